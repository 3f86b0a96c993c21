use crate::eval::EvalError;
use crate::parser::{Ast, Tag};
use crate::value::TlispValue;

/// Convert a syntax tree into a value.
///
/// Punctuation leaves are dropped. A number that does not fit in an `i64`
/// reads as an error value, so the failure surfaces on evaluation.
pub fn read(ast: &Ast) -> TlispValue {
  match ast.tag {
    Tag::Number => read_number(&ast.contents),
    Tag::Symbol => TlispValue::symbol(ast.contents.clone()),
    Tag::Program | Tag::Sexpr => TlispValue::Sexpr(read_children(ast)),
    Tag::Qexpr => TlispValue::Qexpr(read_children(ast)),
    Tag::Char | Tag::Regex => EvalError::UnexpectedSyntax(ast.contents.clone()).into(),
  }
}

/// Top-level expressions of a program, each read on its own.
pub fn read_program(ast: &Ast) -> Vec<TlispValue> {
  match ast.tag {
    Tag::Program => read_children(ast),
    _ => vec![read(ast)],
  }
}

fn read_number(text: &str) -> TlispValue {
  text
    .parse::<i64>()
    .map_or(EvalError::InvalidNumber.into(), TlispValue::Number)
}

fn read_children(ast: &Ast) -> Vec<TlispValue> {
  ast
    .children
    .iter()
    .filter(|child| !child.is_punctuation())
    .map(read)
    .collect()
}
