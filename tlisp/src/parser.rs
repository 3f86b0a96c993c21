//! Grammar front end.
//!
//! Produces a generic concrete syntax tree that keeps punctuation leaves and
//! start/end markers, in the shape a parser-combinator grammar naturally
//! yields. Turning that tree into values is the reader's job.
//!
//! ```text
//! number  : /-?[0-9]+/ ;
//! symbol  : /[a-zA-Z0-9_+\-*\/\\=<>!&]+/ ;
//! sexpr   : '(' <expr>* ')' ;
//! qexpr   : '{' <expr>* '}' ;
//! expr    : <number> | <symbol> | <sexpr> | <qexpr> ;
//! program : /^/ <expr>* /$/ ;
//! ```

use ecow::EcoString;
use nom::{
  Err, IResult, Parser,
  branch::alt,
  bytes::complete::take_while1,
  character::complete::{char, digit1, multispace0},
  combinator::{cut, map, opt, recognize},
  multi::many0,
  sequence::preceded,
};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
  Program,
  Number,
  Symbol,
  Sexpr,
  Qexpr,
  /// Bracket punctuation.
  Char,
  /// Start and end of input markers.
  Regex,
}

/// A node of the concrete syntax tree. Leaves carry their source text,
/// containers carry children.
#[derive(Debug, Clone, PartialEq)]
pub struct Ast {
  pub tag: Tag,
  pub contents: EcoString,
  pub children: Vec<Ast>,
}

impl Ast {
  fn leaf(tag: Tag, contents: impl Into<EcoString>) -> Self {
    Self {
      tag,
      contents: contents.into(),
      children: Vec::new(),
    }
  }

  fn node(tag: Tag, children: Vec<Ast>) -> Self {
    Self {
      tag,
      contents: EcoString::new(),
      children,
    }
  }

  /// Leaves that exist only for the grammar and carry no value.
  pub fn is_punctuation(&self) -> bool {
    matches!(self.tag, Tag::Char | Tag::Regex)
  }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
  #[error("Incomplete input: unclosed bracket")]
  Incomplete,

  #[error("Unexpected closing bracket")]
  UnmatchedClosing,

  #[error("Mismatched brackets: expected '{expected}', found '{found}'")]
  Mismatched { expected: char, found: char },

  #[error("Unexpected character '{found}' at column {column}")]
  Syntax { column: usize, found: char },
}

#[inline]
fn is_symbol_char(c: char) -> bool {
  c.is_ascii_alphanumeric() || "_+-*/\\=<>!&".contains(c)
}

fn parse_number(i: &str) -> IResult<&str, Ast> {
  map(recognize((opt(char('-')), digit1)), |s: &str| {
    Ast::leaf(Tag::Number, s)
  })
  .parse(i)
}

fn parse_symbol(i: &str) -> IResult<&str, Ast> {
  map(take_while1(is_symbol_char), |s: &str| {
    Ast::leaf(Tag::Symbol, s)
  })
  .parse(i)
}

fn parse_char(expected: char) -> impl Fn(&str) -> IResult<&str, Ast> {
  move |i: &str| {
    map(char(expected), |c: char| Ast::leaf(Tag::Char, c.to_string())).parse(i)
  }
}

fn parse_exprs(i: &str) -> IResult<&str, Vec<Ast>> {
  many0(preceded(multispace0, parse_expr)).parse(i)
}

fn parse_container(tag: Tag, open: char, close: char) -> impl Fn(&str) -> IResult<&str, Ast> {
  move |i: &str| {
    let (rest, open_leaf) = parse_char(open)(i)?;
    let (rest, exprs) = parse_exprs(rest)?;
    let (rest, close_leaf) = cut(preceded(multispace0, parse_char(close))).parse(rest)?;

    let mut children = Vec::with_capacity(exprs.len() + 2);
    children.push(open_leaf);
    children.extend(exprs);
    children.push(close_leaf);
    Ok((rest, Ast::node(tag, children)))
  }
}

fn parse_expr(i: &str) -> IResult<&str, Ast> {
  alt((
    parse_number,
    parse_symbol,
    parse_container(Tag::Sexpr, '(', ')'),
    parse_container(Tag::Qexpr, '{', '}'),
  ))
  .parse(i)
}

fn parse_program(i: &str) -> IResult<&str, Ast> {
  let (rest, exprs) = parse_exprs(i)?;
  let (rest, _) = multispace0(rest)?;

  let mut children = Vec::with_capacity(exprs.len() + 2);
  children.push(Ast::leaf(Tag::Regex, ""));
  children.extend(exprs);
  children.push(Ast::leaf(Tag::Regex, ""));
  Ok((rest, Ast::node(Tag::Program, children)))
}

fn check_balanced(input: &str) -> Result<(), ParseError> {
  let mut closers = Vec::new();

  for c in input.chars() {
    match c {
      '(' => closers.push(')'),
      '{' => closers.push('}'),
      ')' | '}' => match closers.pop() {
        None => return Err(ParseError::UnmatchedClosing),
        Some(expected) if expected != c => {
          return Err(ParseError::Mismatched { expected, found: c });
        }
        Some(_) => {}
      },
      _ => {}
    }
  }

  if closers.is_empty() {
    Ok(())
  } else {
    Err(ParseError::Incomplete)
  }
}

fn syntax_error(input: &str, found: char, rest: &str) -> ParseError {
  let offset = input.len() - rest.len();
  ParseError::Syntax {
    column: input[..offset].chars().count() + 1,
    found,
  }
}

/// Classify a grammar failure at `rest`. Running out of input means an open
/// bracket still needs closing; a stray closer is reported by the balance
/// check; anything else is a syntax error.
fn failure(input: &str, rest: &str) -> ParseError {
  match rest.chars().next() {
    None => ParseError::Incomplete,
    Some(found @ (')' | '}')) => match check_balanced(input) {
      Err(err @ (ParseError::UnmatchedClosing | ParseError::Mismatched { .. })) => err,
      _ => syntax_error(input, found, rest),
    },
    Some(found) => syntax_error(input, found, rest),
  }
}

/// Parse a whole program. Input that ends inside an open bracket is
/// `Incomplete`, so callers can ask for more lines; every other failure
/// points at the offending character.
pub fn parse(input: &str) -> Result<Ast, ParseError> {
  match parse_program(input) {
    Ok(("", program)) => Ok(program),
    Ok((rest, _)) => Err(failure(input, rest)),
    Err(Err::Error(e) | Err::Failure(e)) => Err(failure(input, e.input)),
    Err(Err::Incomplete(_)) => Err(ParseError::Incomplete),
  }
}
