use tlisp::{Evaluator, ParseError, TlispValue};

#[derive(Debug, PartialEq)]
pub enum EvalError {
  Incomplete,
  Error(String),
}

impl From<ParseError> for EvalError {
  fn from(err: ParseError) -> Self {
    match err {
      ParseError::Incomplete => EvalError::Incomplete,
      other => EvalError::Error(other.to_string()),
    }
  }
}

/// Evaluate one REPL entry and render the result for display.
pub fn process_input(evaluator: &Evaluator, input: &str) -> Result<String, EvalError> {
  match evaluator.eval_line(input)? {
    TlispValue::Error(err) => Err(EvalError::Error(err.to_string())),
    value => Ok(value.to_string()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_process_input_renders_value() {
    let evaluator = Evaluator::new();
    assert_eq!(process_input(&evaluator, "+ 1 2"), Ok("3".to_string()));
    assert_eq!(process_input(&evaluator, "list 1 {2}"), Ok("{1 {2}}".to_string()));
  }

  #[test]
  fn test_process_input_keeps_session_state() {
    let evaluator = Evaluator::new();
    assert_eq!(process_input(&evaluator, "def {x} 5"), Ok("()".to_string()));
    assert_eq!(process_input(&evaluator, "* x x"), Ok("25".to_string()));
  }

  #[test]
  fn test_process_input_incomplete() {
    let evaluator = Evaluator::new();
    assert_eq!(process_input(&evaluator, "(+ 1"), Err(EvalError::Incomplete));
  }

  #[test]
  fn test_process_input_errors() {
    let evaluator = Evaluator::new();
    assert_eq!(
      process_input(&evaluator, "/ 1 0"),
      Err(EvalError::Error("Division By Zero!".to_string()))
    );
    assert_eq!(
      process_input(&evaluator, "+ 1)"),
      Err(EvalError::Error("Unexpected closing bracket".to_string()))
    );
  }
}
