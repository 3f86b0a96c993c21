use std::fmt;

use ecow::EcoString;

use crate::builtins::Builtin;
use crate::env::Environment;
use crate::eval::EvalError;

#[derive(Debug, Clone, PartialEq)]
pub enum TlispValue {
  Number(i64),
  Error(EvalError),
  Symbol { name: EcoString },
  Builtin(Builtin),
  Lambda(Box<Lambda>),

  /// Evaluable list, applied on evaluation.
  Sexpr(Vec<TlispValue>),
  /// Quoted list, inert until passed to `eval`.
  Qexpr(Vec<TlispValue>),
}

/// A user-defined function.
///
/// `env` is private to this closure instance: it holds the bindings captured
/// when the lambda was built plus any arguments supplied by partial
/// application. Cloning the closure clones the environment with it.
#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
  pub formals: Vec<EcoString>,
  pub body: Vec<TlispValue>,
  pub env: Environment,
}

impl Lambda {
  pub fn new(formals: Vec<EcoString>, body: Vec<TlispValue>, env: Environment) -> Self {
    Self { formals, body, env }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
  Number,
  Error,
  Symbol,
  Function,
  Sexpr,
  Qexpr,
}

impl fmt::Display for ValueKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      ValueKind::Number => "Number",
      ValueKind::Error => "Error",
      ValueKind::Symbol => "Symbol",
      ValueKind::Function => "Function",
      ValueKind::Sexpr => "S-Expression",
      ValueKind::Qexpr => "Q-Expression",
    };
    f.write_str(name)
  }
}

impl TlispValue {
  pub fn symbol(name: impl Into<EcoString>) -> Self {
    TlispValue::Symbol { name: name.into() }
  }

  pub fn lambda(lambda: Lambda) -> Self {
    TlispValue::Lambda(Box::new(lambda))
  }

  /// The empty S-expression, returned by forms that produce no value.
  pub fn unit() -> Self {
    TlispValue::Sexpr(Vec::new())
  }

  pub fn kind(&self) -> ValueKind {
    match self {
      TlispValue::Number(_) => ValueKind::Number,
      TlispValue::Error(_) => ValueKind::Error,
      TlispValue::Symbol { .. } => ValueKind::Symbol,
      TlispValue::Builtin(_) | TlispValue::Lambda(_) => ValueKind::Function,
      TlispValue::Sexpr(_) => ValueKind::Sexpr,
      TlispValue::Qexpr(_) => ValueKind::Qexpr,
    }
  }

  pub fn is_error(&self) -> bool {
    matches!(self, TlispValue::Error(_))
  }
}

impl From<i64> for TlispValue {
  fn from(value: i64) -> Self {
    TlispValue::Number(value)
  }
}

impl From<EvalError> for TlispValue {
  fn from(err: EvalError) -> Self {
    TlispValue::Error(err)
  }
}

impl From<Result<TlispValue, EvalError>> for TlispValue {
  fn from(result: Result<TlispValue, EvalError>) -> Self {
    result.unwrap_or_else(TlispValue::Error)
  }
}

fn write_cells(f: &mut fmt::Formatter<'_>, cells: &[TlispValue], open: char, close: char) -> fmt::Result {
  write!(f, "{}", open)?;

  for (i, cell) in cells.iter().enumerate() {
    if i > 0 {
      write!(f, " ")?;
    }
    write!(f, "{}", cell)?;
  }

  write!(f, "{}", close)
}

impl fmt::Display for TlispValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      TlispValue::Number(value) => write!(f, "{}", value),
      TlispValue::Error(err) => write!(f, "error: {}", err),
      TlispValue::Symbol { name } => write!(f, "{}", name),
      TlispValue::Builtin(_) => write!(f, "<function>"),
      TlispValue::Lambda(lambda) => write!(f, "{}", lambda),
      TlispValue::Sexpr(cells) => write_cells(f, cells, '(', ')'),
      TlispValue::Qexpr(cells) => write_cells(f, cells, '{', '}'),
    }
  }
}

impl fmt::Display for Lambda {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "(\\ {{")?;
    for (i, formal) in self.formals.iter().enumerate() {
      if i > 0 {
        write!(f, " ")?;
      }
      write!(f, "{}", formal)?;
    }
    write!(f, "}} ")?;
    write_cells(f, &self.body, '{', '}')?;
    write!(f, ")")
  }
}

#[macro_export]
macro_rules! sexpr {
    [$($elem:expr),* $(,)?] => {
        $crate::value::TlispValue::Sexpr(vec![$(<$crate::value::TlispValue as From<_>>::from($elem)),*])
    };
}

#[macro_export]
macro_rules! qexpr {
    [$($elem:expr),* $(,)?] => {
        $crate::value::TlispValue::Qexpr(vec![$(<$crate::value::TlispValue as From<_>>::from($elem)),*])
    };
}

#[macro_export]
macro_rules! sym {
  ($s:expr) => {
    $crate::value::TlispValue::symbol($s)
  };
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_display_lists() {
    let value = sexpr![sym!("+"), 1, qexpr![2, 3]];
    assert_eq!(value.to_string(), "(+ 1 {2 3})");
    assert_eq!(TlispValue::unit().to_string(), "()");
    assert_eq!(qexpr![].to_string(), "{}");
  }

  #[test]
  fn test_display_lambda() {
    let lambda = Lambda::new(
      vec!["a".into(), "b".into()],
      vec![sym!("+"), sym!("a"), sym!("b")],
      Environment::new(),
    );
    assert_eq!(TlispValue::lambda(lambda).to_string(), "(\\ {a b} {+ a b})");
  }

  #[test]
  fn test_display_builtin_and_error() {
    assert_eq!(TlispValue::Builtin(Builtin::Add).to_string(), "<function>");
    assert_eq!(
      TlispValue::Error(EvalError::DivisionByZero).to_string(),
      "error: Division By Zero!"
    );
  }

  #[test]
  fn test_clone_is_independent() {
    let original = qexpr![1, qexpr![2, sym!("x")]];
    let mut copy = original.clone();
    assert_eq!(copy.to_string(), original.to_string());

    if let TlispValue::Qexpr(cells) = &mut copy {
      cells.clear();
    }
    drop(copy);

    assert_eq!(original.to_string(), "{1 {2 x}}");
  }

  #[test]
  fn test_cloned_lambda_owns_its_environment() {
    let mut env = Environment::new();
    env.define_local("x", 1.into());
    let original = Lambda::new(vec!["y".into()], vec![sym!("x")], env);

    let mut copy = original.clone();
    copy.env.define_local("x", 2.into());

    assert_eq!(original.env.get("x"), Some(&TlispValue::Number(1)));
    assert_eq!(copy.env.get("x"), Some(&TlispValue::Number(2)));
  }

  #[test]
  fn test_kind_names() {
    assert_eq!(TlispValue::Number(1).kind().to_string(), "Number");
    assert_eq!(TlispValue::unit().kind().to_string(), "S-Expression");
    assert_eq!(qexpr![].kind().to_string(), "Q-Expression");
    assert_eq!(TlispValue::Builtin(Builtin::Head).kind(), ValueKind::Function);
  }

  #[test]
  fn test_result_folds_into_value() {
    let ok: Result<TlispValue, EvalError> = Ok(3.into());
    let err: Result<TlispValue, EvalError> = Err(EvalError::InvalidNumber);
    assert_eq!(TlispValue::from(ok), TlispValue::Number(3));
    assert!(TlispValue::from(err).is_error());
  }
}
