use std::path::Path;

use ecow::EcoString;
use thiserror::Error;
use tracing::{debug, trace};

use crate::env::{Env, Environment};
use crate::io::IoAdapter;
use crate::parser::{self, ParseError};
use crate::reader;
use crate::value::{Lambda, TlispValue, ValueKind};

/// Marks a variadic formal: `{x & rest}` binds the remaining arguments to `rest`.
const VARIADIC_MARKER: &str = "&";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
  #[error("Unbound Symbol '{0}'")]
  UnboundSymbol(EcoString),

  #[error(
    "Function '{function}' passed incorrect type for argument {index}. Got {got}, Expected {expected}."
  )]
  WrongArgumentType {
    function: &'static str,
    index: usize,
    got: ValueKind,
    expected: ValueKind,
  },

  #[error("Function '{function}' passed incorrect number of arguments. Got {got}, Expected {expected}.")]
  WrongArgumentCount {
    function: &'static str,
    got: usize,
    expected: usize,
  },

  #[error("Function '{function}' passed {{}} for argument {index}.")]
  EmptyArgument { function: &'static str, index: usize },

  #[error("Division By Zero!")]
  DivisionByZero,

  #[error("Invalid number")]
  InvalidNumber,

  #[error("S-Expression starts with incorrect type. Got {got}, Expected Function.")]
  NotAFunction { got: ValueKind },

  #[error("Function passed too many arguments. Got {given}, Expected {expected}.")]
  TooManyArguments { given: usize, expected: usize },

  #[error("Function '{function}' cannot define non-symbol. Got {got}, Expected Symbol.")]
  NonSymbolBinding { function: &'static str, got: ValueKind },

  #[error("Function '{function}' passed {values} values for {symbols} symbols.")]
  BindingCountMismatch {
    function: &'static str,
    symbols: usize,
    values: usize,
  },

  #[error("Function format invalid. Symbol '&' not followed by single symbol.")]
  InvalidVariadicFormals,

  #[error("Integer overflow in '{function}'.")]
  IntegerOverflow { function: &'static str },

  #[error("Unexpected syntax '{0}'")]
  UnexpectedSyntax(EcoString),
}

#[derive(Debug, Error)]
pub enum RunError {
  #[error(transparent)]
  Parse(#[from] ParseError),

  #[error(transparent)]
  Eval(#[from] EvalError),

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),
}

/// Which results `Evaluator::run_program` writes to its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Echo {
  Silent,
  Last,
  Each,
}

/// Reduce `value` to normal form in `env`.
pub fn eval(env: &Env, value: TlispValue) -> Result<TlispValue, EvalError> {
  match value {
    TlispValue::Symbol { name } => env.borrow().lookup(&name),
    TlispValue::Sexpr(cells) => eval_sexpr(env, cells),
    TlispValue::Error(err) => Err(err),
    TlispValue::Number(_)
    | TlispValue::Builtin(_)
    | TlispValue::Lambda(_)
    | TlispValue::Qexpr(_) => Ok(value),
  }
}

fn eval_sexpr(env: &Env, cells: Vec<TlispValue>) -> Result<TlispValue, EvalError> {
  trace!(len = cells.len(), "reducing s-expression");

  // All cells are reduced before the first error is reported.
  let reduced: Vec<_> = cells.into_iter().map(|cell| eval(env, cell)).collect();
  let mut cells = reduced
    .into_iter()
    .collect::<Result<Vec<_>, _>>()?
    .into_iter();

  let Some(head) = cells.next() else {
    return Ok(TlispValue::unit());
  };

  let arguments: Vec<_> = cells.collect();
  if arguments.is_empty() {
    return Ok(head);
  }

  apply(env, head, arguments)
}

/// Call `callee` with already evaluated `arguments`.
pub fn apply(
  env: &Env,
  callee: TlispValue,
  arguments: Vec<TlispValue>,
) -> Result<TlispValue, EvalError> {
  match callee {
    TlispValue::Builtin(builtin) => builtin.call(env, arguments),
    TlispValue::Lambda(lambda) => call_lambda(env, *lambda, arguments),
    other => Err(EvalError::NotAFunction { got: other.kind() }),
  }
}

fn call_lambda(
  env: &Env,
  mut lambda: Lambda,
  arguments: Vec<TlispValue>,
) -> Result<TlispValue, EvalError> {
  let given = arguments.len();
  let expected = lambda.formals.len();
  let mut arguments = arguments.into_iter();

  while let Some(argument) = arguments.next() {
    if lambda.formals.is_empty() {
      return Err(EvalError::TooManyArguments { given, expected });
    }

    let formal = lambda.formals.remove(0);
    if formal.as_str() == VARIADIC_MARKER {
      let rest_name = take_variadic_name(&mut lambda.formals)?;
      let rest = std::iter::once(argument).chain(arguments.by_ref()).collect();
      lambda.env.define_local(rest_name, TlispValue::Qexpr(rest));
      break;
    }

    lambda.env.define_local(formal, argument);
  }

  // `&` left unbound once the arguments run out still completes the call.
  if lambda
    .formals
    .first()
    .is_some_and(|formal| formal.as_str() == VARIADIC_MARKER)
  {
    lambda.formals.remove(0);
    let rest_name = take_variadic_name(&mut lambda.formals)?;
    lambda.env.define_local(rest_name, TlispValue::Qexpr(Vec::new()));
  }

  if !lambda.formals.is_empty() {
    debug!(
      bound = given,
      remaining = lambda.formals.len(),
      "partially applied lambda"
    );
    return Ok(TlispValue::lambda(lambda));
  }

  debug!(arguments = given, "calling lambda");
  let call_env = lambda.env.fork_with_parent(env);
  eval(&call_env, TlispValue::Sexpr(lambda.body))
}

fn take_variadic_name(formals: &mut Vec<EcoString>) -> Result<EcoString, EvalError> {
  match formals.pop() {
    Some(name) if formals.is_empty() => Ok(name),
    _ => Err(EvalError::InvalidVariadicFormals),
  }
}

/// Owns the root environment and drives evaluation of source text.
pub struct Evaluator {
  env: Env,
}

impl Default for Evaluator {
  fn default() -> Self {
    Self::new()
  }
}

impl Evaluator {
  pub fn new() -> Self {
    Self::with_environment(Environment::with_builtins().into_shared())
  }

  pub fn with_environment(env: Env) -> Self {
    Self { env }
  }

  pub fn environment(&self) -> &Env {
    &self.env
  }

  pub fn eval(&self, value: TlispValue) -> Result<TlispValue, EvalError> {
    eval(&self.env, value)
  }

  /// Evaluate one line of input. The whole line reads as a single
  /// S-expression, so `+ 1 2` and `(+ 1 2)` both give `3`.
  ///
  /// Evaluation errors come back as `TlispValue::Error`.
  pub fn eval_line(&self, input: &str) -> Result<TlispValue, ParseError> {
    let program = parser::parse(input)?;
    Ok(self.eval(reader::read(&program)).into())
  }

  /// Evaluate each top-level expression of `source` in order, stopping at
  /// the first error. Returns the last result, or `()` for empty input.
  pub fn run_program<I: IoAdapter>(
    &self,
    source: &str,
    io: &mut I,
    echo: Echo,
  ) -> Result<TlispValue, RunError> {
    let program = parser::parse(source)?;
    let mut last = TlispValue::unit();

    for expression in reader::read_program(&program) {
      last = self.eval(expression)?;
      if echo == Echo::Each {
        io.println(&last.to_string())?;
      }
    }

    if echo == Echo::Last {
      io.println(&last.to_string())?;
    }

    Ok(last)
  }

  /// Load `path` through `io` and run it as a program.
  pub fn run_file<I: IoAdapter>(
    &self,
    path: impl AsRef<Path>,
    io: &mut I,
    echo: Echo,
  ) -> Result<TlispValue, RunError> {
    let path = path.as_ref();
    debug!(path = %path.display(), "running file");
    let source = io.load_source(path)?;
    self.run_program(&source, io, echo)
  }
}
