use ecow::EcoString;

use crate::env::Env;
use crate::eval::{EvalError, eval};
use crate::value::{Lambda, TlispValue, ValueKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
  List,
  Head,
  Tail,
  Eval,
  Join,
  Add,
  Subtract,
  Multiply,
  Divide,
  Lambda,
  Def,
  Put,
}

/// Every primitive and the name it is bound to in the root environment.
pub const BUILTINS: &[(&str, Builtin)] = &[
  ("list", Builtin::List),
  ("head", Builtin::Head),
  ("tail", Builtin::Tail),
  ("eval", Builtin::Eval),
  ("join", Builtin::Join),
  ("+", Builtin::Add),
  ("-", Builtin::Subtract),
  ("*", Builtin::Multiply),
  ("/", Builtin::Divide),
  ("\\", Builtin::Lambda),
  ("def", Builtin::Def),
  ("=", Builtin::Put),
];

impl Builtin {
  pub fn name(self) -> &'static str {
    match self {
      Builtin::List => "list",
      Builtin::Head => "head",
      Builtin::Tail => "tail",
      Builtin::Eval => "eval",
      Builtin::Join => "join",
      Builtin::Add => "+",
      Builtin::Subtract => "-",
      Builtin::Multiply => "*",
      Builtin::Divide => "/",
      Builtin::Lambda => "\\",
      Builtin::Def => "def",
      Builtin::Put => "=",
    }
  }

  pub fn call(self, env: &Env, arguments: Vec<TlispValue>) -> Result<TlispValue, EvalError> {
    match self {
      Builtin::List => Ok(TlispValue::Qexpr(arguments)),
      Builtin::Head => builtin_head(arguments),
      Builtin::Tail => builtin_tail(arguments),
      Builtin::Eval => builtin_eval(env, arguments),
      Builtin::Join => builtin_join(arguments),
      Builtin::Add | Builtin::Subtract | Builtin::Multiply | Builtin::Divide => {
        builtin_arithmetic(self, arguments)
      }
      Builtin::Lambda => builtin_lambda(env, arguments),
      Builtin::Def | Builtin::Put => builtin_var(self, env, arguments),
    }
  }
}

/// Destructure exactly `N` arguments.
fn exact<const N: usize>(
  function: &'static str,
  arguments: Vec<TlispValue>,
) -> Result<[TlispValue; N], EvalError> {
  arguments
    .try_into()
    .map_err(|arguments: Vec<TlispValue>| EvalError::WrongArgumentCount {
      function,
      got: arguments.len(),
      expected: N,
    })
}

/// Unwrap the cells of a Q-expression, reporting `index` if it is not one.
fn into_qexpr(
  function: &'static str,
  index: usize,
  value: TlispValue,
) -> Result<Vec<TlispValue>, EvalError> {
  match value {
    TlispValue::Qexpr(cells) => Ok(cells),
    other => Err(EvalError::WrongArgumentType {
      function,
      index,
      got: other.kind(),
      expected: ValueKind::Qexpr,
    }),
  }
}

/// The single non-empty Q-expression argument of `head` and `tail`.
fn single_list(function: &'static str, arguments: Vec<TlispValue>) -> Result<Vec<TlispValue>, EvalError> {
  let [list] = exact(function, arguments)?;
  let cells = into_qexpr(function, 0, list)?;

  if cells.is_empty() {
    return Err(EvalError::EmptyArgument { function, index: 0 });
  }
  Ok(cells)
}

fn builtin_head(arguments: Vec<TlispValue>) -> Result<TlispValue, EvalError> {
  let mut cells = single_list("head", arguments)?;
  cells.truncate(1);
  Ok(TlispValue::Qexpr(cells))
}

fn builtin_tail(arguments: Vec<TlispValue>) -> Result<TlispValue, EvalError> {
  let mut cells = single_list("tail", arguments)?;
  cells.remove(0);
  Ok(TlispValue::Qexpr(cells))
}

fn builtin_eval(env: &Env, arguments: Vec<TlispValue>) -> Result<TlispValue, EvalError> {
  let [list] = exact("eval", arguments)?;
  let cells = into_qexpr("eval", 0, list)?;
  eval(env, TlispValue::Sexpr(cells))
}

fn builtin_join(arguments: Vec<TlispValue>) -> Result<TlispValue, EvalError> {
  if arguments.is_empty() {
    return Err(EvalError::WrongArgumentCount {
      function: "join",
      got: 0,
      expected: 1,
    });
  }

  let lists = arguments
    .into_iter()
    .enumerate()
    .map(|(index, list)| into_qexpr("join", index, list))
    .collect::<Result<Vec<_>, _>>()?;

  Ok(TlispValue::Qexpr(lists.into_iter().flatten().collect()))
}

fn builtin_arithmetic(op: Builtin, arguments: Vec<TlispValue>) -> Result<TlispValue, EvalError> {
  let function = op.name();

  // Type check everything before folding anything.
  let numbers = arguments
    .iter()
    .enumerate()
    .map(|(index, argument)| match argument {
      TlispValue::Number(n) => Ok(*n),
      other => Err(EvalError::WrongArgumentType {
        function,
        index,
        got: other.kind(),
        expected: ValueKind::Number,
      }),
    })
    .collect::<Result<Vec<_>, _>>()?;

  let Some((&first, rest)) = numbers.split_first() else {
    return Err(EvalError::WrongArgumentCount {
      function,
      got: 0,
      expected: 1,
    });
  };

  let overflow = || EvalError::IntegerOverflow { function };

  if op == Builtin::Subtract && rest.is_empty() {
    return first.checked_neg().map(TlispValue::Number).ok_or_else(overflow);
  }

  let step: fn(i64, i64) -> Option<i64> = match op {
    Builtin::Add => i64::checked_add,
    Builtin::Subtract => i64::checked_sub,
    Builtin::Multiply => i64::checked_mul,
    _ => i64::checked_div,
  };

  let mut acc = first;
  for &y in rest {
    if op == Builtin::Divide && y == 0 {
      return Err(EvalError::DivisionByZero);
    }
    acc = step(acc, y).ok_or_else(overflow)?;
  }

  Ok(TlispValue::Number(acc))
}

/// Names out of a Q-expression that must hold only symbols.
fn symbol_names(function: &'static str, cells: Vec<TlispValue>) -> Result<Vec<EcoString>, EvalError> {
  cells
    .into_iter()
    .map(|cell| match cell {
      TlispValue::Symbol { name } => Ok(name),
      other => Err(EvalError::NonSymbolBinding {
        function,
        got: other.kind(),
      }),
    })
    .collect()
}

fn builtin_lambda(env: &Env, arguments: Vec<TlispValue>) -> Result<TlispValue, EvalError> {
  let [formals, body] = exact("\\", arguments)?;
  let formals = into_qexpr("\\", 0, formals)?;
  let body = into_qexpr("\\", 1, body)?;
  let formals = symbol_names("\\", formals)?;

  Ok(TlispValue::lambda(Lambda::new(
    formals,
    body,
    env.borrow().capture(),
  )))
}

fn builtin_var(op: Builtin, env: &Env, arguments: Vec<TlispValue>) -> Result<TlispValue, EvalError> {
  let function = op.name();
  let mut arguments = arguments.into_iter();
  let Some(symbols) = arguments.next() else {
    return Err(EvalError::WrongArgumentCount {
      function,
      got: 0,
      expected: 1,
    });
  };
  let names = symbol_names(function, into_qexpr(function, 0, symbols)?)?;
  let values: Vec<_> = arguments.collect();

  if names.len() != values.len() {
    return Err(EvalError::BindingCountMismatch {
      function,
      symbols: names.len(),
      values: values.len(),
    });
  }

  let mut env = env.borrow_mut();
  for (name, value) in names.into_iter().zip(values) {
    match op {
      Builtin::Def => env.define_global(name, value),
      _ => env.define_local(name, value),
    }
  }

  Ok(TlispValue::unit())
}
