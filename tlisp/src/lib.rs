pub mod builtins;
pub mod env;
pub mod eval;
pub mod io;
pub mod parser;
pub mod reader;
pub mod value;

pub use builtins::Builtin;
pub use env::{Env, Environment};
pub use eval::{Echo, EvalError, Evaluator, RunError, apply, eval};
pub use io::{IoAdapter, StdioAdapter, StringIoAdapter};
pub use parser::ParseError;
pub use value::{Lambda, TlispValue, ValueKind};
