mod repl;

use clap::{Parser, Subcommand};
use tlisp::{Echo, Evaluator, StdioAdapter};
use tracing::info;

pub use crate::repl::ReplSession;

pub const DEFAULT_STACK_SIZE_MIB: u64 = 64;
pub const MAX_STACK_SIZE_MIB: u64 = 4096;

#[derive(Parser)]
#[command(name = "tlisp")]
#[command(about = "tlisp - A small S-expression evaluator", long_about = None)]
#[command(version)]
pub struct Cli {
  /// Stack size of the evaluation thread, in MiB
  #[arg(
    long,
    global = true,
    value_name = "MIB",
    default_value_t = DEFAULT_STACK_SIZE_MIB,
    value_parser = clap::value_parser!(u64).range(1..=MAX_STACK_SIZE_MIB)
  )]
  pub stack_size: u64,

  #[command(subcommand)]
  pub command: Option<Commands>,
}

impl Cli {
  /// Requested stack size in bytes, if it fits this platform's `usize`.
  pub fn stack_size_bytes(&self) -> Result<usize, String> {
    usize::try_from(self.stack_size)
      .ok()
      .and_then(|mib| mib.checked_mul(1024 * 1024))
      .ok_or_else(|| format!("Stack size of {} MiB is too large", self.stack_size))
  }
}

#[derive(Subcommand)]
pub enum Commands {
  /// Start an interactive REPL
  Repl,
  /// Run tlisp code
  Run {
    /// Evaluate expression from the command line
    #[arg(short, long)]
    eval: Option<String>,
    /// Run tlisp files (multiple files will share context)
    #[arg(value_name = "FILES")]
    files: Vec<String>,
  },
}

pub fn run_repl() -> Result<(), String> {
  let mut session = ReplSession::new().map_err(|e| format!("Failed to initialize REPL: {}", e))?;
  session.run().map_err(|e| format!("REPL error: {}", e))
}

pub fn run_eval(expression: &str) -> Result<(), String> {
  let evaluator = Evaluator::new();
  let mut io = StdioAdapter::new();

  evaluator
    .run_program(expression, &mut io, Echo::Last)
    .map(|_| ())
    .map_err(|e| e.to_string())
}

pub fn run_file(path: &str) -> Result<(), String> {
  run_files(&[path.to_string()])
}

pub fn run_files(paths: &[String]) -> Result<(), String> {
  let evaluator = Evaluator::new();
  let mut io = StdioAdapter::new();

  for path in paths {
    info!(path = path.as_str(), "running file");
    evaluator
      .run_file(path, &mut io, Echo::Silent)
      .map_err(|e| format!("In file '{}': {}", path, e))?;
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_default_stack_size() {
    let cli = Cli::try_parse_from(["tlisp"]).expect("Failed to parse arguments");
    assert_eq!(cli.stack_size, DEFAULT_STACK_SIZE_MIB);
    assert_eq!(cli.stack_size_bytes(), Ok(64 * 1024 * 1024));
  }

  #[test]
  fn test_stack_size_is_global() {
    let cli = Cli::try_parse_from(["tlisp", "run", "--stack-size", "8", "-e", "+ 1 2"])
      .expect("Failed to parse arguments");
    assert_eq!(cli.stack_size_bytes(), Ok(8 * 1024 * 1024));
    assert!(matches!(cli.command, Some(Commands::Run { eval: Some(_), .. })));
  }

  #[test]
  fn test_stack_size_out_of_range_is_rejected() {
    for size in ["0", "4097", "18446744073709551615", "99999999999999999999999"] {
      assert!(
        Cli::try_parse_from(["tlisp", "--stack-size", size]).is_err(),
        "--stack-size {} should be rejected",
        size
      );
    }
  }

  #[test]
  fn test_stack_size_bytes_checks_overflow() {
    let cli = Cli {
      stack_size: u64::MAX,
      command: None,
    };
    assert!(cli.stack_size_bytes().is_err());
  }
}
