use clap::Parser;
use cli::{Cli, Commands, run_eval, run_file, run_files, run_repl};
use colored::*;
use std::{io, process, thread};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
  let filter = EnvFilter::try_from_env("TLISP_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(io::stderr)
    .with_target(false)
    .init();
}

fn run(command: Option<Commands>) -> Result<(), String> {
  match command {
    Some(Commands::Repl) | None => run_repl(),
    Some(Commands::Run { eval, files }) => match (eval, files.as_slice()) {
      (Some(expr), _) => run_eval(&expr),
      (None, [file]) => run_file(file),
      (None, []) => Err("Either --eval or file paths must be provided".to_string()),
      (None, files) => run_files(files),
    },
  }
}

fn main() {
  init_tracing();
  let cli = Cli::parse();

  // Evaluation recurses on the host stack, so it runs on a thread sized for it.
  let result = cli
    .stack_size_bytes()
    .and_then(|stack_size| {
      thread::Builder::new()
        .stack_size(stack_size)
        .spawn(move || run(cli.command))
        .map_err(|e| format!("Failed to spawn evaluation thread: {}", e))
    })
    .and_then(|handle| {
      handle
        .join()
        .map_err(|_| "Failed to join evaluation thread".to_string())?
    });

  if let Err(e) = result {
    eprintln!("{} {}", "Error:".red().bold(), e);
    process::exit(1);
  }
}
