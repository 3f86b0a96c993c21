use colored::*;
use rustyline::config::Configurer;
use rustyline::error::ReadlineError;
use rustyline::history::{DefaultHistory, History};
use rustyline::{Editor, Result as RustyResult};
use std::path::PathBuf;
use tlisp::{Echo, Evaluator, RunError, StdioAdapter, TlispValue};
use tracing::debug;

use super::helper::ReplHelper;
use super::input::{InputBuffer, LineResult};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_HISTORY_SIZE: usize = 1000;
const HISTORY_FILE_NAME: &str = ".tlisp_history";
const SHOWN_HISTORY: usize = 20;

/// Where the REPL keeps its history and how much of it.
#[derive(Debug, PartialEq)]
pub struct HistoryConfig {
  pub file: PathBuf,
  pub size: usize,
}

impl HistoryConfig {
  pub fn from_env() -> Self {
    Self::from_lookup(|key| std::env::var(key).ok(), dirs::home_dir())
  }

  fn from_lookup(lookup: impl Fn(&str) -> Option<String>, home: Option<PathBuf>) -> Self {
    let file = lookup("TLISP_REPL_HISTORY")
      .map(PathBuf::from)
      .or_else(|| home.map(|home| home.join(HISTORY_FILE_NAME)))
      .unwrap_or_else(|| PathBuf::from(HISTORY_FILE_NAME));

    let size = lookup("TLISP_REPL_HISTORY_SIZE")
      .and_then(|s| s.parse().ok())
      .unwrap_or(DEFAULT_HISTORY_SIZE);

    Self { file, size }
  }
}

/// A line starting with `:` addressed to the REPL itself.
#[derive(Debug, PartialEq)]
enum Command<'a> {
  Quit,
  Help,
  History,
  Env,
  Load(Option<&'a str>),
  Unknown(&'a str),
}

impl<'a> Command<'a> {
  fn parse(line: &'a str) -> Option<Self> {
    let mut words = line.split_whitespace();
    let name = words.next()?;
    if !name.starts_with(':') {
      return None;
    }

    Some(match name {
      ":quit" | ":exit" => Command::Quit,
      ":help" => Command::Help,
      ":history" => Command::History,
      ":env" => Command::Env,
      ":l" | ":load" => Command::Load(words.next()),
      other => Command::Unknown(other),
    })
  }
}

pub struct ReplSession {
  editor: Editor<ReplHelper, DefaultHistory>,
  history: HistoryConfig,
  input: InputBuffer,
}

impl ReplSession {
  pub fn new() -> RustyResult<Self> {
    let mut editor = Editor::new()?;
    editor.set_helper(Some(ReplHelper::new()));

    let history = HistoryConfig::from_env();
    editor.set_max_history_size(history.size)?;

    if let Err(e) = editor.load_history(&history.file) {
      debug!(path = %history.file.display(), error = %e, "no history loaded");
    }

    Ok(Self {
      editor,
      history,
      input: InputBuffer::new(Evaluator::new()),
    })
  }

  pub fn run(&mut self) -> RustyResult<()> {
    print_banner();

    loop {
      let prompt = self.prompt();

      match self.editor.readline(&prompt) {
        Ok(line) => {
          if !self.input.is_continuation() {
            if line.trim().is_empty() {
              continue;
            }

            if let Some(command) = Command::parse(&line) {
              if command == Command::Quit {
                print_goodbye();
                break;
              }
              self.editor.add_history_entry(line.as_str())?;
              self.execute(command);
              continue;
            }
          }

          self.evaluate(&line)?;
        }
        Err(ReadlineError::Interrupted) => {
          println!("{}", "^C".yellow());
          self.input.discard();
        }
        Err(ReadlineError::Eof) => {
          print_goodbye();
          break;
        }
        Err(err) => {
          eprintln!("{} {:?}", "Error:".red().bold(), err);
          break;
        }
      }
    }

    if let Err(e) = self.editor.save_history(&self.history.file) {
      eprintln!("Warning: Could not save history: {}", e);
    }

    Ok(())
  }

  fn prompt(&self) -> String {
    if self.input.is_continuation() {
      format!("{} ", "  ...".bright_black())
    } else {
      format!(
        "{}{}❯ ",
        "tlisp".bright_cyan().bold(),
        format!("[{}]", self.input.entry_number()).bright_black()
      )
    }
  }

  fn evaluate(&mut self, line: &str) -> RustyResult<()> {
    let (result, entry) = self.input.push(line);
    if let Some(entry) = entry {
      self.editor.add_history_entry(entry)?;
    }

    match result {
      LineResult::Complete(rendered) => {
        println!("{} {}", "=>".bright_green().bold(), rendered.bright_white());
      }
      LineResult::NeedMore => {}
      LineResult::Error(msg) => {
        eprintln!("{} {}", "Error:".red().bold(), msg);
      }
    }

    Ok(())
  }

  fn execute(&mut self, command: Command<'_>) {
    match command {
      Command::Quit => {}
      Command::Help => print_help(),
      Command::History => print_history(self.editor.history()),
      Command::Env => print_env(self.input.evaluator()),
      Command::Load(Some(path)) => load_file(self.input.evaluator(), path),
      Command::Load(None) => {
        eprintln!(
          "{} Please provide a file path: {} or {}",
          "Error:".red().bold(),
          ":l <path>".bright_green(),
          ":load <path>".bright_green()
        );
      }
      Command::Unknown(name) => {
        eprintln!(
          "{} Unknown command {} (try {})",
          "Error:".red().bold(),
          name.bright_yellow(),
          ":help".bright_green()
        );
      }
    }
  }
}

fn load_file(evaluator: &Evaluator, path: &str) {
  let mut io = StdioAdapter::new();

  match evaluator.run_file(path, &mut io, Echo::Silent) {
    Ok(last) => {
      println!("{} Loaded {}", "✓".bright_green().bold(), path.bright_cyan());
      if last != TlispValue::unit() {
        println!("{} {}", "=>".bright_green().bold(), last.to_string().bright_white());
      }
    }
    Err(RunError::Io(e)) => {
      eprintln!("{} Could not read {}: {}", "Error:".red().bold(), path.bright_yellow(), e);
    }
    Err(e) => {
      eprintln!("{} In file {}: {}", "Error:".red().bold(), path.bright_yellow(), e);
    }
  }
}

/// Global definitions made during the session, primitives excluded.
fn print_env(evaluator: &Evaluator) {
  let root = evaluator.environment().borrow();
  let mut definitions = root
    .bindings()
    .filter(|(_, value)| !matches!(value, TlispValue::Builtin(_)))
    .peekable();

  if definitions.peek().is_none() {
    println!("  {}", "Nothing defined yet".bright_black().italic());
    return;
  }

  for (name, value) in definitions {
    println!(
      "  {} {}",
      format!("{:<16}", name.as_str()).bright_cyan(),
      value.to_string().bright_white()
    );
  }
}

fn print_banner() {
  println!(
    "{} {} {}",
    "tlisp".bright_cyan().bold(),
    format!("v{}", VERSION).bright_black(),
    "· S-expressions, Q-expressions and closures".bright_white()
  );
  println!(
    "  {} {} {} {} {}\n",
    "Type".bright_white(),
    ":help".bright_green().bold(),
    "for commands,".bright_white(),
    ":quit".bright_green().bold(),
    "to leave".bright_white(),
  );
}

fn print_goodbye() {
  println!("{}", "Bye.".bright_cyan().italic());
}

fn print_help() {
  let separator = "━".repeat(56).bright_black().to_string();
  let row = |key: ColoredString, text: &str| println!("    {:14} {}", key, text);

  println!("\n{}", separator);

  println!("  {}", "Commands".bright_yellow().bold());
  row(":help".bright_green(), "Show this help");
  row(":quit :exit".bright_green(), "Leave the REPL");
  row(":history".bright_green(), "Show recent entries");
  row(":env".bright_green(), "Show global definitions");
  row(":l <file>".bright_green(), "Run a file in this session");

  println!("\n  {}", "Builtins".bright_yellow().bold());
  row("numbers".bright_cyan(), "+ - * /");
  row("lists".bright_cyan(), "list head tail join eval");
  row("binding".bright_cyan(), "def = \\");

  println!("\n  {}", "Examples".bright_yellow().bold());
  row("+ 1 (* 2 3)".bright_white(), "7");
  row("head {1 2 3}".bright_white(), "{1}");
  row("def {sq} (\\ {x} {* x x})".bright_white(), "()");

  println!("\n  {}", "Keys".bright_yellow().bold());
  row("↑/↓ Ctrl+R".bright_magenta(), "Browse and search history");
  row("Ctrl+C".bright_magenta(), "Drop the current entry");
  row("Ctrl+D".bright_magenta(), "Leave the REPL");

  println!("{}\n", separator);
}

fn print_history(history: &DefaultHistory) {
  let total = history.len();
  let start = total.saturating_sub(SHOWN_HISTORY);

  if total == 0 {
    println!("  {}", "History is empty".bright_black().italic());
    return;
  }
  if start > 0 {
    println!("  {}", format!("... {} older entries", start).bright_black());
  }

  for (i, entry) in history.iter().enumerate().skip(start) {
    println!(
      "  {} {}",
      format!("{:>4}", i + 1).bright_black(),
      entry.bright_white()
    );
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_commands() {
    assert_eq!(Command::parse(":quit"), Some(Command::Quit));
    assert_eq!(Command::parse("  :exit  "), Some(Command::Quit));
    assert_eq!(Command::parse(":env"), Some(Command::Env));
    assert_eq!(Command::parse(":l lib.tl"), Some(Command::Load(Some("lib.tl"))));
    assert_eq!(Command::parse(":load"), Some(Command::Load(None)));
    assert_eq!(Command::parse(":nope"), Some(Command::Unknown(":nope")));
  }

  #[test]
  fn test_expressions_are_not_commands() {
    assert_eq!(Command::parse("+ 1 2"), None);
    assert_eq!(Command::parse("(def {x} 1)"), None);
    assert_eq!(Command::parse(""), None);
  }

  #[test]
  fn test_history_config_defaults() {
    let config = HistoryConfig::from_lookup(|_| None, Some(PathBuf::from("/home/user")));
    assert_eq!(
      config,
      HistoryConfig {
        file: PathBuf::from("/home/user/.tlisp_history"),
        size: DEFAULT_HISTORY_SIZE,
      }
    );

    let homeless = HistoryConfig::from_lookup(|_| None, None);
    assert_eq!(homeless.file, PathBuf::from(".tlisp_history"));
  }

  #[test]
  fn test_history_config_overrides() {
    let config = HistoryConfig::from_lookup(
      |key| match key {
        "TLISP_REPL_HISTORY" => Some("/tmp/hist".to_string()),
        "TLISP_REPL_HISTORY_SIZE" => Some("50".to_string()),
        _ => None,
      },
      Some(PathBuf::from("/home/user")),
    );
    assert_eq!(config.file, PathBuf::from("/tmp/hist"));
    assert_eq!(config.size, 50);

    let bad_size = HistoryConfig::from_lookup(
      |key| (key == "TLISP_REPL_HISTORY_SIZE").then(|| "lots".to_string()),
      None,
    );
    assert_eq!(bad_size.size, DEFAULT_HISTORY_SIZE);
  }
}
