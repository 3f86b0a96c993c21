use rustyline::completion::{Completer, FilenameCompleter, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use tlisp::builtins::BUILTINS;

pub const COMMANDS: &[&str] = &[":help", ":quit", ":exit", ":history", ":env", ":load", ":l"];

pub struct ReplHelper {
  file_completer: FilenameCompleter,
}

impl ReplHelper {
  pub fn new() -> Self {
    Self {
      file_completer: FilenameCompleter::new(),
    }
  }
}

impl Helper for ReplHelper {}

fn is_delimiter(c: char) -> bool {
  c.is_ascii_whitespace() || "(){}".contains(c)
}

fn pairs<'a>(prefix: &str, names: impl Iterator<Item = &'a str>) -> Vec<Pair> {
  names
    .filter(|name| name.starts_with(prefix))
    .map(|name| Pair {
      display: name.to_string(),
      replacement: name.to_string(),
    })
    .collect()
}

impl Completer for ReplHelper {
  type Candidate = Pair;

  fn complete(
    &self,
    line: &str,
    pos: usize,
    ctx: &Context<'_>,
  ) -> Result<(usize, Vec<Pair>), ReadlineError> {
    if line.starts_with(":l ") || line.starts_with(":load ") {
      let cmd_end = line.find(' ').map_or(0, |i| i + 1);
      // Cursor still inside the command word.
      let Some(path_part) = line.get(cmd_end..pos) else {
        return Ok((pos, vec![]));
      };

      let (start, candidates) = self
        .file_completer
        .complete(path_part, path_part.len(), ctx)?;

      return Ok((cmd_end + start, candidates));
    }

    if line.starts_with(':') {
      return Ok((0, pairs(&line[..pos], COMMANDS.iter().copied())));
    }

    let start = line[..pos].rfind(is_delimiter).map_or(0, |i| i + 1);
    let prefix = &line[start..pos];
    if prefix.is_empty() {
      return Ok((pos, vec![]));
    }

    Ok((start, pairs(prefix, BUILTINS.iter().map(|&(name, _)| name))))
  }
}

impl Hinter for ReplHelper {
  type Hint = String;

  fn hint(&self, _line: &str, _pos: usize, _ctx: &Context<'_>) -> Option<String> {
    None
  }
}

impl Highlighter for ReplHelper {}

impl Validator for ReplHelper {}

#[cfg(test)]
mod tests {
  use super::*;
  use rustyline::history::DefaultHistory;

  fn replacements(prefix: &str, names: &[&str]) -> Vec<String> {
    pairs(prefix, names.iter().copied())
      .into_iter()
      .map(|pair| pair.replacement)
      .collect()
  }

  #[test]
  fn test_pairs_filter_by_prefix() {
    assert_eq!(replacements(":h", COMMANDS), [":help", ":history"]);
    assert_eq!(replacements("he", &["head", "tail", "help"]), ["head", "help"]);
    assert!(replacements("zz", COMMANDS).is_empty());
  }

  #[test]
  fn test_delimiters() {
    assert!(is_delimiter('('));
    assert!(is_delimiter('}'));
    assert!(is_delimiter(' '));
    assert!(!is_delimiter('-'));
  }

  #[test]
  fn test_load_completion_with_cursor_in_command() {
    let helper = ReplHelper::new();
    let history = DefaultHistory::new();
    let ctx = Context::new(&history);

    for pos in [0, 2, 5] {
      let (start, candidates) = helper
        .complete(":load foo.tl", pos, &ctx)
        .expect("completion should not fail");
      assert_eq!(start, pos);
      assert!(candidates.is_empty());
    }
  }

  #[test]
  fn test_builtin_completion() {
    let helper = ReplHelper::new();
    let history = DefaultHistory::new();
    let ctx = Context::new(&history);

    let (start, candidates) = helper
      .complete("(join {1} (he", 13, &ctx)
      .expect("completion should not fail");
    assert_eq!(start, 11);
    let names: Vec<_> = candidates.into_iter().map(|pair| pair.replacement).collect();
    assert_eq!(names, ["head"]);
  }
}
