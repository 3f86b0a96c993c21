use tlisp::Evaluator;

use super::eval::{EvalError, process_input};

/// Outcome of feeding one line to the REPL.
#[derive(Debug, PartialEq)]
pub enum LineResult {
  /// Input evaluated; carries the rendered value.
  Complete(String),
  /// Brackets are still open.
  NeedMore,
  Error(String),
}

/// Accumulates lines until they form a complete entry, then evaluates the
/// entry against the session's evaluator.
pub struct InputBuffer {
  pending: String,
  entries: usize,
  evaluator: Evaluator,
}

impl InputBuffer {
  pub fn new(evaluator: Evaluator) -> Self {
    Self {
      pending: String::new(),
      entries: 0,
      evaluator,
    }
  }

  pub fn evaluator(&self) -> &Evaluator {
    &self.evaluator
  }

  /// Number of the next entry, counted from one.
  pub fn entry_number(&self) -> usize {
    self.entries + 1
  }

  pub fn is_continuation(&self) -> bool {
    !self.pending.is_empty()
  }

  pub fn discard(&mut self) {
    self.pending.clear();
  }

  /// Add `line` to the pending entry. When the entry is finished it is
  /// returned alongside the result so the caller can record it.
  pub fn push(&mut self, line: &str) -> (LineResult, Option<String>) {
    if self.is_continuation() {
      self.pending.push('\n');
    }
    self.pending.push_str(line);

    let result = match process_input(&self.evaluator, &self.pending) {
      Err(EvalError::Incomplete) => return (LineResult::NeedMore, None),
      Ok(rendered) => {
        self.entries += 1;
        LineResult::Complete(rendered)
      }
      Err(EvalError::Error(msg)) => LineResult::Error(msg),
    };

    (result, Some(std::mem::take(&mut self.pending)))
  }
}
