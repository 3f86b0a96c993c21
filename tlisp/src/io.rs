use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Sink for echoed results and source of program files.
pub trait IoAdapter {
  fn print(&mut self, text: &str) -> io::Result<()>;

  fn println(&mut self, text: &str) -> io::Result<()> {
    self.print(text)?;
    self.print("\n")
  }

  fn load_source(&self, path: &Path) -> io::Result<String>;
}

/// Writes to any `Write` (stdout by default) and loads sources from disk.
pub struct StdioAdapter<W: Write = io::Stdout> {
  out: W,
}

impl StdioAdapter {
  pub fn new() -> Self {
    Self::with_writer(io::stdout())
  }
}

impl Default for StdioAdapter {
  fn default() -> Self {
    Self::new()
  }
}

impl<W: Write> StdioAdapter<W> {
  pub fn with_writer(out: W) -> Self {
    Self { out }
  }

  pub fn into_inner(self) -> W {
    self.out
  }
}

impl<W: Write> IoAdapter for StdioAdapter<W> {
  fn print(&mut self, text: &str) -> io::Result<()> {
    self.out.write_all(text.as_bytes())?;
    self.out.flush()
  }

  fn load_source(&self, path: &Path) -> io::Result<String> {
    fs::read_to_string(path)
  }
}

/// In-memory adapter for tests and benchmarks: output accumulates in a
/// string and sources come from a fixed set of virtual files.
#[derive(Debug, Default)]
pub struct StringIoAdapter {
  output: String,
  files: BTreeMap<PathBuf, String>,
}

impl StringIoAdapter {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_file(mut self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
    self.files.insert(path.into(), contents.into());
    self
  }

  pub fn output(&self) -> &str {
    &self.output
  }

  pub fn take_output(&mut self) -> String {
    std::mem::take(&mut self.output)
  }
}

impl IoAdapter for StringIoAdapter {
  fn print(&mut self, text: &str) -> io::Result<()> {
    self.output.push_str(text);
    Ok(())
  }

  fn load_source(&self, path: &Path) -> io::Result<String> {
    self.files.get(path).cloned().ok_or_else(|| {
      io::Error::new(
        io::ErrorKind::NotFound,
        format!("no such file: {}", path.display()),
      )
    })
  }
}
