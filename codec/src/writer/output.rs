//! Where a writer puts its bytes.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

/// Output of a [`crate::Writer`].
pub enum Output<'a> {
    /// A file, created (or appended to) on the first write.
    Path(PathBuf),
    /// Standard output.
    Stdout,
    /// A caller-supplied sink. The writer flushes it but never closes it.
    Handle(Box<dyn Write + 'a>),
}

impl<'a> Output<'a> {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Output::Path(path.into())
    }

    pub fn stdout() -> Self {
        Output::Stdout
    }

    pub fn handle<W: Write + 'a>(handle: W) -> Self {
        Output::Handle(Box::new(handle))
    }

    /// Display name used in messages.
    pub fn name(&self) -> String {
        match self {
            Output::Path(path) => path.display().to_string(),
            Output::Stdout => "<stdout>".to_string(),
            Output::Handle(_) => "<handle>".to_string(),
        }
    }

    /// Open the sink. The flag is true when appending to a file that
    /// already has content.
    pub(crate) fn open(self, append: bool) -> io::Result<(Box<dyn Write + 'a>, bool)> {
        match self {
            Output::Path(path) if append => {
                let file = OpenOptions::new().append(true).create(true).open(&path)?;
                let has_content = file.metadata()?.len() > 0;
                Ok((Box::new(file), has_content))
            }
            Output::Path(path) => Ok((Box::new(File::create(&path)?), false)),
            Output::Stdout => Ok((Box::new(io::stdout()), false)),
            Output::Handle(handle) => Ok((handle, false)),
        }
    }
}

impl<'a> From<PathBuf> for Output<'a> {
    fn from(path: PathBuf) -> Self {
        Output::Path(path)
    }
}

impl<'a> From<&str> for Output<'a> {
    fn from(path: &str) -> Self {
        Output::Path(PathBuf::from(path))
    }
}

impl<'a> std::fmt::Debug for Output<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Output({})", self.name())
    }
}

/// Sink wrapper counting bytes accepted by the underlying writer.
pub(crate) struct CountingSink<W> {
    inner: W,
    written: usize,
}

impl<W: Write> CountingSink<W> {
    pub(crate) fn new(inner: W) -> Self {
        Self { inner, written: 0 }
    }

    pub(crate) fn written(&self) -> usize {
        self.written
    }
}

impl<W: Write> Write for CountingSink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_reports_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let (_, has_content) = Output::path(&path).open(true).unwrap();
        assert!(!has_content);

        std::fs::write(&path, "a,b\n").unwrap();
        let (_, has_content) = Output::path(&path).open(true).unwrap();
        assert!(has_content);

        let (_, has_content) = Output::path(&path).open(false).unwrap();
        assert!(!has_content);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
    }

    #[test]
    fn test_counting_sink() {
        let mut buf = Vec::new();
        let mut sink = CountingSink::new(&mut buf);
        sink.write_all(b"hello").unwrap();
        sink.write_all(b", world").unwrap();
        assert_eq!(sink.written(), 12);
    }
}
