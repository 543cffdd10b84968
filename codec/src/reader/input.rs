//! Where a reader takes its bytes from.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::PathBuf;

use crate::error::{CsvError, CsvResult};

/// Anything readable that can be rewound.
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

/// Input of a [`crate::Reader`].
pub enum Input<'a> {
    /// A file, opened at the start of every pass and closed at its end.
    Path(PathBuf),
    /// Standard input. Only the first pass sees data.
    Stdin,
    /// A caller-supplied handle, rewound to where it stood when first read.
    /// Pass `&mut handle` to keep ownership; the reader never closes it.
    Handle {
        handle: Box<dyn ReadSeek + 'a>,
        start: Option<u64>,
    },
}

impl<'a> Input<'a> {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Input::Path(path.into())
    }

    pub fn stdin() -> Self {
        Input::Stdin
    }

    pub fn handle<R: Read + Seek + 'a>(handle: R) -> Self {
        Input::Handle {
            handle: Box::new(handle),
            start: None,
        }
    }

    /// Display name used in messages.
    pub fn name(&self) -> String {
        match self {
            Input::Path(path) => path.display().to_string(),
            Input::Stdin => "<stdin>".to_string(),
            Input::Handle { .. } => "<handle>".to_string(),
        }
    }

    /// Open (or rewind) for a new pass.
    pub(crate) fn open(&mut self) -> CsvResult<Box<dyn Read + '_>> {
        let name = self.name();
        let unavailable = |source: io::Error| CsvError::SourceUnavailable {
            name: name.clone(),
            source,
        };

        match self {
            Input::Path(path) => {
                let file = File::open(&*path).map_err(unavailable)?;
                Ok(Box::new(file))
            }
            Input::Stdin => Ok(Box::new(io::stdin().lock())),
            Input::Handle { handle, start } => {
                match start {
                    Some(pos) => {
                        handle.seek(SeekFrom::Start(*pos)).map_err(unavailable)?;
                    }
                    None => {
                        *start = Some(handle.stream_position().map_err(unavailable)?);
                    }
                }
                Ok(Box::new(&mut **handle))
            }
        }
    }
}

impl<'a> From<PathBuf> for Input<'a> {
    fn from(path: PathBuf) -> Self {
        Input::Path(path)
    }
}

impl<'a> From<&str> for Input<'a> {
    fn from(path: &str) -> Self {
        Input::Path(PathBuf::from(path))
    }
}

impl<'a> std::fmt::Debug for Input<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Input({})", self.name())
    }
}
