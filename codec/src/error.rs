//! Error types for the rowcsv codec.
//!
//! Two layers:
//!
//! - [`ConfigError`] - raised while building a [`crate::Reader`] or
//!   [`crate::Writer`], before any I/O happens
//! - [`CsvError`] - everything that can go wrong while reading or writing,
//!   wrapping [`ConfigError`] so `?` works across the boundary
//!
//! Every record-level variant carries the 1-based physical line number it
//! was raised on.

use thiserror::Error;

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors detected at construction time.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Delimiter, quote or escape is not exactly one character.
    #[error("{field} must be exactly one character, got {value:?}")]
    InvalidCharacter { field: &'static str, value: String },

    /// Delimiter, quote or escape is not a single-byte character.
    #[error("{field} must be a single-byte (ASCII) character, got {value:?}")]
    NonAsciiCharacter { field: &'static str, value: String },

    /// Two column names are equal after trimming.
    #[error("Column names are not unique: '{0}' appears more than once")]
    DuplicateColumn(String),

    /// A callback selector could not be parsed or compiled.
    #[error("Invalid column selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    /// An operation could not be turned into a transform.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Keyed iteration requested without a key column.
    #[error("No key column configured")]
    NoKeyColumn,

    /// Configuration document could not be read.
    #[error("Cannot read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration document could not be parsed.
    #[error("Configuration JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Codec Errors (top-level)
// =============================================================================

/// Errors raised while reading or writing records.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The input could not be opened.
    #[error("Failed to open {name}: {source}")]
    SourceUnavailable {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// The output could not be created.
    #[error("Failed to create {name}: {source}")]
    SinkUnavailable {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// The tokenizer rejected a record.
    #[error("Line {line}: cannot read record: {source}")]
    Tokenize {
        line: usize,
        #[source]
        source: csv::Error,
    },

    /// Record field count differs from the column count.
    #[error("Column mismatch on line {line}: expected {expected} fields, found {found}")]
    ColumnMismatch {
        line: usize,
        expected: usize,
        found: usize,
    },

    /// A referenced column does not exist in the row.
    #[error("Line {line}: no such column: {column}")]
    MissingColumn { column: String, line: usize },

    /// A key value was produced twice with duplicate detection enabled.
    #[error("Line {line}: duplicate key detected: {key}")]
    DuplicateKey { key: String, line: usize },

    /// A written row has a column outside the established column order.
    #[error("Line {line}: unknown column: {column}")]
    UnknownColumn { column: String, line: usize },

    /// The sink rejected a record or wrote it short.
    #[error("Line {line}: failed writing record: {source}")]
    WriteFailure {
        line: usize,
        #[source]
        source: std::io::Error,
    },
}

impl CsvError {
    /// Line number the error was raised on, when it is tied to a record.
    pub fn line(&self) -> Option<usize> {
        match self {
            CsvError::Tokenize { line, .. }
            | CsvError::ColumnMismatch { line, .. }
            | CsvError::MissingColumn { line, .. }
            | CsvError::DuplicateKey { line, .. }
            | CsvError::UnknownColumn { line, .. }
            | CsvError::WriteFailure { line, .. } => Some(*line),
            _ => None,
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for construction.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for reading and writing.
pub type CsvResult<T> = Result<T, CsvError>;
