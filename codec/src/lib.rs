//! # Rowcsv - row-oriented CSV reading and writing
//!
//! Rowcsv turns CSV files into rows (named by a header or positional) and
//! rows back into CSV, with per-column transforms applied on the way.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  CSV bytes  │────▶│  Tokenizer  │────▶│  Projector  │────▶│  Callbacks  │──▶ rows
//! │ (file/pipe) │◀────│    (csv)    │◀────│ (names/ord) │◀────│ (transform) │◀── rows
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rowcsv::{CallbackPipeline, Reader, ReaderOptions};
//!
//! let callbacks = CallbackPipeline::from_json(r#"{"/./": {"type": "trim"}}"#)?;
//! let mut reader = Reader::new("people.csv", ReaderOptions::default())?.with_callbacks(callbacks);
//! for row in reader.iter()? {
//!     println!("{:?}", row?);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Configuration and codec errors
//! - [`models`] - Rows, column references, keyed row maps
//! - [`dialect`] - Delimiter, quote and escape characters
//! - [`columns`] - Column name sets
//! - [`transform`] - Operations, callbacks, projection and keys
//! - [`reader`] - Streaming reader
//! - [`writer`] - Writer
//! - [`config`] - Options and configuration files
//! - [`logs`] - Event log

// Core modules
pub mod error;
pub mod models;

// Format
pub mod columns;
pub mod dialect;

// Transformation
pub mod transform;

// Codec
pub mod reader;
pub mod writer;

// Configuration
pub mod config;

// Logging
pub mod logs;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{ConfigError, ConfigResult, CsvError, CsvResult};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use columns::{ColumnNames, ColumnState};
pub use dialect::Dialect;
pub use models::{field_text, ColumnRef, Row, RowMap};

// =============================================================================
// Re-exports - Transforms
// =============================================================================

pub use transform::{
    operations_description,
    CallbackBinding,
    CallbackPipeline,
    KeyDeriver,
    Operation,
    Selector,
    Transform,
};

// =============================================================================
// Re-exports - Reader / Writer
// =============================================================================

pub use reader::{ColumnValues, Input, KeyedRows, Reader, Rows};
pub use writer::{Output, Writer};

// =============================================================================
// Re-exports - Configuration
// =============================================================================

pub use config::{CodecConfig, ReaderOptions, WriterOptions};
