//! Reader and writer options.
//!
//! Options are plain serde structs with defaults, so they can be built in
//! code or loaded from a JSON configuration file ([`CodecConfig`]).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

use crate::dialect::Dialect;
use crate::error::ConfigResult;
use crate::models::ColumnRef;
use crate::transform::CallbackPipeline;

/// Options for a [`crate::Reader`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderOptions {
    /// True if the first record holds column names.
    pub has_header: bool,

    /// Explicit column names, `None` entries drop their column. When set,
    /// a header record is still consumed but its content is ignored.
    pub column_names: Option<Vec<Option<String>>>,

    /// Column whose value keys each row in keyed iteration.
    pub key_by_column: Option<ColumnRef>,

    /// Fail on the second occurrence of a key.
    pub detect_duplicate_keys: bool,

    pub dialect: Dialect,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            column_names: None,
            key_by_column: None,
            detect_duplicate_keys: false,
            dialect: Dialect::default(),
        }
    }
}

impl ReaderOptions {
    pub fn headerless() -> Self {
        Self {
            has_header: false,
            ..Self::default()
        }
    }
}

/// Options for a [`crate::Writer`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterOptions {
    /// Write a header record with the column names.
    pub has_header: bool,

    /// Column order. Without it the first written row's keys are used
    /// (header mode) or rows are written as they come.
    pub column_names: Option<Vec<Option<String>>>,

    /// Append to an existing file instead of truncating it.
    pub append: bool,

    /// Silently drop cells outside the column order instead of failing.
    pub allow_unknown_columns: bool,

    pub dialect: Dialect,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            has_header: true,
            column_names: None,
            append: false,
            allow_unknown_columns: true,
            dialect: Dialect::default(),
        }
    }
}

impl WriterOptions {
    pub fn headerless() -> Self {
        Self {
            has_header: false,
            ..Self::default()
        }
    }
}

/// Configuration file shared by reads and writes.
///
/// ```json
/// {
///   "dialect": {"delimiter": ";"},
///   "callbacks": {"/./": {"type": "trim"}}
/// }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    pub dialect: Option<Dialect>,
    pub callbacks: Map<String, Value>,
}

impl CodecConfig {
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Compile the callbacks section.
    pub fn callbacks(&self) -> ConfigResult<CallbackPipeline> {
        CallbackPipeline::from_map(self.callbacks.clone())
    }
}
