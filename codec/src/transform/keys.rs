//! Keys for keyed iteration.
//!
//! [`KeyDeriver`] reads the key column of each row and, when asked to,
//! remembers every key of the current pass so a repeat is reported at the
//! record that repeats it.

use std::collections::HashSet;

use crate::error::{CsvError, CsvResult};
use crate::models::{ColumnRef, Row};

/// Per-pass key derivation state.
#[derive(Debug, Clone)]
pub struct KeyDeriver {
    column: ColumnRef,
    seen: Option<HashSet<String>>,
}

impl KeyDeriver {
    pub fn new(column: ColumnRef, detect_duplicates: bool) -> Self {
        Self {
            column,
            seen: detect_duplicates.then(HashSet::new),
        }
    }

    /// Key of one row.
    pub fn derive(&mut self, row: &Row, line: usize) -> CsvResult<String> {
        let key = row.text(&self.column).ok_or_else(|| CsvError::MissingColumn {
            column: self.column.to_string(),
            line,
        })?;

        if let Some(seen) = self.seen.as_mut() {
            if seen.contains(&key) {
                return Err(CsvError::DuplicateKey { key, line });
            }
            seen.insert(key.clone());
        }

        Ok(key)
    }
}
