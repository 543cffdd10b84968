//! Column name sets.
//!
//! A [`ColumnNames`] binds each ordinal position to an optional, trimmed
//! name. A `None` (or blank) name means "drop this column": it is skipped
//! when projecting a record into a named row and written back as an empty
//! field. Non-blank names are unique.

use std::collections::HashSet;

use crate::error::{ConfigError, ConfigResult};

/// Ordered position ↔ name mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnNames {
    names: Vec<Option<String>>,
}

impl ColumnNames {
    /// Build from the fields of a header record.
    ///
    /// Fields are trimmed; a field that trims to nothing drops its column.
    pub fn from_header_record<I, S>(fields: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::build(fields.into_iter().map(|f| Some(f.as_ref().to_string())))
    }

    /// Build from caller-supplied names; `None` drops the column.
    pub fn from_explicit_names<I, S>(names: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        Self::build(names.into_iter().map(|n| n.map(|s| s.as_ref().to_string())))
    }

    /// Build from the keys of a row, as they are.
    ///
    /// Nothing is trimmed, so every name still finds its cell in the row it
    /// came from.
    pub fn from_row_keys<I, S>(keys: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::check_unique(keys.into_iter().map(|k| Some(k.as_ref().to_string())).collect())
    }

    fn build(names: impl Iterator<Item = Option<String>>) -> ConfigResult<Self> {
        Self::check_unique(
            names
                .map(|name| {
                    name.map(|n| n.trim().to_string())
                        .filter(|n| !n.is_empty())
                })
                .collect(),
        )
    }

    fn check_unique(names: Vec<Option<String>>) -> ConfigResult<Self> {
        let mut seen = HashSet::new();
        for name in names.iter().flatten() {
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::DuplicateColumn(name.clone()));
            }
        }

        Ok(Self { names })
    }

    /// Number of positions, dropped ones included.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Name at a position, `None` for a dropped column.
    pub fn get(&self, position: usize) -> Option<&str> {
        self.names.get(position).and_then(|n| n.as_deref())
    }

    /// Position of a name.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n.as_deref() == Some(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Every position in order.
    pub fn iter(&self) -> impl Iterator<Item = Option<&str>> {
        self.names.iter().map(|n| n.as_deref())
    }

    /// Non-dropped names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().filter_map(|n| n.as_deref())
    }

    /// Header record text: dropped columns become empty fields.
    pub fn to_record(&self) -> Vec<&str> {
        self.iter().map(|n| n.unwrap_or("")).collect()
    }
}

/// How a reader or writer came by its column names.
///
/// Explicit names never change. Names taken from the data (a header record
/// or the first written row) are derived once per pass and then frozen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ColumnState {
    #[default]
    Unresolved,
    Explicit(ColumnNames),
    DerivedFromData(ColumnNames),
}

impl ColumnState {
    pub fn from_option(names: Option<ColumnNames>) -> Self {
        names.map(ColumnState::Explicit).unwrap_or_default()
    }

    pub fn names(&self) -> Option<&ColumnNames> {
        match self {
            ColumnState::Unresolved => None,
            ColumnState::Explicit(names) | ColumnState::DerivedFromData(names) => Some(names),
        }
    }

    pub fn is_explicit(&self) -> bool {
        matches!(self, ColumnState::Explicit(_))
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, ColumnState::Unresolved)
    }
}
