//! Row models shared by the reader and the writer.
//!
//! - [`Row`] - one record, either positional or named
//! - [`ColumnRef`] - a reference to a column by ordinal or by name
//! - [`RowMap`] - ordered key → row dictionary built by keyed materialization
//!
//! Cells are [`serde_json::Value`]s. Everything read from a file is a
//! `Value::String`; callers writing rows may hand in numbers, booleans or
//! null, which are rendered back to text by [`field_text`].

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

// =============================================================================
// Column references
// =============================================================================

/// A column addressed by ordinal position or by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnRef {
    /// Zero-based ordinal position.
    Index(usize),
    /// Exact column name.
    Name(String),
}

impl ColumnRef {
    /// Ordinal this reference denotes on a positional row.
    ///
    /// A name made only of digits counts as an ordinal, so `"3"` and `3`
    /// address the same cell of a headerless row.
    fn ordinal(&self) -> Option<usize> {
        match self {
            ColumnRef::Index(i) => Some(*i),
            ColumnRef::Name(name) => name.parse().ok(),
        }
    }
}

impl From<usize> for ColumnRef {
    fn from(index: usize) -> Self {
        ColumnRef::Index(index)
    }
}

impl From<&str> for ColumnRef {
    fn from(name: &str) -> Self {
        ColumnRef::Name(name.to_string())
    }
}

impl From<String> for ColumnRef {
    fn from(name: String) -> Self {
        ColumnRef::Name(name)
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRef::Index(i) => write!(f, "{}", i),
            ColumnRef::Name(name) => write!(f, "{}", name),
        }
    }
}

// =============================================================================
// Rows
// =============================================================================

/// One record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Row {
    /// Values addressed by ordinal only (headerless input).
    Positional(Vec<Value>),
    /// Values addressed by column name, in column order.
    Named(Map<String, Value>),
}

impl Row {
    /// Number of cells.
    pub fn len(&self) -> usize {
        match self {
            Row::Positional(values) => values.len(),
            Row::Named(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up one cell.
    pub fn get(&self, column: &ColumnRef) -> Option<&Value> {
        match (self, column) {
            (Row::Named(map), ColumnRef::Name(name)) => map.get(name),
            (Row::Named(map), ColumnRef::Index(i)) => map.values().nth(*i),
            (Row::Positional(values), _) => column.ordinal().and_then(|i| values.get(i)),
        }
    }

    /// Look up one cell for modification.
    pub fn get_mut(&mut self, column: &ColumnRef) -> Option<&mut Value> {
        match self {
            Row::Named(map) => match column {
                ColumnRef::Name(name) => map.get_mut(name),
                ColumnRef::Index(i) => map.values_mut().nth(*i),
            },
            Row::Positional(values) => column.ordinal().and_then(move |i| values.get_mut(i)),
        }
    }

    /// Text of one cell, see [`field_text`].
    pub fn text(&self, column: &ColumnRef) -> Option<String> {
        self.get(column).map(|v| field_text(v).into_owned())
    }

    /// Keys of this row: column names, or ordinal strings for positional rows.
    pub fn keys(&self) -> Vec<Cow<'_, str>> {
        match self {
            Row::Named(map) => map.keys().map(|k| Cow::Borrowed(k.as_str())).collect(),
            Row::Positional(values) => (0..values.len()).map(|i| Cow::Owned(i.to_string())).collect(),
        }
    }

    /// Visit every cell mutably together with its key.
    pub fn for_each_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&str, &mut Value),
    {
        match self {
            Row::Named(map) => {
                for (key, value) in map.iter_mut() {
                    f(key, value);
                }
            }
            Row::Positional(values) => {
                for (i, value) in values.iter_mut().enumerate() {
                    f(&i.to_string(), value);
                }
            }
        }
    }

    /// Build a row from a JSON object or array; other values are rejected.
    pub fn from_value(value: Value) -> Option<Row> {
        match value {
            Value::Object(map) => Some(Row::Named(map)),
            Value::Array(values) => Some(Row::Positional(values)),
            _ => None,
        }
    }

    /// Convert into a JSON object or array.
    pub fn into_value(self) -> Value {
        match self {
            Row::Named(map) => Value::Object(map),
            Row::Positional(values) => Value::Array(values),
        }
    }
}

impl From<Map<String, Value>> for Row {
    fn from(map: Map<String, Value>) -> Self {
        Row::Named(map)
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Row::Positional(values)
    }
}

impl From<Vec<String>> for Row {
    fn from(values: Vec<String>) -> Self {
        Row::Positional(values.into_iter().map(Value::String).collect())
    }
}

impl From<Vec<&str>> for Row {
    fn from(values: Vec<&str>) -> Self {
        Row::Positional(values.into_iter().map(|v| Value::String(v.to_string())).collect())
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Row::Named(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Render a cell as CSV field text.
///
/// Strings pass through, null is the empty string, numbers and booleans use
/// their display form, arrays and objects are compact JSON.
pub fn field_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        Value::Null => Cow::Borrowed(""),
        Value::Bool(b) => Cow::Owned(b.to_string()),
        Value::Number(n) => Cow::Owned(n.to_string()),
        other => Cow::Owned(other.to_string()),
    }
}

// =============================================================================
// Keyed rows
// =============================================================================

/// Ordered dictionary of key → row.
///
/// The first insertion of a key fixes its position; inserting the key again
/// replaces the row in place (last write wins).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowMap {
    entries: Vec<(String, Row)>,
    index: HashMap<String, usize>,
}

impl RowMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row, returning the row it replaced.
    pub fn insert(&mut self, key: String, row: Row) -> Option<Row> {
        match self.index.get(&key) {
            Some(&pos) => Some(std::mem::replace(&mut self.entries[pos].1, row)),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, row));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Row> {
        self.index.get(key).map(|&pos| &self.entries[pos].1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Row)> {
        self.entries.iter().map(|(k, r)| (k.as_str(), r))
    }
}

impl IntoIterator for RowMap {
    type Item = (String, Row);
    type IntoIter = std::vec::IntoIter<(String, Row)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for RowMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, row) in &self.entries {
            map.serialize_entry(key, row)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn named() -> Row {
        Row::from_value(json!({"Id": "1", "Name": "foo"})).unwrap()
    }

    #[test]
    fn test_named_lookup_by_name_and_index() {
        let row = named();
        assert_eq!(row.get(&"Name".into()), Some(&json!("foo")));
        assert_eq!(row.get(&0.into()), Some(&json!("1")));
        assert_eq!(row.get(&"Missing".into()), None);
    }

    #[test]
    fn test_positional_lookup_accepts_digit_names() {
        let row = Row::from(vec!["a", "b", "c"]);
        assert_eq!(row.get(&"2".into()), Some(&json!("c")));
        assert_eq!(row.get(&1.into()), Some(&json!("b")));
        assert_eq!(row.get(&5.into()), None);
        assert_eq!(row.keys(), vec!["0", "1", "2"]);
    }

    #[test]
    fn test_field_text() {
        assert_eq!(field_text(&json!("x")), "x");
        assert_eq!(field_text(&json!(null)), "");
        assert_eq!(field_text(&json!(42)), "42");
        assert_eq!(field_text(&json!(true)), "true");
        assert_eq!(field_text(&json!([1, 2])), "[1,2]");
    }

    #[test]
    fn test_named_row_keeps_insertion_order() {
        let row: Row = vec![("b", json!(1)), ("a", json!(2))].into_iter().collect();
        assert_eq!(row.keys(), vec!["b", "a"]);
    }

    #[test]
    fn test_row_map_last_write_wins_in_first_position() {
        let mut map = RowMap::new();
        map.insert("foo".into(), Row::from(vec!["1"]));
        map.insert("bar".into(), Row::from(vec!["2"]));
        let replaced = map.insert("foo".into(), Row::from(vec!["3"]));

        assert_eq!(replaced, Some(Row::from(vec!["1"])));
        assert_eq!(map.len(), 2);
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["foo", "bar"]);
        assert_eq!(map.get("foo"), Some(&Row::from(vec!["3"])));
    }

    #[test]
    fn test_row_map_serializes_as_object() {
        let mut map = RowMap::new();
        map.insert("1".into(), named());
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json, json!({"1": {"Id": "1", "Name": "foo"}}));
    }
}
