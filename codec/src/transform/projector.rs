//! Projection between raw records and rows.
//!
//! Read direction: zip a record's fields with the column names
//! ([`map_record`]). Write direction: lay a row out in column order,
//! padding what is missing ([`order_row`]).

use serde_json::{Map, Value};

use crate::columns::ColumnNames;
use crate::error::{CsvError, CsvResult};
use crate::models::{field_text, Row};

/// Turn a tokenized record into a row.
///
/// Without column names the record stays positional. With names the field
/// count must equal the column count; dropped columns are left out.
pub fn map_record<I, S>(fields: I, columns: Option<&ColumnNames>, line: usize) -> CsvResult<Row>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let columns = match columns {
        Some(columns) => columns,
        None => {
            return Ok(Row::Positional(
                fields.into_iter().map(|f| Value::String(f.into())).collect(),
            ))
        }
    };

    let mut map = Map::with_capacity(columns.len());
    let mut names = columns.iter();
    let mut found = 0;
    for field in fields {
        found += 1;
        if let Some(Some(name)) = names.next() {
            map.insert(name.to_string(), Value::String(field.into()));
        }
    }

    if found != columns.len() {
        return Err(CsvError::ColumnMismatch {
            line,
            expected: columns.len(),
            found,
        });
    }
    Ok(Row::Named(map))
}

/// Reject any cell outside the column order.
///
/// Named rows are checked by key; positional rows by length.
pub fn check_unknown(row: &Row, columns: &ColumnNames, line: usize) -> CsvResult<()> {
    match row {
        Row::Named(map) => match map.keys().find(|k| !columns.contains(k)) {
            Some(column) => Err(CsvError::UnknownColumn {
                column: column.clone(),
                line,
            }),
            None => Ok(()),
        },
        Row::Positional(values) if values.len() > columns.len() => Err(CsvError::UnknownColumn {
            column: columns.len().to_string(),
            line,
        }),
        Row::Positional(_) => Ok(()),
    }
}

/// Lay a row out in column order.
///
/// Every output record has exactly `columns.len()` fields: missing cells
/// and dropped columns become empty strings, cells outside the order are
/// left behind.
pub fn order_row(row: &Row, columns: &ColumnNames) -> Vec<String> {
    match row {
        Row::Named(map) => columns
            .iter()
            .map(|name| {
                name.and_then(|n| map.get(n))
                    .map(|v| field_text(v).into_owned())
                    .unwrap_or_default()
            })
            .collect(),
        Row::Positional(values) => (0..columns.len())
            .map(|i| {
                values
                    .get(i)
                    .map(|v| field_text(v).into_owned())
                    .unwrap_or_default()
            })
            .collect(),
    }
}

/// Row values in their own order, for output without a column order.
pub fn unordered_row(row: &Row) -> Vec<String> {
    match row {
        Row::Named(map) => map.values().map(|v| field_text(v).into_owned()).collect(),
        Row::Positional(values) => values.iter().map(|v| field_text(v).into_owned()).collect(),
    }
}
