//! Streaming CSV reader.
//!
//! A [`Reader`] holds configuration only. Every call to [`Reader::iter`]
//! starts a fresh pass: the input is (re)opened, the line counter goes back
//! to zero and the header record, if any, is read again. The pass itself is
//! the [`Rows`] cursor, which pulls one record at a time from the tokenizer.
//!
//! ```text
//! record ──▶ header? ──▶ project ──▶ callbacks ──▶ (key) ──▶ row
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use rowcsv::{Reader, ReaderOptions, Input};
//!
//! let mut reader = Reader::new(Input::path("people.csv"), ReaderOptions::default())?;
//! let mut rows = reader.iter()?;
//! while let Some(row) = rows.next() {
//!     println!("line {}: {:?}", rows.line_number(), row?);
//! }
//! ```

pub mod input;

pub use input::{Input, ReadSeek};

use serde_json::Value;
use std::io::Read;

use crate::columns::{ColumnNames, ColumnState};
use crate::config::ReaderOptions;
use crate::dialect::ByteDialect;
use crate::error::{ConfigError, ConfigResult, CsvError, CsvResult};
use crate::logs::{log_error, log_info, log_success};
use crate::models::{ColumnRef, Row, RowMap};
use crate::transform::projector::map_record;
use crate::transform::{CallbackPipeline, KeyDeriver};

/// CSV reader.
///
/// Passes over the same reader must not overlap; each pass borrows the
/// reader mutably. Build separate readers to read concurrently.
#[derive(Debug)]
pub struct Reader<'h> {
    input: Input<'h>,
    dialect: ByteDialect,
    has_header: bool,
    columns: ColumnState,
    callbacks: CallbackPipeline,
    key_by_column: Option<ColumnRef>,
    detect_duplicate_keys: bool,
    line: usize,
}

impl<'h> Reader<'h> {
    /// Validate options and build a reader. No I/O happens here.
    pub fn new(input: impl Into<Input<'h>>, options: ReaderOptions) -> ConfigResult<Self> {
        let dialect = options.dialect.validate()?;
        let explicit = options
            .column_names
            .map(ColumnNames::from_explicit_names)
            .transpose()?;

        Ok(Self {
            input: input.into(),
            dialect,
            has_header: options.has_header,
            columns: ColumnState::from_option(explicit),
            callbacks: CallbackPipeline::new(),
            key_by_column: options.key_by_column,
            detect_duplicate_keys: options.detect_duplicate_keys,
            line: 0,
        })
    }

    /// Reader with default options.
    pub fn from_input(input: impl Into<Input<'h>>) -> ConfigResult<Self> {
        Self::new(input, ReaderOptions::default())
    }

    pub fn with_callbacks(mut self, callbacks: CallbackPipeline) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn has_header(&self) -> bool {
        self.has_header
    }

    /// Physical records read by the current or last pass.
    pub fn line_number(&self) -> usize {
        self.line
    }

    /// Start a pass.
    pub fn iter(&mut self) -> CsvResult<Rows<'_>> {
        let Reader {
            input,
            dialect,
            has_header,
            columns,
            callbacks,
            line,
            ..
        } = self;

        *line = 0;
        let name = input.name();
        let source = input.open().map_err(|e| {
            log_error(&e);
            e
        })?;
        log_info(format!("Reading {}", name));

        Ok(Rows {
            records: Some(dialect.reader_builder().from_reader(source)),
            record: csv::StringRecord::new(),
            columns: match &*columns {
                ColumnState::Explicit(names) => Some(names.clone()),
                _ => None,
            },
            header_pending: *has_header,
            cache: columns,
            callbacks,
            line,
            name,
        })
    }

    /// Start a keyed pass yielding `(key, row)` pairs.
    pub fn keyed(&mut self) -> CsvResult<KeyedRows<'_>> {
        let column = self.key_by_column.clone().ok_or(ConfigError::NoKeyColumn)?;
        let keys = KeyDeriver::new(column, self.detect_duplicate_keys);
        Ok(KeyedRows {
            rows: self.iter()?,
            keys,
        })
    }

    /// Start a pass yielding one column's value per data row.
    pub fn column(&mut self, column: impl Into<ColumnRef>) -> CsvResult<ColumnValues<'_>> {
        Ok(ColumnValues {
            column: column.into(),
            rows: self.iter()?,
        })
    }

    /// Column names of this reader.
    ///
    /// Reads the header record if no pass has done so yet. `None` when
    /// there are no names: headerless without explicit names, or empty input.
    pub fn column_names(&mut self) -> CsvResult<Option<&ColumnNames>> {
        if self.has_header && !self.columns.is_resolved() {
            self.iter()?.resolve_header()?;
        }
        Ok(self.columns.names())
    }

    /// Read a whole pass into memory, in record order.
    pub fn to_vec(&mut self) -> CsvResult<Vec<Row>> {
        self.iter()?.collect()
    }

    /// Read a whole keyed pass into memory. Later rows replace earlier rows
    /// with the same key.
    pub fn to_map(&mut self) -> CsvResult<RowMap> {
        let mut map = RowMap::new();
        for entry in self.keyed()? {
            let (key, row) = entry?;
            map.insert(key, row);
        }
        Ok(map)
    }
}

// =============================================================================
// Passes
// =============================================================================

/// One pass over the input.
pub struct Rows<'a> {
    /// `None` once the pass is over; dropping it closes an owned file.
    records: Option<csv::Reader<Box<dyn Read + 'a>>>,
    record: csv::StringRecord,
    columns: Option<ColumnNames>,
    header_pending: bool,
    cache: &'a mut ColumnState,
    callbacks: &'a CallbackPipeline,
    line: &'a mut usize,
    name: String,
}

impl<'a> Rows<'a> {
    /// Physical records read so far in this pass.
    pub fn line_number(&self) -> usize {
        *self.line
    }

    /// Column names in effect for this pass.
    pub fn column_names(&self) -> Option<&ColumnNames> {
        self.columns.as_ref()
    }

    fn finish(&mut self) {
        if self.records.take().is_some() {
            log_success(format!("Read {} records from {}", *self.line, self.name));
        }
    }

    fn fail(&mut self, error: CsvError) -> CsvError {
        self.records = None;
        log_error(&error);
        error
    }

    /// Read the next physical record; `false` at end of input.
    fn read_physical(&mut self) -> CsvResult<bool> {
        let records = match self.records.as_mut() {
            Some(records) => records,
            None => return Ok(false),
        };
        match records.read_record(&mut self.record) {
            Ok(true) => {
                *self.line += 1;
                Ok(true)
            }
            Ok(false) => {
                self.finish();
                Ok(false)
            }
            Err(source) => Err(CsvError::Tokenize {
                line: *self.line + 1,
                source,
            }),
        }
    }

    /// Consume the header record just read. Its names are used unless the
    /// caller supplied names.
    fn take_header(&mut self) -> CsvResult<()> {
        self.header_pending = false;
        if self.cache.is_explicit() {
            return Ok(());
        }
        let names = ColumnNames::from_header_record(self.record.iter())?;
        log_info(format!(
            "Columns: {}",
            names.names().collect::<Vec<_>>().join(", ")
        ));
        *self.cache = ColumnState::DerivedFromData(names.clone());
        self.columns = Some(names);
        Ok(())
    }

    fn resolve_header(&mut self) -> CsvResult<()> {
        if self.header_pending && self.read_physical()? {
            self.take_header()?;
        }
        Ok(())
    }

    fn next_row(&mut self) -> CsvResult<Option<Row>> {
        loop {
            if !self.read_physical()? {
                return Ok(None);
            }
            if self.header_pending {
                self.take_header()?;
                continue;
            }
            let mut row = map_record(self.record.iter(), self.columns.as_ref(), *self.line)?;
            if !self.callbacks.is_empty() {
                self.callbacks.apply(&mut row);
            }
            return Ok(Some(row));
        }
    }
}

impl<'a> Iterator for Rows<'a> {
    type Item = CsvResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_row() {
            Ok(row) => row.map(Ok),
            Err(e) => Some(Err(self.fail(e))),
        }
    }
}

/// A pass yielding `(key, row)` pairs.
pub struct KeyedRows<'a> {
    rows: Rows<'a>,
    keys: KeyDeriver,
}

impl<'a> KeyedRows<'a> {
    pub fn line_number(&self) -> usize {
        self.rows.line_number()
    }
}

impl<'a> Iterator for KeyedRows<'a> {
    type Item = CsvResult<(String, Row)>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = match self.rows.next()? {
            Ok(row) => row,
            Err(e) => return Some(Err(e)),
        };
        match self.keys.derive(&row, self.rows.line_number()) {
            Ok(key) => Some(Ok((key, row))),
            Err(e) => Some(Err(self.rows.fail(e))),
        }
    }
}

/// A pass yielding one column's values.
pub struct ColumnValues<'a> {
    rows: Rows<'a>,
    column: ColumnRef,
}

impl<'a> Iterator for ColumnValues<'a> {
    type Item = CsvResult<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut row = match self.rows.next()? {
            Ok(row) => row,
            Err(e) => return Some(Err(e)),
        };
        match row.get_mut(&self.column) {
            Some(value) => Some(Ok(value.take())),
            None => {
                let e = CsvError::MissingColumn {
                    column: self.column.to_string(),
                    line: self.rows.line_number(),
                };
                Some(Err(self.rows.fail(e)))
            }
        }
    }
}
