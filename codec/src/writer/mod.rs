//! CSV writer.
//!
//! The sink is created on the first [`Writer::write`]. In header mode the
//! column order comes from the options or, failing that, from the first
//! row's keys, and every later row is laid out in that order.
//!
//! ```text
//! row ──▶ (strict check) ──▶ callbacks ──▶ order ──▶ record
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use rowcsv::{Writer, WriterOptions, Output, Row};
//! use serde_json::json;
//!
//! let mut writer = Writer::new(Output::path("out.csv"), WriterOptions::default())?;
//! writer.write(Row::from_value(json!({"Id": 1, "Name": "foo"})).unwrap())?;
//! ```

pub mod output;

pub use output::Output;

use std::io::{self, Write};

use crate::columns::{ColumnNames, ColumnState};
use crate::config::WriterOptions;
use crate::dialect::ByteDialect;
use crate::error::{ConfigResult, CsvError, CsvResult};
use crate::logs::{log_error, log_info, log_success, log_warning};
use crate::models::Row;
use crate::transform::projector::{check_unknown, order_row, unordered_row};
use crate::transform::CallbackPipeline;
use output::CountingSink;

type Sink<'a> = csv::Writer<CountingSink<Box<dyn Write + 'a>>>;

/// CSV writer.
pub struct Writer<'a> {
    /// Taken when the sink is opened.
    output: Option<Output<'a>>,
    name: String,
    sink: Option<Sink<'a>>,
    dialect: ByteDialect,
    has_header: bool,
    columns: ColumnState,
    callbacks: CallbackPipeline,
    append: bool,
    allow_unknown_columns: bool,
    line: usize,
}

impl<'a> Writer<'a> {
    /// Validate options and build a writer. No I/O happens here.
    pub fn new(output: impl Into<Output<'a>>, options: WriterOptions) -> ConfigResult<Self> {
        let output = output.into();
        let dialect = options.dialect.validate()?;
        let explicit = options
            .column_names
            .map(ColumnNames::from_explicit_names)
            .transpose()?;

        Ok(Self {
            name: output.name(),
            output: Some(output),
            sink: None,
            dialect,
            has_header: options.has_header,
            columns: ColumnState::from_option(explicit),
            callbacks: CallbackPipeline::new(),
            append: options.append,
            allow_unknown_columns: options.allow_unknown_columns,
            line: 0,
        })
    }

    pub fn with_callbacks(mut self, callbacks: CallbackPipeline) -> Self {
        self.callbacks = callbacks;
        self
    }

    /// Records written so far, header included.
    pub fn line_number(&self) -> usize {
        self.line
    }

    /// Established column order, if any.
    pub fn column_names(&self) -> Option<&ColumnNames> {
        self.columns.names()
    }

    /// Write one row. Returns the bytes written by this call, including the
    /// header when this call emitted it.
    pub fn write(&mut self, row: impl Into<Row>) -> CsvResult<usize> {
        let mut row = row.into();
        let mut written = 0;
        if self.sink.is_none() {
            match self.start(&row) {
                Ok(n) => written += n,
                Err(e) => {
                    // A writer whose header never made it out must not go on
                    // writing bare rows.
                    self.sink = None;
                    return Err(e);
                }
            }
        }

        self.line += 1;
        let line = self.line;
        if let Some(columns) = self.columns.names() {
            match check_unknown(&row, columns, line) {
                Err(e) if self.allow_unknown_columns => log_warning(format!("{}, dropped", e)),
                result => result?,
            }
        }

        self.callbacks.apply(&mut row);
        let fields = match self.columns.names() {
            Some(columns) => order_row(&row, columns),
            None => unordered_row(&row),
        };

        written += write_record(self.sink()?, &fields, line)?;
        Ok(written)
    }

    /// Write every row of a sequence, in order. Returns the number of rows.
    pub fn write_from<I, R>(&mut self, rows: I) -> CsvResult<usize>
    where
        I: IntoIterator<Item = R>,
        R: Into<Row>,
    {
        let mut count = 0;
        for row in rows {
            self.write(row)?;
            count += 1;
        }
        Ok(count)
    }

    pub fn flush(&mut self) -> CsvResult<()> {
        let line = self.line;
        match self.sink.as_mut() {
            Some(sink) => sink
                .flush()
                .map_err(|source| CsvError::WriteFailure { line, source }),
            None => Ok(()),
        }
    }

    fn sink(&mut self) -> CsvResult<&mut Sink<'a>> {
        let name = &self.name;
        self.sink.as_mut().ok_or_else(|| CsvError::SinkUnavailable {
            name: name.clone(),
            source: io::Error::new(io::ErrorKind::NotConnected, "output is not open"),
        })
    }

    /// Open the sink, settle the column order and emit the header.
    fn start(&mut self, first: &Row) -> CsvResult<usize> {
        if self.has_header && !self.columns.is_resolved() {
            let names = ColumnNames::from_row_keys(first.keys())?;
            self.columns = ColumnState::DerivedFromData(names);
        }

        let unavailable = |source| CsvError::SinkUnavailable {
            name: self.name.clone(),
            source,
        };
        let output = self.output.take().ok_or_else(|| {
            unavailable(io::Error::new(
                io::ErrorKind::NotConnected,
                "output was not set up by an earlier write",
            ))
        })?;
        let (sink, has_content) = output.open(self.append).map_err(|e| {
            let error = unavailable(e);
            log_error(&error);
            error
        })?;
        self.sink = Some(self.dialect.writer_builder().from_writer(CountingSink::new(sink)));
        log_info(format!("Writing {}", self.name));

        if !self.has_header {
            return Ok(0);
        }
        if has_content {
            log_info("Appending to existing content, header skipped");
            return Ok(0);
        }

        let header: Vec<String> = self
            .columns
            .names()
            .map(|names| names.iter().map(|n| n.unwrap_or_default().to_string()).collect())
            .unwrap_or_default();
        self.line += 1;
        let line = self.line;
        write_record(self.sink()?, &header, line)
    }
}

/// Write and flush one record, returning the bytes it took.
fn write_record(sink: &mut Sink<'_>, fields: &[String], line: usize) -> CsvResult<usize> {
    let failure = |source: io::Error| {
        let error = CsvError::WriteFailure { line, source };
        log_error(&error);
        error
    };

    let before = sink.get_ref().written();
    sink.write_record(fields).map_err(|e| failure(e.into()))?;
    sink.flush().map_err(failure)?;
    let written = sink.get_ref().written() - before;

    if written < fields.len() {
        return Err(failure(io::Error::new(
            io::ErrorKind::WriteZero,
            format!("short write: {} bytes for {} fields", written, fields.len()),
        )));
    }
    Ok(written)
}

impl<'a> Drop for Writer<'a> {
    fn drop(&mut self) {
        if let Some(sink) = self.sink.as_mut() {
            // Errors surface through flush(); here they can only be dropped.
            let _ = sink.flush();
            log_success(format!("Wrote {} records to {}", self.line, self.name));
        }
    }
}

impl<'a> std::fmt::Debug for Writer<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Writer")
            .field("name", &self.name)
            .field("open", &self.sink.is_some())
            .field("columns", &self.columns)
            .field("line", &self.line)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReaderOptions;
    use crate::dialect::Dialect;
    use crate::reader::Reader;
    use crate::transform::Transform;
    use serde_json::{json, Value};

    fn named(value: Value) -> Row {
        Row::from_value(value).unwrap()
    }

    fn written(options: WriterOptions, rows: Vec<Row>) -> String {
        let mut buf = Vec::new();
        {
            let mut writer = Writer::new(Output::handle(&mut buf), options).unwrap();
            writer.write_from(rows).unwrap();
        }
        String::from_utf8(buf).unwrap()
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        {
            let mut writer = Writer::new(path.clone(), WriterOptions::default()).unwrap();
            let count = writer
                .write_from(vec![
                    named(json!({"Id": 1, "Name": "foo"})),
                    named(json!({"Id": 2, "Name": "bar"})),
                ])
                .unwrap();
            assert_eq!(count, 2);
            assert_eq!(writer.line_number(), 3);
        }

        let mut reader = Reader::new(path, ReaderOptions::default()).unwrap();
        assert_eq!(
            reader.to_vec().unwrap(),
            vec![
                named(json!({"Id": "1", "Name": "foo"})),
                named(json!({"Id": "2", "Name": "bar"})),
            ]
        );
    }

    #[test]
    fn test_header_from_first_row() {
        let out = written(
            WriterOptions::default(),
            vec![named(json!({"b": "x", "a": "y"})), named(json!({"a": "1", "b": "2"}))],
        );
        assert_eq!(out, "b,a\nx,y\n2,1\n");
    }

    #[test]
    fn test_rows_padded_to_column_order() {
        let options = WriterOptions {
            column_names: Some(vec![Some("one".into()), Some("two".into()), Some("three".into())]),
            ..WriterOptions::default()
        };
        let out = written(
            options,
            vec![named(json!({"two": 2, "three": 3})), named(json!({"one": 1}))],
        );
        assert_eq!(out, "one,two,three\n,2,3\n1,,\n");
    }

    #[test]
    fn test_positional_rows_padded() {
        let options = WriterOptions {
            has_header: false,
            column_names: Some(vec![Some("a".into()), Some("b".into()), Some("c".into())]),
            ..WriterOptions::default()
        };
        let out = written(options, vec![Row::from(vec!["1"]), Row::from(vec!["1", "2", "3", "4"])]);
        assert_eq!(out, "1,,\n1,2,3\n");
    }

    #[test]
    fn test_headerless_unordered() {
        let out = written(
            WriterOptions::headerless(),
            vec![named(json!({"x": "1", "y": "2"})), Row::from(vec!["a", "b", "c"])],
        );
        assert_eq!(out, "1,2\na,b,c\n");
    }

    #[test]
    fn test_quoting() {
        let options = WriterOptions {
            dialect: Dialect::with_delimiter(";"),
            ..WriterOptions::headerless()
        };
        let out = written(options, vec![Row::from(vec!["Hello; \"World\"", "plain"])]);
        assert_eq!(out, "\"Hello; \"\"World\"\"\";plain\n");
    }

    #[test]
    fn test_bytes_written() {
        let mut buf = Vec::new();
        let mut writer = Writer::new(Output::handle(&mut buf), WriterOptions::default()).unwrap();
        assert_eq!(writer.write(named(json!({"Id": 1, "Name": "foo"}))).unwrap(), 14);
        assert_eq!(writer.write(named(json!({"Id": 2, "Name": "bar"}))).unwrap(), 6);
    }

    #[test]
    fn test_callbacks_applied() {
        let callbacks = CallbackPipeline::new()
            .bind("Name", Transform::text(|s| s.to_uppercase()))
            .unwrap();
        let mut buf = Vec::new();
        {
            let mut writer = Writer::new(Output::handle(&mut buf), WriterOptions::default())
                .unwrap()
                .with_callbacks(callbacks);
            writer.write(named(json!({"Id": 1, "Name": "foo"}))).unwrap();
        }
        assert_eq!(String::from_utf8(buf).unwrap(), "Id,Name\n1,FOO\n");
    }

    #[test]
    fn test_strict_unknown_column() {
        let options = WriterOptions {
            column_names: Some(vec![Some("a".into()), Some("b".into())]),
            allow_unknown_columns: false,
            ..WriterOptions::default()
        };
        let mut buf = Vec::new();
        let mut writer = Writer::new(Output::handle(&mut buf), options).unwrap();
        writer.write(named(json!({"a": 1}))).unwrap();
        let err = writer.write(named(json!({"a": 1, "c": 2}))).unwrap_err();
        assert!(matches!(err, CsvError::UnknownColumn { ref column, line: 3 } if column == "c"));
    }

    #[test]
    fn test_lenient_unknown_column_dropped() {
        let options = WriterOptions {
            column_names: Some(vec![Some("a".into())]),
            ..WriterOptions::default()
        };
        let out = written(options, vec![named(json!({"a": 1, "c": 2}))]);
        assert_eq!(out, "a\n1\n");
    }

    #[test]
    fn test_create_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = Writer::new(
            dir.path().join("missing").join("out.csv"),
            WriterOptions::default(),
        )
        .unwrap();
        let err = writer.write(Row::from(vec!["1"])).unwrap_err();
        assert!(matches!(err, CsvError::SinkUnavailable { .. }));
    }

    #[test]
    fn test_write_failure_names_line() {
        let mut writer = Writer::new(Output::handle(Broken), WriterOptions::headerless()).unwrap();
        let err = writer.write(Row::from(vec!["1", "2"])).unwrap_err();
        assert!(matches!(err, CsvError::WriteFailure { line: 1, .. }));
    }

    struct FailOnce<'a> {
        failed: bool,
        out: &'a mut Vec<u8>,
    }

    impl<'a> Write for FailOnce<'a> {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if !self.failed {
                self.failed = true;
                return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
            }
            self.out.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_untrimmed_keys_keep_their_values() {
        let out = written(
            WriterOptions::default(),
            vec![named(json!({" Id ": 1, "Name": "foo"})), named(json!({" Id ": 2, "Name": "bar"}))],
        );
        assert_eq!(out, " Id ,Name\n1,foo\n2,bar\n");
    }

    #[test]
    fn test_untrimmed_keys_strict() {
        let options = WriterOptions {
            allow_unknown_columns: false,
            ..WriterOptions::default()
        };
        let out = written(options, vec![named(json!({" Id ": 1, "Name": "foo"}))]);
        assert_eq!(out, " Id ,Name\n1,foo\n");
    }

    #[test]
    fn test_keys_equal_after_trim_stay_distinct() {
        let out = written(
            WriterOptions::default(),
            vec![named(json!({"a": 1, " a": 2})), named(json!({"a": 3}))],
        );
        assert_eq!(out, "a, a\n1,2\n3,\n");
    }

    #[test]
    fn test_failed_header_stops_later_writes() {
        let mut out = Vec::new();
        {
            let sink = FailOnce {
                failed: false,
                out: &mut out,
            };
            let mut writer = Writer::new(Output::handle(sink), WriterOptions::default()).unwrap();
            let err = writer.write(named(json!({"a": 1}))).unwrap_err();
            assert!(matches!(err, CsvError::WriteFailure { line: 1, .. }));

            let err = writer.write(named(json!({"a": 2}))).unwrap_err();
            assert!(matches!(err, CsvError::SinkUnavailable { .. }));
        }
        // the buffered header may still go out on drop, but no data row does
        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains('1') && !text.contains('2'));
    }

    #[test]
    fn test_append_skips_header_on_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let append = WriterOptions {
            append: true,
            ..WriterOptions::default()
        };

        {
            let mut writer = Writer::new(path.clone(), append.clone()).unwrap();
            writer.write(named(json!({"Id": 1, "Name": "foo"}))).unwrap();
        }
        {
            let mut writer = Writer::new(path.clone(), append).unwrap();
            writer.write(named(json!({"Id": 2, "Name": "bar"}))).unwrap();
            assert_eq!(writer.line_number(), 1);
        }

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Id,Name\n1,foo\n2,bar\n");
    }

    #[test]
    fn test_invalid_dialect() {
        let options = WriterOptions {
            dialect: Dialect {
                quote: "''".into(),
                ..Dialect::default()
            },
            ..WriterOptions::default()
        };
        assert!(Writer::new(Output::stdout(), options).is_err());
    }
}
