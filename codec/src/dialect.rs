//! Delimiter, quote and escape characters handed to the tokenizer.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// CSV dialect as configured by the caller.
///
/// Each field is kept as text so that a configuration file or command line
/// can hand in anything; [`Dialect::validate`] enforces the one-character
/// rule before the tokenizer is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dialect {
    /// The field delimiter character.
    pub delimiter: String,
    /// The field quote character.
    pub quote: String,
    /// The escape character.
    pub escape: String,
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            delimiter: ",".to_string(),
            quote: "\"".to_string(),
            escape: "\\".to_string(),
        }
    }
}

impl Dialect {
    /// Dialect with a different delimiter and default quote/escape.
    pub fn with_delimiter(delimiter: impl Into<String>) -> Self {
        Self {
            delimiter: delimiter.into(),
            ..Self::default()
        }
    }

    /// Check every character and return the byte form.
    pub fn validate(&self) -> ConfigResult<ByteDialect> {
        Ok(ByteDialect {
            delimiter: single_byte("delimiter", &self.delimiter)?,
            quote: single_byte("quote", &self.quote)?,
            escape: single_byte("escape", &self.escape)?,
        })
    }
}

fn single_byte(field: &'static str, value: &str) -> ConfigResult<u8> {
    let mut chars = value.chars();
    let c = match (chars.next(), chars.next()) {
        (Some(c), None) => c,
        _ => {
            return Err(ConfigError::InvalidCharacter {
                field,
                value: value.to_string(),
            })
        }
    };
    if !c.is_ascii() {
        return Err(ConfigError::NonAsciiCharacter {
            field,
            value: value.to_string(),
        });
    }
    Ok(c as u8)
}

/// Validated dialect, ready for the tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteDialect {
    pub delimiter: u8,
    pub quote: u8,
    pub escape: u8,
}

impl ByteDialect {
    /// Tokenizer for reading. Header handling and field-count checks are
    /// done by the reader, so the tokenizer is headerless and flexible.
    pub(crate) fn reader_builder(&self) -> csv::ReaderBuilder {
        let mut builder = csv::ReaderBuilder::new();
        builder
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .quote(self.quote)
            .escape(Some(self.escape))
            .double_quote(true);
        builder
    }

    /// Tokenizer for writing. Quotes are escaped by doubling.
    pub(crate) fn writer_builder(&self) -> csv::WriterBuilder {
        let mut builder = csv::WriterBuilder::new();
        builder
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .quote(self.quote)
            .escape(self.escape)
            .double_quote(true);
        builder
    }
}
