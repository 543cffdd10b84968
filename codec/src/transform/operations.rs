//! Cell transforms.
//!
//! A [`Transform`] is any `Value → Value` function. Built-in transforms are
//! described declaratively by [`Operation`] so they can come from a JSON
//! configuration file, and are compiled into a [`Transform`] up front.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{ConfigError, ConfigResult};
use crate::models::field_text;

// =============================================================================
// Transform
// =============================================================================

/// A unary cell transform.
#[derive(Clone)]
pub struct Transform(Arc<dyn Fn(Value) -> Value + Send + Sync>);

impl Transform {
    /// Wrap a value-level function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        Transform(Arc::new(f))
    }

    /// Wrap a function over the cell's text. The result is a string cell.
    pub fn text<F>(f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Transform::new(move |value| Value::String(f(&field_text(&value))))
    }

    pub fn apply(&self, value: Value) -> Value {
        (self.0)(value)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Transform(..)")
    }
}

/// A lone transform binds like a one-element list.
impl IntoIterator for Transform {
    type Item = Transform;
    type IntoIter = std::iter::Once<Transform>;

    fn into_iter(self) -> Self::IntoIter {
        std::iter::once(self)
    }
}

// =============================================================================
// Operation
// =============================================================================

/// Built-in transformation operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    /// Remove leading and trailing whitespace
    Trim,

    /// Convert to uppercase
    Uppercase,

    /// Convert to lowercase
    Lowercase,

    /// Reverse the characters
    Reverse,

    /// Replace using regex pattern
    Replace {
        pattern: String,
        #[serde(default)]
        value: String,
    },

    /// Pad string at start to reach target length
    PadStart {
        length: usize,
        #[serde(default = "default_pad_char")]
        char: String,
    },

    /// Pad string at end to reach target length
    PadEnd {
        length: usize,
        #[serde(default = "default_pad_char")]
        char: String,
    },

    /// Ensure string starts with given prefix
    EnsurePrefix {
        value: String,
    },

    /// Ensure string ends with given suffix
    EnsureSuffix {
        value: String,
    },

    /// Map values using a lookup table
    Map {
        mapping: HashMap<String, String>,
        #[serde(default)]
        case_insensitive: bool,
        /// Value to use when no mapping match found (None keeps the input)
        #[serde(default)]
        default_unmapped: Option<String>,
    },

    /// Convert to boolean
    ToBoolean {
        #[serde(default = "default_true_values")]
        true_values: Vec<String>,
    },

    /// Convert to number (integer)
    ToNumber,

    /// Take a character range
    Substring {
        start: usize,
        #[serde(default)]
        length: Option<usize>,
    },

    /// Remove all non-alphanumeric characters
    Alphanumeric,

    /// Remove all non-digit characters
    DigitsOnly,

    /// Replace an empty cell with a fixed value
    Default {
        value: String,
    },
}

fn default_pad_char() -> String {
    "0".to_string()
}

fn default_true_values() -> Vec<String> {
    vec![
        "true".to_string(),
        "1".to_string(),
        "yes".to_string(),
        "y".to_string(),
        "on".to_string(),
    ]
}

impl Operation {
    /// Validate and turn into a [`Transform`].
    ///
    /// Regex patterns are compiled here, once.
    pub fn compile(&self) -> ConfigResult<Transform> {
        match self {
            Operation::Replace { pattern, value } => {
                let re = Regex::new(pattern).map_err(|e| {
                    ConfigError::InvalidOperation(format!("replace pattern '{}': {}", pattern, e))
                })?;
                let replacement = value.clone();
                Ok(Transform::new(move |v| apply_replace(&v, &re, &replacement)))
            }
            Operation::PadStart { char, .. } | Operation::PadEnd { char, .. } => {
                if char.chars().count() != 1 {
                    return Err(ConfigError::InvalidOperation(format!(
                        "pad character must be exactly one character, got {:?}",
                        char
                    )));
                }
                let op = self.clone();
                Ok(Transform::new(move |v| op.run(&v)))
            }
            _ => {
                let op = self.clone();
                Ok(Transform::new(move |v| op.run(&v)))
            }
        }
    }

    /// Evaluate an operation that needs no preparation.
    fn run(&self, value: &Value) -> Value {
        match self {
            Operation::Trim => map_text(value, |s| s.trim().to_string()),
            Operation::Uppercase => map_text(value, |s| s.to_uppercase()),
            Operation::Lowercase => map_text(value, |s| s.to_lowercase()),
            Operation::Reverse => map_text(value, |s| s.chars().rev().collect()),
            // built with its compiled regex in `compile`
            Operation::Replace { .. } => value.clone(),
            Operation::PadStart { length, char } => {
                map_text(value, |s| pad(s, *length, char, true))
            }
            Operation::PadEnd { length, char } => map_text(value, |s| pad(s, *length, char, false)),
            Operation::EnsurePrefix { value: prefix } => map_text(value, |s| {
                if s.starts_with(prefix.as_str()) {
                    s.to_string()
                } else {
                    format!("{}{}", prefix, s)
                }
            }),
            Operation::EnsureSuffix { value: suffix } => map_text(value, |s| {
                if s.ends_with(suffix.as_str()) {
                    s.to_string()
                } else {
                    format!("{}{}", s, suffix)
                }
            }),
            Operation::Map { mapping, case_insensitive, default_unmapped } => {
                self.apply_map(value, mapping, *case_insensitive, default_unmapped.as_deref())
            }
            Operation::ToBoolean { true_values } => self.apply_to_boolean(value, true_values),
            Operation::ToNumber => self.apply_to_number(value),
            Operation::Substring { start, length } => map_text(value, |s| {
                let chars: Vec<char> = s.chars().collect();
                let begin = (*start).min(chars.len());
                let end = length.map(|l| begin + l).unwrap_or(chars.len()).min(chars.len());
                chars[begin..end].iter().collect()
            }),
            Operation::Alphanumeric => {
                map_text(value, |s| s.chars().filter(|c| c.is_alphanumeric()).collect())
            }
            Operation::DigitsOnly => {
                map_text(value, |s| s.chars().filter(|c| c.is_ascii_digit()).collect())
            }
            Operation::Default { value: fallback } => {
                if field_text(value).trim().is_empty() {
                    Value::String(fallback.clone())
                } else {
                    value.clone()
                }
            }
        }
    }

    fn apply_map(
        &self,
        value: &Value,
        mapping: &HashMap<String, String>,
        case_insensitive: bool,
        default_unmapped: Option<&str>,
    ) -> Value {
        let text = field_text(value);
        let found = if case_insensitive {
            let key = text.to_lowercase();
            mapping.iter().find(|(k, _)| k.to_lowercase() == key).map(|(_, v)| v)
        } else {
            mapping.get(&*text)
        };

        match (found, default_unmapped) {
            (Some(v), _) => Value::String(v.clone()),
            (None, Some(d)) => Value::String(d.to_string()),
            (None, None) => value.clone(),
        }
    }

    fn apply_to_boolean(&self, value: &Value, true_values: &[String]) -> Value {
        match value {
            Value::Bool(b) => Value::Bool(*b),
            _ => {
                let lower = field_text(value).trim().to_lowercase();
                Value::Bool(true_values.iter().any(|tv| tv.to_lowercase() == lower))
            }
        }
    }

    fn apply_to_number(&self, value: &Value) -> Value {
        match value {
            Value::Number(_) => value.clone(),
            _ => {
                let text = field_text(value);
                // Check if starts with minus for negative numbers
                let is_negative = text.trim().starts_with('-');
                let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
                if digits.is_empty() {
                    return Value::Null;
                }
                let num_str = if is_negative { format!("-{}", digits) } else { digits };
                num_str
                    .parse::<i64>()
                    .map(|n| Value::Number(n.into()))
                    .unwrap_or(Value::Null)
            }
        }
    }
}

/// Apply a text function, leaving arrays and objects untouched.
fn map_text<F>(value: &Value, f: F) -> Value
where
    F: FnOnce(&str) -> String,
{
    match value {
        Value::Array(_) | Value::Object(_) => value.clone(),
        _ => Value::String(f(&field_text(value))),
    }
}

fn apply_replace(value: &Value, re: &Regex, replacement: &str) -> Value {
    map_text(value, |s| re.replace_all(s, replacement).into_owned())
}

fn pad(s: &str, length: usize, pad_char: &str, at_start: bool) -> String {
    let current = s.chars().count();
    if current >= length {
        return s.to_string();
    }
    let pad = pad_char.chars().next().unwrap_or('0');
    let padding: String = std::iter::repeat(pad).take(length - current).collect();
    if at_start {
        format!("{}{}", padding, s)
    } else {
        format!("{}{}", s, padding)
    }
}

/// Get a description of all available operations
pub fn operations_description() -> String {
    r#"Available transformation operations:

| Operation | Description | Parameters |
|-----------|-------------|------------|
| trim | Remove leading/trailing whitespace | - |
| uppercase | Convert to uppercase | - |
| lowercase | Convert to lowercase | - |
| reverse | Reverse the characters | - |
| replace | Regex pattern replacement | pattern: regex, value: replacement |
| pad_start | Pad string at start | length: target length, char: pad character (default "0") |
| pad_end | Pad string at end | length: target length, char: pad character (default "0") |
| ensure_prefix | Add prefix if not present | value: prefix string |
| ensure_suffix | Add suffix if not present | value: suffix string |
| map | Map values using lookup table | mapping: {source: target}, case_insensitive: bool, default_unmapped: string |
| to_boolean | Convert to boolean | true_values: list of truthy strings |
| to_number | Convert to integer | - |
| substring | Extract substring | start: start index, length: optional length |
| alphanumeric | Keep only alphanumeric chars | - |
| digits_only | Keep only digits | - |
| default | Replace an empty cell | value: replacement |

Callbacks file (selectors starting with '/' are regexes, applied in order):
{
  "/./": {"type": "trim"},
  "Name": [{"type": "lowercase"}, {"type": "reverse"}],
  "Phone": [{"type": "digits_only"}, {"type": "pad_start", "length": 10}]
}"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_trim() {
        let op = Operation::Trim;
        assert_eq!(op.compile().unwrap().apply(json!("  hello  ")), json!("hello"));
    }

    #[test]
    fn test_reverse_and_uppercase() {
        assert_eq!(Operation::Reverse.compile().unwrap().apply(json!("foo")), json!("oof"));
        assert_eq!(Operation::Uppercase.compile().unwrap().apply(json!("foo")), json!("FOO"));
    }

    #[test]
    fn test_numbers_are_treated_as_text() {
        assert_eq!(Operation::PadStart { length: 4, char: "0".into() }.compile().unwrap().apply(json!(7)), json!("0007"));
    }

    #[test]
    fn test_map() {
        let mut mapping = HashMap::new();
        mapping.insert("CA".to_string(), "Composer".to_string());

        let op = Operation::Map { mapping: mapping.clone(), case_insensitive: true, default_unmapped: None };
        assert_eq!(op.compile().unwrap().apply(json!("ca")), json!("Composer"));
        assert_eq!(op.compile().unwrap().apply(json!("Unknown")), json!("Unknown"));

        let op_with_default = Operation::Map { mapping, case_insensitive: false, default_unmapped: Some("Other".into()) };
        assert_eq!(op_with_default.compile().unwrap().apply(json!("ca")), json!("Other"));
    }

    #[test]
    fn test_to_number() {
        let op = Operation::ToNumber;
        assert_eq!(op.compile().unwrap().apply(json!("123-456")), json!(123456));
        assert_eq!(op.compile().unwrap().apply(json!("-42")), json!(-42));
        assert_eq!(op.compile().unwrap().apply(json!("abc")), Value::Null);
    }

    #[test]
    fn test_substring_out_of_range() {
        let op = Operation::Substring { start: 10, length: Some(2) };
        assert_eq!(op.compile().unwrap().apply(json!("short")), json!(""));
    }

    #[test]
    fn test_default_fills_blank() {
        let op = Operation::Default { value: "n/a".into() };
        assert_eq!(op.compile().unwrap().apply(json!("  ")), json!("n/a"));
        assert_eq!(op.compile().unwrap().apply(json!("x")), json!("x"));
    }

    #[test]
    fn test_compile_rejects_bad_pattern() {
        let op = Operation::Replace { pattern: "(".into(), value: String::new() };
        assert!(matches!(op.compile(), Err(ConfigError::InvalidOperation(_))));
    }

    #[test]
    fn test_compiled_replace() {
        let op = Operation::Replace { pattern: "[-. ]".into(), value: String::new() };
        let t = op.compile().unwrap();
        assert_eq!(t.apply(json!("T-123.456 7")), json!("T1234567"));
    }

    #[test]
    fn test_operation_from_json() {
        let op: Operation = serde_json::from_str(r#"{"type": "pad_start", "length": 3}"#).unwrap();
        assert_eq!(op, Operation::PadStart { length: 3, char: "0".into() });
    }

    #[test]
    fn test_text_transform() {
        let t = Transform::text(|s| s.to_uppercase());
        assert_eq!(t.apply(json!("abc")), json!("ABC"));
        assert_eq!(t.into_iter().count(), 1);
    }
}
