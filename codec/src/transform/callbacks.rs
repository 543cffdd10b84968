//! Column callbacks.
//!
//! A [`CallbackPipeline`] is an ordered list of bindings, each pairing a
//! [`Selector`] with a list of [`Transform`]s. Applying the pipeline to a
//! row runs, binding by binding in declaration order, every transform of
//! the binding on every cell it selects, threading the value through the
//! list left to right.
//!
//! ```text
//! "/./"   → [trim]              every column
//! "Name"  → [lowercase, reverse] one column, skipped when absent
//! ```

use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use serde_json::{Map, Value};

use super::operations::{Operation, Transform};
use crate::error::{ConfigError, ConfigResult};
use crate::models::{ColumnRef, Row};

/// Prefix marking a selector as a regex.
pub const PATTERN_PREFIX: char = '/';

// =============================================================================
// Selector
// =============================================================================

/// Which cells a binding applies to. Decided once, when the binding is built.
#[derive(Debug, Clone)]
pub enum Selector {
    /// One column by name or ordinal.
    Exact(ColumnRef),
    /// Every column whose key matches.
    Pattern(Regex),
}

impl Selector {
    /// Parse selector text.
    ///
    /// `/pattern/flags` is a regex (flags: `i`, `m`, `s`, `x`, `u`);
    /// anything else names one column.
    pub fn parse(text: &str) -> ConfigResult<Self> {
        if !text.starts_with(PATTERN_PREFIX) {
            return Ok(Selector::Exact(ColumnRef::Name(text.to_string())));
        }

        let invalid = |message: String| ConfigError::InvalidSelector {
            selector: text.to_string(),
            message,
        };

        let body = &text[PATTERN_PREFIX.len_utf8()..];
        let end = body
            .rfind(PATTERN_PREFIX)
            .ok_or_else(|| invalid("missing closing '/'".to_string()))?;
        let (pattern, flags) = (&body[..end], &body[end + PATTERN_PREFIX.len_utf8()..]);

        let mut builder = RegexBuilder::new(pattern);
        for flag in flags.chars() {
            match flag {
                'i' => builder.case_insensitive(true),
                'm' => builder.multi_line(true),
                's' => builder.dot_matches_new_line(true),
                'x' => builder.ignore_whitespace(true),
                'u' => builder.unicode(true),
                other => return Err(invalid(format!("unknown flag '{}'", other))),
            };
        }

        builder
            .build()
            .map(Selector::Pattern)
            .map_err(|e| invalid(e.to_string()))
    }
}

// =============================================================================
// Bindings
// =============================================================================

/// A selector and the transforms it runs.
#[derive(Debug, Clone)]
pub struct CallbackBinding {
    pub selector: Selector,
    pub transforms: Vec<Transform>,
}

impl CallbackBinding {
    pub fn new(selector: Selector, transforms: impl IntoIterator<Item = Transform>) -> Self {
        Self {
            selector,
            transforms: transforms.into_iter().collect(),
        }
    }

    fn run(&self, value: &mut Value) {
        for transform in &self.transforms {
            *value = transform.apply(std::mem::take(value));
        }
    }
}

/// Ordered list of callback bindings.
#[derive(Debug, Clone, Default)]
pub struct CallbackPipeline {
    bindings: Vec<CallbackBinding>,
}

impl CallbackPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a binding from selector text.
    pub fn bind(
        mut self,
        selector: &str,
        transforms: impl IntoIterator<Item = Transform>,
    ) -> ConfigResult<Self> {
        self.bindings
            .push(CallbackBinding::new(Selector::parse(selector)?, transforms));
        Ok(self)
    }

    /// Append an already built binding.
    pub fn push(&mut self, binding: CallbackBinding) {
        self.bindings.push(binding);
    }

    /// Build from a JSON object of selector → operation(s), in document order.
    ///
    /// ```json
    /// { "/./": {"type": "trim"}, "Name": [{"type": "uppercase"}] }
    /// ```
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let map: Map<String, Value> = serde_json::from_str(json)?;
        Self::from_map(map)
    }

    /// Build from an already parsed selector → operation(s) object.
    pub fn from_map(map: Map<String, Value>) -> ConfigResult<Self> {
        let mut pipeline = Self::new();
        for (selector, operations) in map {
            let operations: OneOrMany = serde_json::from_value(operations)?;
            let transforms = operations
                .into_vec()
                .iter()
                .map(Operation::compile)
                .collect::<ConfigResult<Vec<_>>>()?;
            pipeline.push(CallbackBinding::new(Selector::parse(&selector)?, transforms));
        }
        Ok(pipeline)
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Run every binding over the row.
    ///
    /// Exact bindings on a column the row lacks are skipped. No cell is
    /// added or removed.
    pub fn apply(&self, row: &mut Row) {
        for binding in &self.bindings {
            match &binding.selector {
                Selector::Pattern(re) => row.for_each_mut(|key, value| {
                    if re.is_match(key) {
                        binding.run(value);
                    }
                }),
                Selector::Exact(column) => {
                    if let Some(value) = row.get_mut(column) {
                        binding.run(value);
                    }
                }
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<Operation>),
    One(Operation),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<Operation> {
        match self {
            OneOrMany::Many(ops) => ops,
            OneOrMany::One(op) => vec![op],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn upper() -> Transform {
        Transform::text(|s| s.to_uppercase())
    }

    fn reverse() -> Transform {
        Transform::text(|s| s.chars().rev().collect())
    }

    fn trim() -> Transform {
        Transform::text(|s| s.trim().to_string())
    }

    fn row(value: Value) -> Row {
        Row::from_value(value).unwrap()
    }

    #[test]
    fn test_transforms_run_left_to_right() {
        let pipeline = CallbackPipeline::new().bind("Name", vec![upper(), reverse()]).unwrap();
        let mut r = row(json!({"Name": "foo"}));
        pipeline.apply(&mut r);
        assert_eq!(r, row(json!({"Name": "OOF"})));
    }

    #[test]
    fn test_pattern_applies_to_every_matching_column() {
        let pipeline = CallbackPipeline::new().bind("/./", trim()).unwrap();
        let mut r = row(json!({"Id": "1", "Name": " foo "}));
        pipeline.apply(&mut r);
        assert_eq!(r, row(json!({"Id": "1", "Name": "foo"})));
    }

    #[test]
    fn test_pattern_and_exact_bindings_both_run_in_order() {
        let pipeline = CallbackPipeline::new()
            .bind("/^na/i", trim())
            .unwrap()
            .bind("Name", reverse())
            .unwrap();
        let mut r = row(json!({"Id": " 1 ", "Name": " ab "}));
        pipeline.apply(&mut r);
        assert_eq!(r, row(json!({"Id": " 1 ", "Name": "ba"})));
    }

    #[test]
    fn test_exact_binding_on_absent_column_is_skipped() {
        let pipeline = CallbackPipeline::new().bind("DoesNotExist", upper()).unwrap();
        let mut r = row(json!({"Id": "1"}));
        pipeline.apply(&mut r);
        assert_eq!(r, row(json!({"Id": "1"})));
    }

    #[test]
    fn test_positional_rows_use_ordinal_keys() {
        let pipeline = CallbackPipeline::new()
            .bind("1", upper())
            .unwrap()
            .bind("/^[02]$/", reverse())
            .unwrap();
        let mut r = Row::from(vec!["ab", "cd", "ef"]);
        pipeline.apply(&mut r);
        assert_eq!(r, Row::from(vec!["ba", "CD", "fe"]));
    }

    #[test]
    fn test_selector_parse() {
        assert!(matches!(Selector::parse("Name").unwrap(), Selector::Exact(ColumnRef::Name(ref n)) if n == "Name"));
        match Selector::parse("/^id$/i").unwrap() {
            Selector::Pattern(re) => assert!(re.is_match("ID")),
            other => panic!("expected pattern, got {:?}", other),
        }
        assert!(Selector::parse("/unterminated").is_err());
        assert!(Selector::parse("/a/q").is_err());
        assert!(Selector::parse("/(/").is_err());
    }

    #[test]
    fn test_from_json_keeps_document_order() {
        let pipeline = CallbackPipeline::from_json(
            r#"{
                "Name": [{"type": "uppercase"}, {"type": "reverse"}],
                "/./": {"type": "trim"}
            }"#,
        )
        .unwrap();
        assert_eq!(pipeline.len(), 2);

        let mut r = row(json!({"Name": "foo ", "Id": " 2"}));
        pipeline.apply(&mut r);
        // reverse ran before trim, so the trailing space moved to the front first
        assert_eq!(r, row(json!({"Name": "OOF", "Id": "2"})));
    }

    #[test]
    fn test_from_json_rejects_unknown_operation() {
        let err = CallbackPipeline::from_json(r#"{"Name": {"type": "explode"}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }
}
