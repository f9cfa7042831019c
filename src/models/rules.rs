//! Extraction rules and the picker selections they are derived from

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashSet;

use crate::errors::{ChainpulseError, Result};

/// Where an extraction rule reads its value from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    JsonBody,
}

/// Persisted instruction: store the value at `source_identifier` as `variable_name`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRule {
    pub variable_name: String,
    pub source_type: SourceType,
    pub source_identifier: String,
}

impl ExtractionRule {
    pub fn json_body(variable_name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            variable_name: variable_name.into(),
            source_type: SourceType::JsonBody,
            source_identifier: path.into(),
        }
    }
}

/// Kind of value a selection points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionType {
    String,
    Number,
    Boolean,
    Null,
    /// A whole object or array, picked as one value
    Object,
    Array,
    Key,
}

impl SelectionType {
    /// Type recorded when `value` itself is picked
    pub fn of(value: &JsonValue) -> Self {
        match value {
            JsonValue::String(_) => SelectionType::String,
            JsonValue::Number(_) => SelectionType::Number,
            JsonValue::Bool(_) => SelectionType::Boolean,
            JsonValue::Null => SelectionType::Null,
            JsonValue::Object(_) => SelectionType::Object,
            JsonValue::Array(_) => SelectionType::Array,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionType::String => "string",
            SelectionType::Number => "number",
            SelectionType::Boolean => "boolean",
            SelectionType::Null => "null",
            SelectionType::Object => "object",
            SelectionType::Array => "array",
            SelectionType::Key => "key",
        }
    }
}

/// A value the user picked in the rendered response tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionSelection {
    pub path: String,
    pub selection_type: SelectionType,
    pub variable_name: String,
    /// Tree node the selection was made on; `None` once that tree is replaced
    pub node: Option<usize>,
}

impl ExtractionSelection {
    pub fn to_rule(&self) -> ExtractionRule {
        ExtractionRule::json_body(self.variable_name.clone(), self.path.clone())
    }
}

/// Parse the text of a rules field. Blank text is an empty list.
///
/// Existing entries are kept as raw JSON so that fields this program does
/// not know about survive a rewrite.
pub fn parse_rules(text: &str) -> Result<Vec<JsonValue>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    let value: JsonValue = serde_json::from_str(text)
        .map_err(|e| ChainpulseError::validation("data_extraction_rules", e.to_string()))?;
    match value {
        JsonValue::Array(items) => Ok(items),
        _ => Err(ChainpulseError::validation(
            "data_extraction_rules",
            "expected a JSON array of rules",
        )),
    }
}

/// Outcome of merging new rules into an existing list
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRules {
    pub rules: Vec<JsonValue>,
    pub added: usize,
    pub skipped: usize,
}

/// Merge `new` into `existing`, keyed on `source_identifier`.
///
/// The first entry seen for a path wins: a new rule whose path is already
/// present is dropped, not used to overwrite the earlier one.
pub fn merge_rules(existing: Vec<JsonValue>, new: &[ExtractionRule]) -> MergedRules {
    let mut seen: HashSet<String> = HashSet::new();
    let mut rules = Vec::with_capacity(existing.len() + new.len());

    for entry in existing {
        match entry.get("source_identifier").and_then(|v| v.as_str()) {
            Some(path) if !seen.insert(path.to_string()) => continue,
            _ => rules.push(entry),
        }
    }

    let mut added = 0;
    let mut skipped = 0;
    for rule in new {
        if seen.insert(rule.source_identifier.clone()) {
            // ExtractionRule only holds strings, serialization cannot fail
            rules.push(serde_json::to_value(rule).unwrap_or(JsonValue::Null));
            added += 1;
        } else {
            skipped += 1;
        }
    }

    MergedRules { rules, added, skipped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rule_serialization() {
        let rule = ExtractionRule::json_body("b", "a.b");
        assert_eq!(
            serde_json::to_value(&rule).unwrap(),
            json!({"variable_name": "b", "source_type": "json_body", "source_identifier": "a.b"})
        );
    }

    #[test]
    fn test_parse_rules_blank_is_empty() {
        assert!(parse_rules("").unwrap().is_empty());
        assert!(parse_rules("  \n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rules_rejects_non_array() {
        let err = parse_rules(r#"{"variable_name": "x"}"#).unwrap_err();
        assert!(matches!(err, ChainpulseError::Validation { .. }));
        assert!(parse_rules("[oops").is_err());
    }

    #[test]
    fn test_merge_first_seen_wins() {
        let existing = vec![json!({
            "variable_name": "old_name",
            "source_type": "json_body",
            "source_identifier": "a.b"
        })];
        let merged = merge_rules(existing, &[
            ExtractionRule::json_body("new_name", "a.b"),
            ExtractionRule::json_body("c", "a.c"),
        ]);

        assert_eq!(merged.added, 1);
        assert_eq!(merged.skipped, 1);
        assert_eq!(merged.rules.len(), 2);
        assert_eq!(merged.rules[0]["variable_name"], "old_name");
        assert_eq!(merged.rules[1]["source_identifier"], "a.c");
    }

    #[test]
    fn test_merge_never_duplicates_paths() {
        let existing = vec![
            json!({"variable_name": "x", "source_type": "json_body", "source_identifier": "id"}),
            json!({"variable_name": "y", "source_type": "json_body", "source_identifier": "id"}),
        ];
        let merged = merge_rules(existing, &[ExtractionRule::json_body("z", "id")]);

        assert_eq!(merged.rules.len(), 1);
        assert_eq!(merged.rules[0]["variable_name"], "x");
    }

    #[test]
    fn test_merge_keeps_unknown_entries() {
        let existing = vec![json!({"variable_name": "status", "source_type": "status_code"})];
        let merged = merge_rules(existing.clone(), &[ExtractionRule::json_body("id", "id")]);
        assert_eq!(merged.rules[0], existing[0]);
        assert_eq!(merged.rules.len(), 2);
    }
}
