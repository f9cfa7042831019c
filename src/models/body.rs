//! Response bodies, classified once when they enter the program

use serde_json::Value as JsonValue;

use crate::output::{format_json_value, JsonFormatterOptions};

/// A response body that is either JSON or plain text
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(JsonValue),
    Text(String),
}

impl ResponseBody {
    /// Classify raw text: JSON when it parses, plain text otherwise
    pub fn from_raw(raw: &str) -> Self {
        match serde_json::from_str::<JsonValue>(raw) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Text(raw.to_string()),
        }
    }

    /// Classify a value received inside a JSON envelope.
    ///
    /// A string value is treated as raw text and parsed again, since backends
    /// commonly pass the upstream body through as a string.
    pub fn from_value(value: JsonValue) -> Self {
        match value {
            JsonValue::String(raw) => Self::from_raw(&raw),
            other => ResponseBody::Json(other),
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, ResponseBody::Json(_))
    }

    pub fn as_json(&self) -> Option<&JsonValue> {
        match self {
            ResponseBody::Json(value) => Some(value),
            ResponseBody::Text(_) => None,
        }
    }

    /// Pretty-printed JSON, or the raw text unchanged
    pub fn pretty(&self) -> String {
        match self {
            ResponseBody::Json(value) => format_json_value(value, &JsonFormatterOptions::default())
                .unwrap_or_else(|_| value.to_string()),
            ResponseBody::Text(text) => text.clone(),
        }
    }
}

impl std::fmt::Display for ResponseBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.pretty())
    }
}
