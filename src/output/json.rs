//! JSON formatting

use serde_json::Value as JsonValue;

/// JSON formatting options
#[derive(Debug, Clone)]
pub struct JsonFormatterOptions {
    /// Indentation (default: 2 spaces)
    pub indent: usize,
}

impl Default for JsonFormatterOptions {
    fn default() -> Self {
        Self { indent: 2 }
    }
}

/// Pretty-print an already parsed JSON value, keeping key order
pub fn format_json_value(value: &JsonValue, options: &JsonFormatterOptions) -> Result<String, String> {
    let indent = vec![b' '; options.indent];
    let formatter = serde_json::ser::PrettyFormatter::with_indent(&indent);
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);

    serde::Serialize::serialize(value, &mut serializer)
        .map_err(|e| format!("JSON formatting error: {}", e))?;

    String::from_utf8(buf)
        .map_err(|e| format!("UTF-8 error: {}", e))
}
