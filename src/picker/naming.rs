//! Variable names derived from response paths

use once_cell::sync::Lazy;
use regex::Regex;

pub const ROOT_PATH: &str = "root";
pub const TEXT_PATH: &str = "response_text";

static INVALID_CHARS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^a-z0-9_]").unwrap()
});
static REPEATED_UNDERSCORE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"_+").unwrap()
});

/// Field names too generic to stand alone; they keep their full path
const AMBIGUOUS_NAMES: &[&str] = &[
    "name", "id", "value", "type", "key", "code", "status", "message", "data", "result", "text",
];

/// Suggest a variable name for a value at `path`
///
/// - `root` is `response_body` and `response_text` stays `response_text`
/// - otherwise the last segment is used; an array index becomes `<parent>_item`
/// - ambiguous leaf names such as `name` or `id` keep the whole path
/// - the result is lower-case `[a-z0-9_]`, never starts with a digit, never empty
pub fn generate_variable_name(path: &str) -> String {
    match path {
        ROOT_PATH => return "response_body".to_string(),
        TEXT_PATH => return TEXT_PATH.to_string(),
        _ => {}
    }

    let segments: Vec<&str> = path.split('.').collect();
    let last = segments.last().copied().unwrap_or_default();

    let mut name = if is_numeric(last) && segments.len() > 1 {
        format!("{}_item", segments[segments.len() - 2])
    } else if segments.len() > 1 && AMBIGUOUS_NAMES.contains(&last.to_lowercase().as_str()) {
        segments.join("_")
    } else {
        last.to_string()
    };

    if is_numeric(&name) {
        name = segments.join("_");
    }

    sanitize(&name)
}

fn is_numeric(segment: &str) -> bool {
    !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit())
}

fn sanitize(raw: &str) -> String {
    let lower = raw.to_lowercase();
    let replaced = INVALID_CHARS_RE.replace_all(&lower, "_");
    let collapsed = REPEATED_UNDERSCORE_RE.replace_all(&replaced, "_");
    let trimmed = collapsed.trim_matches('_');

    if trimmed.is_empty() {
        "extracted_value".to_string()
    } else if trimmed.starts_with(|c: char| c.is_ascii_digit()) {
        format!("item_{}", trimmed)
    } else {
        trimmed.to_string()
    }
}
