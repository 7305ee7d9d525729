//! Best-effort JSON handling shared by the console send and render paths

use serde_json::Value;

/// Parse `text` as JSON, handing the original text back on failure
pub fn try_parse_json(text: &str) -> Result<Value, &str> {
    serde_json::from_str(text).map_err(|_| text)
}

/// Pretty-print when `text` is JSON, otherwise return it unchanged
pub fn pretty_or_raw(text: &str) -> String {
    match try_parse_json(text) {
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| text.to_string()),
        Err(raw) => raw.to_string(),
    }
}

/// Re-serialize JSON compactly, otherwise return it unchanged
pub fn compact_or_raw(text: &str) -> String {
    match try_parse_json(text) {
        Ok(value) => serde_json::to_string(&value).unwrap_or_else(|_| text.to_string()),
        Err(raw) => raw.to_string(),
    }
}

/// Render a JSON value as header-friendly text: strings bare, everything else serialized
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
