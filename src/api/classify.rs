//! Entry payload classification
//!
//! Stored payloads arrive as raw text. [`classify`] assigns each payload one
//! of the [`EntryKind`] variants using a fixed precedence; exactly one rule
//! fires and `Error` is the fallback, so classification never fails.

use crate::EntryKind;
use serde_json::Value;

/// Classify a raw payload and produce its display form.
///
/// Precedence, first match wins:
///
/// 1. JSON object or array → `Json`, display is the raw text
/// 2. JSON-quoted string → `String`, display is the unescaped value
/// 3. Numeric literal → `Number`, display is the raw text
/// 4. Exactly `true` or `false` → `Bool`, display is the raw text
/// 5. Anything else → `Error`, display is the raw text
///
/// The order matters: a quoted `"123"` must be unwrapped to a string before
/// the numeric check runs, and a bare `123` must never be treated as a
/// generic string.
pub fn classify(raw: &str) -> (EntryKind, String) {
    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        if value.is_object() || value.is_array() {
            return (EntryKind::Json, raw.to_string());
        }
    }

    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        if let Some(decoded) = decode_json_string(raw) {
            return (EntryKind::String, decoded);
        }
    }

    if raw.parse::<f64>().is_ok() {
        return (EntryKind::Number, raw.to_string());
    }

    if raw == "true" || raw == "false" {
        return (EntryKind::Bool, raw.to_string());
    }

    (EntryKind::Error, raw.to_string())
}

/// Encode a string as a JSON string literal (quoted and escaped).
pub fn encode_json_string(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}

/// Decode a JSON string literal back to the wrapped string value.
///
/// The candidate is embedded in a single-field object and parsed, so escape
/// handling is exactly the JSON grammar's. Returns `None` when the text is
/// not a lone string literal.
pub fn decode_json_string(raw: &str) -> Option<String> {
    let wrapped = format!("{{\"value\":{raw}}}");
    let parsed: Value = serde_json::from_str(&wrapped).ok()?;
    match parsed.get("value") {
        Some(Value::String(s)) => Some(s.clone()),
        _ => None,
    }
}
