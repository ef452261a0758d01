//! Rendering record values as flat cell text.
//!
//! Shared by the text report, the bundle's delimited tables and the
//! workbook's string cells so every artifact agrees on how a value looks.

use std::borrow::Cow;

use serde_json::Value;

/// Flat text for one cell. Missing and null render as the empty string;
/// nested values render as compact JSON.
#[must_use]
pub fn cell_text(value: Option<&Value>) -> Cow<'_, str> {
    match value {
        None | Some(Value::Null) => Cow::Borrowed(""),
        Some(Value::String(s)) => Cow::Borrowed(s.as_str()),
        Some(Value::Bool(b)) => Cow::Borrowed(if *b { "true" } else { "false" }),
        Some(Value::Number(n)) => Cow::Owned(n.to_string()),
        Some(nested @ (Value::Array(_) | Value::Object(_))) => Cow::Owned(nested.to_string()),
    }
}

/// Escape the characters that would break a tab-separated line.
#[must_use]
pub fn escape_tsv(text: &str) -> Cow<'_, str> {
    if !text.contains(['\t', '\r', '\n']) {
        return Cow::Borrowed(text);
    }
    let mut escaped = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        match ch {
            '\t' => escaped.push_str("\\t"),
            '\r' => escaped.push_str("\\r"),
            '\n' => escaped.push_str("\\n"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}
