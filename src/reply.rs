//! # Model Reply Parsing
//!
//! The classification and extraction services answer in free text that is
//! expected, but not guaranteed, to contain JSON. This module is the single
//! place where that text is turned into structured values.
//!
//! - `strip_code_fences` removes Markdown fences such as ` ```json ... ``` `
//! - `parse_json_object` / `parse_json_array` try the fenced body, the raw
//!   reply, and finally the outermost bracketed span
//! - `ParsedReply` tags a value with whether it came from the reply or from a
//!   conservative fallback

use serde_json::{Map, Value};

/// A value derived from a model reply, tagged with its provenance
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedReply<T> {
    /// The reply was parsed successfully
    Parsed(T),

    /// The reply was unusable and a conservative substitute was produced
    Fallback(T),
}

impl<T> ParsedReply<T> {
    /// Whether the value is a fallback substitute
    pub fn is_fallback(&self) -> bool {
        matches!(self, ParsedReply::Fallback(_))
    }

    /// Borrow the inner value
    pub fn value(&self) -> &T {
        match self {
            ParsedReply::Parsed(value) | ParsedReply::Fallback(value) => value,
        }
    }

    /// Take the inner value, discarding the provenance tag
    pub fn into_inner(self) -> T {
        match self {
            ParsedReply::Parsed(value) | ParsedReply::Fallback(value) => value,
        }
    }
}

/// Strip Markdown code fences from a reply.
///
/// Returns the body of the first fenced block when one exists, dropping an
/// optional language tag on the opening fence. Replies without fences are
/// returned trimmed.
pub fn strip_code_fences(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed;
    };

    let after_fence = &trimmed[start + 3..];
    // The language tag, if any, runs to the end of the opening line
    let body = match after_fence.find('\n') {
        Some(newline)
            if after_fence[..newline]
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') =>
        {
            &after_fence[newline + 1..]
        }
        _ => after_fence,
    };

    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

/// Parse a reply expected to hold a single JSON object
pub fn parse_json_object(reply: &str) -> Option<Map<String, Value>> {
    match parse_value(reply, '{', '}')? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Parse a reply expected to hold a JSON array
pub fn parse_json_array(reply: &str) -> Option<Vec<Value>> {
    match parse_value(reply, '[', ']')? {
        Value::Array(items) => Some(items),
        _ => None,
    }
}

fn parse_value(reply: &str, open: char, close: char) -> Option<Value> {
    let body = strip_code_fences(reply);
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        return Some(value);
    }

    // Models sometimes wrap the JSON in prose
    let start = body.find(open)?;
    let end = body.rfind(close)?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&body[start..=end]).ok()
}

/// Read a boolean field, accepting `true`/`false` or their string spellings
pub fn bool_field(map: &Map<String, Value>, key: &str) -> Option<bool> {
    match map.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" => Some(true),
            "false" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Read a numeric field, accepting numbers or numeric strings
pub fn f64_field(map: &Map<String, Value>, key: &str) -> Option<f64> {
    match map.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Read a string field, trimmed
pub fn str_field<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key)?.as_str().map(str::trim)
}
