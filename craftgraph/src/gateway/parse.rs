//! Parse-repair chain for model output.
//!
//! 1. strict JSON parse of the whole reply;
//! 2. strip markdown fences and surrounding prose, reparse the JSON span;
//! 3. field salvage ([`salvage_string_fields`]) for callers that build a manual
//!    fallback out of whatever key/value pairs survived.

use serde::de::DeserializeOwned;

/// Parses `raw` strictly, then after repair. The error is the strict-parse message.
pub fn parse_with_repair<T: DeserializeOwned>(raw: &str) -> Result<T, String> {
    let strict_err = match serde_json::from_str::<T>(raw.trim()) {
        Ok(v) => return Ok(v),
        Err(e) => e.to_string(),
    };
    let unfenced = strip_markdown_fences(raw);
    if let Some(span) = json_span(unfenced) {
        if let Ok(v) = serde_json::from_str::<T>(span) {
            return Ok(v);
        }
    }
    Err(strict_err)
}

/// Returns the body of the first fenced block (```json ... ```), or the input.
pub fn strip_markdown_fences(raw: &str) -> &str {
    let Some(open) = raw.find("```") else {
        return raw;
    };
    let after_open = &raw[open + 3..];
    // Skip an optional language tag on the fence line.
    let body_start = after_open.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after_open[body_start..];
    match body.find("```") {
        Some(close) => &body[..close],
        None => body,
    }
}

/// Slice from the first `{` or `[` to the last matching closer.
fn json_span(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let closer = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(closer)?;
    (end > start).then(|| &text[start..=end])
}

/// Collects every string value of `"key": "..."` in document order, even from broken JSON.
pub fn salvage_string_fields(raw: &str, key: &str) -> Vec<String> {
    let needle = format!("\"{}\"", key);
    let mut out = Vec::new();
    let mut rest = raw;
    while let Some(pos) = rest.find(&needle) {
        rest = &rest[pos + needle.len()..];
        let trimmed = rest.trim_start();
        let Some(after_colon) = trimmed.strip_prefix(':') else {
            continue;
        };
        let value_part = after_colon.trim_start();
        let Some(body) = value_part.strip_prefix('"') else {
            continue;
        };
        let mut value = String::new();
        let mut escaped = false;
        let mut closed = false;
        for c in body.chars() {
            if escaped {
                value.push(c);
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                closed = true;
                break;
            } else {
                value.push(c);
            }
        }
        if closed && !value.trim().is_empty() {
            out.push(value.trim().to_string());
        }
    }
    out
}
