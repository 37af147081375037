//! Locate the JSON object inside a model's natural-language reply.
//!
//! Models wrap their answer in prose or a code fence more often than not.
//! The scan walks every `{` in order, follows brackets while respecting
//! string literals and escapes, and returns the first balanced span that
//! parses as a JSON object. Malformed candidates are skipped.

use serde_json::{Map, Value};

/// First well-formed JSON object in `text`.
pub fn extract_json_object(text: &str) -> Option<Map<String, Value>> {
    for (idx, ch) in text.char_indices() {
        if ch != '{' {
            continue;
        }
        let Some(candidate) = balanced_span(text, idx) else {
            continue;
        };
        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(candidate) {
            return Some(map);
        }
    }
    None
}

/// The bracket-balanced span starting at `start`, if it closes.
fn balanced_span(text: &str, start: usize) -> Option<&str> {
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                if stack.pop() != Some(ch) {
                    return None;
                }
                if stack.is_empty() {
                    let end = start + offset + ch.len_utf8();
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }
    None
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
