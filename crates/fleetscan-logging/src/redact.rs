//! Shape-only rendering of JSON payloads for debug logs.
//!
//! Extracted values are business data copied off a photographed document.
//! [`describe`] keeps object keys (they come from a fixed whitelist) and
//! replaces every leaf with its type and length.

use std::fmt::Write as _;

use serde_json::Value;

/// Render `value` by type and length, never by content.
///
/// ```text
/// {"vendor":"Pilot","total":41.2} -> {vendor: <string len=5>, total: <number>}
/// ```
pub fn describe(value: &Value) -> String {
    let mut out = String::new();
    write_shape(&mut out, value);
    out
}

fn write_shape(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("<null>"),
        Value::Bool(_) => out.push_str("<bool>"),
        Value::Number(_) => out.push_str("<number>"),
        Value::String(s) => {
            let _ = write!(out, "<string len={}>", s.chars().count());
        }
        Value::Array(items) => {
            let _ = write!(out, "<array len={}>", items.len());
        }
        Value::Object(map) => {
            out.push('{');
            for (i, (key, val)) in map.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(key);
                out.push_str(": ");
                write_shape(out, val);
            }
            out.push('}');
        }
    }
}
