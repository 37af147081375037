//! Per-field sanitizers for values a model hands back.

use serde_json::{Number, Value};

/// Amounts at or above this are rejected as implausible.
pub const MAX_AMOUNT: f64 = 1_000_000_000.0;

/// Characters removed from vendor names on top of control characters.
const VENDOR_FORBIDDEN: [char; 6] = ['<', '>', '{', '}', '[', ']'];

/// Whether `c` is a control character removed before prompting.
///
/// Covers C0 controls except tab (0x09), line feed (0x0A) and carriage
/// return (0x0D), plus DEL (0x7F).
pub fn is_stripped_control(c: char) -> bool {
    matches!(c, '\u{00}'..='\u{08}' | '\u{0B}' | '\u{0C}' | '\u{0E}'..='\u{1F}' | '\u{7F}')
}

/// Remove stripped control characters from `text`.
pub fn strip_control_chars(text: &str) -> String {
    text.chars().filter(|c| !is_stripped_control(*c)).collect()
}

/// Clean a vendor name: strip control and markup characters, trim, cap.
///
/// Returns `None` when nothing is left.
pub fn sanitize_vendor_name(raw: &str, max_chars: usize) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !is_stripped_control(*c) && !VENDOR_FORBIDDEN.contains(c))
        .collect();
    let capped = truncate_chars(cleaned.trim(), max_chars);
    let capped = capped.trim_end();
    (!capped.is_empty()).then(|| capped.to_string())
}

/// Clean a free-text description: strip control characters, trim, cap.
pub fn sanitize_description(raw: &str, max_chars: usize) -> String {
    let cleaned = strip_control_chars(raw);
    truncate_chars(cleaned.trim(), max_chars).trim_end().to_string()
}

/// Accept a monetary or quantity value if it is a finite, non-negative
/// number below [`MAX_AMOUNT`]. The original number representation is kept.
pub fn sanitize_amount(value: &Value) -> Option<Number> {
    let Value::Number(n) = value else {
        return None;
    };
    let f = n.as_f64()?;
    (f.is_finite() && f >= 0.0 && f < MAX_AMOUNT).then(|| n.clone())
}

/// Longest prefix of `text` with at most `max_chars` characters.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn vendor_markup_is_stripped() {
        assert_eq!(
            sanitize_vendor_name("<script>x</script>", 500).as_deref(),
            Some("scriptx/script")
        );
        assert_eq!(
            sanitize_vendor_name("  {Pilot}\u{0007} [Flying J] ", 500).as_deref(),
            Some("Pilot Flying J")
        );
    }

    #[test]
    fn vendor_empty_after_cleaning_is_none() {
        assert!(sanitize_vendor_name("<>{}[]", 500).is_none());
        assert!(sanitize_vendor_name("   ", 500).is_none());
        assert!(sanitize_vendor_name("\u{0000}\u{001F}", 500).is_none());
    }

    #[test]
    fn vendor_is_capped_by_chars() {
        let long = "é".repeat(600);
        let out = sanitize_vendor_name(&long, 500).unwrap();
        assert_eq!(out.chars().count(), 500);
    }

    #[test]
    fn description_keeps_newlines_and_tabs() {
        assert_eq!(
            sanitize_description("  line one\n\tline\u{0008} two  ", 2_000),
            "line one\n\tline two"
        );
    }

    #[test]
    fn description_is_capped() {
        let out = sanitize_description(&"x".repeat(3_000), 2_000);
        assert_eq!(out.len(), 2_000);
    }

    #[test]
    fn amount_rules() {
        assert_eq!(sanitize_amount(&json!(41.2)), Some(Number::from_f64(41.2).unwrap()));
        assert_eq!(sanitize_amount(&json!(0)), Some(Number::from(0)));
        assert!(sanitize_amount(&json!(-5)).is_none());
        assert!(sanitize_amount(&json!(1_000_000_000)).is_none());
        assert!(sanitize_amount(&json!(999_999_999.99)).is_some());
        assert!(sanitize_amount(&json!("41.20")).is_none());
        assert!(sanitize_amount(&Value::Null).is_none());
    }

    #[test]
    fn control_char_set() {
        assert!(is_stripped_control('\u{0000}'));
        assert!(is_stripped_control('\u{000B}'));
        assert!(is_stripped_control('\u{007F}'));
        assert!(!is_stripped_control('\n'));
        assert!(!is_stripped_control('\t'));
        assert!(!is_stripped_control('\r'));
        assert!(!is_stripped_control('a'));
    }

    #[test]
    fn truncate_on_char_boundary() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
        assert_eq!(truncate_chars("hi", 0), "");
    }
}
