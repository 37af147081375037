//! Sanitization pipeline for untrusted text entering a prompt.

use std::sync::LazyLock;

use fleetscan_core::{ContentClass, SanitizationLimits};
use regex::Regex;

use crate::fields::{strip_control_chars, truncate_chars};
use crate::injection::neutralize_injections;

/// Appended when text is cut at its ceiling.
pub const TRUNCATION_MARKER: &str = "\n[TRUNCATED]";

/// Replacement for a run of three or more backticks.
const FENCE_MARKER: &str = "[code]";

static FENCE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`{3,}").expect("fence pattern is a valid literal"));

/// Clean `text` for embedding in a model prompt.
///
/// Steps, in order:
/// 1. strip control characters (tab, LF and CR survive)
/// 2. neutralize prompt-injection patterns
/// 3. collapse code fences so the document cannot open or close one
/// 4. cap at the content class's ceiling, appending [`TRUNCATION_MARKER`]
///
/// `None` yields an empty string.
pub fn sanitize_for_prompt(
    text: Option<&str>,
    class: ContentClass,
    limits: &SanitizationLimits,
) -> String {
    let Some(text) = text else {
        return String::new();
    };

    let stripped = strip_control_chars(text);
    let neutralized = neutralize_injections(&stripped);
    let defenced = FENCE_RUN.replace_all(&neutralized, FENCE_MARKER);

    cap_length(&defenced, limits.for_class(class))
}

/// Cut `text` to `max_chars` characters, appending [`TRUNCATION_MARKER`] when
/// anything was removed.
pub fn cap_length(text: &str, max_chars: usize) -> String {
    let capped = truncate_chars(text, max_chars);
    if capped.len() == text.len() {
        return text.to_string();
    }
    let mut out = String::with_capacity(capped.len() + TRUNCATION_MARKER.len());
    out.push_str(capped);
    out.push_str(TRUNCATION_MARKER);
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
