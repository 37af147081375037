//! API error response parsing shared by both adapters.
//!
//! Handles the error envelopes either vendor (or a proxy in front of one)
//! may send:
//! - Standard: `{"error": {"message": "...", "type": "..."}}`
//! - Coded:    `{"error": {"message": "...", "code": "..."}}`
//! - Detail:   `{"detail": "..."}`
//! - Flat:     `{"message": "...", "code": "..."}`
//!
//! Unrecognized bodies are quoted, cut to [`MAX_BODY_EXCERPT`] characters.

use serde_json::Value;

use crate::provider::ProviderError;

/// Longest slice of an unrecognized error body kept in a message.
pub const MAX_BODY_EXCERPT: usize = 200;

/// Parsed API error information.
pub struct ApiErrorInfo {
    /// Human-readable error message.
    pub message: String,
    /// Provider-specific error code (e.g., `"overloaded_error"`).
    pub code: Option<String>,
}

/// Parse an API error response body into structured error info.
pub fn parse_api_error(body: &str, status: u16) -> ApiErrorInfo {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        if let Some(msg) = json["error"]["message"].as_str() {
            let code = json["error"]["type"]
                .as_str()
                .or_else(|| json["error"]["code"].as_str())
                .map(String::from);
            return ApiErrorInfo {
                message: msg.to_string(),
                code,
            };
        }

        if let Some(msg) = json["detail"].as_str().or_else(|| json["message"].as_str()) {
            let code = json["code"]
                .as_str()
                .or_else(|| json["type"].as_str())
                .map(String::from);
            return ApiErrorInfo {
                message: msg.to_string(),
                code,
            };
        }
    }

    ApiErrorInfo {
        message: format!("HTTP {status}: {}", excerpt(body)),
        code: None,
    }
}

/// Map a non-success status and its body to a [`ProviderError`].
pub fn error_for_status(status: u16, body: &str) -> ProviderError {
    let info = parse_api_error(body, status);
    match status {
        401 | 403 => ProviderError::Auth {
            status,
            message: info.message,
        },
        429 => ProviderError::RateLimited {
            message: info.message,
        },
        _ => ProviderError::Api {
            status,
            message: info.message,
            code: info.code,
        },
    }
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX_BODY_EXCERPT) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
