//! Provider trait and error taxonomy.
//!
//! An [`ExtractionProvider`] performs exactly one outbound call and returns
//! the model's text. Everything around that call (encoding, timing, JSON
//! extraction, health bookkeeping) lives in [`crate::adapter`], so the
//! adapters for different vendors stay small and identical in contract.

use std::time::Duration;

use async_trait::async_trait;
use fleetscan_core::{ApiKey, ProviderId};

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Connection settings for one HTTP adapter.
#[derive(Clone, Debug)]
pub struct ProviderConfig {
    /// Credential sent with every request.
    pub api_key: ApiKey,
    /// Model identifier.
    pub model: String,
    /// Base URL without trailing slash or API path.
    pub base_url: String,
    /// Output token cap.
    pub max_tokens: u32,
    /// Whole-request timeout.
    pub timeout: Duration,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
}

impl ProviderConfig {
    /// `base_url` joined with an API path.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }
}

/// One prompt plus one image, ready to send.
#[derive(Clone, Copy)]
pub struct ProviderCall<'a> {
    /// Sanitized instruction text.
    pub prompt: &'a str,
    /// Standard base64 of the image or PDF bytes.
    pub image_base64: &'a str,
    /// MIME type of the encoded bytes.
    pub content_type: &'a str,
}

impl ProviderCall<'_> {
    /// Whether the attachment is a PDF rather than an image.
    pub fn is_pdf(&self) -> bool {
        self.content_type.eq_ignore_ascii_case("application/pdf")
    }
}

impl std::fmt::Debug for ProviderCall<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderCall")
            .field("prompt_len", &self.prompt.len())
            .field("image_base64_len", &self.image_base64.len())
            .field("content_type", &self.content_type)
            .finish()
    }
}

/// How a failure affects the provider's circuit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureClass {
    /// The request itself was rejected (4xx-class). The provider is healthy.
    Client,
    /// The provider is failing or unreachable.
    Transient,
}

/// Errors that can occur during a provider call.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// HTTP request failed (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Credentials rejected.
    #[error("Auth error ({status}): {message}")]
    Auth {
        /// HTTP status code (401 or 403).
        status: u16,
        /// Error description.
        message: String,
    },

    /// Rate limited by the provider.
    #[error("Rate limited: {message}")]
    RateLimited {
        /// Error description.
        message: String,
    },

    /// Provider returned a non-success status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error description.
        message: String,
        /// Provider-specific error code.
        code: Option<String>,
    },

    /// Response was JSON but not the expected shape.
    #[error("Malformed response: {message}")]
    MalformedResponse {
        /// What was missing or wrong.
        message: String,
    },

    /// The model's text contained no JSON object.
    #[error("No JSON object in model response")]
    NoJsonObject,

    /// Provider-specific error.
    #[error("{message}")]
    Other {
        /// Error description.
        message: String,
    },
}

impl ProviderError {
    /// Client vs transient classification.
    ///
    /// Every 4xx is a client failure except 408 and 429, which say nothing
    /// about the request and everything about the provider's state.
    pub fn class(&self) -> FailureClass {
        match self {
            Self::Auth { .. } => FailureClass::Client,
            Self::Api { status, .. } => classify_status(*status),
            Self::Http(e) => e.status().map_or(FailureClass::Transient, |s| classify_status(s.as_u16())),
            Self::RateLimited { .. }
            | Self::Json(_)
            | Self::MalformedResponse { .. }
            | Self::NoJsonObject
            | Self::Other { .. } => FailureClass::Transient,
        }
    }

    /// Error category string for logs.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Http(e) if e.is_timeout() => "timeout",
            Self::Http(_) => "network",
            Self::Json(_) | Self::NoJsonObject => "parse",
            Self::Auth { .. } => "auth",
            Self::RateLimited { .. } => "rate_limit",
            Self::Api { status, .. } if *status >= 500 => "server",
            Self::Api { .. } => "client",
            Self::MalformedResponse { .. } => "malformed",
            Self::Other { .. } => "unknown",
        }
    }
}

/// 4xx other than 408/429 is a client failure; everything else is transient.
pub fn classify_status(status: u16) -> FailureClass {
    match status {
        408 | 429 => FailureClass::Transient,
        400..=499 => FailureClass::Client,
        _ => FailureClass::Transient,
    }
}

/// A backing multimodal completion service.
///
/// Implementors must be `Send + Sync` for use behind `Arc` across tasks.
/// [`complete`](ExtractionProvider::complete) performs a single round trip
/// with no internal retry.
#[async_trait]
pub trait ExtractionProvider: Send + Sync {
    /// Which provider this is.
    fn id(&self) -> ProviderId;

    /// Model identifier sent with each request.
    fn model(&self) -> &str;

    /// Send one prompt plus one attachment and return the model's text.
    async fn complete(&self, call: &ProviderCall<'_>) -> ProviderResult<String>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
