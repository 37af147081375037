//! Request and outcome shapes shared by adapters, the orchestrator and the
//! gateway.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::provider::ProviderId;

/// The kind of document being extracted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionKind {
    /// Fuel or expense receipt.
    Receipt,
    /// Carrier settlement statement.
    Settlement,
}

impl ExtractionKind {
    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Receipt => "receipt",
            Self::Settlement => "settlement",
        }
    }
}

impl std::fmt::Display for ExtractionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One extraction attempt's input, built once per gateway call.
///
/// `prompt_text` is already sanitized by the time a request is constructed.
#[derive(Clone)]
pub struct ExtractionRequest {
    /// Fully rendered, sanitized instruction text.
    pub prompt_text: String,
    /// Raw image (or PDF) bytes.
    pub image_bytes: Bytes,
    /// MIME type of `image_bytes`, e.g. `image/jpeg`.
    pub image_content_type: String,
}

impl ExtractionRequest {
    /// Build a request.
    pub fn new(
        prompt_text: impl Into<String>,
        image_bytes: impl Into<Bytes>,
        image_content_type: impl Into<String>,
    ) -> Self {
        Self {
            prompt_text: prompt_text.into(),
            image_bytes: image_bytes.into(),
            image_content_type: image_content_type.into(),
        }
    }
}

impl std::fmt::Debug for ExtractionRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionRequest")
            .field("prompt_len", &self.prompt_text.len())
            .field("image_len", &self.image_bytes.len())
            .field("image_content_type", &self.image_content_type)
            .finish()
    }
}

/// Why an outcome failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No provider is configured. Nothing was attempted.
    Configuration,
    /// The provider rejected the request (4xx-class). Not counted against the
    /// provider's circuit.
    ClientRejected,
    /// Server error, network fault, timeout or unparseable response. Counted
    /// against the provider's circuit.
    ProviderUnavailable,
    /// Every eligible provider was tried and failed.
    Exhausted,
    /// The overall gateway deadline elapsed before any provider succeeded.
    DeadlineExceeded,
}

impl FailureKind {
    /// Stable snake-case name for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::ClientRejected => "client_rejected",
            Self::ProviderUnavailable => "provider_unavailable",
            Self::Exhausted => "exhausted",
            Self::DeadlineExceeded => "deadline_exceeded",
        }
    }
}

/// Result of one extraction attempt. Never mutated after construction.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionOutcome {
    /// Whether a provider returned a parseable object.
    pub success: bool,
    /// Parsed (not yet validated) object from the provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
    /// Human-readable failure description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Provider that produced this outcome: the one that answered, or the
    /// last one attempted. `None` when no request was dispatched.
    pub provider_used: Option<ProviderId>,
    /// Wall-clock time spent, in milliseconds.
    pub elapsed_ms: u64,
    /// Failure classification, `None` on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
}

impl ExtractionOutcome {
    /// A successful outcome carrying the provider's parsed object.
    pub fn success(provider: ProviderId, data: Map<String, Value>, elapsed_ms: u64) -> Self {
        Self {
            success: true,
            data: Some(data),
            error_message: None,
            provider_used: Some(provider),
            elapsed_ms,
            failure: None,
        }
    }

    /// A failed outcome attributed to `provider`.
    pub fn failure(
        provider: ProviderId,
        kind: FailureKind,
        message: impl Into<String>,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            success: false,
            data: None,
            error_message: Some(message.into()),
            provider_used: Some(provider),
            elapsed_ms,
            failure: Some(kind),
        }
    }

    /// A failure reached before any provider was called.
    pub fn unattempted(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error_message: Some(message.into()),
            provider_used: None,
            elapsed_ms: 0,
            failure: Some(kind),
        }
    }

    /// The outcome returned when no provider is configured at all.
    pub fn not_configured() -> Self {
        Self::unattempted(FailureKind::Configuration, "no providers configured")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
