//! Gateway input and output shapes.

use bytes::Bytes;
use fleetscan_core::{ContentClass, ExtractionKind, ExtractionOutcome, FailureKind, ProviderId};
use fleetscan_guardrails::{AllowedFieldSet, ExtractedDocument};
use serde::Serialize;

/// One document submitted for extraction.
#[derive(Clone)]
pub struct DocumentInput {
    /// Receipt or settlement.
    pub kind: ExtractionKind,
    /// Untrusted text read off the document (OCR or PDF text layer), if any.
    pub document_text: Option<String>,
    /// Where `document_text` came from. Selects its length ceiling.
    pub text_class: ContentClass,
    /// Image or PDF bytes sent to the provider.
    pub image_bytes: Bytes,
    /// MIME type of `image_bytes`.
    pub image_content_type: String,
    /// Field whitelist. Defaults to the kind's full field set.
    pub allowed: Option<AllowedFieldSet>,
}

impl DocumentInput {
    /// Input with no text and the default whitelist.
    pub fn new(
        kind: ExtractionKind,
        image_bytes: impl Into<Bytes>,
        image_content_type: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            document_text: None,
            text_class: ContentClass::OcrText,
            image_bytes: image_bytes.into(),
            image_content_type: image_content_type.into(),
            allowed: None,
        }
    }

    /// Attach recognized text and its source class.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>, class: ContentClass) -> Self {
        self.document_text = Some(text.into());
        self.text_class = class;
        self
    }

    /// Restrict the accepted fields.
    #[must_use]
    pub fn with_allowed(mut self, allowed: AllowedFieldSet) -> Self {
        self.allowed = Some(allowed);
        self
    }
}

impl std::fmt::Debug for DocumentInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentInput")
            .field("kind", &self.kind)
            .field("text_len", &self.document_text.as_ref().map(String::len))
            .field("text_class", &self.text_class)
            .field("image_len", &self.image_bytes.len())
            .field("image_content_type", &self.image_content_type)
            .field("allowed", &self.allowed.as_ref().map(AllowedFieldSet::len))
            .finish()
    }
}

/// What the gateway hands back to callers.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionReport {
    /// Whether a validated document was produced.
    pub success: bool,
    /// Validated, typed record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<ExtractedDocument>,
    /// Failure description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Provider that produced the result or the last failure.
    pub provider_used: Option<ProviderId>,
    /// Time spent in the orchestrator, in milliseconds.
    pub elapsed_ms: u64,
    /// Failure classification, `None` on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    /// Whether the document text matched any injection rule.
    pub injection_detected: bool,
}

impl ExtractionReport {
    /// Report for a failed orchestrator outcome.
    pub(crate) fn from_failure(outcome: ExtractionOutcome, injection_detected: bool) -> Self {
        Self {
            success: false,
            document: None,
            error_message: outcome.error_message,
            provider_used: outcome.provider_used,
            elapsed_ms: outcome.elapsed_ms,
            failure: outcome.failure,
            injection_detected,
        }
    }

    /// Report for the overall deadline elapsing.
    pub(crate) fn deadline_exceeded(elapsed_ms: u64, injection_detected: bool) -> Self {
        Self {
            success: false,
            document: None,
            error_message: Some(format!("extraction deadline exceeded after {elapsed_ms} ms")),
            provider_used: None,
            elapsed_ms,
            failure: Some(FailureKind::DeadlineExceeded),
            injection_detected,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
