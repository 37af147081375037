//! Shared call harness around [`ExtractionProvider::complete`].
//!
//! [`dispatch`] is the only place a provider is invoked. It encodes the
//! attachment, times the call, pulls the JSON object out of the reply,
//! classifies any failure, and tells the [`HealthTracker`] what happened.
//! The caller always gets an [`ExtractionOutcome`].

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use fleetscan_core::{ExtractionOutcome, ExtractionRequest, FailureKind};
use tokio::time::Instant;
use tracing::{debug, error};

use crate::health::HealthTracker;
use crate::json_span::extract_json_object;
use crate::provider::{ExtractionProvider, FailureClass, ProviderCall, ProviderError};

/// Run one attempt against `provider` and record it in `health`.
pub async fn dispatch(
    provider: &dyn ExtractionProvider,
    health: &HealthTracker,
    request: &ExtractionRequest,
) -> ExtractionOutcome {
    let id = provider.id();
    let image_base64 = STANDARD.encode(&request.image_bytes);
    let call = ProviderCall {
        prompt: &request.prompt_text,
        image_base64: &image_base64,
        content_type: &request.image_content_type,
    };

    let start = Instant::now();
    let result = provider
        .complete(&call)
        .await
        .and_then(|text| extract_json_object(&text).ok_or(ProviderError::NoJsonObject));
    let elapsed_ms = elapsed_millis(start);

    match result {
        Ok(data) => {
            health.record_success(id);
            debug!(
                provider = id.as_str(),
                model = provider.model(),
                elapsed_ms,
                field_count = data.len(),
                "provider call succeeded"
            );
            ExtractionOutcome::success(id, data, elapsed_ms)
        }
        Err(err) => {
            let kind = match err.class() {
                FailureClass::Transient => {
                    health.record_failure(id);
                    FailureKind::ProviderUnavailable
                }
                FailureClass::Client => FailureKind::ClientRejected,
            };
            if matches!(err, ProviderError::Auth { .. }) {
                error!(
                    provider = id.as_str(),
                    error_kind = "auth",
                    elapsed_ms,
                    "provider rejected credentials"
                );
            } else {
                debug!(
                    provider = id.as_str(),
                    error_kind = err.category(),
                    elapsed_ms,
                    "provider call failed"
                );
            }
            metrics::counter!(
                "provider_failures_total",
                "provider" => id.as_str(),
                "kind" => kind.as_str()
            )
            .increment(1);
            ExtractionOutcome::failure(id, kind, err.to_string(), elapsed_ms)
        }
    }
}

pub(crate) fn elapsed_millis(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
