//! Sequential fallback across configured providers.
//!
//! Providers are tried one at a time in [`ProviderId::PREFERENCE`] order,
//! skipping any whose circuit is open. When every configured circuit is open
//! the primary still gets a single probe, so recovery is noticed without
//! waiting for the whole reset window.

use std::sync::Arc;

use fleetscan_core::{ExtractionOutcome, ExtractionRequest, FailureKind, ProviderId};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::adapter::{dispatch, elapsed_millis};
use crate::health::HealthTracker;
use crate::provider::ExtractionProvider;

/// Drives one extraction across the configured providers.
pub struct FallbackOrchestrator {
    providers: Vec<Arc<dyn ExtractionProvider>>,
    health: Arc<HealthTracker>,
}

impl FallbackOrchestrator {
    /// Orchestrator over `providers`, sorted into preference order.
    ///
    /// A second provider with an id already seen is dropped.
    pub fn new(mut providers: Vec<Arc<dyn ExtractionProvider>>, health: Arc<HealthTracker>) -> Self {
        providers.sort_by_key(|p| p.id().rank());
        providers.dedup_by_key(|p| p.id());
        Self { providers, health }
    }

    /// Configured providers in preference order.
    pub fn providers(&self) -> &[Arc<dyn ExtractionProvider>] {
        &self.providers
    }

    /// Shared circuit state.
    pub fn health(&self) -> &Arc<HealthTracker> {
        &self.health
    }

    /// Providers the next [`extract`](Self::extract) would try, in order.
    pub fn candidates(&self) -> Vec<ProviderId> {
        self.plan().iter().map(|p| p.id()).collect()
    }

    fn plan(&self) -> Vec<&Arc<dyn ExtractionProvider>> {
        let closed: Vec<_> = self
            .providers
            .iter()
            .filter(|p| !self.health.is_open(p.id()))
            .collect();
        if !closed.is_empty() {
            return closed;
        }
        self.providers
            .iter()
            .filter(|p| p.id().is_primary())
            .take(1)
            .collect()
    }

    /// Try providers until one returns a parseable object.
    pub async fn extract(&self, request: &ExtractionRequest) -> ExtractionOutcome {
        if self.providers.is_empty() {
            warn!("extraction requested with no providers configured");
            return ExtractionOutcome::not_configured();
        }

        let plan = self.plan();
        if plan.is_empty() {
            // every circuit is open and the primary is not configured
            warn!(
                configured = self.providers.len(),
                "all provider circuits open, nothing to try"
            );
            return ExtractionOutcome::unattempted(
                FailureKind::Exhausted,
                "all providers failed: every circuit is open",
            );
        }
        if plan.iter().all(|p| self.health.is_open(p.id())) {
            info!(
                provider = ProviderId::PRIMARY.as_str(),
                "all circuits open, probing primary provider"
            );
        }

        let start = Instant::now();
        let mut last: Option<ExtractionOutcome> = None;
        for &provider in &plan {
            let outcome = dispatch(provider.as_ref(), &self.health, request).await;
            if outcome.success {
                return outcome;
            }
            warn!(
                provider = provider.id().as_str(),
                failure = outcome.failure.map_or("unknown", FailureKind::as_str),
                elapsed_ms = outcome.elapsed_ms,
                "provider attempt failed, trying next"
            );
            last = Some(outcome);
        }

        let elapsed_ms = elapsed_millis(start);
        let (provider, last_error) = last.map_or((None, String::new()), |outcome| {
            (outcome.provider_used, outcome.error_message.unwrap_or_default())
        });
        warn!(
            attempted = plan.len(),
            last_provider = provider.map_or("none", ProviderId::as_str),
            elapsed_ms,
            "all providers failed"
        );
        ExtractionOutcome {
            provider_used: provider,
            elapsed_ms,
            ..ExtractionOutcome::unattempted(
                FailureKind::Exhausted,
                format!("all providers failed: {last_error}"),
            )
        }
    }
}

impl std::fmt::Debug for FallbackOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackOrchestrator")
            .field(
                "providers",
                &self.providers.iter().map(|p| p.id()).collect::<Vec<_>>(),
            )
            .field("health", &self.health)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
