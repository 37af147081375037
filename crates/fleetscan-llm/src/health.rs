//! Per-provider circuit breaker.
//!
//! Two states per provider. **Closed** while `failure_count < threshold`,
//! **Open** once the threshold is reached. There is no stored half-open
//! state and no background timer: every read first checks whether the last
//! failure is older than the reset window and, if so, zeroes the counters.
//! The next call after the window is therefore an ordinary closed-circuit
//! attempt.
//!
//! One `Mutex` per provider, allocated up front for every [`ProviderId`], so
//! concurrent requests never lose an update and never contend across
//! providers. Create one tracker per gateway and share it via
//! `Arc<HealthTracker>`.

use std::time::Duration;

use fleetscan_core::ProviderId;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Default consecutive failures that open a circuit.
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;

/// Default time after the last failure before an open circuit reads closed.
pub const DEFAULT_RESET_WINDOW: Duration = Duration::from_secs(300);

/// Circuit thresholds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CircuitConfig {
    /// Counted failures that open the circuit.
    pub failure_threshold: u32,
    /// Quiet period after the last failure that resets the counters.
    pub reset_window: Duration,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            reset_window: DEFAULT_RESET_WINDOW,
        }
    }
}

/// Point-in-time health of one provider.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProviderHealth {
    /// Counted failures since the last success or reset.
    pub failure_count: u32,
    /// When the most recent counted failure happened.
    pub last_failure_at: Option<Instant>,
    /// Whether calls to this provider are currently skipped.
    pub circuit_open: bool,
}

/// Circuit state for every provider.
pub struct HealthTracker {
    slots: [Mutex<ProviderHealth>; ProviderId::PREFERENCE.len()],
    config: CircuitConfig,
}

impl HealthTracker {
    /// Tracker with default thresholds.
    pub fn new() -> Self {
        Self::with_config(CircuitConfig::default())
    }

    /// Tracker with custom thresholds. A zero threshold is raised to one.
    pub fn with_config(config: CircuitConfig) -> Self {
        Self {
            slots: std::array::from_fn(|_| Mutex::new(ProviderHealth::default())),
            config: CircuitConfig {
                failure_threshold: config.failure_threshold.max(1),
                reset_window: config.reset_window,
            },
        }
    }

    /// Thresholds in use.
    pub fn config(&self) -> CircuitConfig {
        self.config
    }

    /// Whether calls to `provider` should currently be skipped.
    pub fn is_open(&self, provider: ProviderId) -> bool {
        let mut state = self.slot(provider).lock();
        self.refresh(provider, &mut state);
        state.circuit_open
    }

    /// Record a counted failure for `provider`.
    ///
    /// Opens the circuit when the count reaches the threshold.
    pub fn record_failure(&self, provider: ProviderId) {
        let mut state = self.slot(provider).lock();
        self.refresh(provider, &mut state);

        state.failure_count = state.failure_count.saturating_add(1);
        state.last_failure_at = Some(Instant::now());

        if !state.circuit_open && state.failure_count >= self.config.failure_threshold {
            state.circuit_open = true;
            let failure_count = state.failure_count;
            drop(state);

            metrics::gauge!("provider_circuit_open", "provider" => provider.as_str()).set(1.0);
            warn!(
                provider = provider.as_str(),
                failure_count,
                reset_window_secs = self.config.reset_window.as_secs(),
                "circuit opened, skipping provider until reset window elapses"
            );
        } else {
            debug!(
                provider = provider.as_str(),
                failure_count = state.failure_count,
                "provider failure recorded"
            );
        }
    }

    /// Record a success for `provider`. Closes the circuit unconditionally.
    pub fn record_success(&self, provider: ProviderId) {
        let mut state = self.slot(provider).lock();
        let was_open = state.circuit_open;
        *state = ProviderHealth::default();
        drop(state);

        if was_open {
            metrics::gauge!("provider_circuit_open", "provider" => provider.as_str()).set(0.0);
            info!(provider = provider.as_str(), "circuit closed after success");
        }
    }

    /// Copy of `provider`'s state after applying the lazy reset.
    pub fn snapshot(&self, provider: ProviderId) -> ProviderHealth {
        let mut state = self.slot(provider).lock();
        self.refresh(provider, &mut state);
        *state
    }

    /// Zero every provider's state.
    pub fn reset(&self) {
        for id in ProviderId::PREFERENCE {
            *self.slot(id).lock() = ProviderHealth::default();
        }
    }

    fn slot(&self, provider: ProviderId) -> &Mutex<ProviderHealth> {
        &self.slots[provider.rank()]
    }

    /// Zero stale counters. Any failure older than the reset window no longer
    /// counts, whether or not the circuit had opened.
    fn refresh(&self, provider: ProviderId, state: &mut ProviderHealth) {
        let Some(last) = state.last_failure_at else {
            return;
        };
        if last.elapsed() < self.config.reset_window {
            return;
        }
        let was_open = state.circuit_open;
        *state = ProviderHealth::default();
        if was_open {
            metrics::gauge!("provider_circuit_open", "provider" => provider.as_str()).set(0.0);
            info!(
                provider = provider.as_str(),
                "reset window elapsed, circuit closed"
            );
        }
    }
}

impl Default for HealthTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HealthTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthTracker")
            .field("failure_threshold", &self.config.failure_threshold)
            .field("reset_window", &self.config.reset_window)
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use fleetscan_logging::capture_logs;
    use tracing::Level;

    use super::*;

    const A: ProviderId = ProviderId::Anthropic;
    const O: ProviderId = ProviderId::OpenAi;

    #[test]
    fn new_provider_is_closed() {
        let tracker = HealthTracker::new();
        assert!(!tracker.is_open(A));
        assert_eq!(tracker.snapshot(A), ProviderHealth::default());
    }

    #[test]
    fn opens_at_threshold() {
        let tracker = HealthTracker::new();
        tracker.record_failure(A);
        tracker.record_failure(A);
        assert!(!tracker.is_open(A));
        tracker.record_failure(A);
        assert!(tracker.is_open(A));
        assert_eq!(tracker.snapshot(A).failure_count, 3);
    }

    #[test]
    fn success_resets_everything() {
        let tracker = HealthTracker::new();
        for _ in 0..5 {
            tracker.record_failure(A);
        }
        assert!(tracker.is_open(A));
        tracker.record_success(A);
        let snap = tracker.snapshot(A);
        assert!(!snap.circuit_open);
        assert_eq!(snap.failure_count, 0);
        assert!(snap.last_failure_at.is_none());
    }

    #[test]
    fn providers_are_independent() {
        let tracker = HealthTracker::new();
        for _ in 0..3 {
            tracker.record_failure(A);
        }
        assert!(tracker.is_open(A));
        assert!(!tracker.is_open(O));
        assert_eq!(tracker.snapshot(O).failure_count, 0);
    }

    #[test]
    fn custom_threshold() {
        let tracker = HealthTracker::with_config(CircuitConfig {
            failure_threshold: 1,
            reset_window: Duration::from_secs(10),
        });
        tracker.record_failure(O);
        assert!(tracker.is_open(O));
    }

    #[test]
    fn zero_threshold_is_raised_to_one() {
        let tracker = HealthTracker::with_config(CircuitConfig {
            failure_threshold: 0,
            reset_window: Duration::from_secs(10),
        });
        assert_eq!(tracker.config().failure_threshold, 1);
        assert!(!tracker.is_open(A));
    }

    #[tokio::test(start_paused = true)]
    async fn lazy_reset_after_window() {
        let tracker = HealthTracker::new();
        for _ in 0..3 {
            tracker.record_failure(A);
        }
        assert!(tracker.is_open(A));

        tokio::time::advance(Duration::from_secs(299)).await;
        assert!(tracker.is_open(A));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(!tracker.is_open(A));
        assert_eq!(tracker.snapshot(A).failure_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_failures_do_not_combine_with_fresh_ones() {
        let tracker = HealthTracker::new();
        tracker.record_failure(A);
        tracker.record_failure(A);

        tokio::time::advance(Duration::from_secs(301)).await;
        tracker.record_failure(A);

        assert!(!tracker.is_open(A));
        assert_eq!(tracker.snapshot(A).failure_count, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn window_measured_from_latest_failure() {
        let tracker = HealthTracker::new();
        for _ in 0..3 {
            tracker.record_failure(A);
        }
        tokio::time::advance(Duration::from_secs(200)).await;
        tracker.record_failure(A);
        tokio::time::advance(Duration::from_secs(200)).await;
        assert!(tracker.is_open(A));
        assert_eq!(tracker.snapshot(A).failure_count, 4);
    }

    #[test]
    fn reset_clears_all() {
        let tracker = HealthTracker::new();
        for _ in 0..3 {
            tracker.record_failure(A);
            tracker.record_failure(O);
        }
        tracker.reset();
        assert!(!tracker.is_open(A));
        assert!(!tracker.is_open(O));
    }

    #[test]
    fn opening_logs_a_warning_once() {
        let (logs, _guard) = capture_logs();
        let tracker = HealthTracker::new();
        for _ in 0..5 {
            tracker.record_failure(O);
        }
        let opened = logs.find("circuit opened");
        assert_eq!(opened.len(), 1);
        assert_eq!(opened[0].level, Level::WARN);
        assert_eq!(opened[0].field("provider"), Some("openai"));
        assert_eq!(opened[0].field("failure_count"), Some("3"));
    }

    #[test]
    fn concurrent_failures_are_not_lost() {
        let tracker = Arc::new(HealthTracker::with_config(CircuitConfig {
            failure_threshold: 1_000,
            reset_window: Duration::from_secs(300),
        }));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tracker = Arc::clone(&tracker);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        tracker.record_failure(A);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(tracker.snapshot(A).failure_count, 400);
    }

    #[test]
    fn is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HealthTracker>();
    }
}
