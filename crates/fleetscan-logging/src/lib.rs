//! # fleetscan-logging
//!
//! Structured logging with `tracing`.
//!
//! This crate provides:
//! - [`init_subscriber`] for installing the process-wide stderr subscriber
//! - [`redact::describe`] for rendering payloads by shape and length only
//! - [`capture_logs`] for asserting on emitted events in tests
//!
//! Document text never appears in logs. Library code logs lengths, provider
//! ids, error kinds and timings; anything payload-shaped goes through
//! [`redact::describe`] first.

#![deny(unsafe_code)]

pub mod redact;
pub mod test_utils;

pub use redact::describe;
pub use test_utils::{CapturedEvent, CapturedLogs, capture_logs};

/// Initialize the global tracing subscriber with stderr output.
///
/// Call once at application startup. Subsequent calls are no-ops.
/// `RUST_LOG` takes precedence over `level` when set.
///
/// # Arguments
///
/// * `level` - Minimum log level to display, e.g. `"warn"` or
///   `"fleetscan_llm=debug,info"`.
pub fn init_subscriber(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();

    // set_global_default fails if already set
    let _ = subscriber.try_init();
}

/// Like [`init_subscriber`] but emits one JSON object per event.
pub fn init_json_subscriber(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .json();

    let _ = subscriber.try_init();
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
