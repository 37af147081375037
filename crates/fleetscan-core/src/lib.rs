//! # fleetscan-core
//!
//! Shared vocabulary for the document extraction gateway.
//!
//! Every other crate in the workspace speaks in these types:
//! - [`ProviderId`] names a backing multimodal provider and fixes the
//!   preference order used for fallback
//! - [`ExtractionRequest`] / [`ExtractionOutcome`] are the uniform shapes an
//!   adapter consumes and produces
//! - [`SanitizationLimits`] holds the per-content-class length ceilings
//! - [`ApiKey`] wraps provider credentials so they never reach a log line

#![deny(unsafe_code)]

pub mod extraction;
pub mod limits;
pub mod provider;
pub mod security;

pub use extraction::{ExtractionKind, ExtractionOutcome, ExtractionRequest, FailureKind};
pub use limits::{ContentClass, SanitizationLimits};
pub use provider::ProviderId;
pub use security::ApiKey;
