//! # fleetscan-llm
//!
//! Vendor adapters and the machinery that decides which one to call.
//!
//! - [`provider`]: the [`ExtractionProvider`] trait and [`ProviderError`]
//! - [`anthropic`], [`openai`]: one HTTPS round trip each, no retry
//! - [`adapter`]: [`dispatch`] wraps a single call with encoding, timing,
//!   JSON extraction and health bookkeeping
//! - [`health`]: per-provider circuit breaker with lazy reset
//! - [`orchestrator`]: sequential fallback in preference order
//! - [`mock`]: scripted provider for tests

#![deny(unsafe_code)]

pub mod adapter;
pub mod anthropic;
pub mod error_parsing;
pub mod health;
mod http;
pub mod json_span;
pub mod mock;
pub mod openai;
pub mod orchestrator;
pub mod provider;

pub use adapter::dispatch;
pub use anthropic::AnthropicProvider;
pub use health::{CircuitConfig, HealthTracker, ProviderHealth};
pub use json_span::extract_json_object;
pub use openai::OpenAIProvider;
pub use orchestrator::FallbackOrchestrator;
pub use provider::{
    ExtractionProvider, FailureClass, ProviderCall, ProviderConfig, ProviderError, ProviderResult,
};
