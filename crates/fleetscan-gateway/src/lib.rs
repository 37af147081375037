//! # fleetscan-gateway
//!
//! Defensive extraction of receipt and settlement fields from photographed
//! documents.
//!
//! [`ExtractionGateway::extract`] runs the whole path for one document:
//! injection detection and sanitization of any recognized text, prompt
//! rendering, fallback across providers under an optional overall deadline,
//! then whitelist validation into a typed [`ExtractedDocument`]. Callers get
//! an [`ExtractionReport`] whether or not anything succeeded.

#![deny(unsafe_code)]

pub mod gateway;
pub mod prompts;
pub mod report;

pub use fleetscan_guardrails::{AllowedFieldSet, ExtractedDocument};
pub use gateway::ExtractionGateway;
pub use report::{DocumentInput, ExtractionReport};
