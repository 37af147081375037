//! # fleetscan-guardrails
//!
//! Defenses on both sides of a model call.
//!
//! - **Input** ([`sanitize`], [`injection`]): text copied off a photographed
//!   document is cleaned before it is embedded in a prompt. Control characters
//!   are stripped, known prompt-injection shapes are replaced with inert
//!   markers, code fences are collapsed and length is capped per content class.
//! - **Output** ([`validator`], [`records`]): the object a model hands back is
//!   allow-listed field by field and only then converted into a typed record.
//!
//! Adversarial content is never an error. It is neutralized in place and
//! surfaced only as a boolean flag plus rule ids.

#![deny(unsafe_code)]

pub mod fields;
pub mod injection;
pub mod records;
pub mod sanitize;
pub mod validator;

pub use fields::{sanitize_amount, sanitize_description, sanitize_vendor_name, strip_control_chars};
pub use injection::{contains_injection_attempt, injection_findings, neutralize_injections};
pub use records::{ExtractedDocument, LineItem, ReceiptFields, SettlementFields};
pub use sanitize::{TRUNCATION_MARKER, cap_length, sanitize_for_prompt};
pub use validator::{AllowedFieldSet, MAX_LINE_ITEMS, validate_output, validate_output_with};
