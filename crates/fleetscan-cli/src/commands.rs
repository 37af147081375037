//! Subcommand bodies, kept apart from argument parsing so they can be tested.

use std::path::Path;

use anyhow::{Context, Result, bail};
use fleetscan_core::{ContentClass, ExtractionKind, SanitizationLimits};
use fleetscan_gateway::{DocumentInput, ExtractionGateway};
use fleetscan_guardrails::{injection_findings, sanitize_for_prompt};
use serde::Serialize;

/// MIME type for an attachment, from its file extension.
pub fn content_type_for(path: &Path) -> Result<&'static str> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .with_context(|| format!("cannot infer content type of {}", path.display()))?;
    Ok(match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" => "image/heic",
        "pdf" => "application/pdf",
        other => bail!("unsupported file extension .{other}; pass --content-type"),
    })
}

/// Read the attachment and optional text into a gateway input.
pub fn build_input(
    kind: ExtractionKind,
    image: &Path,
    content_type: Option<&str>,
    text: Option<&Path>,
    text_class: ContentClass,
) -> Result<DocumentInput> {
    let content_type = match content_type {
        Some(ct) => ct.to_string(),
        None => content_type_for(image)?.to_string(),
    };
    let bytes =
        std::fs::read(image).with_context(|| format!("failed to read {}", image.display()))?;
    let mut input = DocumentInput::new(kind, bytes, content_type);
    if let Some(path) = text {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        input = input.with_text(text, text_class);
    }
    Ok(input)
}

/// What `scan` prints. Never includes the text itself.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ScanReport {
    /// Input length in bytes.
    pub length: usize,
    /// Whether any injection rule matched.
    pub injection_detected: bool,
    /// Ids of the rules that matched.
    pub findings: Vec<&'static str>,
    /// Length in bytes after sanitization.
    pub sanitized_length: usize,
}

/// Run the input sanitizer over `text` without calling any provider.
pub fn scan(text: &str, class: ContentClass, limits: &SanitizationLimits) -> ScanReport {
    let findings = injection_findings(text);
    ScanReport {
        length: text.len(),
        injection_detected: !findings.is_empty(),
        findings,
        sanitized_length: sanitize_for_prompt(Some(text), class, limits).len(),
    }
}

/// One row of `providers` output.
#[derive(Debug, Serialize)]
pub struct ProviderStatus {
    /// Provider id.
    pub provider: &'static str,
    /// Configured model.
    pub model: String,
    /// Position in the next extraction's plan, if it would be tried.
    pub next_attempt: Option<usize>,
    /// Counted failures.
    pub failure_count: u32,
    /// Whether the circuit is open.
    pub circuit_open: bool,
}

/// Status of every configured provider.
pub fn providers(gateway: &ExtractionGateway) -> Vec<ProviderStatus> {
    let orchestrator = gateway.orchestrator();
    let plan = orchestrator.candidates();
    orchestrator
        .providers()
        .iter()
        .map(|p| {
            let id = p.id();
            let health = gateway.health().snapshot(id);
            ProviderStatus {
                provider: id.as_str(),
                model: p.model().to_string(),
                next_attempt: plan.iter().position(|c| *c == id),
                failure_count: health.failure_count,
                circuit_open: health.circuit_open,
            }
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
