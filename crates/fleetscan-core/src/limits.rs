//! Length ceilings applied before text reaches a prompt.

use serde::{Deserialize, Serialize};

/// Where a piece of untrusted text came from. Selects its length ceiling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentClass {
    /// Text recognized from a photographed document.
    OcrText,
    /// Text extracted from an uploaded PDF.
    PdfText,
    /// A whole rendered prompt or caller-supplied context block.
    PromptContext,
}

/// Named character ceilings per content class and per extracted field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SanitizationLimits {
    /// OCR text ceiling.
    pub ocr_text: usize,
    /// PDF text ceiling.
    pub pdf_text: usize,
    /// Prompt context ceiling.
    pub prompt_context: usize,
    /// Vendor name field ceiling.
    pub vendor_name: usize,
    /// Free-text description field ceiling.
    pub description: usize,
}

impl SanitizationLimits {
    /// Ceiling for a content class, in characters.
    pub fn for_class(&self, class: ContentClass) -> usize {
        match class {
            ContentClass::OcrText => self.ocr_text,
            ContentClass::PdfText => self.pdf_text,
            ContentClass::PromptContext => self.prompt_context,
        }
    }
}

impl Default for SanitizationLimits {
    fn default() -> Self {
        Self {
            ocr_text: 120_000,
            pdf_text: 120_000,
            prompt_context: 50_000,
            vendor_name: 500,
            description: 2_000,
        }
    }
}
