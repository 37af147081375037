//! Typed extraction records.
//!
//! [`ExtractedDocument::from_validated`] is the only way to build one, and it
//! only reads a map that already went through the validator. Fields the model
//! left out (or that failed validation) are `None`.

use std::collections::BTreeMap;

use fleetscan_core::ExtractionKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One entry of a line-item or deduction list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Cleaned description, possibly empty.
    pub description: String,
    /// Amount, when the model gave a valid one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
}

/// Fields read off a fuel or expense receipt.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct ReceiptFields {
    pub vendor: Option<String>,
    pub date: Option<String>,
    pub total: Option<f64>,
    pub subtotal: Option<f64>,
    pub tax: Option<f64>,
    pub category: Option<String>,
    pub gallons: Option<f64>,
    pub price_per_gallon: Option<f64>,
    pub fuel_type: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub payment_method: Option<String>,
    pub description: Option<String>,
    pub is_fuel: Option<bool>,
    pub line_items: Vec<LineItem>,
    pub confidence: BTreeMap<String, f64>,
}

/// Fields read off a carrier settlement statement.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub struct SettlementFields {
    pub carrier: Option<String>,
    pub settlement_date: Option<String>,
    pub period_start: Option<String>,
    pub period_end: Option<String>,
    pub gross_pay: Option<f64>,
    pub total_deductions: Option<f64>,
    pub net_pay: Option<f64>,
    pub miles: Option<f64>,
    pub load_count: Option<u32>,
    pub deductions: Vec<LineItem>,
    pub confidence: BTreeMap<String, f64>,
}

/// A validated, typed extraction result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ExtractedDocument {
    /// Receipt fields.
    Receipt(ReceiptFields),
    /// Settlement fields.
    Settlement(SettlementFields),
}

impl ExtractedDocument {
    /// Build a typed record from validator output.
    pub fn from_validated(kind: ExtractionKind, map: &Map<String, Value>) -> Self {
        let f = Fields(map);
        match kind {
            ExtractionKind::Receipt => Self::Receipt(ReceiptFields {
                vendor: f.string("vendor"),
                date: f.string("date"),
                total: f.number("total"),
                subtotal: f.number("subtotal"),
                tax: f.number("tax"),
                category: f.string("category"),
                gallons: f.number("gallons"),
                price_per_gallon: f.number("price_per_gallon"),
                fuel_type: f.string("fuel_type"),
                state: f.string("state"),
                city: f.string("city"),
                payment_method: f.string("payment_method"),
                description: f.string("description"),
                is_fuel: f.boolean("is_fuel"),
                line_items: f.items("line_items"),
                confidence: f.confidence(),
            }),
            ExtractionKind::Settlement => Self::Settlement(SettlementFields {
                carrier: f.string("carrier"),
                settlement_date: f.string("settlement_date"),
                period_start: f.string("period_start"),
                period_end: f.string("period_end"),
                gross_pay: f.number("gross_pay"),
                total_deductions: f.number("total_deductions"),
                net_pay: f.number("net_pay"),
                miles: f.number("miles"),
                load_count: f.count("load_count"),
                deductions: f.items("deductions"),
                confidence: f.confidence(),
            }),
        }
    }

    /// Document kind.
    pub fn kind(&self) -> ExtractionKind {
        match self {
            Self::Receipt(_) => ExtractionKind::Receipt,
            Self::Settlement(_) => ExtractionKind::Settlement,
        }
    }

    /// Per-field confidence scores.
    pub fn confidence(&self) -> &BTreeMap<String, f64> {
        match self {
            Self::Receipt(r) => &r.confidence,
            Self::Settlement(s) => &s.confidence,
        }
    }
}

struct Fields<'a>(&'a Map<String, Value>);

impl Fields<'_> {
    fn string(&self, key: &str) -> Option<String> {
        self.0.get(key).and_then(Value::as_str).map(str::to_string)
    }

    fn number(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(Value::as_f64)
    }

    fn boolean(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    /// Whole non-negative count. Fractional values are rejected.
    fn count(&self, key: &str) -> Option<u32> {
        let value = self.0.get(key)?;
        if let Some(n) = value.as_u64() {
            return u32::try_from(n).ok();
        }
        let f = value.as_f64()?;
        if f.fract() != 0.0 || f < 0.0 || f > f64::from(u32::MAX) {
            return None;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let whole = f as u32;
        Some(whole)
    }

    fn items(&self, key: &str) -> Vec<LineItem> {
        self.0
            .get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_object)
                    .map(|item| LineItem {
                        description: item
                            .get("description")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                        amount: item.get("amount").and_then(Value::as_f64),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn confidence(&self) -> BTreeMap<String, f64> {
        self.0
            .get("confidence")
            .and_then(Value::as_object)
            .map(|scores| {
                scores
                    .iter()
                    .filter_map(|(k, v)| v.as_f64().map(|score| (k.clone(), score)))
                    .collect()
            })
            .unwrap_or_default()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
