//! Output validator: allow-lists and cleans the object a model returns.
//!
//! Only whitelisted keys survive. Each surviving value is cleaned according
//! to its JSON type; anything that fails its rule is dropped silently rather
//! than reported, because a partially filled record is still useful to the
//! review screen.

use std::collections::BTreeSet;

use fleetscan_core::{ExtractionKind, SanitizationLimits};
use serde_json::{Map, Number, Value};

use crate::fields::{sanitize_amount, sanitize_description, sanitize_vendor_name};

/// Line-item arrays are cut to this many entries.
pub const MAX_LINE_ITEMS: usize = 50;

/// Longest key accepted inside a confidence map.
const MAX_CONFIDENCE_KEY: usize = 64;

/// Field names accepted for one extraction call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllowedFieldSet {
    fields: BTreeSet<String>,
}

impl AllowedFieldSet {
    /// A custom whitelist.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Fields accepted for receipts.
    pub fn receipt() -> Self {
        Self::new([
            "vendor",
            "date",
            "total",
            "subtotal",
            "tax",
            "category",
            "gallons",
            "price_per_gallon",
            "fuel_type",
            "state",
            "city",
            "payment_method",
            "description",
            "is_fuel",
            "line_items",
            "confidence",
        ])
    }

    /// Fields accepted for settlement statements.
    pub fn settlement() -> Self {
        Self::new([
            "carrier",
            "settlement_date",
            "period_start",
            "period_end",
            "gross_pay",
            "total_deductions",
            "net_pay",
            "miles",
            "load_count",
            "deductions",
            "confidence",
        ])
    }

    /// Default whitelist for a document kind.
    pub fn for_kind(kind: ExtractionKind) -> Self {
        match kind {
            ExtractionKind::Receipt => Self::receipt(),
            ExtractionKind::Settlement => Self::settlement(),
        }
    }

    /// Whether `field` is accepted.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains(field)
    }

    /// Accepted field names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }

    /// Number of accepted fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the set accepts nothing.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Validate `raw` against `allowed` with default field ceilings.
pub fn validate_output(raw: &Map<String, Value>, allowed: &AllowedFieldSet) -> Map<String, Value> {
    validate_output_with(raw, allowed, &SanitizationLimits::default())
}

/// Validate `raw` against `allowed`.
///
/// Per JSON type of each whitelisted value:
/// - string: vendor-name sanitizer, dropped if empty
/// - number: finite, non-negative and below one billion
/// - boolean: unchanged
/// - object: confidence map, entries in `[0, 1]` rounded to two decimals
/// - array: line items, first [`MAX_LINE_ITEMS`] objects reshaped to
///   `{description, amount}`
/// - null: dropped
pub fn validate_output_with(
    raw: &Map<String, Value>,
    allowed: &AllowedFieldSet,
    limits: &SanitizationLimits,
) -> Map<String, Value> {
    let mut out = Map::new();
    for (key, value) in raw {
        if !allowed.contains(key) {
            continue;
        }
        let cleaned = match value {
            Value::String(s) => sanitize_vendor_name(s, limits.vendor_name).map(Value::String),
            Value::Number(_) => sanitize_amount(value).map(Value::Number),
            Value::Bool(b) => Some(Value::Bool(*b)),
            Value::Object(scores) => Some(Value::Object(confidence_map(scores))),
            Value::Array(items) => Some(Value::Array(line_items(items, limits))),
            Value::Null => None,
        };
        if let Some(v) = cleaned {
            let _ = out.insert(key.clone(), v);
        }
    }
    out
}

fn confidence_map(scores: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    for (key, value) in scores {
        if !is_confidence_key(key) {
            continue;
        }
        let Some(score) = value.as_f64() else {
            continue;
        };
        if !(0.0..=1.0).contains(&score) {
            continue;
        }
        let rounded = (score * 100.0).round() / 100.0;
        if let Some(n) = Number::from_f64(rounded) {
            let _ = out.insert(key.clone(), Value::Number(n));
        }
    }
    out
}

fn is_confidence_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= MAX_CONFIDENCE_KEY
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn line_items(items: &[Value], limits: &SanitizationLimits) -> Vec<Value> {
    items
        .iter()
        .take(MAX_LINE_ITEMS)
        .filter_map(Value::as_object)
        .map(|item| {
            let description = item
                .get("description")
                .and_then(Value::as_str)
                .map(|s| sanitize_description(s, limits.description))
                .unwrap_or_default();
            let mut shaped = Map::new();
            let _ = shaped.insert("description".to_string(), Value::String(description));
            if let Some(amount) = item.get("amount").and_then(sanitize_amount) {
                let _ = shaped.insert("amount".to_string(), Value::Number(amount));
            }
            Value::Object(shaped)
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
