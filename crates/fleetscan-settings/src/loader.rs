//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`GatewaySettings::default()`]
//! 2. If `~/.fleetscan/settings.json` exists, deep-merge user values over defaults
//! 3. Apply environment variable overrides (highest priority)
//! 4. Validate the result
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use fleetscan_core::ProviderId;
use serde_json::Value;
use tracing::debug;

use crate::errors::{Result, SettingsError};
use crate::types::GatewaySettings;

/// Resolve the path to the settings file (`~/.fleetscan/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".fleetscan").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<GatewaySettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON or an out-of-range value, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<GatewaySettings> {
    let mut settings = load_file_layer(path)?;
    apply_env_overrides(&mut settings);
    validate(&settings)?;
    Ok(settings)
}

/// Defaults merged with the file at `path`, without env overrides.
pub fn load_file_layer(path: &Path) -> Result<GatewaySettings> {
    let defaults = serde_json::to_value(GatewaySettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let user: Value = serde_json::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Reject settings the gateway cannot run with.
pub fn validate(settings: &GatewaySettings) -> Result<()> {
    const AT_LEAST_ONE: &str = "must be at least 1";

    if settings.circuit.failure_threshold == 0 {
        return Err(SettingsError::invalid("circuit.failureThreshold", AT_LEAST_ONE));
    }
    if settings.circuit.reset_window_secs == 0 {
        return Err(SettingsError::invalid("circuit.resetWindowSecs", AT_LEAST_ONE));
    }
    for id in ProviderId::PREFERENCE {
        let endpoint = settings.providers.get(id);
        if endpoint.base_url.trim().is_empty() {
            return Err(SettingsError::invalid(
                format!("providers.{id}.baseUrl"),
                "must not be empty",
            ));
        }
        if endpoint.timeout_ms == 0 {
            return Err(SettingsError::invalid(
                format!("providers.{id}.timeoutMs"),
                AT_LEAST_ONE,
            ));
        }
    }
    let limits = &settings.limits;
    for (key, value) in [
        ("limits.ocrText", limits.ocr_text),
        ("limits.pdfText", limits.pdf_text),
        ("limits.promptContext", limits.prompt_context),
        ("limits.vendorName", limits.vendor_name),
        ("limits.description", limits.description),
    ] {
        if value == 0 {
            return Err(SettingsError::invalid(key, AT_LEAST_ONE));
        }
    }
    Ok(())
}

/// Apply environment variable overrides to loaded settings.
///
/// Invalid values are ignored with a warning (fall back to file/default).
pub fn apply_env_overrides(settings: &mut GatewaySettings) {
    apply_overrides_with(settings, |name| std::env::var(name).ok());
}

/// Apply overrides through an arbitrary lookup function.
pub fn apply_overrides_with<F>(settings: &mut GatewaySettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    // ── Circuit ─────────────────────────────────────────────────────
    if let Some(v) = read_u64(&lookup, "FLEETSCAN_CIRCUIT_THRESHOLD", 1, 100) {
        settings.circuit.failure_threshold = u32::try_from(v).unwrap_or(u32::MAX);
    }
    if let Some(v) = read_u64(&lookup, "FLEETSCAN_CIRCUIT_RESET_SECS", 1, 86_400) {
        settings.circuit.reset_window_secs = v;
    }

    // ── Gateway ─────────────────────────────────────────────────────
    if let Some(v) = read_u64(&lookup, "FLEETSCAN_DEADLINE_MS", 100, 600_000) {
        settings.gateway.deadline_ms = Some(v);
    }
    if let Some(v) = read_string(&lookup, "FLEETSCAN_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = read_bool(&lookup, "FLEETSCAN_LOG_JSON") {
        settings.logging.json = v;
    }

    // ── Providers ───────────────────────────────────────────────────
    for id in ProviderId::PREFERENCE {
        let prefix = id.as_str().to_ascii_uppercase();
        let endpoint = settings.providers.get_mut(id);
        if let Some(v) = read_string(&lookup, &format!("FLEETSCAN_{prefix}_MODEL")) {
            endpoint.model = v;
        }
        if let Some(v) = read_string(&lookup, &format!("FLEETSCAN_{prefix}_BASE_URL")) {
            endpoint.base_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = read_u64(&lookup, &format!("FLEETSCAN_{prefix}_TIMEOUT_MS"), 100, 600_000)
        {
            endpoint.timeout_ms = v;
        }
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

fn read_string<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).filter(|v| !v.trim().is_empty())
}

fn read_bool<F>(lookup: &F, name: &str) -> Option<bool>
where
    F: Fn(&str) -> Option<String>,
{
    let val = lookup(name)?;
    let result = parse_bool(&val);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid boolean env var, ignoring");
    }
    result
}

fn read_u64<F>(lookup: &F, name: &str, min: u64, max: u64) -> Option<u64>
where
    F: Fn(&str) -> Option<String>,
{
    let val = lookup(name)?;
    let result = parse_u64_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, min, max, "invalid u64 env var, ignoring");
    }
    result
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
