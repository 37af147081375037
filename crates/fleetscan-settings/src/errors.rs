//! Settings error types.

use std::path::PathBuf;

use thiserror::Error;

/// Why settings could not be loaded.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file exists but could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// The settings file is not JSON.
    #[error("{} is not valid JSON: {source}", path.display())]
    Parse {
        /// File that was being parsed.
        path: PathBuf,
        /// Parser position and reason.
        source: serde_json::Error,
    },

    /// The merged layers do not fit the settings schema (wrong type for a key).
    #[error("settings do not match the schema: {0}")]
    Schema(#[from] serde_json::Error),

    /// A value the gateway cannot run with.
    #[error("{key} {requirement}")]
    Invalid {
        /// Dotted camelCase key, e.g. `limits.vendorName`.
        key: String,
        /// What the value must satisfy.
        requirement: &'static str,
    },
}

impl SettingsError {
    pub(crate) fn invalid(key: impl Into<String>, requirement: &'static str) -> Self {
        Self::Invalid {
            key: key.into(),
            requirement,
        }
    }
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
