//! # fleetscan-settings
//!
//! Configuration management with layered sources.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`GatewaySettings::default()`]
//! 2. **User file**: `~/.fleetscan/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `FLEETSCAN_*` overrides (highest priority)
//!
//! API keys are never read from the settings file. [`resolve_api_key`] looks
//! them up in the environment on demand; presence of a key is what makes a
//! provider eligible.

#![deny(unsafe_code)]

pub mod errors;
pub mod keys;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use keys::{api_key_env_vars, resolve_api_key, resolve_api_key_with};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
