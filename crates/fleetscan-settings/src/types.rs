//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase", default)]` so a partial
//! JSON file only needs the keys it changes.

use std::time::Duration;

use fleetscan_core::{ProviderId, SanitizationLimits};
use serde::{Deserialize, Serialize};

/// Root settings type.
///
/// ```json
/// {
///   "providers": { "openai": { "model": "gpt-4o-mini" } },
///   "circuit": { "failureThreshold": 5 },
///   "gateway": { "deadlineMs": 45000 }
/// }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GatewaySettings {
    /// Per-provider endpoint settings.
    pub providers: ProviderSettings,
    /// Circuit breaker thresholds.
    pub circuit: CircuitSettings,
    /// Sanitization length ceilings.
    pub limits: SanitizationLimits,
    /// Whole-request timing.
    pub gateway: GatewayTimingSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

/// Endpoint settings for every provider.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderSettings {
    /// Anthropic Messages API.
    pub anthropic: ProviderEndpointSettings,
    /// `OpenAI` Chat Completions API.
    pub openai: ProviderEndpointSettings,
}

impl ProviderSettings {
    /// Settings for a given provider.
    pub fn get(&self, id: ProviderId) -> &ProviderEndpointSettings {
        match id {
            ProviderId::Anthropic => &self.anthropic,
            ProviderId::OpenAi => &self.openai,
        }
    }

    /// Mutable settings for a given provider.
    pub fn get_mut(&mut self, id: ProviderId) -> &mut ProviderEndpointSettings {
        match id {
            ProviderId::Anthropic => &mut self.anthropic,
            ProviderId::OpenAi => &mut self.openai,
        }
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            anthropic: ProviderEndpointSettings {
                model: "claude-sonnet-4-5".to_string(),
                base_url: "https://api.anthropic.com".to_string(),
                ..ProviderEndpointSettings::default()
            },
            openai: ProviderEndpointSettings {
                model: "gpt-4o".to_string(),
                base_url: "https://api.openai.com".to_string(),
                ..ProviderEndpointSettings::default()
            },
        }
    }
}

/// One provider's endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderEndpointSettings {
    /// Model identifier sent in the request body.
    pub model: String,
    /// Base URL without trailing path, e.g. `https://api.anthropic.com`.
    pub base_url: String,
    /// Output token cap for one extraction.
    pub max_tokens: u32,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// TCP connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
}

impl ProviderEndpointSettings {
    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Connect timeout.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for ProviderEndpointSettings {
    fn default() -> Self {
        Self {
            model: String::new(),
            base_url: String::new(),
            max_tokens: 2_048,
            timeout_ms: 30_000,
            connect_timeout_ms: 5_000,
        }
    }
}

/// Circuit breaker settings.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CircuitSettings {
    /// Consecutive counted failures that open a circuit.
    pub failure_threshold: u32,
    /// Seconds after the last failure before an open circuit reads as closed.
    pub reset_window_secs: u64,
}

impl CircuitSettings {
    /// Reset window as a [`Duration`].
    pub fn reset_window(&self) -> Duration {
        Duration::from_secs(self.reset_window_secs)
    }
}

impl Default for CircuitSettings {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            reset_window_secs: 300,
        }
    }
}

/// Whole-request timing.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GatewayTimingSettings {
    /// Overall deadline for one extraction across all providers. `None` or
    /// `0` disables it; each adapter still has its own request timeout.
    pub deadline_ms: Option<u64>,
}

impl GatewayTimingSettings {
    /// Deadline as a [`Duration`].
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_ms.filter(|ms| *ms > 0).map(Duration::from_millis)
    }
}

impl Default for GatewayTimingSettings {
    fn default() -> Self {
        Self {
            deadline_ms: Some(90_000),
        }
    }
}

/// Logging settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of compact text.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
        }
    }
}
