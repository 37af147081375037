//! Provider identity.

use serde::{Deserialize, Serialize};

/// A backing multimodal completion service.
///
/// The set is closed and stable for the lifetime of the process. Declaration
/// order is preference order: the first variant is the primary provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    /// Anthropic Messages API (primary).
    Anthropic,
    /// `OpenAI` Chat Completions API (secondary).
    #[serde(rename = "openai")]
    OpenAi,
}

impl ProviderId {
    /// All providers in fixed preference order, primary first.
    pub const PREFERENCE: [Self; 2] = [Self::Anthropic, Self::OpenAi];

    /// The provider that gets a forced probe when every circuit is open.
    pub const PRIMARY: Self = Self::Anthropic;

    /// Stable lowercase identifier used in logs, metrics and settings keys.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
        }
    }

    /// Whether this is the primary provider.
    pub fn is_primary(self) -> bool {
        self == Self::PRIMARY
    }

    /// Position in the preference order (0 = most preferred).
    pub fn rank(self) -> usize {
        match self {
            Self::Anthropic => 0,
            Self::OpenAi => 1,
        }
    }

    /// Parse a provider name, accepting a few common spellings.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "anthropic" | "claude" => Some(Self::Anthropic),
            "openai" | "open-ai" | "open_ai" => Some(Self::OpenAi),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
