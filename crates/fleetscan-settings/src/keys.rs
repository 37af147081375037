//! Provider credential discovery.
//!
//! Keys come from the environment only. The `FLEETSCAN_`-prefixed variable
//! wins over the vendor's conventional name so a deployment can pin a key
//! without clobbering a developer's shell.

use fleetscan_core::{ApiKey, ProviderId};

/// Environment variables consulted for a provider, highest priority first.
pub fn api_key_env_vars(id: ProviderId) -> [&'static str; 2] {
    match id {
        ProviderId::Anthropic => ["FLEETSCAN_ANTHROPIC_API_KEY", "ANTHROPIC_API_KEY"],
        ProviderId::OpenAi => ["FLEETSCAN_OPENAI_API_KEY", "OPENAI_API_KEY"],
    }
}

/// Look up the API key for `id` in the process environment.
pub fn resolve_api_key(id: ProviderId) -> Option<ApiKey> {
    resolve_api_key_with(id, |name| std::env::var(name).ok())
}

/// Look up the API key for `id` through an arbitrary lookup function.
///
/// Blank values are treated as absent and fall through to the next name.
pub fn resolve_api_key_with<F>(id: ProviderId, lookup: F) -> Option<ApiKey>
where
    F: Fn(&str) -> Option<String>,
{
    api_key_env_vars(id)
        .iter()
        .find_map(|name| lookup(name).and_then(ApiKey::new))
}
