//! Anthropic Messages API adapter (primary provider).
//!
//! Sends a single user turn holding the attachment and the instruction text:
//!
//! ```json
//! {"model": "...", "max_tokens": 2048, "messages": [{"role": "user", "content": [
//!   {"type": "image", "source": {"type": "base64", "media_type": "image/jpeg", "data": "..."}},
//!   {"type": "text", "text": "..."}
//! ]}]}
//! ```
//!
//! PDFs go in a `document` block instead of `image`. The reply text is the
//! concatenation of every `text` content block.

use async_trait::async_trait;
use fleetscan_core::ProviderId;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::http::{build_client, send};
use crate::provider::{
    ExtractionProvider, ProviderCall, ProviderConfig, ProviderError, ProviderResult,
};

/// `anthropic-version` header value.
pub const API_VERSION: &str = "2023-06-01";

/// Messages endpoint path.
const MESSAGES_PATH: &str = "/v1/messages";

// ─────────────────────────────────────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [UserTurn<'a>; 1],
}

#[derive(Serialize)]
struct UserTurn<'a> {
    role: &'static str,
    content: [ContentBlock<'a>; 2],
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock<'a> {
    Image { source: Base64Source<'a> },
    Document { source: Base64Source<'a> },
    Text { text: &'a str },
}

#[derive(Serialize)]
struct Base64Source<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    media_type: &'a str,
    data: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
}

#[derive(Deserialize)]
struct ResponseBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Provider
// ─────────────────────────────────────────────────────────────────────────────

/// Adapter for the Anthropic Messages API.
pub struct AnthropicProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl AnthropicProvider {
    /// Build the adapter and its HTTP client.
    pub fn new(config: ProviderConfig) -> ProviderResult<Self> {
        let client = build_client(&config)?;
        Ok(Self { config, client })
    }

    fn build_request<'a>(&'a self, call: &ProviderCall<'a>) -> MessagesRequest<'a> {
        let source = Base64Source {
            kind: "base64",
            media_type: call.content_type,
            data: call.image_base64,
        };
        let attachment = if call.is_pdf() {
            ContentBlock::Document { source }
        } else {
            ContentBlock::Image { source }
        };
        MessagesRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            messages: [UserTurn {
                role: "user",
                content: [attachment, ContentBlock::Text { text: call.prompt }],
            }],
        }
    }
}

fn response_text(body: &str) -> ProviderResult<String> {
    let parsed: MessagesResponse = serde_json::from_str(body)?;
    let text: String = parsed
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect();
    if text.is_empty() {
        return Err(ProviderError::MalformedResponse {
            message: "response carried no text content".to_string(),
        });
    }
    Ok(text)
}

#[async_trait]
impl ExtractionProvider for AnthropicProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Anthropic
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, call: &ProviderCall<'_>) -> ProviderResult<String> {
        let request = self.build_request(call);
        debug!(
            model = %self.config.model,
            prompt_len = call.prompt.len(),
            attachment = if call.is_pdf() { "document" } else { "image" },
            "sending Anthropic messages request"
        );

        let body = send(
            self.client
                .post(self.config.endpoint(MESSAGES_PATH))
                .header("x-api-key", self.config.api_key.expose())
                .header("anthropic-version", API_VERSION)
                .json(&request),
        )
        .await?;

        response_text(&body)
    }
}

impl std::fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("model", &self.config.model)
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
