//! `OpenAI` Chat Completions adapter (secondary provider).
//!
//! One user message with a text part and the attachment as a data URL, and
//! `response_format` set to `json_object`. PDFs are sent as a `file` part.
//! The reply text is `choices[0].message.content`.

use async_trait::async_trait;
use fleetscan_core::ProviderId;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::http::{build_client, send};
use crate::provider::{
    ExtractionProvider, ProviderCall, ProviderConfig, ProviderError, ProviderResult,
};

/// Chat Completions endpoint path.
const CHAT_PATH: &str = "/v1/chat/completions";

/// File name attached to PDF parts.
const PDF_FILENAME: &str = "document.pdf";

// ─────────────────────────────────────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    response_format: ResponseFormat,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: [ChatPart<'a>; 2],
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ChatPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
    File { file: FileData },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Serialize)]
struct FileData {
    filename: &'static str,
    file_data: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Provider
// ─────────────────────────────────────────────────────────────────────────────

/// Adapter for the `OpenAI` Chat Completions API.
pub struct OpenAIProvider {
    config: ProviderConfig,
    client: reqwest::Client,
}

impl OpenAIProvider {
    /// Build the adapter and its HTTP client.
    pub fn new(config: ProviderConfig) -> ProviderResult<Self> {
        let client = build_client(&config)?;
        Ok(Self { config, client })
    }

    fn build_request<'a>(&'a self, call: &ProviderCall<'a>) -> ChatRequest<'a> {
        let data_url = format!("data:{};base64,{}", call.content_type, call.image_base64);
        let attachment = if call.is_pdf() {
            ChatPart::File {
                file: FileData {
                    filename: PDF_FILENAME,
                    file_data: data_url,
                },
            }
        } else {
            ChatPart::ImageUrl {
                image_url: ImageUrl { url: data_url },
            }
        };
        ChatRequest {
            model: &self.config.model,
            max_tokens: self.config.max_tokens,
            response_format: ResponseFormat {
                kind: "json_object",
            },
            messages: [ChatMessage {
                role: "user",
                content: [ChatPart::Text { text: call.prompt }, attachment],
            }],
        }
    }
}

fn response_text(body: &str) -> ProviderResult<String> {
    let parsed: ChatResponse = serde_json::from_str(body)?;
    let Some(choice) = parsed.choices.into_iter().next() else {
        return Err(ProviderError::MalformedResponse {
            message: "response carried no choices".to_string(),
        });
    };
    match choice.message.content {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ if choice.message.refusal.is_some() => Err(ProviderError::MalformedResponse {
            message: "model refused the request".to_string(),
        }),
        _ => Err(ProviderError::MalformedResponse {
            message: "response carried no message content".to_string(),
        }),
    }
}

#[async_trait]
impl ExtractionProvider for OpenAIProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenAi
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, call: &ProviderCall<'_>) -> ProviderResult<String> {
        let request = self.build_request(call);
        debug!(
            model = %self.config.model,
            prompt_len = call.prompt.len(),
            "sending OpenAI chat completion request"
        );

        let body = send(
            self.client
                .post(self.config.endpoint(CHAT_PATH))
                .bearer_auth(self.config.api_key.expose())
                .json(&request),
        )
        .await?;

        response_text(&body)
    }
}

impl std::fmt::Debug for OpenAIProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIProvider")
            .field("model", &self.config.model)
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
