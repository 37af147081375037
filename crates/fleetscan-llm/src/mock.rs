//! Scripted provider for deterministic tests without network calls.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use fleetscan_core::ProviderId;
use parking_lot::Mutex;

use crate::error_parsing::error_for_status;
use crate::provider::{ExtractionProvider, ProviderCall, ProviderError, ProviderResult};

/// One pre-programmed reply.
#[derive(Clone, Debug)]
pub enum MockReply {
    /// Return this text as the model's answer.
    Text(String),
    /// Fail as if the provider answered with this status and body.
    Status(u16, String),
    /// Fail with a response of the wrong shape.
    Malformed,
    /// Wait, then produce the inner reply.
    Delay(Duration, Box<MockReply>),
}

impl MockReply {
    /// A text reply containing `value` serialized as JSON.
    pub fn json(value: &serde_json::Value) -> Self {
        Self::Text(value.to_string())
    }

    /// Wrap any reply with a delay.
    pub fn delayed(delay: Duration, inner: MockReply) -> Self {
        Self::Delay(delay, Box::new(inner))
    }
}

/// What the mock was asked, for assertions.
#[derive(Clone, Debug)]
pub struct RecordedCall {
    /// Prompt text received.
    pub prompt: String,
    /// Attachment content type received.
    pub content_type: String,
    /// Length of the base64 attachment.
    pub image_base64_len: usize,
}

/// Provider that returns pre-programmed replies in sequence.
pub struct MockProvider {
    id: ProviderId,
    replies: Vec<MockReply>,
    repeat_last: bool,
    call_count: AtomicUsize,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockProvider {
    /// Replies are consumed in order; calls past the end fail.
    pub fn new(id: ProviderId, replies: Vec<MockReply>) -> Self {
        Self {
            id,
            replies,
            repeat_last: false,
            call_count: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call gets the same reply.
    pub fn always(id: ProviderId, reply: MockReply) -> Self {
        Self {
            repeat_last: true,
            ..Self::new(id, vec![reply])
        }
    }

    /// Number of `complete` calls so far.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Calls received so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    fn reply_for(&self, idx: usize) -> Option<MockReply> {
        if self.repeat_last {
            return self.replies.last().cloned();
        }
        self.replies.get(idx).cloned()
    }
}

#[async_trait]
impl ExtractionProvider for MockProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, call: &ProviderCall<'_>) -> ProviderResult<String> {
        let idx = self.call_count.fetch_add(1, Ordering::Relaxed);
        self.calls.lock().push(RecordedCall {
            prompt: call.prompt.to_string(),
            content_type: call.content_type.to_string(),
            image_base64_len: call.image_base64.len(),
        });

        let Some(mut reply) = self.reply_for(idx) else {
            return Err(ProviderError::Other {
                message: format!("MockProvider: no reply configured for call {idx}"),
            });
        };

        loop {
            match reply {
                MockReply::Text(text) => return Ok(text),
                MockReply::Status(status, body) => return Err(error_for_status(status, &body)),
                MockReply::Malformed => {
                    return Err(ProviderError::MalformedResponse {
                        message: "mock malformed response".to_string(),
                    });
                }
                MockReply::Delay(duration, inner) => {
                    tokio::time::sleep(duration).await;
                    reply = *inner;
                }
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
