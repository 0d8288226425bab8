//! Provider-neutral completion and embedding interfaces.
//!
//! Guardrail validation and the evaluators only see these types, so tests can
//! swap the HTTP adapters for in-process doubles.

use std::fmt;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result of an adapter call.
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Chunks produced by [`ModelAdapter::infer`].
pub type AdapterStream = Pin<Box<dyn Stream<Item = AdapterResult<InferenceChunk>> + Send>>;

/// Failure talking to a completion or embedding backend.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Credentials or endpoint settings are missing or unusable.
    #[error("adapter misconfigured: {reason}")]
    Configuration {
        /// What is wrong with the configuration.
        reason: String,
    },

    /// The request was rejected before it was sent.
    #[error("invalid request: {reason}")]
    InvalidRequest {
        /// Why the request was rejected.
        reason: String,
    },

    /// The backend could not be reached or the connection broke.
    #[error("transport failure: {reason}")]
    Transport {
        /// Underlying network or TLS error.
        reason: String,
    },

    /// HTTP 429 from the backend.
    #[error("rate limited by provider (retry after {retry_after:?})")]
    RateLimited {
        /// Parsed `Retry-After` header, when present.
        retry_after: Option<Duration>,
    },

    /// The provider returned an error status or a malformed response.
    #[error("unexpected provider response: {reason}")]
    Response {
        /// Status and body summary.
        reason: String,
    },
}

impl AdapterError {
    /// Builds [`Self::InvalidRequest`].
    #[must_use]
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Builds [`Self::Configuration`].
    #[must_use]
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Builds [`Self::Transport`].
    #[must_use]
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }

    /// Builds [`Self::Response`].
    #[must_use]
    pub fn response(reason: impl Into<String>) -> Self {
        Self::Response {
            reason: reason.into(),
        }
    }
}

/// Which backend and model an adapter talks to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdapterMetadata {
    provider: &'static str,
    model: String,
}

impl AdapterMetadata {
    /// Describes an adapter for `provider` defaulting to `model`.
    #[must_use]
    pub fn new(provider: &'static str, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Backend identifier, e.g. `openai`.
    #[must_use]
    pub const fn provider(&self) -> &'static str {
        self.provider
    }

    /// Model used when a request does not override it.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Author of a chat message.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Instructions for the model.
    System,
    /// End-user input.
    User,
    /// Earlier model output.
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        })
    }
}

/// One turn of a chat exchange.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct PromptMessage {
    role: MessageRole,
    content: String,
}

impl PromptMessage {
    /// Creates a message authored by `role`.
    #[must_use]
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Author of the message.
    #[must_use]
    pub const fn role(&self) -> MessageRole {
        self.role
    }

    /// Message text.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }
}

/// A chat completion request with optional sampling overrides.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct InferenceRequest {
    /// Optional system prompt, sent ahead of the conversation messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    system_prompt: Option<String>,
    /// Conversation messages (user, assistant).
    messages: Vec<PromptMessage>,
    /// Model identifier overriding the adapter's configured default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

impl InferenceRequest {
    /// Starts a request from the conversation so far.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::InvalidRequest`] if the message list is empty.
    pub fn new(messages: Vec<PromptMessage>) -> AdapterResult<Self> {
        if messages.is_empty() {
            return Err(AdapterError::invalid_request(
                "a completion request needs at least one message",
            ));
        }

        Ok(Self {
            system_prompt: None,
            messages,
            model: None,
            max_output_tokens: None,
            temperature: None,
            top_p: None,
        })
    }

    /// Sends `prompt` as a leading system message.
    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Routes the request to a specific model instead of the adapter default.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Caps the completion length.
    #[must_use]
    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }

    /// Overrides the sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets nucleus sampling (`top_p`).
    #[must_use]
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// System prompt, if any.
    #[must_use]
    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    /// Conversation messages in order.
    #[must_use]
    pub fn messages(&self) -> &[PromptMessage] {
        &self.messages
    }

    /// Returns the model override if one was set.
    #[must_use]
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Completion length cap, if any.
    #[must_use]
    pub const fn max_output_tokens(&self) -> Option<u32> {
        self.max_output_tokens
    }

    /// Temperature override, if any.
    #[must_use]
    pub const fn temperature(&self) -> Option<f32> {
        self.temperature
    }

    /// Returns the configured `top_p`.
    #[must_use]
    pub const fn top_p(&self) -> Option<f32> {
        self.top_p
    }
}

/// Piece of a completion.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct InferenceChunk {
    /// Text appended by this chunk.
    pub delta: String,
    /// Set on the final chunk.
    pub done: bool,
}

impl InferenceChunk {
    /// Creates a new chunk.
    #[must_use]
    pub fn new(delta: impl Into<String>, done: bool) -> Self {
        Self {
            delta: delta.into(),
            done,
        }
    }
}

/// A chat completion backend.
#[async_trait]
pub trait ModelAdapter: Send + Sync {
    /// Backend and default model.
    fn metadata(&self) -> &AdapterMetadata;

    /// Sends `request` and streams the completion back.
    async fn infer(&self, request: InferenceRequest) -> AdapterResult<AdapterStream>;
}

/// A text embedding backend.
#[async_trait]
pub trait EmbeddingAdapter: Send + Sync {
    /// Backend and embedding model.
    fn metadata(&self) -> &AdapterMetadata;

    /// Embeds a single input text.
    async fn embed(&self, input: &str) -> AdapterResult<Vec<f32>>;
}

/// Drains an [`AdapterStream`] into the full response text.
///
/// # Errors
///
/// Propagates the first error yielded by the stream.
pub async fn collect_text(mut stream: AdapterStream) -> AdapterResult<String> {
    let mut text = String::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        text.push_str(&chunk.delta);
        if chunk.done {
            break;
        }
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    #[test]
    fn empty_conversation_is_rejected() {
        let err = InferenceRequest::new(Vec::new()).unwrap_err();
        assert!(matches!(err, AdapterError::InvalidRequest { .. }));
    }

    #[test]
    fn builds_request() {
        let request = InferenceRequest::new(vec![PromptMessage::new(MessageRole::User, "hello")])
            .unwrap()
            .with_model("gpt-4")
            .with_max_output_tokens(500)
            .with_temperature(0.7)
            .with_top_p(0.9);

        assert_eq!(request.messages()[0].role(), MessageRole::User);
        assert_eq!(request.model(), Some("gpt-4"));
        assert_eq!(request.max_output_tokens(), Some(500));
        assert_eq!(request.temperature(), Some(0.7));
        assert_eq!(request.top_p(), Some(0.9));
    }

    #[tokio::test]
    async fn collect_text_joins_chunks_until_done() {
        let chunks = vec![
            Ok(InferenceChunk::new("Hello, ", false)),
            Ok(InferenceChunk::new("world", true)),
            Ok(InferenceChunk::new("ignored", true)),
        ];
        let stream: AdapterStream = Box::pin(stream::iter(chunks));

        assert_eq!(collect_text(stream).await.unwrap(), "Hello, world");
    }

    #[tokio::test]
    async fn collect_text_surfaces_stream_errors() {
        let chunks = vec![
            Ok(InferenceChunk::new("partial", false)),
            Err(AdapterError::transport("connection reset")),
        ];
        let stream: AdapterStream = Box::pin(stream::iter(chunks));

        let err = collect_text(stream).await.expect_err("stream error");
        assert!(matches!(err, AdapterError::Transport { .. }));
    }
}
