//! `OpenAI` chat completion and embedding adapters.

use std::{fmt, time::Duration};

use async_trait::async_trait;
use futures::stream;
use hyper::header::RETRY_AFTER;
use hyper::{StatusCode, Uri};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::http_client::{HyperClient, JsonResponse, build_https_client, post_json};
use crate::traits::{
    AdapterError, AdapterMetadata, AdapterResult, AdapterStream, EmbeddingAdapter, InferenceChunk,
    InferenceRequest, MessageRole, ModelAdapter, PromptMessage,
};

/// Environment variable holding the API key; resolved by the configuration
/// layer and passed in through [`OpenAiConfig::with_api_key`].
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Embedding model used by the bias evaluation tooling.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";

/// Configuration for the `OpenAI` adapters.
#[derive(Clone)]
pub struct OpenAiConfig {
    api_key: Option<String>,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl OpenAiConfig {
    /// Targets `model` on the public API with a 60 s timeout and no key.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            api_key: None,
            model: model.into(),
            base_url: "https://api.openai.com/".to_owned(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Points the adapters at a compatible endpoint, e.g. a proxy.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] when the URL has no http(s)
    /// scheme or does not parse.
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> AdapterResult<Self> {
        self.base_url = sanitize_base_url(base_url.as_ref())?;
        Ok(self)
    }

    /// Per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the bearer key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Replaces the model identifier, keeping credentials and transport settings.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Returns the configured model identifier.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Returns the sanitized base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> AdapterResult<Uri> {
        format!("{}{path}", self.base_url)
            .parse::<Uri>()
            .map_err(|err| AdapterError::configuration(format!("invalid OpenAI endpoint: {err}")))
    }

    fn require_api_key(&self) -> AdapterResult<String> {
        self.api_key
            .clone()
            .ok_or_else(|| AdapterError::configuration("OpenAI adapter requires an API key"))
    }
}

/// `OpenAI` chat completion adapter that calls the official API over HTTPS.
pub struct OpenAiAdapter {
    client: HyperClient,
    endpoint: Uri,
    metadata: AdapterMetadata,
    api_key: String,
    timeout: Duration,
}

impl fmt::Debug for OpenAiAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiAdapter")
            .field("model", &self.metadata.model())
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl OpenAiAdapter {
    /// Builds a chat adapter; the config's model is the default model.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] without an API key.
    pub fn new(config: OpenAiConfig) -> AdapterResult<Self> {
        let api_key = config.require_api_key()?;
        let endpoint = config.endpoint("v1/chat/completions")?;
        let metadata = AdapterMetadata::new("openai", config.model.clone());
        let client = build_https_client()?;

        Ok(Self {
            client,
            endpoint,
            metadata,
            api_key,
            timeout: config.timeout,
        })
    }

    fn build_request(&self, request: &InferenceRequest) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(request.messages().len() + 1);
        if let Some(system) = request.system_prompt() {
            messages.push(OpenAiMessage {
                role: MessageRole::System.to_string(),
                content: system.to_owned(),
            });
        }
        messages.extend(request.messages().iter().map(map_prompt_message));

        ChatCompletionRequest {
            model: request
                .model()
                .unwrap_or_else(|| self.metadata.model())
                .to_owned(),
            messages,
            temperature: request.temperature(),
            top_p: request.top_p(),
            max_tokens: request.max_output_tokens(),
            stream: false,
        }
    }
}

#[async_trait]
impl ModelAdapter for OpenAiAdapter {
    fn metadata(&self) -> &AdapterMetadata {
        &self.metadata
    }

    async fn infer(&self, request: InferenceRequest) -> AdapterResult<AdapterStream> {
        let payload = self.build_request(&request);
        let body = serde_json::to_vec(&payload).map_err(|err| {
            AdapterError::invalid_request(format!("failed to encode OpenAI request: {err}"))
        })?;

        debug!(
            model = %payload.model,
            messages = payload.messages.len(),
            "sending chat completion request"
        );

        let response = post_json(
            &self.client,
            &self.endpoint,
            &self.api_key,
            body,
            self.timeout,
        )
        .await?;
        let response: ChatCompletionResponse = decode_success(response)?;

        let content = extract_content(response)?;
        debug!(
            model = %payload.model,
            chars = content.len(),
            "chat completion received"
        );

        let stream = stream::once(async move { Ok(InferenceChunk::new(content, true)) });
        Ok(Box::pin(stream))
    }
}

/// `OpenAI` embeddings adapter.
pub struct OpenAiEmbeddingAdapter {
    client: HyperClient,
    endpoint: Uri,
    metadata: AdapterMetadata,
    api_key: String,
    timeout: Duration,
}

impl fmt::Debug for OpenAiEmbeddingAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiEmbeddingAdapter")
            .field("model", &self.metadata.model())
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl OpenAiEmbeddingAdapter {
    /// Constructs an embedding adapter; the config's model is the embedding model.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] without an API key.
    pub fn new(config: OpenAiConfig) -> AdapterResult<Self> {
        let api_key = config.require_api_key()?;
        let endpoint = config.endpoint("v1/embeddings")?;
        let metadata = AdapterMetadata::new("openai", config.model.clone());
        let client = build_https_client()?;

        Ok(Self {
            client,
            endpoint,
            metadata,
            api_key,
            timeout: config.timeout,
        })
    }
}

#[async_trait]
impl EmbeddingAdapter for OpenAiEmbeddingAdapter {
    fn metadata(&self) -> &AdapterMetadata {
        &self.metadata
    }

    async fn embed(&self, input: &str) -> AdapterResult<Vec<f32>> {
        let payload = EmbeddingRequest {
            model: self.metadata.model(),
            input,
        };
        let body = serde_json::to_vec(&payload).map_err(|err| {
            AdapterError::invalid_request(format!("failed to encode embedding request: {err}"))
        })?;

        let response = post_json(
            &self.client,
            &self.endpoint,
            &self.api_key,
            body,
            self.timeout,
        )
        .await?;
        let response: EmbeddingResponse = decode_success(response)?;

        response
            .data
            .into_iter()
            .next()
            .map(|item| item.embedding)
            .ok_or_else(|| AdapterError::response("embedding response contained no data"))
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "max_tokens")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

fn map_prompt_message(message: &PromptMessage) -> OpenAiMessage {
    OpenAiMessage {
        role: message.role().to_string(),
        content: message.content().to_owned(),
    }
}

/// Maps non-success statuses to adapter errors and decodes the body otherwise.
fn decode_success<T>(response: JsonResponse) -> AdapterResult<T>
where
    T: for<'de> Deserialize<'de>,
{
    let JsonResponse {
        status,
        headers,
        body,
    } = response;

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = headers
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        return Err(AdapterError::RateLimited { retry_after });
    }

    if !status.is_success() {
        let reason = String::from_utf8_lossy(&body).to_string();
        return Err(AdapterError::response(format!(
            "OpenAI returned {status}: {reason}"
        )));
    }

    serde_json::from_slice(&body)
        .map_err(|err| AdapterError::response(format!("failed to decode OpenAI response: {err}")))
}

/// Takes the first choice's content; a response without choices is an error.
fn extract_content(response: ChatCompletionResponse) -> AdapterResult<String> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| AdapterError::response("unexpected response format from OpenAI API"))?;

    Ok(choice
        .message
        .and_then(|message| message.content)
        .unwrap_or_default())
}

fn sanitize_base_url(input: &str) -> AdapterResult<String> {
    let mut base = input.trim().to_owned();
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err(AdapterError::configuration(
            "OpenAI base URL must start with http:// or https://",
        ));
    }
    if !base.ends_with('/') {
        base.push('/');
    }
    base.parse::<Uri>()
        .map_err(|err| AdapterError::configuration(format!("invalid OpenAI base URL: {err}")))?;
    Ok(base)
}
