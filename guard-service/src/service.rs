//! Completion calls validated against a prompt template.

use std::fmt;
use std::sync::Arc;

use guard_adapters::traits::{
    AdapterError, InferenceRequest, MessageRole, ModelAdapter, PromptMessage, collect_text,
};
use guard_policy::ValidationResult;
use guard_prompts::{PromptTemplate, validate};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::params::{CompletionParams, ServiceConfig};

/// Result alias for service calls.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors returned by [`GuardrailService`].
///
/// Content problems are reported through [`ValidationResult`]; only
/// failures to obtain a completion surface here.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The completion request failed.
    #[error("completion request failed: {source}")]
    Adapter {
        /// Underlying adapter failure.
        #[from]
        source: AdapterError,
    },
}

/// Sends template-driven prompts and validates the answers.
#[derive(Clone)]
pub struct GuardrailService {
    adapter: Arc<dyn ModelAdapter>,
    config: ServiceConfig,
}

impl fmt::Debug for GuardrailService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let metadata = self.adapter.metadata();
        f.debug_struct("GuardrailService")
            .field("provider", &metadata.provider())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl GuardrailService {
    /// Creates a service around `adapter`.
    #[must_use]
    pub fn new(adapter: Arc<dyn ModelAdapter>, config: ServiceConfig) -> Self {
        Self { adapter, config }
    }

    /// Returns the configured defaults.
    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Builds the system + user request for `template` and `input`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Adapter`] if the request cannot be assembled.
    pub fn build_request(
        &self,
        template: &PromptTemplate,
        input: &str,
        params: &CompletionParams,
    ) -> ServiceResult<InferenceRequest> {
        let defaults = self.config.sampling();
        let user_prompt = template.render_user_prompt(input);

        let mut request =
            InferenceRequest::new(vec![PromptMessage::new(MessageRole::User, user_prompt)])?
                .with_system_prompt(template.system_prompt())
                .with_model(
                    params
                        .model
                        .as_deref()
                        .unwrap_or(&self.config.models().default),
                )
                .with_temperature(params.temperature.unwrap_or(defaults.temperature))
                .with_max_output_tokens(params.max_output_tokens.unwrap_or(defaults.max_tokens));

        if let Some(top_p) = params.top_p {
            request = request.with_top_p(top_p);
        }

        Ok(request)
    }

    /// Requests a completion and returns the raw text.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Adapter`] when the call or its stream fails.
    pub async fn complete(
        &self,
        template: &PromptTemplate,
        input: &str,
        params: &CompletionParams,
    ) -> ServiceResult<String> {
        let request = self.build_request(template, input, params)?;
        debug!(
            template = template.name(),
            model = request.model().unwrap_or_default(),
            system_prompt = request.system_prompt().unwrap_or_default(),
            user_prompt = request.messages()[0].content(),
            "sending completion request"
        );

        let result = match self.adapter.infer(request).await {
            Ok(stream) => collect_text(stream).await,
            Err(err) => Err(err),
        };

        match result {
            Ok(text) => {
                debug!(template = template.name(), response = %text, "completion received");
                Ok(text)
            }
            Err(err) => {
                warn!(template = template.name(), error = %err, "completion request failed");
                Err(err.into())
            }
        }
    }

    /// Requests a completion and validates it against `template`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Adapter`] when no completion could be
    /// obtained. Guardrail and schema failures are part of the returned
    /// [`ValidationResult`].
    pub async fn prompt_with_guardrails(
        &self,
        template: &PromptTemplate,
        input: &str,
        params: CompletionParams,
    ) -> ServiceResult<ValidationResult> {
        let response = self.complete(template, input, &params).await?;
        let result = validate(&response, template).await;
        info!(
            template = template.name(),
            valid = result.is_valid(),
            errors = result.errors().len(),
            warnings = result.warnings().len(),
            "response validated"
        );
        Ok(result)
    }

    /// Like [`Self::prompt_with_guardrails`], retrying once with the
    /// fallback model if the first call fails.
    ///
    /// Invalid content never triggers the retry.
    ///
    /// # Errors
    ///
    /// Returns the fallback call's error when both calls fail.
    pub async fn prompt_with_fallback(
        &self,
        template: &PromptTemplate,
        input: &str,
        params: CompletionParams,
    ) -> ServiceResult<ValidationResult> {
        match self
            .prompt_with_guardrails(template, input, params.clone())
            .await
        {
            Ok(result) => Ok(result),
            Err(err) => {
                let fallback = self.config.models().fallback.clone();
                warn!(
                    template = template.name(),
                    error = %err,
                    fallback = %fallback,
                    "primary model failed, trying fallback model"
                );
                self.prompt_with_guardrails(template, input, params.with_model(fallback))
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use futures::stream;
    use guard_adapters::traits::{AdapterMetadata, AdapterResult, AdapterStream, InferenceChunk};
    use guard_config::{ModelDefaults, SamplingDefaults};
    use guard_policy::library;

    struct ScriptedAdapter {
        metadata: AdapterMetadata,
        replies: Mutex<VecDeque<AdapterResult<String>>>,
        requests: Mutex<Vec<InferenceRequest>>,
    }

    impl ScriptedAdapter {
        fn new(replies: Vec<AdapterResult<String>>) -> Arc<Self> {
            Arc::new(Self {
                metadata: AdapterMetadata::new("scripted", "gpt-4"),
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<InferenceRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ModelAdapter for ScriptedAdapter {
        fn metadata(&self) -> &AdapterMetadata {
            &self.metadata
        }

        async fn infer(&self, request: InferenceRequest) -> AdapterResult<AdapterStream> {
            self.requests.lock().unwrap().push(request);
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("scripted reply available")?;
            let chunk = InferenceChunk::new(reply, true);
            Ok(Box::pin(stream::once(async move { Ok(chunk) })))
        }
    }

    fn service(adapter: Arc<ScriptedAdapter>) -> GuardrailService {
        let models = ModelDefaults {
            default: "gpt-4".into(),
            fallback: "gpt-3.5-turbo".into(),
        };
        GuardrailService::new(adapter, ServiceConfig::new(models, SamplingDefaults::default()))
    }

    fn template() -> PromptTemplate {
        PromptTemplate::builder("test_template")
            .with_system_prompt("You are a helpful assistant")
            .with_user_prompt("Answer the following: {input}")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn sends_system_and_user_messages_with_defaults() {
        let adapter = ScriptedAdapter::new(vec![Ok("This is a test response".into())]);
        let result = service(adapter.clone())
            .prompt_with_guardrails(&template(), "test question", CompletionParams::new())
            .await
            .unwrap();

        assert!(result.is_valid());
        assert_eq!(result.raw_response(), "This is a test response");

        let requests = adapter.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.model(), Some("gpt-4"));
        assert_eq!(request.system_prompt(), Some("You are a helpful assistant"));
        assert_eq!(
            request.messages(),
            [PromptMessage::new(
                MessageRole::User,
                "Answer the following: test question"
            )]
        );
        assert_eq!(request.temperature(), Some(0.7));
        assert_eq!(request.max_output_tokens(), Some(500));
        assert_eq!(request.top_p(), None);
    }

    #[tokio::test]
    async fn params_override_defaults() {
        let adapter = ScriptedAdapter::new(vec![Ok("ok".into())]);
        let params = CompletionParams::new()
            .with_model("gpt-4o-mini")
            .with_temperature(0.2)
            .with_top_p(0.1)
            .with_max_output_tokens(50);

        service(adapter.clone())
            .prompt_with_guardrails(&template(), "q", params)
            .await
            .unwrap();

        let request = &adapter.requests()[0];
        assert_eq!(request.model(), Some("gpt-4o-mini"));
        assert_eq!(request.temperature(), Some(0.2));
        assert_eq!(request.top_p(), Some(0.1));
        assert_eq!(request.max_output_tokens(), Some(50));
    }

    #[tokio::test]
    async fn adapter_errors_propagate() {
        let adapter = ScriptedAdapter::new(vec![Err(AdapterError::transport("API Error"))]);
        let err = service(adapter)
            .prompt_with_guardrails(&template(), "test question", CompletionParams::new())
            .await
            .unwrap_err();

        let ServiceError::Adapter { source } = err;
        assert!(matches!(source, AdapterError::Transport { reason } if reason == "API Error"));
    }

    #[tokio::test]
    async fn falls_back_once_on_failure() {
        let adapter = ScriptedAdapter::new(vec![
            Err(AdapterError::response("Primary model error")),
            Ok("Fallback response".into()),
        ]);

        let result = service(adapter.clone())
            .prompt_with_fallback(&template(), "test question", CompletionParams::new())
            .await
            .unwrap();

        assert_eq!(result.raw_response(), "Fallback response");
        let requests = adapter.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].model(), Some("gpt-4"));
        assert_eq!(requests[1].model(), Some("gpt-3.5-turbo"));
        assert_eq!(requests[1].messages(), requests[0].messages());
    }

    #[tokio::test]
    async fn second_failure_is_returned() {
        let adapter = ScriptedAdapter::new(vec![
            Err(AdapterError::response("primary down")),
            Err(AdapterError::response("fallback down")),
        ]);

        let err = service(adapter.clone())
            .prompt_with_fallback(&template(), "q", CompletionParams::new())
            .await
            .unwrap_err();

        let ServiceError::Adapter { source } = err;
        assert!(matches!(source, AdapterError::Response { reason } if reason == "fallback down"));
        assert_eq!(adapter.requests().len(), 2);
    }

    #[tokio::test]
    async fn invalid_content_does_not_trigger_fallback() {
        let adapter = ScriptedAdapter::new(vec![Ok("write to leak@example.com".into())]);
        let guarded = PromptTemplate::builder("guarded")
            .with_user_prompt("{input}")
            .with_guardrails(library::common_guardrails())
            .build()
            .unwrap();

        let result = service(adapter.clone())
            .prompt_with_fallback(&guarded, "q", CompletionParams::new())
            .await
            .unwrap();

        assert!(!result.is_valid());
        assert_eq!(result.errors()[0].guardrail(), library::PII_DETECTION);
        assert_eq!(adapter.requests().len(), 1);
    }
}
