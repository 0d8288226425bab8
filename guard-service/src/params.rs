//! Per-call completion settings and service-wide defaults.

use guard_config::{ModelDefaults, SamplingDefaults, Settings};

/// Defaults applied to every call made by the service.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ServiceConfig {
    models: ModelDefaults,
    sampling: SamplingDefaults,
}

impl ServiceConfig {
    /// Creates a configuration from explicit defaults.
    #[must_use]
    pub fn new(models: ModelDefaults, sampling: SamplingDefaults) -> Self {
        Self { models, sampling }
    }

    /// Takes model and sampling defaults from loaded settings.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.models().clone(), settings.sampling())
    }

    /// Returns the primary and fallback model identifiers.
    #[must_use]
    pub fn models(&self) -> &ModelDefaults {
        &self.models
    }

    /// Returns the default sampling parameters.
    #[must_use]
    pub fn sampling(&self) -> SamplingDefaults {
        self.sampling
    }
}

/// Overrides for a single completion call. Unset fields fall back to the
/// [`ServiceConfig`] defaults; `top_p` is only sent when set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompletionParams {
    /// Model identifier.
    pub model: Option<String>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Nucleus sampling mass.
    pub top_p: Option<f32>,
    /// Maximum completion tokens.
    pub max_output_tokens: Option<u32>,
}

impl CompletionParams {
    /// Returns params with every field unset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes the call to `model`.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets `top_p`.
    #[must_use]
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Sets the completion token budget.
    #[must_use]
    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }
}
