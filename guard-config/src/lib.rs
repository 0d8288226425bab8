//! Process-wide settings loaded once at startup.
//!
//! [`Settings::from_env`] reads a `.env` file when present, then the process
//! environment. The API key is mandatory; everything else has a default.

#![warn(missing_docs, clippy::pedantic)]

use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use guard_adapters::openai::{OPENAI_API_KEY_ENV, OpenAiConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Overrides the API base URL.
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";
/// Overrides the primary completion model.
pub const DEFAULT_MODEL_ENV: &str = "GUARDRAILS_DEFAULT_MODEL";
/// Overrides the fallback completion model.
pub const FALLBACK_MODEL_ENV: &str = "GUARDRAILS_FALLBACK_MODEL";
/// Overrides where evaluation results are written.
pub const RESULTS_DIR_ENV: &str = "GUARDRAILS_RESULTS_DIR";

/// Primary completion model.
pub const DEFAULT_MODEL: &str = "gpt-4o";
/// Model used when the primary call fails.
pub const FALLBACK_MODEL: &str = "gpt-4";
/// Directory for persisted evaluation results.
pub const DEFAULT_RESULTS_DIR: &str = "results";

/// Result alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The API credential is absent or empty.
    #[error("{variable} is not set; export it or add it to .env")]
    MissingApiKey {
        /// Environment variable that should hold the key.
        variable: &'static str,
    },

    /// A variable is present but unusable.
    #[error("invalid value for {variable}: {reason}")]
    Invalid {
        /// Offending environment variable.
        variable: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Primary and fallback model identifiers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDefaults {
    /// Model used for every first attempt.
    pub default: String,
    /// Model used for the single retry after a failed call.
    pub fallback: String,
}

impl Default for ModelDefaults {
    fn default() -> Self {
        Self {
            default: DEFAULT_MODEL.to_owned(),
            fallback: FALLBACK_MODEL.to_owned(),
        }
    }
}

/// Sampling parameters applied when a call does not override them.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SamplingDefaults {
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum completion tokens.
    pub max_tokens: u32,
    /// Whether responses are streamed. Always `false` here.
    pub stream: bool,
}

impl Default for SamplingDefaults {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 500,
            stream: false,
        }
    }
}

/// Settings shared by the service, the evaluators, and the demos.
#[derive(Clone)]
pub struct Settings {
    api_key: String,
    base_url: Option<String>,
    models: ModelDefaults,
    sampling: SamplingDefaults,
    results_dir: PathBuf,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("models", &self.models)
            .field("sampling", &self.sampling)
            .field("results_dir", &self.results_dir)
            .finish()
    }
}

impl Settings {
    /// Loads `.env` (if any) and reads settings from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingApiKey`] when `OPENAI_API_KEY` is unset
    /// or empty.
    pub fn from_env() -> ConfigResult<Self> {
        match dotenv::dotenv() {
            Ok(path) => debug!(path = %path.display(), "loaded .env file"),
            Err(err) => debug!(error = %err, "no .env file loaded"),
        }
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds settings from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingApiKey`] when the key is unset or empty.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let api_key = read(OPENAI_API_KEY_ENV).ok_or(ConfigError::MissingApiKey {
            variable: OPENAI_API_KEY_ENV,
        })?;

        let defaults = ModelDefaults::default();
        let models = ModelDefaults {
            default: read(DEFAULT_MODEL_ENV).unwrap_or(defaults.default),
            fallback: read(FALLBACK_MODEL_ENV).unwrap_or(defaults.fallback),
        };

        Ok(Self {
            api_key,
            base_url: read(BASE_URL_ENV),
            models,
            sampling: SamplingDefaults::default(),
            results_dir: read(RESULTS_DIR_ENV)
                .map_or_else(|| PathBuf::from(DEFAULT_RESULTS_DIR), PathBuf::from),
        })
    }

    /// Returns the model identifiers.
    #[must_use]
    pub fn models(&self) -> &ModelDefaults {
        &self.models
    }

    /// Returns the default sampling parameters.
    #[must_use]
    pub fn sampling(&self) -> SamplingDefaults {
        self.sampling
    }

    /// Returns the API base URL override, if any.
    #[must_use]
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Returns the directory evaluation results are written to.
    #[must_use]
    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    /// Builds adapter configuration for the default model.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the base URL override is not a
    /// usable URL.
    pub fn openai_config(&self) -> ConfigResult<OpenAiConfig> {
        let config = OpenAiConfig::new(&self.models.default).with_api_key(&self.api_key);
        match &self.base_url {
            Some(url) => config
                .with_base_url(url)
                .map_err(|err| ConfigError::Invalid {
                    variable: BASE_URL_ENV,
                    reason: err.to_string(),
                }),
            None => Ok(config),
        }
    }
}
