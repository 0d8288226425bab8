//! Guardrail validation for LLM responses.
//!
//! Depend on this crate via `cargo add llm-guardrails`. It bundles the
//! workspace crates behind feature flags; the validation core (guardrails
//! and prompt templates) is always available and makes no network calls.

#![warn(missing_docs, clippy::pedantic)]

/// Guardrails, validation results, and sanitisation.
pub use guard_policy as policy;

/// Prompt templates, response schemas, and the validator.
pub use guard_prompts as prompts;

/// Chat-completion and embedding adapters (enabled by `adapters` feature).
#[cfg(feature = "adapters")]
pub use guard_adapters as adapters;

/// Guarded completion service with fallback (enabled by `service` feature).
#[cfg(feature = "service")]
pub use guard_service as service;

/// Environment configuration (enabled by `config` feature).
#[cfg(feature = "config")]
pub use guard_config as config;

/// Logging setup (enabled by `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use guard_telemetry as telemetry;

/// Accuracy, bias, and parameter evaluations (enabled by `evals` feature).
#[cfg(feature = "evals")]
pub use guard_evals as evals;

pub use guard_policy::{Guardrail, Severity, ValidationIssue, ValidationResult};
pub use guard_prompts::{PromptTemplate, ResponseSchema, validate};
