//! Service facade tying completion calls to guardrail validation.
//!
//! [`GuardrailService`] renders a [`guard_prompts::PromptTemplate`], calls
//! the configured [`guard_adapters::traits::ModelAdapter`], and validates
//! the answer. [`GuardrailService::prompt_with_fallback`] retries a failed
//! call once on the fallback model.

#![warn(missing_docs, clippy::pedantic)]

pub mod params;
pub mod service;

pub use params::{CompletionParams, ServiceConfig};
pub use service::{GuardrailService, ServiceError, ServiceResult};
