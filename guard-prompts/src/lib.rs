//! Prompt templates and response validation.
//!
//! A [`PromptTemplate`] bundles the system prompt, the user prompt with its
//! `{input}` slot, an optional [`ResponseSchema`], and the guardrails run by
//! [`validate`]. [`catalog`] ships the built-in templates.

#![warn(missing_docs, clippy::pedantic)]

pub mod catalog;
pub mod schema;
pub mod template;
pub mod validator;

pub use catalog::TemplateCatalog;
pub use schema::{ResponseSchema, SchemaError, SchemaResult, SchemaViolation};
pub use template::{PromptTemplate, TemplateBuilder, TemplateError, TemplateResult};
pub use validator::validate;
