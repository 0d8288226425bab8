//! Guardrail policy for model responses.
//!
//! A [`Guardrail`] is a named, severity-tagged check over raw response text.
//! [`library`] ships the reference checks, [`sanitize`] redacts PII for
//! display, and [`decision`] holds the structured verdict the validator
//! produces.

#![warn(missing_docs, clippy::pedantic)]

pub mod decision;
pub mod guardrail;
pub mod library;
pub mod sanitize;

pub use decision::{
    JSON_PARSING, SCHEMA_VALIDATION, ValidationBuilder, ValidationIssue, ValidationResult,
};
pub use guardrail::{
    FnGuardrail, Guardrail, GuardrailError, GuardrailResult, PatternGuardrail, Severity,
};
pub use sanitize::sanitize_response;
