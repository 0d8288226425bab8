//! Offline evaluation tooling for LLM completions.
//!
//! Evaluators share the [`guard_adapters`] traits so they can run against a
//! live provider or a scripted double:
//!
//! - [`accuracy::AccuracyEvaluator`] asks factual questions and compares
//!   answers to ideals.
//! - [`bias::BiasEvaluator`] measures statistical parity of model-rated
//!   associations.
//! - [`advanced_bias::AdvancedBiasEvaluator`] compares embedding
//!   similarities between attributes and groups.
//! - [`sweep::ParameterRunner`] replays one prompt under different
//!   sampling settings.
//!
//! Reports serialise to camelCase JSON and can be persisted through
//! [`results::ResultsStore`].

#![warn(missing_docs, clippy::pedantic)]

pub mod accuracy;
pub mod advanced_bias;
pub mod bias;
pub mod datasets;
pub mod error;
pub mod results;
pub mod stats;
pub mod summary;
pub mod sweep;

mod chat;
#[cfg(test)]
mod test_support;

pub use accuracy::{AccuracyEvaluator, AccuracyRecord, AccuracyReport};
pub use advanced_bias::{AdvancedBiasEvaluator, AdvancedBiasReport, EffectInterpretation};
pub use bias::{BiasEvaluator, BiasRecord, BiasReport};
pub use datasets::{BiasExample, EvalExample};
pub use error::{EvalError, EvalResult};
pub use results::ResultsStore;
pub use summary::overall_health;
pub use sweep::{MultiRunReport, ParameterConfig, ParameterRunner};
