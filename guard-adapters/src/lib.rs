//! Model adapters used by the guardrail pipeline and evaluation tooling.
//!
//! The provider implementation lives in [`openai`] and plugs into the
//! trait-based interface defined in [`traits`], so callers (and tests) can
//! substitute their own completion or embedding backends.

#![warn(missing_docs, clippy::pedantic)]

pub mod openai;
pub mod traits;

mod http_client;
