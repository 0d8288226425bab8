//! Guardrail trait and reusable guardrail implementations.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by a guardrail while checking a response.
#[derive(Debug, Error)]
pub enum GuardrailError {
    /// Guardrail definition is invalid (bad pattern, empty name, ...).
    #[error("invalid guardrail `{name}`: {reason}")]
    InvalidDefinition {
        /// Name of the offending guardrail.
        name: String,
        /// Human-readable reason for rejection.
        reason: String,
    },
    /// The check itself failed to produce a verdict.
    #[error("{reason}")]
    CheckFailed {
        /// Description of the internal failure.
        reason: String,
    },
}

impl GuardrailError {
    /// Convenience constructor for failed checks.
    #[must_use]
    pub fn check_failed(reason: impl Into<String>) -> Self {
        Self::CheckFailed {
            reason: reason.into(),
        }
    }
}

/// Result alias for guardrail operations.
pub type GuardrailResult<T> = Result<T, GuardrailError>;

/// How a failed guardrail affects the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Recorded but never invalidates the response.
    Warning,
    /// Invalidates the response.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// A named content check applied to model output.
///
/// `check` returns `Ok(true)` when the response is acceptable and
/// `Ok(false)` when it violates the guardrail. An `Err` means the check
/// could not run; validators record that as an error-severity issue.
#[async_trait]
pub trait Guardrail: Send + Sync {
    /// Unique identifier used for issue attribution.
    fn name(&self) -> &str;

    /// Human-readable description, used as the issue message on failure.
    fn description(&self) -> &str;

    /// Severity applied when the check returns `false`.
    fn severity(&self) -> Severity;

    /// Checks the raw response text.
    async fn check(&self, response: &str) -> GuardrailResult<bool>;
}

fn validate_name(name: &str) -> GuardrailResult<()> {
    if name.trim().is_empty() {
        return Err(GuardrailError::InvalidDefinition {
            name: name.to_owned(),
            reason: "guardrail name cannot be empty".into(),
        });
    }
    Ok(())
}

/// Guardrail that fails when any of its patterns matches the response.
#[derive(Debug, Clone)]
pub struct PatternGuardrail {
    name: String,
    description: String,
    severity: Severity,
    patterns: Vec<Regex>,
}

impl PatternGuardrail {
    /// Creates a guardrail from precompiled patterns.
    ///
    /// # Errors
    ///
    /// Returns [`GuardrailError::InvalidDefinition`] when the name is empty.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        severity: Severity,
        patterns: Vec<Regex>,
    ) -> GuardrailResult<Self> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self {
            name,
            description: description.into(),
            severity,
            patterns,
        })
    }

    /// Compiles the supplied pattern sources and builds the guardrail.
    ///
    /// # Errors
    ///
    /// Returns [`GuardrailError::InvalidDefinition`] when the name is empty or
    /// a pattern fails to compile.
    pub fn from_sources<I, S>(
        name: impl Into<String>,
        description: impl Into<String>,
        severity: Severity,
        sources: I,
        case_insensitive: bool,
    ) -> GuardrailResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let name = name.into();
        let patterns = sources
            .into_iter()
            .map(|source| {
                RegexBuilder::new(source.as_ref())
                    .case_insensitive(case_insensitive)
                    .build()
                    .map_err(|err| GuardrailError::InvalidDefinition {
                        name: name.clone(),
                        reason: err.to_string(),
                    })
            })
            .collect::<GuardrailResult<Vec<_>>>()?;
        Self::new(name, description, severity, patterns)
    }

    /// Returns the first pattern matching `response`, if any.
    #[must_use]
    pub fn first_match(&self, response: &str) -> Option<&Regex> {
        self.patterns.iter().find(|pattern| pattern.is_match(response))
    }
}

#[async_trait]
impl Guardrail for PatternGuardrail {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn severity(&self) -> Severity {
        self.severity
    }

    async fn check(&self, response: &str) -> GuardrailResult<bool> {
        Ok(self.first_match(response).is_none())
    }
}

type CheckFn = dyn Fn(&str) -> GuardrailResult<bool> + Send + Sync;

/// Guardrail backed by an arbitrary synchronous predicate.
#[derive(Clone)]
pub struct FnGuardrail {
    name: String,
    description: String,
    severity: Severity,
    check: Arc<CheckFn>,
}

impl fmt::Debug for FnGuardrail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnGuardrail")
            .field("name", &self.name)
            .field("severity", &self.severity)
            .finish_non_exhaustive()
    }
}

impl FnGuardrail {
    /// Wraps `check` as a guardrail.
    ///
    /// # Errors
    ///
    /// Returns [`GuardrailError::InvalidDefinition`] when the name is empty.
    pub fn new<F>(
        name: impl Into<String>,
        description: impl Into<String>,
        severity: Severity,
        check: F,
    ) -> GuardrailResult<Self>
    where
        F: Fn(&str) -> GuardrailResult<bool> + Send + Sync + 'static,
    {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self {
            name,
            description: description.into(),
            severity,
            check: Arc::new(check),
        })
    }
}

#[async_trait]
impl Guardrail for FnGuardrail {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn severity(&self) -> Severity {
        self.severity
    }

    async fn check(&self, response: &str) -> GuardrailResult<bool> {
        (self.check)(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pattern_guardrail_fails_on_any_match() {
        let guardrail = PatternGuardrail::from_sources(
            "banned_words",
            "Checks for banned words",
            Severity::Error,
            ["forbidden", "secret"],
            true,
        )
        .unwrap();

        assert!(guardrail.check("all good here").await.unwrap());
        assert!(!guardrail.check("This is SECRET").await.unwrap());
        assert_eq!(
            guardrail.first_match("a forbidden thing").map(Regex::as_str),
            Some("forbidden")
        );
    }

    #[test]
    fn pattern_guardrail_rejects_bad_regex() {
        let err = PatternGuardrail::from_sources("broken", "", Severity::Error, ["("], false)
            .expect_err("unbalanced group");
        assert!(matches!(err, GuardrailError::InvalidDefinition { name, .. } if name == "broken"));
    }

    #[test]
    fn empty_names_are_rejected() {
        assert!(PatternGuardrail::new(" ", "", Severity::Warning, Vec::new()).is_err());
        assert!(FnGuardrail::new("", "", Severity::Warning, |_| Ok(true)).is_err());
    }

    #[tokio::test]
    async fn fn_guardrail_delegates_to_closure() {
        let guardrail = FnGuardrail::new("short", "Must be short", Severity::Warning, |text| {
            Ok(text.len() < 5)
        })
        .unwrap();

        assert_eq!(guardrail.severity(), Severity::Warning);
        assert!(guardrail.check("tiny").await.unwrap());
        assert!(!guardrail.check("much longer").await.unwrap());
    }

    #[test]
    fn severity_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Severity::Error).unwrap(), "\"error\"");
        assert_eq!(Severity::Warning.to_string(), "warning");
    }
}
