//! Validation verdicts produced for a single model response.

use serde::Serialize;
use serde_json::Value;

use crate::guardrail::Severity;

/// Issue source used when a schema-bound response is not valid JSON.
pub const JSON_PARSING: &str = "json_parsing";
/// Issue source used when parsed JSON does not satisfy the schema.
pub const SCHEMA_VALIDATION: &str = "schema_validation";

/// One failed check, attributed to the guardrail that raised it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    guardrail: String,
    message: String,
}

impl ValidationIssue {
    /// Creates an issue for the named guardrail.
    #[must_use]
    pub fn new(guardrail: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            guardrail: guardrail.into(),
            message: message.into(),
        }
    }

    /// Returns the name of the guardrail that raised the issue.
    #[must_use]
    pub fn guardrail(&self) -> &str {
        &self.guardrail
    }

    /// Returns the issue message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Structured verdict for one response.
///
/// `is_valid` holds exactly when `errors` is empty; warnings never affect
/// it. `processed_response` is only present when a schema was supplied and
/// the response satisfied it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    is_valid: bool,
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
    raw_response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    processed_response: Option<Value>,
}

impl ValidationResult {
    /// Returns a builder for the supplied raw response.
    #[must_use]
    pub fn builder(raw_response: impl Into<String>) -> ValidationBuilder {
        ValidationBuilder::new(raw_response)
    }

    /// Returns true when no error-severity issues were recorded.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// Returns error-severity issues in check order.
    #[must_use]
    pub fn errors(&self) -> &[ValidationIssue] {
        &self.errors
    }

    /// Returns warning-severity issues in check order.
    #[must_use]
    pub fn warnings(&self) -> &[ValidationIssue] {
        &self.warnings
    }

    /// Returns the model output exactly as received.
    #[must_use]
    pub fn raw_response(&self) -> &str {
        &self.raw_response
    }

    /// Returns the schema-validated value, if any.
    #[must_use]
    pub fn processed_response(&self) -> Option<&Value> {
        self.processed_response.as_ref()
    }
}

/// Accumulates issues for a [`ValidationResult`].
#[derive(Debug)]
pub struct ValidationBuilder {
    raw_response: String,
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
    processed_response: Option<Value>,
}

impl ValidationBuilder {
    /// Starts a verdict for `raw_response` with no issues.
    #[must_use]
    pub fn new(raw_response: impl Into<String>) -> Self {
        Self {
            raw_response: raw_response.into(),
            errors: Vec::new(),
            warnings: Vec::new(),
            processed_response: None,
        }
    }

    /// Records an issue in the list matching `severity`.
    pub fn record(&mut self, severity: Severity, issue: ValidationIssue) {
        match severity {
            Severity::Error => self.errors.push(issue),
            Severity::Warning => self.warnings.push(issue),
        }
    }

    /// Records an error-severity issue.
    pub fn error(&mut self, guardrail: impl Into<String>, message: impl Into<String>) {
        self.record(Severity::Error, ValidationIssue::new(guardrail, message));
    }

    /// Stores the schema-validated value.
    pub fn set_processed(&mut self, value: Value) {
        self.processed_response = Some(value);
    }

    /// Finalises the verdict.
    #[must_use]
    pub fn build(self) -> ValidationResult {
        ValidationResult {
            is_valid: self.errors.is_empty(),
            errors: self.errors,
            warnings: self.warnings,
            raw_response: self.raw_response,
            processed_response: self.processed_response,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn warnings_do_not_invalidate() {
        let mut builder = ValidationResult::builder("raw");
        builder.record(
            Severity::Warning,
            ValidationIssue::new("formatting", "raw json"),
        );
        let result = builder.build();

        assert!(result.is_valid());
        assert!(result.errors().is_empty());
        assert_eq!(result.warnings()[0].guardrail(), "formatting");
        assert_eq!(result.raw_response(), "raw");
    }

    #[test]
    fn errors_invalidate() {
        let mut builder = ValidationResult::builder("raw");
        builder.error(JSON_PARSING, "bad json");

        let result = builder.build();
        assert!(!result.is_valid());
        assert_eq!(result.errors()[0].message(), "bad json");
        assert!(result.processed_response().is_none());
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let mut builder = ValidationResult::builder("{}");
        builder.set_processed(json!({ "title": "x" }));
        let value = serde_json::to_value(builder.build()).unwrap();

        assert_eq!(value["isValid"], json!(true));
        assert_eq!(value["rawResponse"], json!("{}"));
        assert_eq!(value["processedResponse"]["title"], json!("x"));
    }

    #[test]
    fn omits_missing_processed_response() {
        let value = serde_json::to_value(ValidationResult::builder("text").build()).unwrap();
        assert!(value.get("processedResponse").is_none());
    }
}
