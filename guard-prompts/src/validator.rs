//! Runs a template's guardrails and schema against a model response.

use guard_policy::{
    JSON_PARSING, SCHEMA_VALIDATION, Severity, ValidationIssue, ValidationResult,
};
use tracing::{debug, warn};

use crate::schema::SchemaError;
use crate::template::PromptTemplate;

/// Validates `response` against `template`.
///
/// Guardrails run sequentially in declaration order. A failed check is
/// recorded under its severity; a check that errors is always recorded as
/// an error and the remaining checks still run. When the template carries a
/// schema the response is then parsed and validated, yielding a
/// `json_parsing` or `schema_validation` error on failure and the parsed
/// value on success.
pub async fn validate(response: &str, template: &PromptTemplate) -> ValidationResult {
    let mut builder = ValidationResult::builder(response);

    for guardrail in template.guardrails() {
        match guardrail.check(response).await {
            Ok(true) => {}
            Ok(false) => {
                debug!(
                    template = template.name(),
                    guardrail = guardrail.name(),
                    severity = %guardrail.severity(),
                    "guardrail check failed"
                );
                builder.record(
                    guardrail.severity(),
                    ValidationIssue::new(guardrail.name(), guardrail.description()),
                );
            }
            Err(err) => {
                warn!(
                    template = template.name(),
                    guardrail = guardrail.name(),
                    error = %err,
                    "guardrail check errored"
                );
                builder.record(
                    Severity::Error,
                    ValidationIssue::new(
                        guardrail.name(),
                        format!("Guardrail check failed: {err}"),
                    ),
                );
            }
        }
    }

    if let Some(schema) = template.response_schema() {
        match schema.parse(response) {
            Ok(value) => builder.set_processed(value),
            Err(err @ SchemaError::Mismatch { .. }) => builder.error(
                SCHEMA_VALIDATION,
                format!("Response does not match expected schema: {err}"),
            ),
            Err(err) => builder.error(
                JSON_PARSING,
                format!("Failed to parse response as JSON: {err}"),
            ),
        }
    }

    let result = builder.build();
    debug!(
        template = template.name(),
        valid = result.is_valid(),
        errors = result.errors().len(),
        warnings = result.warnings().len(),
        "response validated"
    );
    result
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use guard_policy::{FnGuardrail, GuardrailError, library, sanitize_response};
    use serde_json::json;

    use super::*;
    use crate::schema::ResponseSchema;

    fn title_description_schema() -> ResponseSchema {
        ResponseSchema::new(json!({
            "type": "object",
            "properties": {
                "title": { "type": "string" },
                "description": { "type": "string" }
            },
            "required": ["title", "description"]
        }))
        .unwrap()
    }

    fn schema_template() -> PromptTemplate {
        PromptTemplate::builder("test_template")
            .with_system_prompt("Test system prompt")
            .with_user_prompt("Test user prompt {input}")
            .with_schema(title_description_schema())
            .with_guardrail(library::harmful_content())
            .with_guardrail(library::pii_detection())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn no_guardrails_and_no_schema_is_always_valid() {
        let template = PromptTemplate::builder("bare").build().unwrap();
        for response in ["", "anything", "{\"a\": 1}", "mail test@example.com"] {
            let result = validate(response, &template).await;
            assert!(result.is_valid());
            assert!(result.errors().is_empty());
            assert!(result.warnings().is_empty());
            assert_eq!(result.raw_response(), response);
            assert!(result.processed_response().is_none());
        }
    }

    #[tokio::test]
    async fn matching_schema_yields_processed_response() {
        let response = r#"{"title": "Safe Product", "description": "A safe description"}"#;
        let result = validate(response, &schema_template()).await;

        assert!(result.is_valid());
        assert!(result.errors().is_empty());
        assert!(result.warnings().is_empty());
        assert_eq!(
            result.processed_response(),
            Some(&json!({ "title": "Safe Product", "description": "A safe description" }))
        );
    }

    #[tokio::test]
    async fn harmful_content_yields_single_error() {
        let response = r#"{"title": "Guide", "description": "how to make explosive devices"}"#;
        let result = validate(response, &schema_template()).await;

        assert!(!result.is_valid());
        assert_eq!(result.errors().len(), 1);
        assert_eq!(result.errors()[0].guardrail(), library::HARMFUL_CONTENT);
    }

    #[tokio::test]
    async fn email_is_flagged_and_sanitized() {
        let response = r#"{"title": "Contact", "description": "Email me at test@example.com"}"#;
        let result = validate(response, &schema_template()).await;

        assert!(!result.is_valid());
        assert_eq!(result.errors().len(), 1);
        assert_eq!(result.errors()[0].guardrail(), library::PII_DETECTION);

        let sanitized = sanitize_response(response);
        assert!(!sanitized.contains("test@example.com"));
        assert!(sanitized.contains("[REDACTED EMAIL]"));
    }

    #[tokio::test]
    async fn schema_mismatch_is_reported_once() {
        let response = r#"{"title": "Product", "wrongField": "Value"}"#;
        let result = validate(response, &schema_template()).await;

        assert!(!result.is_valid());
        assert_eq!(result.errors().len(), 1);
        assert_eq!(result.errors()[0].guardrail(), SCHEMA_VALIDATION);
        assert!(
            result.errors()[0]
                .message()
                .starts_with("Response does not match expected schema: ")
        );
        assert!(result.processed_response().is_none());
    }

    #[tokio::test]
    async fn non_json_is_a_parsing_error() {
        let result = validate("This is not JSON", &schema_template()).await;

        assert!(!result.is_valid());
        assert_eq!(result.errors().len(), 1);
        assert_eq!(result.errors()[0].guardrail(), JSON_PARSING);
        assert!(
            result.errors()[0]
                .message()
                .starts_with("Failed to parse response as JSON: ")
        );
        assert!(result.processed_response().is_none());
    }

    #[tokio::test]
    async fn non_json_against_untyped_object_schema_is_a_parsing_error() {
        let schema = ResponseSchema::new(json!({
            "properties": { "title": { "type": "string" } },
            "required": ["title"]
        }))
        .unwrap();
        let template = PromptTemplate::builder("untyped")
            .with_schema(schema)
            .build()
            .unwrap();

        let result = validate("This is not JSON", &template).await;

        assert!(!result.is_valid());
        assert_eq!(result.errors().len(), 1);
        assert_eq!(result.errors()[0].guardrail(), JSON_PARSING);
        assert!(result.processed_response().is_none());
    }

    #[tokio::test]
    async fn truncated_json_is_a_parsing_error() {
        let result = validate("{\"title\": \"Prod", &schema_template()).await;
        assert_eq!(result.errors().len(), 1);
        assert_eq!(result.errors()[0].guardrail(), JSON_PARSING);
        assert!(!result.is_valid());
        assert!(result.processed_response().is_none());
    }

    #[tokio::test]
    async fn schema_still_applies_without_guardrails() {
        let template = PromptTemplate::builder("schema_only")
            .with_schema(title_description_schema())
            .build()
            .unwrap();

        let result = validate("This is not JSON", &template).await;
        assert!(!result.is_valid());
        assert_eq!(result.errors()[0].guardrail(), JSON_PARSING);

        let ok = validate(r#"{"title": "a", "description": "b"}"#, &template).await;
        assert!(ok.is_valid());
        assert!(ok.processed_response().is_some());
    }

    #[tokio::test]
    async fn warnings_do_not_invalidate() {
        let template = PromptTemplate::builder("warn_only")
            .with_guardrail(library::formatting())
            .with_guardrail(library::feature_hallucination())
            .build()
            .unwrap();

        let result = validate(r#"{"feature": "voice recognition"}"#, &template).await;
        assert!(result.is_valid());
        let names: Vec<_> = result.warnings().iter().map(ValidationIssue::guardrail).collect();
        assert_eq!(names, [library::FORMATTING, library::FEATURE_HALLUCINATION]);
    }

    #[tokio::test]
    async fn erroring_guardrail_is_recorded_as_error_and_checks_continue() {
        let flaky = FnGuardrail::new("flaky", "Sometimes breaks", Severity::Warning, |_| {
            Err(GuardrailError::check_failed("classifier unavailable"))
        })
        .unwrap();
        let template = PromptTemplate::builder("flaky_template")
            .with_guardrail(Arc::new(flaky))
            .with_guardrail(library::pii_detection())
            .build()
            .unwrap();

        let result = validate("reach me at someone@example.org", &template).await;

        assert!(!result.is_valid());
        assert!(result.warnings().is_empty());
        assert_eq!(result.errors().len(), 2);
        assert_eq!(result.errors()[0].guardrail(), "flaky");
        assert_eq!(
            result.errors()[0].message(),
            "Guardrail check failed: classifier unavailable"
        );
        assert_eq!(result.errors()[1].guardrail(), library::PII_DETECTION);
    }

    #[tokio::test]
    async fn validation_is_idempotent() {
        let template = schema_template();
        let response = r#"{"title": "Product", "wrongField": "Value"}"#;

        let first = validate(response, &template).await;
        let second = validate(response, &template).await;
        assert_eq!(first, second);
    }
}
