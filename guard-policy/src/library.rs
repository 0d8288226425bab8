//! Reference guardrails reused across prompt templates.

use std::sync::{Arc, LazyLock};

use regex::{Regex, RegexBuilder};

use crate::guardrail::{FnGuardrail, Guardrail, PatternGuardrail, Severity};

/// Name of the harmful content guardrail.
pub const HARMFUL_CONTENT: &str = "harmful_content";
/// Name of the PII detection guardrail.
pub const PII_DETECTION: &str = "pii_detection";
/// Name of the response length guardrail.
pub const RESPONSE_LENGTH: &str = "response_length";
/// Name of the formatting guardrail.
pub const FORMATTING: &str = "formatting";
/// Name of the feature hallucination guardrail.
pub const FEATURE_HALLUCINATION: &str = "feature_hallucination";

/// Whitespace-delimited token count at which [`response_length`] warns.
pub const MAX_RESPONSE_TOKENS: usize = 1000;

// Digit classes are ASCII-only: `\d` would also match non-Latin digits.
pub(crate) static SSN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[0-9]{3}[-.\s]?[0-9]{2}[-.\s]?[0-9]{4}\b").expect("valid SSN regex")
});

pub(crate) static CARD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[0-9]{16}\b").expect("valid card regex"));

pub(crate) static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("valid email regex")
});

static HARMFUL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    case_insensitive(&[
        r"how to (make|create|build) (bomb|explosive|weapon)",
        r"(hack|compromise|break into) (password|account|system)",
        r"(illegal|illicit) (drug|substance) (creation|manufacturing|synthesis)",
    ])
});

static DISALLOWED_FEATURES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    case_insensitive(&[
        r"voice recognition",
        r"video processing",
        r"real-time analysis",
    ])
});

fn case_insensitive(sources: &[&str]) -> Vec<Regex> {
    sources
        .iter()
        .map(|source| {
            RegexBuilder::new(source)
                .case_insensitive(true)
                .build()
                .expect("valid guardrail regex")
        })
        .collect()
}

fn pattern_guardrail(
    name: &str,
    description: &str,
    severity: Severity,
    patterns: Vec<Regex>,
) -> Arc<dyn Guardrail> {
    Arc::new(
        PatternGuardrail::new(name, description, severity, patterns)
            .expect("library guardrail names are non-empty"),
    )
}

/// Rejects instructions for weapons, intrusion, or illicit drug synthesis.
#[must_use]
pub fn harmful_content() -> Arc<dyn Guardrail> {
    pattern_guardrail(
        HARMFUL_CONTENT,
        "Checks for potentially harmful or malicious content",
        Severity::Error,
        HARMFUL_PATTERNS.clone(),
    )
}

/// Rejects SSN-shaped sequences, 16-digit card numbers, and email addresses.
#[must_use]
pub fn pii_detection() -> Arc<dyn Guardrail> {
    pattern_guardrail(
        PII_DETECTION,
        "Checks for personally identifiable information",
        Severity::Error,
        vec![
            SSN_PATTERN.clone(),
            CARD_PATTERN.clone(),
            EMAIL_PATTERN.clone(),
        ],
    )
}

/// Warns when the response reaches [`MAX_RESPONSE_TOKENS`] whitespace tokens.
#[must_use]
pub fn response_length() -> Arc<dyn Guardrail> {
    Arc::new(
        FnGuardrail::new(
            RESPONSE_LENGTH,
            "Ensures response is not excessively long",
            Severity::Warning,
            |response| Ok(approximate_tokens(response) < MAX_RESPONSE_TOKENS),
        )
        .expect("library guardrail names are non-empty"),
    )
}

/// Warns when a chat answer is a bare JSON object without markdown.
///
/// This also fires for templates that explicitly request JSON output.
#[must_use]
pub fn formatting() -> Arc<dyn Guardrail> {
    Arc::new(
        FnGuardrail::new(
            FORMATTING,
            "Checks for proper formatting in user-facing responses",
            Severity::Warning,
            |response| {
                let trimmed = response.trim();
                let is_raw_json = trimmed.starts_with('{') && trimmed.ends_with('}');
                let has_markdown = response.contains("```") || response.contains('#');
                Ok(!is_raw_json || has_markdown)
            },
        )
        .expect("library guardrail names are non-empty"),
    )
}

/// Warns when the response advertises features the product does not have.
#[must_use]
pub fn feature_hallucination() -> Arc<dyn Guardrail> {
    pattern_guardrail(
        FEATURE_HALLUCINATION,
        "Checks for hallucinations about non-existent features",
        Severity::Warning,
        DISALLOWED_FEATURES.clone(),
    )
}

/// Harmful content, PII, length, and formatting, in that order.
#[must_use]
pub fn common_guardrails() -> Vec<Arc<dyn Guardrail>> {
    vec![
        harmful_content(),
        pii_detection(),
        response_length(),
        formatting(),
    ]
}

fn approximate_tokens(response: &str) -> usize {
    response.split_whitespace().count()
}
