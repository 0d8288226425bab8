//! Unconditional PII redaction for display and storage.

use crate::library::{CARD_PATTERN, EMAIL_PATTERN, SSN_PATTERN};

/// Placeholder substituted for SSN-shaped sequences.
pub const REDACTED_SSN: &str = "[REDACTED SSN]";
/// Placeholder substituted for 16-digit card numbers.
pub const REDACTED_CARD: &str = "[REDACTED CARD]";
/// Placeholder substituted for email addresses.
pub const REDACTED_EMAIL: &str = "[REDACTED EMAIL]";

/// Redacts SSNs, card numbers, and email addresses from `response`.
///
/// Independent of validation: the text is rewritten whether or not any
/// guardrail flagged it.
#[must_use]
pub fn sanitize_response(response: &str) -> String {
    let text = SSN_PATTERN.replace_all(response, REDACTED_SSN);
    let text = CARD_PATTERN.replace_all(&text, REDACTED_CARD).into_owned();
    EMAIL_PATTERN.replace_all(&text, REDACTED_EMAIL).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_email_and_ssn() {
        let sanitized = sanitize_response("Contact me at test@example.com or call 123-45-6789");

        assert!(!sanitized.contains("test@example.com"));
        assert!(!sanitized.contains("123-45-6789"));
        assert!(sanitized.contains(REDACTED_EMAIL));
        assert!(sanitized.contains(REDACTED_SSN));
    }

    #[test]
    fn redacts_card_numbers() {
        assert_eq!(
            sanitize_response("card: 4111111111111111."),
            format!("card: {REDACTED_CARD}.")
        );
    }

    #[test]
    fn leaves_non_ascii_digit_runs_alone() {
        let text = "رقم ١٢٣-٤٥-٦٧٨٩";
        assert_eq!(sanitize_response(text), text);
    }

    #[test]
    fn leaves_clean_text_untouched() {
        let text = "Nothing sensitive in here.";
        assert_eq!(sanitize_response(text), text);
    }
}
