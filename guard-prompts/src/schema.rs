//! JSON Schema wrapper used to parse and validate structured responses.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

/// Result alias for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// One field-level schema violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// JSON pointer to the offending instance location (empty for the root).
    pub path: String,
    /// Violation message produced by the schema validator.
    pub message: String,
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Errors raised while compiling a schema or checking a response against it.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The schema document itself is invalid.
    #[error("invalid response schema: {reason}")]
    Compile {
        /// Compiler diagnostic.
        reason: String,
    },

    /// The response could not be turned into a JSON value.
    #[error("{reason}")]
    Parse {
        /// Parser diagnostic.
        reason: String,
    },

    /// The parsed value does not satisfy the schema.
    #[error("{}", join_violations(.violations))]
    Mismatch {
        /// Every violation reported by the validator.
        violations: Vec<SchemaViolation>,
    },
}

impl SchemaError {
    /// Convenience constructor for parse failures.
    #[must_use]
    pub fn parse(reason: impl Into<String>) -> Self {
        Self::Parse {
            reason: reason.into(),
        }
    }
}

fn join_violations(violations: &[SchemaViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Compiled JSON Schema (draft 2020-12) describing an expected response.
#[derive(Clone)]
pub struct ResponseSchema {
    document: Value,
    validator: Arc<jsonschema::Validator>,
}

impl fmt::Debug for ResponseSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseSchema")
            .field("document", &self.document)
            .finish_non_exhaustive()
    }
}

impl ResponseSchema {
    /// Compiles a schema document.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Compile`] when the document is not a valid schema.
    pub fn new(document: Value) -> SchemaResult<Self> {
        let validator =
            jsonschema::draft202012::new(&document).map_err(|err| SchemaError::Compile {
                reason: err.to_string(),
            })?;
        Ok(Self {
            document,
            validator: Arc::new(validator),
        })
    }

    /// Returns the schema document.
    #[must_use]
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Returns true when the schema root describes a JSON object: its
    /// `type` is or includes `"object"`, or it declares `properties` or
    /// `required`.
    #[must_use]
    pub fn expects_object(&self) -> bool {
        let typed_object = match self.document.get("type") {
            Some(Value::String(kind)) => kind == "object",
            Some(Value::Array(kinds)) => kinds.iter().any(|kind| kind == "object"),
            _ => false,
        };
        typed_object
            || self.document.get("properties").is_some()
            || self.document.get("required").is_some()
    }

    /// Checks an already parsed value.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Mismatch`] listing every violation.
    pub fn check(&self, value: &Value) -> SchemaResult<()> {
        let violations: Vec<SchemaViolation> = self
            .validator
            .iter_errors(value)
            .map(|err| SchemaViolation {
                path: err.instance_path.to_string(),
                message: err.to_string(),
            })
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::Mismatch { violations })
        }
    }

    /// Parses a raw response and validates it.
    ///
    /// A response whose trimmed text starts with `{` is parsed as JSON. Any
    /// other text is rejected for object schemas and otherwise validated as
    /// a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::Parse`] when the text is not the JSON the
    /// schema expects, or [`SchemaError::Mismatch`] when it parses but fails
    /// validation.
    pub fn parse(&self, response: &str) -> SchemaResult<Value> {
        let trimmed = response.trim();
        let candidate = if trimmed.starts_with('{') {
            serde_json::from_str(trimmed).map_err(|err| SchemaError::parse(err.to_string()))?
        } else if self.expects_object() {
            return Err(SchemaError::parse("response is not a JSON object"));
        } else {
            Value::String(response.to_owned())
        };

        self.check(&candidate)?;
        Ok(candidate)
    }
}
