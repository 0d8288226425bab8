//! Prompt templates pairing instructions, an input slot, a response schema,
//! and the guardrails applied to the model's answer.

use std::fmt;
use std::sync::Arc;

use guard_policy::Guardrail;

use crate::schema::{ResponseSchema, SchemaError};

/// Placeholder replaced by the caller's input in the user prompt.
pub const INPUT_PLACEHOLDER: &str = "{input}";

/// Result alias for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Errors that can occur while building templates.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// The template has no name.
    #[error("template name cannot be empty")]
    EmptyName,

    /// The user prompt has nowhere to put the caller's input.
    #[error("user prompt for template `{name}` is missing the {{input}} placeholder")]
    MissingPlaceholder {
        /// Name of the offending template.
        name: String,
    },

    /// Two guardrails share a name, so issues could not be attributed.
    #[error("template `{template}` declares guardrail `{guardrail}` more than once")]
    DuplicateGuardrail {
        /// Name of the offending template.
        template: String,
        /// Name of the repeated guardrail.
        guardrail: String,
    },

    /// The response schema could not be compiled.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Static configuration for one kind of model request.
///
/// # Examples
///
/// ```
/// use guard_policy::library;
/// use guard_prompts::template::PromptTemplate;
///
/// let template = PromptTemplate::builder("summary")
///     .with_system_prompt("You summarise text.")
///     .with_user_prompt("Summarise: {input}")
///     .with_guardrails(library::common_guardrails())
///     .build()
///     .unwrap();
///
/// assert_eq!(template.render_user_prompt("hello"), "Summarise: hello");
/// ```
#[derive(Clone)]
pub struct PromptTemplate {
    name: String,
    system_prompt: String,
    user_prompt_template: String,
    response_schema: Option<ResponseSchema>,
    guardrails: Vec<Arc<dyn Guardrail>>,
}

impl PromptTemplate {
    /// Returns a builder for a template with the supplied name.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> TemplateBuilder {
        TemplateBuilder::new(name)
    }

    /// Returns the template name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the system prompt.
    #[must_use]
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Returns the unrendered user prompt.
    #[must_use]
    pub fn user_prompt_template(&self) -> &str {
        &self.user_prompt_template
    }

    /// Returns the expected response schema, if any.
    #[must_use]
    pub fn response_schema(&self) -> Option<&ResponseSchema> {
        self.response_schema.as_ref()
    }

    /// Returns the guardrails in evaluation order.
    #[must_use]
    pub fn guardrails(&self) -> &[Arc<dyn Guardrail>] {
        &self.guardrails
    }

    /// Replaces every `{input}` placeholder with `input`, verbatim.
    #[must_use]
    pub fn render_user_prompt(&self, input: &str) -> String {
        self.user_prompt_template.replace(INPUT_PLACEHOLDER, input)
    }
}

impl fmt::Debug for PromptTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guardrails: Vec<&str> = self.guardrails.iter().map(|g| g.name()).collect();
        f.debug_struct("PromptTemplate")
            .field("name", &self.name)
            .field("user_prompt_template", &self.user_prompt_template)
            .field("has_schema", &self.response_schema.is_some())
            .field("guardrails", &guardrails)
            .finish_non_exhaustive()
    }
}

/// Builder for constructing prompt templates.
pub struct TemplateBuilder {
    name: String,
    system_prompt: String,
    user_prompt_template: String,
    response_schema: Option<ResponseSchema>,
    guardrails: Vec<Arc<dyn Guardrail>>,
}

impl TemplateBuilder {
    /// Creates a builder with an empty system prompt and a bare `{input}`
    /// user prompt.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            system_prompt: String::new(),
            user_prompt_template: INPUT_PLACEHOLDER.to_owned(),
            response_schema: None,
            guardrails: Vec::new(),
        }
    }

    /// Sets the system prompt.
    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Sets the user prompt; it must contain `{input}`.
    #[must_use]
    pub fn with_user_prompt(mut self, template: impl Into<String>) -> Self {
        self.user_prompt_template = template.into();
        self
    }

    /// Attaches an expected response schema.
    #[must_use]
    pub fn with_schema(mut self, schema: ResponseSchema) -> Self {
        self.response_schema = Some(schema);
        self
    }

    /// Appends a guardrail.
    #[must_use]
    pub fn with_guardrail(mut self, guardrail: Arc<dyn Guardrail>) -> Self {
        self.guardrails.push(guardrail);
        self
    }

    /// Appends several guardrails, preserving their order.
    #[must_use]
    pub fn with_guardrails(
        mut self,
        guardrails: impl IntoIterator<Item = Arc<dyn Guardrail>>,
    ) -> Self {
        self.guardrails.extend(guardrails);
        self
    }

    /// Builds the template.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] when the name is empty, the user prompt
    /// lacks `{input}`, or two guardrails share a name.
    pub fn build(self) -> TemplateResult<PromptTemplate> {
        if self.name.trim().is_empty() {
            return Err(TemplateError::EmptyName);
        }
        if !self.user_prompt_template.contains(INPUT_PLACEHOLDER) {
            return Err(TemplateError::MissingPlaceholder { name: self.name });
        }
        for (index, guardrail) in self.guardrails.iter().enumerate() {
            if self.guardrails[..index]
                .iter()
                .any(|earlier| earlier.name() == guardrail.name())
            {
                return Err(TemplateError::DuplicateGuardrail {
                    template: self.name,
                    guardrail: guardrail.name().to_owned(),
                });
            }
        }

        Ok(PromptTemplate {
            name: self.name,
            system_prompt: self.system_prompt,
            user_prompt_template: self.user_prompt_template,
            response_schema: self.response_schema,
            guardrails: self.guardrails,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guard_policy::library;

    #[test]
    fn replaces_every_placeholder() {
        let template = PromptTemplate::builder("echo")
            .with_user_prompt("{input} and again {input}")
            .build()
            .unwrap();

        assert_eq!(template.render_user_prompt("hi"), "hi and again hi");
    }

    #[test]
    fn input_is_inserted_verbatim() {
        let template = PromptTemplate::builder("echo")
            .with_user_prompt("Q: {input}")
            .build()
            .unwrap();

        assert_eq!(template.render_user_prompt("{input} $1"), "Q: {input} $1");
    }

    #[test]
    fn rejects_empty_name() {
        let err = PromptTemplate::builder("  ").build().unwrap_err();
        assert!(matches!(err, TemplateError::EmptyName));
    }

    #[test]
    fn rejects_prompt_without_placeholder() {
        let err = PromptTemplate::builder("broken")
            .with_user_prompt("no slot here")
            .build()
            .unwrap_err();
        assert!(matches!(err, TemplateError::MissingPlaceholder { name } if name == "broken"));
    }

    #[test]
    fn rejects_duplicate_guardrails() {
        let err = PromptTemplate::builder("dupes")
            .with_guardrail(library::pii_detection())
            .with_guardrail(library::pii_detection())
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            TemplateError::DuplicateGuardrail { guardrail, .. } if guardrail == library::PII_DETECTION
        ));
    }

    #[test]
    fn keeps_guardrail_order() {
        let template = PromptTemplate::builder("ordered")
            .with_guardrails(library::common_guardrails())
            .with_guardrail(library::feature_hallucination())
            .build()
            .unwrap();

        let names: Vec<_> = template.guardrails().iter().map(|g| g.name()).collect();
        assert_eq!(
            names,
            [
                library::HARMFUL_CONTENT,
                library::PII_DETECTION,
                library::RESPONSE_LENGTH,
                library::FORMATTING,
                library::FEATURE_HALLUCINATION,
            ]
        );
        assert!(template.response_schema().is_none());
    }
}
