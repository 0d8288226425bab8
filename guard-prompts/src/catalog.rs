//! Built-in prompt templates.

use serde_json::json;

use guard_policy::library;

use crate::schema::ResponseSchema;
use crate::template::{PromptTemplate, TemplateResult};

/// Name of the product description template.
pub const PRODUCT_DESCRIPTION: &str = "product_description";
/// Name of the content moderation template.
pub const CONTENT_MODERATION: &str = "content_moderation";

const PRODUCT_DESCRIPTION_SYSTEM_PROMPT: &str = "\
You are an AI assistant specialized in creating compelling product descriptions.
Your job is to create engaging, accurate, and professional product descriptions.
Always focus on benefits, not just features.
Never invent features that aren't mentioned in the input.
Format your response as JSON with the fields: title, description, keyFeatures (array), and optionally targetAudience.
Do not wrap the json codes in JSON markers.";

const CONTENT_MODERATION_SYSTEM_PROMPT: &str = "\
You are a content moderation assistant. Your job is to review text and flag any potentially inappropriate content.
Respond with a summary of any issues found or confirm the content is appropriate.
Be vigilant for harmful, offensive, illegal, or dangerous content.
Do not repeat explicitly harmful content in your response.";

/// Schema for product description responses.
///
/// # Errors
///
/// Returns a schema error only if the embedded document fails to compile.
pub fn product_description_schema() -> TemplateResult<ResponseSchema> {
    let schema = ResponseSchema::new(json!({
        "type": "object",
        "properties": {
            "title": { "type": "string", "minLength": 3, "maxLength": 100 },
            "description": { "type": "string", "minLength": 50, "maxLength": 1000 },
            "keyFeatures": {
                "type": "array",
                "items": { "type": "string" },
                "minItems": 3,
                "maxItems": 10
            },
            "targetAudience": { "type": "string" }
        },
        "required": ["title", "description", "keyFeatures"]
    }))?;
    Ok(schema)
}

/// Product description template: JSON output, common guardrails plus
/// feature hallucination.
///
/// # Errors
///
/// Propagates [`crate::template::TemplateError`] from the builder.
pub fn product_description() -> TemplateResult<PromptTemplate> {
    PromptTemplate::builder(PRODUCT_DESCRIPTION)
        .with_system_prompt(PRODUCT_DESCRIPTION_SYSTEM_PROMPT)
        .with_user_prompt("Create a product description for the following product: {input}")
        .with_schema(product_description_schema()?)
        .with_guardrails(library::common_guardrails())
        .with_guardrail(library::feature_hallucination())
        .build()
}

/// Content moderation template: free text, common guardrails.
///
/// # Errors
///
/// Propagates [`crate::template::TemplateError`] from the builder.
pub fn content_moderation() -> TemplateResult<PromptTemplate> {
    PromptTemplate::builder(CONTENT_MODERATION)
        .with_system_prompt(CONTENT_MODERATION_SYSTEM_PROMPT)
        .with_user_prompt(
            "Please review the following content and provide feedback on its appropriateness: {input}",
        )
        .with_guardrails(library::common_guardrails())
        .build()
}

struct Entry {
    alias: Option<String>,
    template: PromptTemplate,
}

/// Named collection of templates.
#[derive(Default)]
pub struct TemplateCatalog {
    entries: Vec<Entry>,
}

impl std::fmt::Debug for TemplateCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateCatalog")
            .field("names", &self.names())
            .finish()
    }
}

impl TemplateCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog holding the product description and content moderation
    /// templates, also reachable as `productDescription` and
    /// `contentModeration`.
    ///
    /// # Errors
    ///
    /// Propagates template construction failures.
    pub fn builtin() -> TemplateResult<Self> {
        let mut catalog = Self::new();
        catalog.register_with_alias(product_description()?, "productDescription");
        catalog.register_with_alias(content_moderation()?, "contentModeration");
        Ok(catalog)
    }

    /// Adds a template, replacing any existing one with the same name.
    pub fn register(&mut self, template: PromptTemplate) {
        self.insert(Entry {
            alias: None,
            template,
        });
    }

    /// Adds a template that can also be looked up by `alias`.
    pub fn register_with_alias(&mut self, template: PromptTemplate, alias: impl Into<String>) {
        self.insert(Entry {
            alias: Some(alias.into()),
            template,
        });
    }

    fn insert(&mut self, entry: Entry) {
        self.entries
            .retain(|existing| existing.template.name() != entry.template.name());
        self.entries.push(entry);
    }

    /// Looks a template up by name or alias.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PromptTemplate> {
        self.entries
            .iter()
            .find(|entry| entry.template.name() == name || entry.alias.as_deref() == Some(name))
            .map(|entry| &entry.template)
    }

    /// Returns template names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries
            .iter()
            .map(|entry| entry.template.name())
            .collect()
    }
}
