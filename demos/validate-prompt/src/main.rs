//! Validates a live completion against a built-in prompt template.
//!
//! ```text
//! validate-prompt productDescription "Solar-powered phone charger"
//! ```

use std::sync::Arc;

use anyhow::{Result, bail};
use clap::Parser;
use guard_adapters::openai::OpenAiAdapter;
use guard_config::Settings;
use guard_prompts::TemplateCatalog;
use guard_service::{CompletionParams, GuardrailService, ServiceConfig};
use tracing::info;

#[derive(Debug, Parser)]
#[command(about = "Validate an LLM response against a prompt template")]
struct Args {
    /// Template name, e.g. `productDescription` or `content_moderation`.
    template: String,
    /// Text substituted into the template's user prompt.
    input: String,
    /// Model override; defaults to the configured default model.
    #[arg(long)]
    model: Option<String>,
    /// Retry once with the fallback model when the request fails.
    #[arg(long)]
    fallback: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    guard_telemetry::init_tracing();
    let args = Args::parse();

    let catalog = TemplateCatalog::builtin()?;
    let Some(template) = catalog.get(&args.template) else {
        bail!(
            "unknown template '{}'; available templates: {}",
            args.template,
            catalog.names().join(", ")
        );
    };

    let settings = Settings::from_env()?;
    let adapter = Arc::new(OpenAiAdapter::new(settings.openai_config()?)?);
    let service = GuardrailService::new(adapter, ServiceConfig::from_settings(&settings));

    let mut params = CompletionParams::new();
    if let Some(model) = args.model {
        params = params.with_model(model);
    }

    info!(template = template.name(), "validating prompt");
    let result = if args.fallback {
        service.prompt_with_fallback(template, &args.input, params).await?
    } else {
        service.prompt_with_guardrails(template, &args.input, params).await?
    };

    println!("Template: {}", template.name());
    println!("Valid: {}", result.is_valid());

    if !result.errors().is_empty() {
        println!("\nErrors:");
        for issue in result.errors() {
            println!("- [{}] {}", issue.guardrail(), issue.message());
        }
    }
    if !result.warnings().is_empty() {
        println!("\nWarnings:");
        for issue in result.warnings() {
            println!("- [{}] {}", issue.guardrail(), issue.message());
        }
    }

    println!("\nRaw response:\n{}", result.raw_response());
    if let Some(processed) = result.processed_response() {
        println!(
            "\nProcessed response:\n{}",
            serde_json::to_string_pretty(processed)?
        );
    }

    Ok(())
}
