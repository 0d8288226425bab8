//! Runs the product description and content moderation templates end to
//! end and prints what the guardrails found.

use std::sync::Arc;

use anyhow::Result;
use guard_adapters::openai::OpenAiAdapter;
use guard_config::Settings;
use guard_policy::ValidationResult;
use guard_prompts::TemplateCatalog;
use guard_prompts::catalog::{CONTENT_MODERATION, PRODUCT_DESCRIPTION};
use guard_service::{CompletionParams, GuardrailService, ServiceConfig};
use tracing::{error, info};

const PRODUCT_INPUT: &str = "Wireless noise-cancelling headphones with 30-hour battery life, water resistance, and multi-device connectivity";
const MODERATION_INPUT: &str = "I really enjoyed the movie last night!";

#[tokio::main]
async fn main() -> Result<()> {
    guard_telemetry::init_tracing();

    let settings = Settings::from_env()?;
    let adapter = Arc::new(OpenAiAdapter::new(settings.openai_config()?)?);
    let service = GuardrailService::new(adapter, ServiceConfig::from_settings(&settings));
    let catalog = TemplateCatalog::builtin()?;

    let runs = [
        ("Product description", PRODUCT_DESCRIPTION, PRODUCT_INPUT),
        ("Content moderation", CONTENT_MODERATION, MODERATION_INPUT),
    ];

    for (title, name, input) in runs {
        let Some(template) = catalog.get(name) else {
            error!(template = name, "template missing from catalog");
            continue;
        };

        println!("\n=== {title} ===");
        println!("Input: {input}");

        match service
            .prompt_with_fallback(template, input, CompletionParams::new())
            .await
        {
            Ok(result) => print_result(&result)?,
            Err(err) => error!(template = name, error = %err, "request failed"),
        }
    }

    info!("guardrails demo complete");
    Ok(())
}

fn print_result(result: &ValidationResult) -> Result<()> {
    println!("Valid: {}", result.is_valid());
    for issue in result.errors() {
        println!("- ERROR [{}]: {}", issue.guardrail(), issue.message());
    }
    for issue in result.warnings() {
        println!("- WARNING [{}]: {}", issue.guardrail(), issue.message());
    }

    match result.processed_response() {
        Some(processed) => println!("Response:\n{}", serde_json::to_string_pretty(processed)?),
        None => println!("Response:\n{}", result.raw_response()),
    }
    Ok(())
}
