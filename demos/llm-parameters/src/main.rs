//! Sampling-parameter sweep over a one-word completion prompt.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use guard_adapters::openai::OpenAiAdapter;
use guard_config::Settings;
use guard_evals::ParameterRunner;
use guard_evals::stats::{format_histogram, histogram, mean, standard_deviation};
use guard_evals::sweep::{
    API_CALL_DELAY, BETWEEN_RUNS_DELAY, COMPLETION_PROMPT, MultiRunReport, NUM_MULTIPLE_RUNS,
    SWEEP_MODEL, multi_run_presets, single_run_presets,
};
use tracing::info;

#[derive(Debug, Parser)]
#[command(about = "Explore how temperature and top_p change model output")]
struct Args {
    /// Model to sweep.
    #[arg(long, default_value = SWEEP_MODEL)]
    model: String,
    /// Repetitions per configuration in the multi-run sweep.
    #[arg(long, default_value_t = NUM_MULTIPLE_RUNS)]
    runs: usize,
    /// Pause after every call, in milliseconds.
    #[arg(long)]
    delay_ms: Option<u64>,
    /// Skip the single-run comparison.
    #[arg(long)]
    skip_single: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    guard_telemetry::init_tracing();
    let args = Args::parse();

    let settings = Settings::from_env()?;
    let adapter = Arc::new(OpenAiAdapter::new(
        settings.openai_config()?.with_model(&args.model),
    )?);
    let call_delay = args.delay_ms.map_or(API_CALL_DELAY, Duration::from_millis);
    let runner = ParameterRunner::new(adapter)
        .with_model(&args.model)
        .with_delays(call_delay, BETWEEN_RUNS_DELAY);

    println!("Prompt: {COMPLETION_PROMPT}");

    if !args.skip_single {
        println!("\n=== Single-run comparison ===");
        for (config, outcome) in runner
            .run_single(COMPLETION_PROMPT, &single_run_presets())
            .await
        {
            println!("\n{}: {}", config.name, config.description);
            match outcome {
                Ok(response) => println!("Response: {response}"),
                Err(err) => println!("Error: {err}"),
            }
        }
    }

    println!("\n=== Multi-run comparison ({} runs each) ===", args.runs);
    for config in multi_run_presets() {
        let report = runner
            .run_multiple(COMPLETION_PROMPT, &config, args.runs)
            .await;
        print_report(&report);
    }

    info!("parameter sweep complete");
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn print_report(report: &MultiRunReport) {
    println!("\n{}: {}", report.config.name, report.config.description);
    if report.failures > 0 {
        println!("Failed runs: {}", report.failures);
    }

    let hist = histogram(&report.responses);
    print!("{}", format_histogram(&hist, report.responses.len()));

    let lengths: Vec<f64> = report
        .responses
        .iter()
        .map(|response| response.chars().count() as f64)
        .collect();
    println!(
        "Unique responses: {} ({:.1}%)",
        report.uniqueness.unique_count, report.uniqueness.uniqueness_percentage
    );
    println!(
        "Response length: mean {:.2}, std dev {:.2}",
        mean(&lengths),
        standard_deviation(&lengths)
    );
}
