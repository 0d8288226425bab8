//! Runs the accuracy, statistical parity, and embedding association
//! evaluations and writes their reports to the results directory.

use std::sync::Arc;

use anyhow::Result;
use guard_adapters::openai::{DEFAULT_EMBEDDING_MODEL, OpenAiAdapter, OpenAiEmbeddingAdapter};
use guard_config::Settings;
use guard_evals::datasets::{accuracy_examples, bias_examples};
use guard_evals::{
    AccuracyEvaluator, AdvancedBiasEvaluator, BiasEvaluator, ResultsStore, overall_health,
};
use tracing::info;

const INSIGHT_LIMIT: usize = 5;

#[tokio::main]
async fn main() -> Result<()> {
    guard_telemetry::init_tracing();

    let settings = Settings::from_env()?;
    let config = settings.openai_config()?;
    let chat = Arc::new(OpenAiAdapter::new(config.clone())?);
    let embedder = Arc::new(OpenAiEmbeddingAdapter::new(
        config.with_model(DEFAULT_EMBEDDING_MODEL),
    )?);
    let store = ResultsStore::new(settings.results_dir());

    info!("running accuracy evaluation");
    let accuracy = AccuracyEvaluator::new(chat.clone())
        .run(&accuracy_examples())
        .await;
    store.save("accuracy_results.json", &accuracy).await?;

    let bias_dataset = bias_examples();

    info!("running statistical parity evaluation");
    let parity = BiasEvaluator::new(chat).run(&bias_dataset).await;
    store.save("basic_bias_results.json", &parity).await?;

    info!("running embedding association evaluation");
    let association = AdvancedBiasEvaluator::new(embedder)
        .run(&bias_dataset)
        .await?;
    store.save("advanced_bias_results.json", &association).await?;

    println!("\n=== Evaluation summary ===");
    println!("Accuracy Score: {:.2}%", accuracy.accuracy_score);
    println!(
        "Basic Fairness Score (Statistical Parity): {:.4} (1 is best)",
        parity.normalized_parity_score
    );
    println!(
        "Advanced Fairness Score (Embedding Association): {:.4} (1 is best)",
        association.normalized_bias_score
    );
    println!(
        "Overall Model Health Score: {:.2}%",
        overall_health(
            accuracy.accuracy_score,
            parity.normalized_parity_score,
            association.normalized_bias_score,
        )
    );

    println!("\nBias insights:");
    for insight in association.detailed_results.iter().take(INSIGHT_LIMIT) {
        println!("- {}", insight.interpretation);
    }

    println!("\nReports written to {}", store.dir().display());
    Ok(())
}
