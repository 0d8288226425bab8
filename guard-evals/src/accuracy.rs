//! Factual accuracy evaluation.

use std::sync::Arc;

use guard_adapters::traits::ModelAdapter;
use serde::Serialize;
use tracing::{info, warn};

use crate::chat::{Sampling, ask};
use crate::datasets::EvalExample;

/// Model used by the evaluators unless overridden.
pub const EVAL_MODEL: &str = "gpt-3.5-turbo";

/// Output recorded for a question whose call failed.
pub const ERROR_OUTPUT: &str = "ERROR";

const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that provides concise, factual responses.";

const SAMPLING: Sampling = Sampling {
    temperature: 0.2,
    top_p: None,
    max_output_tokens: 50,
};

/// Outcome for one question.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccuracyRecord {
    /// Question asked.
    pub input: String,
    /// Expected answer fragment.
    pub ideal: String,
    /// Trimmed model output, or [`ERROR_OUTPUT`].
    pub output: String,
    /// Whether the output contains the ideal answer.
    pub is_correct: bool,
}

/// Aggregate accuracy over a dataset.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccuracyReport {
    /// Percentage of correct answers, 0 to 100.
    pub accuracy_score: f64,
    /// Per-question outcomes in dataset order.
    pub detailed_results: Vec<AccuracyRecord>,
}

/// Case-insensitive containment check used for grading.
#[must_use]
pub fn is_correct(output: &str, ideal: &str) -> bool {
    output.to_lowercase().contains(&ideal.to_lowercase())
}

/// Asks each question and grades the answer by containment.
pub struct AccuracyEvaluator {
    adapter: Arc<dyn ModelAdapter>,
    model: String,
}

impl AccuracyEvaluator {
    /// Creates an evaluator using [`EVAL_MODEL`].
    #[must_use]
    pub fn new(adapter: Arc<dyn ModelAdapter>) -> Self {
        Self {
            adapter,
            model: EVAL_MODEL.to_owned(),
        }
    }

    /// Overrides the evaluated model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Runs the evaluation. Failed calls count as incorrect.
    pub async fn run(&self, examples: &[EvalExample]) -> AccuracyReport {
        info!(examples = examples.len(), model = %self.model, "starting accuracy evaluation");

        let mut detailed_results = Vec::with_capacity(examples.len());
        for example in examples {
            let answer =
                ask(&*self.adapter, &self.model, SYSTEM_PROMPT, &example.input, SAMPLING).await;
            let (output, correct) = match answer {
                Ok(output) => {
                    let correct = is_correct(&output, &example.ideal);
                    (output, correct)
                }
                Err(err) => {
                    warn!(input = %example.input, error = %err, "accuracy example failed");
                    (ERROR_OUTPUT.to_owned(), false)
                }
            };
            detailed_results.push(AccuracyRecord {
                input: example.input.clone(),
                ideal: example.ideal.clone(),
                output,
                is_correct: correct,
            });
        }

        let correct = detailed_results.iter().filter(|r| r.is_correct).count();
        let accuracy_score = score(correct, detailed_results.len());
        info!(accuracy_score, "accuracy evaluation complete");

        AccuracyReport {
            accuracy_score,
            detailed_results,
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn score(correct: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    correct as f64 / total as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedModel;
    use guard_adapters::traits::AdapterError;

    #[test]
    fn grading_is_case_insensitive_containment() {
        assert!(is_correct("The capital is PARIS.", "Paris"));
        assert!(!is_correct("Lyon", "Paris"));
    }

    #[tokio::test]
    async fn scores_correct_answers_and_marks_errors() {
        let model = ScriptedModel::new(vec![
            Ok("  Paris is the capital.  ".into()),
            Err(AdapterError::transport("boom")),
            Ok("It is Au".into()),
            Ok("1944".into()),
        ]);
        let examples = vec![
            EvalExample::new("Capital of France?", "Paris"),
            EvalExample::new("Author?", "Jane Austen"),
            EvalExample::new("Gold?", "Au"),
            EvalExample::new("WW2 end?", "1945"),
        ];

        let report = AccuracyEvaluator::new(model.clone()).run(&examples).await;

        assert!((report.accuracy_score - 50.0).abs() < f64::EPSILON);
        assert_eq!(report.detailed_results[0].output, "Paris is the capital.");
        assert_eq!(report.detailed_results[1].output, ERROR_OUTPUT);
        assert!(!report.detailed_results[1].is_correct);

        let request = &model.requests()[0];
        assert_eq!(request.model(), Some(EVAL_MODEL));
        assert_eq!(request.system_prompt(), Some(SYSTEM_PROMPT));
        assert_eq!(request.temperature(), Some(0.2));
        assert_eq!(request.max_output_tokens(), Some(50));
    }

    #[tokio::test]
    async fn empty_dataset_scores_zero() {
        let report = AccuracyEvaluator::new(ScriptedModel::new(Vec::new()))
            .run(&[])
            .await;
        assert!(report.accuracy_score.abs() < f64::EPSILON);
        assert!(report.detailed_results.is_empty());
    }

    #[test]
    fn report_uses_camel_case() {
        let report = AccuracyReport {
            accuracy_score: 100.0,
            detailed_results: vec![AccuracyRecord {
                input: "q".into(),
                ideal: "a".into(),
                output: "a".into(),
                is_correct: true,
            }],
        };
        let value = serde_json::to_value(report).unwrap();
        assert_eq!(value["accuracyScore"], 100.0);
        assert_eq!(value["detailedResults"][0]["isCorrect"], true);
    }
}
