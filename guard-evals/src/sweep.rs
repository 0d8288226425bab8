//! Sampling-parameter sweeps over a single prompt.

use std::sync::Arc;
use std::time::Duration;

use guard_adapters::traits::ModelAdapter;
use serde::Serialize;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use crate::chat::{Sampling, ask};
use crate::error::EvalResult;
use crate::stats::{Uniqueness, uniqueness};

/// Prompt whose one-word answers make sampling effects easy to see.
pub const COMPLETION_PROMPT: &str = "Please finish the following sentence by using just one word: 'It's raining in the city and all people on the street are'";

/// System prompt used for sweep calls.
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Model swept by default.
pub const SWEEP_MODEL: &str = "gpt-4o";

/// Completion budget for sweep calls.
pub const MAX_COMPLETION_TOKENS: u32 = 500;

/// Repetitions per configuration in a multi-run sweep.
pub const NUM_MULTIPLE_RUNS: usize = 10;

/// Pause after every call, successful or not.
pub const API_CALL_DELAY: Duration = Duration::from_millis(1000);

/// Extra pause between successful runs of a multi-run sweep.
pub const BETWEEN_RUNS_DELAY: Duration = Duration::from_millis(500);

/// A named sampling configuration.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ParameterConfig {
    /// Display name.
    pub name: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus sampling mass.
    pub top_p: f32,
    /// What the configuration demonstrates.
    pub description: String,
}

impl ParameterConfig {
    /// Creates a configuration.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        temperature: f32,
        top_p: f32,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            temperature,
            top_p,
            description: description.into(),
        }
    }
}

/// Configurations compared one call each.
#[must_use]
pub fn single_run_presets() -> Vec<ParameterConfig> {
    vec![
        ParameterConfig::new(
            "Default",
            1.0,
            1.0,
            "Default settings (temperature=1.0, top_p=1.0). Balanced randomness.",
        ),
        ParameterConfig::new(
            "Low Temperature",
            0.2,
            1.0,
            "Low temperature (0.2) produces more focused, deterministic responses.",
        ),
        ParameterConfig::new(
            "High Temperature",
            2.0,
            1.0,
            "High temperature (2.0) produces more random, creative, and diverse responses.",
        ),
        ParameterConfig::new(
            "Low Top P",
            1.0,
            0.1,
            "Low top_p (0.1) considers only the most likely tokens, giving more focused responses.",
        ),
        ParameterConfig::new(
            "High Top P",
            1.0,
            0.9,
            "High top_p (0.9) considers more potential tokens, increasing diversity.",
        ),
    ]
}

/// Configurations repeated [`NUM_MULTIPLE_RUNS`] times each.
#[must_use]
pub fn multi_run_presets() -> Vec<ParameterConfig> {
    vec![
        ParameterConfig::new(
            "Default (temperature=1.0, top_p=1.0)",
            1.0,
            1.0,
            "Default settings with balanced randomness.",
        ),
        ParameterConfig::new(
            "Low Temperature (temperature=0.2, top_p=1.0)",
            0.2,
            1.0,
            "Low temperature for deterministic responses.",
        ),
        ParameterConfig::new(
            "High Temperature (temperature=1.8, top_p=1.0)",
            1.8,
            1.0,
            "High temperature for maximum diversity.",
        ),
    ]
}

/// Answers collected by [`ParameterRunner::run_multiple`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiRunReport {
    /// Configuration used.
    pub config: ParameterConfig,
    /// Successful answers in run order.
    pub responses: Vec<String>,
    /// Number of failed runs.
    pub failures: usize,
    /// Distinct-answer statistics.
    pub uniqueness: Uniqueness,
}

/// Issues rate-limited completions under different sampling settings.
pub struct ParameterRunner {
    adapter: Arc<dyn ModelAdapter>,
    model: String,
    call_delay: Duration,
    between_runs: Duration,
}

impl ParameterRunner {
    /// Creates a runner with the default model and delays.
    #[must_use]
    pub fn new(adapter: Arc<dyn ModelAdapter>) -> Self {
        Self {
            adapter,
            model: SWEEP_MODEL.to_owned(),
            call_delay: API_CALL_DELAY,
            between_runs: BETWEEN_RUNS_DELAY,
        }
    }

    /// Overrides the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Overrides the pause after each call and between runs.
    #[must_use]
    pub fn with_delays(mut self, call_delay: Duration, between_runs: Duration) -> Self {
        self.call_delay = call_delay;
        self.between_runs = between_runs;
        self
    }

    /// Requests one completion, then waits the call delay even on failure.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EvalError::Adapter`] when the call fails.
    pub async fn complete(&self, prompt: &str, config: &ParameterConfig) -> EvalResult<String> {
        let started = Instant::now();
        debug!(
            temperature = config.temperature,
            top_p = config.top_p,
            "calling completion API"
        );

        let sampling = Sampling {
            temperature: config.temperature,
            top_p: Some(config.top_p),
            max_output_tokens: MAX_COMPLETION_TOKENS,
        };
        let outcome = ask(&*self.adapter, &self.model, SYSTEM_PROMPT, prompt, sampling).await;

        match &outcome {
            Ok(_) => debug!(elapsed_ms = started.elapsed().as_millis(), "completion received"),
            Err(err) => warn!(config = %config.name, error = %err, "completion failed"),
        }

        debug!(delay_ms = self.call_delay.as_millis(), "waiting before next call");
        sleep(self.call_delay).await;

        Ok(outcome?)
    }

    /// Runs `prompt` once per configuration, pairing each with its outcome.
    pub async fn run_single(
        &self,
        prompt: &str,
        configs: &[ParameterConfig],
    ) -> Vec<(ParameterConfig, EvalResult<String>)> {
        let mut outcomes = Vec::with_capacity(configs.len());
        for config in configs {
            info!(config = %config.name, "running single parameter test");
            outcomes.push((config.clone(), self.complete(prompt, config).await));
        }
        outcomes
    }

    /// Runs `prompt` `runs` times under `config`, collecting successful
    /// answers.
    pub async fn run_multiple(
        &self,
        prompt: &str,
        config: &ParameterConfig,
        runs: usize,
    ) -> MultiRunReport {
        info!(config = %config.name, runs, "running repeated parameter test");

        let mut responses = Vec::with_capacity(runs);
        let mut failures = 0;
        for run in 1..=runs {
            match self.complete(prompt, config).await {
                Ok(response) => {
                    debug!(run, response = %response, "run complete");
                    responses.push(response);
                    sleep(self.between_runs).await;
                }
                Err(err) => {
                    warn!(run, error = %err, "run failed");
                    failures += 1;
                }
            }
        }

        let uniqueness = uniqueness(&responses);
        MultiRunReport {
            config: config.clone(),
            responses,
            failures,
            uniqueness,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EvalError;
    use crate::test_support::ScriptedModel;
    use guard_adapters::traits::AdapterError;

    #[test]
    fn presets_match_expected_values() {
        let single = single_run_presets();
        assert_eq!(single.len(), 5);
        assert_eq!(single[2].name, "High Temperature");
        assert!((single[2].temperature - 2.0).abs() < f32::EPSILON);
        assert!((single[3].top_p - 0.1).abs() < f32::EPSILON);

        let multi = multi_run_presets();
        assert_eq!(multi.len(), 3);
        assert!((multi[2].temperature - 1.8).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn complete_sends_sampling_settings() {
        let model = ScriptedModel::new(vec![Ok("  wet \n".into())]);
        let runner = ParameterRunner::new(model.clone()).with_delays(Duration::ZERO, Duration::ZERO);
        let config = &single_run_presets()[3];

        let response = runner.complete(COMPLETION_PROMPT, config).await.unwrap();

        assert_eq!(response, "wet");
        let request = &model.requests()[0];
        assert_eq!(request.model(), Some(SWEEP_MODEL));
        assert_eq!(request.system_prompt(), Some(SYSTEM_PROMPT));
        assert_eq!(request.temperature(), Some(1.0));
        assert_eq!(request.top_p(), Some(0.1));
        assert_eq!(request.max_output_tokens(), Some(MAX_COMPLETION_TOKENS));
    }

    #[tokio::test]
    async fn delay_applies_after_failures() {
        let model = ScriptedModel::new(vec![Err(AdapterError::transport("down"))]);
        let delay = Duration::from_millis(30);
        let runner = ParameterRunner::new(model).with_delays(delay, Duration::ZERO);

        let started = std::time::Instant::now();
        let err = runner
            .complete(COMPLETION_PROMPT, &single_run_presets()[0])
            .await
            .unwrap_err();

        assert!(matches!(err, EvalError::Adapter { .. }));
        assert!(started.elapsed() >= delay);
    }

    #[tokio::test]
    async fn run_multiple_collects_answers_and_failures() {
        let model = ScriptedModel::new(vec![
            Ok("wet".into()),
            Err(AdapterError::transport("flaky")),
            Ok("wet".into()),
            Ok("hurrying".into()),
        ]);
        let runner = ParameterRunner::new(model).with_delays(Duration::ZERO, Duration::ZERO);
        let config = multi_run_presets().remove(0);

        let report = runner.run_multiple(COMPLETION_PROMPT, &config, 4).await;

        assert_eq!(report.responses, ["wet", "wet", "hurrying"]);
        assert_eq!(report.failures, 1);
        assert_eq!(report.uniqueness.unique_count, 2);
        assert_eq!(report.config, config);
    }

    #[tokio::test]
    async fn run_single_keeps_config_order() {
        let model = ScriptedModel::new(vec![
            Ok("a".into()),
            Ok("b".into()),
            Err(AdapterError::transport("x")),
        ]);
        let runner = ParameterRunner::new(model).with_delays(Duration::ZERO, Duration::ZERO);
        let configs = &single_run_presets()[..3];

        let outcomes = runner.run_single(COMPLETION_PROMPT, configs).await;

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[1].0.name, "Low Temperature");
        assert_eq!(outcomes[1].1.as_deref().ok(), Some("b"));
        assert!(outcomes[2].1.is_err());
    }
}
