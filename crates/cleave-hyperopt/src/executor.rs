use cleave_common::spec::ModelConfig;
use log::{info, warn};
use serde::Serialize;
use serde_json::Value;

use crate::config::HyperoptConfig;
use crate::error::{HyperoptError, HyperoptResult};
use crate::results::{HyperoptResults, TrialResult};
use crate::sampler::{TrialParameters, TrialSampler};
use crate::substitution::substitute_parameters;

/// Trains and evaluates the model of one trial.
pub trait TrialRunner {
    /// Returns training statistics keyed by fold name, then output feature, then metric.
    /// A metric is a number or a list of per-epoch numbers, the last one being final.
    fn run_trial(
        &mut self,
        trial_id: usize,
        config: &ModelConfig,
    ) -> Result<Value, Box<dyn std::error::Error + Send + Sync>>;
}

/// A trial with its sampled parameters and the model config they produce.
#[derive(Debug, Clone, Serialize)]
pub struct PlannedTrial {
    pub trial_id: usize,
    pub parameters: TrialParameters,
    pub config: ModelConfig,
}

/// Runs the trials of a search one after another.
#[derive(Debug, Clone)]
pub struct SerialExecutor {
    config: HyperoptConfig,
    sampler: TrialSampler,
}

impl SerialExecutor {
    pub fn new(config: HyperoptConfig) -> Self {
        let sampler = TrialSampler::from_config(&config);
        Self { config, sampler }
    }

    pub fn config(&self) -> &HyperoptConfig {
        &self.config
    }

    /// Samples every trial and builds its model config, without running anything.
    pub fn plan(&self, model_config: &ModelConfig) -> HyperoptResult<Vec<PlannedTrial>> {
        self.config.validate()?;
        self.config.validate_output_feature(model_config)?;
        self.sampler
            .sample()?
            .into_iter()
            .enumerate()
            .map(|(trial_id, parameters)| {
                let config = substitute_parameters(model_config, &parameters)?;
                Ok(PlannedTrial {
                    trial_id,
                    parameters,
                    config,
                })
            })
            .collect()
    }

    /// Runs every trial, recording failed trials instead of stopping the search.
    pub fn execute(
        &self,
        model_config: &ModelConfig,
        runner: &mut dyn TrialRunner,
    ) -> HyperoptResult<HyperoptResults> {
        let trials = self.plan(model_config)?;
        let num_trials = trials.len();
        let results = trials
            .into_iter()
            .map(|trial| {
                let outcome = runner
                    .run_trial(trial.trial_id, &trial.config)
                    .map_err(|e| e.to_string())
                    .and_then(|stats| self.metric_score(&stats));
                match outcome {
                    Ok(score) => {
                        info!(
                            "Trial {} finished with {} {score}",
                            trial.trial_id, self.config.metric
                        );
                        TrialResult::completed(trial.trial_id, trial.parameters, score)
                    }
                    Err(e) => {
                        warn!("Trial {} failed: {e}", trial.trial_id);
                        TrialResult::failed(trial.trial_id, trial.parameters, e)
                    }
                }
            })
            .collect::<Vec<_>>();
        let results = HyperoptResults::new(self.config.clone(), results);
        if results.num_completed() == 0 {
            return Err(HyperoptError::NoSuccessfulTrials(num_trials));
        }
        Ok(results)
    }

    fn metric_score(&self, stats: &Value) -> Result<f64, String> {
        let split = self.config.split.to_string();
        let metric = stats
            .get(&split)
            .and_then(|s| s.get(&self.config.output_feature))
            .and_then(|s| s.get(&self.config.metric))
            .ok_or_else(|| {
                format!(
                    "missing {} {} statistic for {}",
                    split, self.config.metric, self.config.output_feature
                )
            })?;
        let score = match metric {
            Value::Array(values) => values.last().and_then(Value::as_f64),
            value => value.as_f64(),
        };
        score.ok_or_else(|| format!("{} is not a number: {metric}", self.config.metric))
    }
}
