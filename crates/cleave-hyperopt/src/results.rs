use std::cmp::Ordering;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::config::HyperoptConfig;
use crate::error::HyperoptResult;
use crate::sampler::TrialParameters;

pub const HYPEROPT_STATISTICS_FILE: &str = "hyperopt_statistics.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialStatus {
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    pub trial_id: usize,
    pub parameters: TrialParameters,
    pub status: TrialStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TrialResult {
    pub fn completed(trial_id: usize, parameters: TrialParameters, metric_score: f64) -> Self {
        Self {
            trial_id,
            parameters,
            status: TrialStatus::Completed,
            metric_score: Some(metric_score),
            error: None,
        }
    }

    pub fn failed(trial_id: usize, parameters: TrialParameters, error: impl Into<String>) -> Self {
        Self {
            trial_id,
            parameters,
            status: TrialStatus::Failed,
            metric_score: None,
            error: Some(error.into()),
        }
    }
}

/// The outcome of a search, with completed trials ordered best first and failed trials last.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HyperoptResults {
    pub hyperopt_config: HyperoptConfig,
    pub ordered_trials: Vec<TrialResult>,
}

impl HyperoptResults {
    pub fn new(hyperopt_config: HyperoptConfig, mut trials: Vec<TrialResult>) -> Self {
        let goal = hyperopt_config.goal;
        trials.sort_by(|a, b| match (a.metric_score, b.metric_score) {
            (Some(x), Some(y)) => goal.compare(x, y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.trial_id.cmp(&b.trial_id),
        });
        Self {
            hyperopt_config,
            ordered_trials: trials,
        }
    }

    pub fn best(&self) -> Option<&TrialResult> {
        self.ordered_trials
            .first()
            .filter(|t| t.status == TrialStatus::Completed)
    }

    pub fn num_completed(&self) -> usize {
        self.ordered_trials
            .iter()
            .filter(|t| t.status == TrialStatus::Completed)
            .count()
    }

    /// Writes the results as pretty-printed JSON into `output_directory`,
    /// creating the directory if needed.
    pub fn write(&self, output_directory: impl AsRef<Path>) -> HyperoptResult<PathBuf> {
        let output_directory = output_directory.as_ref();
        std::fs::create_dir_all(output_directory)?;
        let path = output_directory.join(HYPEROPT_STATISTICS_FILE);
        serde_json::to_writer_pretty(BufWriter::new(File::create(&path)?), self)?;
        info!("Hyperopt statistics written to {}", path.display());
        Ok(path)
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::config::Goal;

    fn trials() -> Vec<TrialResult> {
        vec![
            TrialResult::completed(0, TrialParameters::new(), 0.5),
            TrialResult::failed(1, TrialParameters::new(), "diverged"),
            TrialResult::completed(2, TrialParameters::new(), 0.2),
            TrialResult::completed(3, TrialParameters::new(), 0.9),
        ]
    }

    fn ids(results: &HyperoptResults) -> Vec<usize> {
        results.ordered_trials.iter().map(|t| t.trial_id).collect()
    }

    #[test]
    fn test_order_by_goal() {
        let results = HyperoptResults::new(HyperoptConfig::default(), trials());
        assert_eq!(ids(&results), vec![2, 0, 3, 1]);
        assert_eq!(results.best().unwrap().trial_id, 2);
        assert_eq!(results.num_completed(), 3);

        let config = HyperoptConfig {
            goal: Goal::Maximize,
            ..Default::default()
        };
        let results = HyperoptResults::new(config, trials());
        assert_eq!(ids(&results), vec![3, 0, 2, 1]);
    }

    #[test]
    fn test_write_statistics() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("test_hyperopt");
        let results = HyperoptResults::new(HyperoptConfig::default(), trials());
        let path = results.write(&output).unwrap();
        assert_eq!(path, output.join("hyperopt_statistics.json"));

        let written: serde_json::Value =
            serde_json::from_reader(File::open(path).unwrap()).unwrap();
        assert_eq!(written["ordered_trials"][0]["trial_id"], json!(2));
        assert_eq!(written["ordered_trials"][3]["status"], json!("failed"));
        assert_eq!(written["hyperopt_config"]["goal"], json!("minimize"));
    }
}
