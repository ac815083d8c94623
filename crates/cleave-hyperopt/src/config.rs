use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use cleave_common::spec::{Fold, ModelConfig};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{HyperoptError, HyperoptResult};
use crate::space::SearchSpace;

/// Output feature name standing for the combined loss of all output features.
pub const COMBINED: &str = "combined";

pub const DEFAULT_METRIC: &str = "loss";

pub const DEFAULT_SEARCH_SEED: u64 = 42;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Goal {
    #[default]
    Minimize,
    Maximize,
}

impl Goal {
    /// Orders scores best first under this goal.
    pub fn compare(&self, a: f64, b: f64) -> Ordering {
        match self {
            Goal::Minimize => a.total_cmp(&b),
            Goal::Maximize => b.total_cmp(&a),
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Goal::Minimize => write!(f, "minimize"),
            Goal::Maximize => write!(f, "maximize"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchAlgorithm {
    /// Grid dimensions are enumerated and every other dimension is sampled at random.
    #[default]
    #[serde(alias = "variant_generator")]
    Random,
    /// Every dimension must be a grid and the grid is enumerated.
    Grid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchAlgorithmConfig {
    #[serde(rename = "type")]
    pub algorithm: SearchAlgorithm,
    pub random_seed: u64,
}

impl Default for SearchAlgorithmConfig {
    fn default() -> Self {
        Self {
            algorithm: SearchAlgorithm::default(),
            random_seed: DEFAULT_SEARCH_SEED,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    pub num_samples: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self { num_samples: 1 }
    }
}

/// The `hyperopt` section of a model config with every default filled in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HyperoptConfig {
    /// Search spaces keyed by dotted parameter path.
    pub parameters: BTreeMap<String, SearchSpace>,
    pub goal: Goal,
    #[serde(alias = "validation_metric", alias = "validation_metrics")]
    pub metric: String,
    pub output_feature: String,
    /// The fold the metric is read from.
    pub split: Fold,
    pub executor: ExecutorConfig,
    pub search_alg: SearchAlgorithmConfig,
}

impl Default for HyperoptConfig {
    fn default() -> Self {
        Self {
            parameters: BTreeMap::new(),
            goal: Goal::default(),
            metric: DEFAULT_METRIC.to_string(),
            output_feature: COMBINED.to_string(),
            split: Fold::Validation,
            executor: ExecutorConfig::default(),
            search_alg: SearchAlgorithmConfig::default(),
        }
    }
}

impl HyperoptConfig {
    /// Parses a `hyperopt` section, filling in defaults for every absent key
    /// and validating the search spaces.
    pub fn from_value(value: Value) -> HyperoptResult<Self> {
        let config: Self = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_model_config(config: &ModelConfig) -> HyperoptResult<Self> {
        match &config.hyperopt {
            Some(value) => Self::from_value(value.clone()),
            None => Err(HyperoptError::config("the model config has no hyperopt section")),
        }
    }

    pub fn validate(&self) -> HyperoptResult<()> {
        if self.parameters.is_empty() {
            return Err(HyperoptError::config("no hyperopt parameters to search"));
        }
        if self.executor.num_samples == 0 {
            return Err(HyperoptError::config("num_samples must be positive"));
        }
        for (name, space) in &self.parameters {
            space.validate(name)?;
            if self.search_alg.algorithm == SearchAlgorithm::Grid && space.grid_values().is_none()
            {
                return Err(HyperoptError::space(
                    name,
                    "grid search requires every parameter to be a grid_search space",
                ));
            }
        }
        Ok(())
    }

    /// Fails unless the output feature is the combined output or a declared output feature.
    pub fn validate_output_feature(&self, config: &ModelConfig) -> HyperoptResult<()> {
        if self.output_feature == COMBINED
            || config
                .output_features
                .iter()
                .any(|f| f.name == self.output_feature)
        {
            Ok(())
        } else {
            Err(HyperoptError::config(format!(
                "output feature {} is not among the output features: {}",
                self.output_feature,
                config
                    .output_features
                    .iter()
                    .map(|f| f.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )))
        }
    }
}
