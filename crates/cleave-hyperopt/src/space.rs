use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{HyperoptError, HyperoptResult};

/// The domain a hyperparameter is searched over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "space", rename_all = "snake_case")]
pub enum SearchSpace {
    /// Real values drawn uniformly from `[lower, upper)`.
    Uniform { lower: f64, upper: f64 },
    /// Real values whose logarithm is uniform over `[ln(lower), ln(upper))`.
    Loguniform { lower: f64, upper: f64 },
    /// Integers drawn uniformly from `[lower, upper)`.
    Randint { lower: i64, upper: i64 },
    /// One of a list of arbitrary values.
    Choice { categories: Vec<Value> },
    /// Every value of the list, in turn.
    GridSearch { values: Vec<Value> },
}

impl SearchSpace {
    pub fn validate(&self, name: &str) -> HyperoptResult<()> {
        match self {
            SearchSpace::Uniform { lower, upper } => {
                if !lower.is_finite() || !upper.is_finite() || lower >= upper {
                    return Err(HyperoptError::space(
                        name,
                        format!("expected finite bounds with lower < upper, got [{lower}, {upper})"),
                    ));
                }
            }
            SearchSpace::Loguniform { lower, upper } => {
                if !lower.is_finite() || *lower <= 0.0 || !upper.is_finite() || lower >= upper {
                    return Err(HyperoptError::space(
                        name,
                        format!(
                            "expected positive finite bounds with lower < upper, got [{lower}, {upper})"
                        ),
                    ));
                }
            }
            SearchSpace::Randint { lower, upper } => {
                if lower >= upper {
                    return Err(HyperoptError::space(
                        name,
                        format!("expected lower < upper, got [{lower}, {upper})"),
                    ));
                }
            }
            SearchSpace::Choice { categories } => {
                if categories.is_empty() {
                    return Err(HyperoptError::space(name, "no categories to choose from"));
                }
            }
            SearchSpace::GridSearch { values } => {
                if values.is_empty() {
                    return Err(HyperoptError::space(name, "no grid values"));
                }
            }
        }
        Ok(())
    }

    /// The grid values, if this is a grid dimension.
    pub fn grid_values(&self) -> Option<&[Value]> {
        match self {
            SearchSpace::GridSearch { values } => Some(values),
            _ => None,
        }
    }

    /// Draws a value from a validated space.
    ///
    /// Grid dimensions are sampled uniformly; the sampler enumerates them instead.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Value {
        match self {
            SearchSpace::Uniform { lower, upper } => {
                Value::from(lower + rng.random::<f64>() * (upper - lower))
            }
            SearchSpace::Loguniform { lower, upper } => {
                let (log_lower, log_upper) = (lower.ln(), upper.ln());
                Value::from((log_lower + rng.random::<f64>() * (log_upper - log_lower)).exp())
            }
            SearchSpace::Randint { lower, upper } => Value::from(rng.random_range(*lower..*upper)),
            SearchSpace::Choice { categories: values } | SearchSpace::GridSearch { values } => {
                values[rng.random_range(0..values.len())].clone()
            }
        }
    }
}
