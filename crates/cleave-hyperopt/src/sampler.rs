use std::collections::BTreeMap;

use log::debug;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::Value;

use crate::config::HyperoptConfig;
use crate::error::HyperoptResult;
use crate::space::SearchSpace;

/// Sampled values keyed by dotted parameter path.
pub type TrialParameters = BTreeMap<String, Value>;

/// Generates the parameters of every trial of a search.
#[derive(Debug, Clone)]
pub struct TrialSampler {
    parameters: BTreeMap<String, SearchSpace>,
    num_samples: usize,
    seed: u64,
}

impl TrialSampler {
    pub fn new(parameters: BTreeMap<String, SearchSpace>, num_samples: usize, seed: u64) -> Self {
        Self {
            parameters,
            num_samples,
            seed,
        }
    }

    pub fn from_config(config: &HyperoptConfig) -> Self {
        Self::new(
            config.parameters.clone(),
            config.executor.num_samples,
            config.search_alg.random_seed,
        )
    }

    /// Enumerates the grid dimensions and repeats every grid point `num_samples` times,
    /// drawing the other dimensions independently for each trial.
    ///
    /// Every search space is validated before anything is sampled.
    pub fn sample(&self) -> HyperoptResult<Vec<TrialParameters>> {
        for (name, space) in &self.parameters {
            space.validate(name)?;
        }
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let grid = self
            .parameters
            .iter()
            .filter_map(|(name, space)| space.grid_values().map(|values| (name, values)))
            .fold(vec![TrialParameters::new()], |points, (name, values)| {
                points
                    .iter()
                    .flat_map(|point| {
                        values.iter().map(move |value| {
                            let mut point = point.clone();
                            point.insert(name.clone(), value.clone());
                            point
                        })
                    })
                    .collect()
            });
        let trials = grid
            .iter()
            .flat_map(|point| std::iter::repeat_n(point, self.num_samples))
            .map(|point| {
                let mut trial = point.clone();
                for (name, space) in &self.parameters {
                    if space.grid_values().is_none() {
                        trial.insert(name.clone(), space.sample(&mut rng));
                    }
                }
                trial
            })
            .collect::<Vec<_>>();
        debug!(
            "Sampled {} trials over {} parameters",
            trials.len(),
            self.parameters.len()
        );
        Ok(trials)
    }
}
