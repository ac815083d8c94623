use cleave_common::spec::Fold;
use cleave_data::{Backend, DataFrame, DatasetSplits, Probabilities, SplitRng};
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::SplitResult;
use crate::splitter::Splitter;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomSplitConfig {
    pub probabilities: Probabilities,
}

/// Assigns rows to folds uniformly at random.
///
/// On a local engine the rows are shuffled and cut into exact fold sizes.
/// On a partitioned engine each row draws its fold independently within its
/// partition, so fold sizes only approximate the probabilities.
#[derive(Debug, Clone, Default)]
pub struct RandomSplitter {
    probabilities: Probabilities,
}

impl RandomSplitter {
    pub fn new(probabilities: Probabilities) -> Self {
        Self { probabilities }
    }

    pub fn probabilities(&self) -> &Probabilities {
        &self.probabilities
    }
}

impl From<RandomSplitConfig> for RandomSplitter {
    fn from(config: RandomSplitConfig) -> Self {
        Self::new(config.probabilities)
    }
}

impl Splitter for RandomSplitter {
    fn name(&self) -> &'static str {
        "random"
    }

    fn split(
        &self,
        df: &DataFrame,
        backend: &Backend,
        random_seed: u64,
    ) -> SplitResult<DatasetSplits> {
        let engine = backend.df_engine();
        if engine.partitioned() {
            return Ok(engine.random_split(df, &self.probabilities, random_seed)?);
        }
        let mut rng = SplitRng::seed_from_u64(random_seed);
        let shuffled = df.shuffle(&mut rng)?;
        Ok(engine.split(&shuffled, &self.probabilities)?)
    }

    fn has_split(&self, fold: Fold) -> bool {
        self.probabilities.get(fold) > 0.0
    }
}
