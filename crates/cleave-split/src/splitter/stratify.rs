use std::collections::HashMap;

use arrow::row::{RowConverter, SortField};
use cleave_common::spec::{FeatureType, Fold, ModelConfig};
use cleave_data::error::DataError;
use cleave_data::{Backend, DataFrame, DatasetSplits, Probabilities, SplitRng};
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::{SplitError, SplitResult};
use crate::splitter::{check_feature_type, Splitter};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StratifySplitConfig {
    pub column: String,
    #[serde(default)]
    pub probabilities: Probabilities,
}

/// Assigns rows to folds at random, separately for every distinct value of a column,
/// so that each fold approximately preserves the value distribution.
#[derive(Debug, Clone)]
pub struct StratifySplitter {
    column: String,
    probabilities: Probabilities,
}

impl StratifySplitter {
    pub fn new(column: impl Into<String>, probabilities: Probabilities) -> Self {
        Self {
            column: column.into(),
            probabilities,
        }
    }

    /// Row positions grouped by column value, groups in order of first appearance.
    fn groups(&self, df: &DataFrame) -> SplitResult<Vec<Vec<usize>>> {
        let column = df.column(&self.column)?;
        let converter = RowConverter::new(vec![SortField::new(column.data_type().clone())])
            .map_err(DataError::from)?;
        let rows = converter
            .convert_columns(&[column])
            .map_err(DataError::from)?;
        let mut index = HashMap::new();
        let mut groups: Vec<Vec<usize>> = vec![];
        for (i, row) in rows.iter().enumerate() {
            let group = *index.entry(row).or_insert_with(|| {
                groups.push(vec![]);
                groups.len() - 1
            });
            groups[group].push(i);
        }
        Ok(groups)
    }
}

impl From<StratifySplitConfig> for StratifySplitter {
    fn from(config: StratifySplitConfig) -> Self {
        Self::new(config.column, config.probabilities)
    }
}

impl Splitter for StratifySplitter {
    fn name(&self) -> &'static str {
        "stratify"
    }

    fn split(
        &self,
        df: &DataFrame,
        backend: &Backend,
        random_seed: u64,
    ) -> SplitResult<DatasetSplits> {
        let engine = backend.df_engine();
        if engine.partitioned() {
            return Err(SplitError::unsupported(format!(
                "stratified splitting is not supported with the {} dataframe engine",
                engine.name()
            )));
        }
        let mut rng = SplitRng::seed_from_u64(random_seed);
        let mut labels = vec![None; df.num_rows()];
        for group in self.groups(df)? {
            let folds = engine.random_choice(&mut rng, &self.probabilities, group.len())?;
            for (i, fold) in group.into_iter().zip(folds) {
                labels[i] = Some(fold);
            }
        }
        Ok(df.split_on_labels(&labels)?)
    }

    fn validate(&self, config: &ModelConfig) -> SplitResult<()> {
        check_feature_type(
            config,
            &self.column,
            "Stratify",
            &[FeatureType::Binary, FeatureType::Category],
        )
    }

    fn has_split(&self, fold: Fold) -> bool {
        self.probabilities.get(fold) > 0.0
    }

    fn required_columns(&self) -> Vec<String> {
        vec![self.column.clone()]
    }
}
