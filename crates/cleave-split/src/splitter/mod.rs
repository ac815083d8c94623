use std::fmt;

use cleave_common::spec::{FeatureType, Fold, ModelConfig};
use cleave_data::{Backend, DataFrame, DatasetSplits};
use log::info;

use crate::error::{SplitError, SplitResult};

mod datetime;
mod fixed;
mod random;
mod stratify;

pub use datetime::{DatetimeSplitConfig, DatetimeSplitter};
pub use fixed::{FixedSplitConfig, FixedSplitter};
pub use random::{RandomSplitConfig, RandomSplitter};
pub use stratify::{StratifySplitConfig, StratifySplitter};

/// A policy assigning every row of a dataset to the train, validation or test fold.
///
/// A splitter holds its configuration only. All randomness derives from the seed
/// passed to [`Splitter::split`].
pub trait Splitter: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Splits `df` into train, validation and test datasets sharing the input schema.
    fn split(
        &self,
        df: &DataFrame,
        backend: &Backend,
        random_seed: u64,
    ) -> SplitResult<DatasetSplits>;

    /// Checks the splitter against the features declared in the model config.
    fn validate(&self, _config: &ModelConfig) -> SplitResult<()> {
        Ok(())
    }

    /// Whether the fold can receive any rows.
    fn has_split(&self, _fold: Fold) -> bool {
        true
    }

    /// Dataset columns the splitter reads.
    fn required_columns(&self) -> Vec<String> {
        vec![]
    }
}

/// Fails when the feature backed by `column` is declared with a type outside `expected`.
///
/// Columns that back no declared feature cannot be checked and are accepted.
pub(crate) fn check_feature_type(
    config: &ModelConfig,
    column: &str,
    description: &str,
    expected: &[FeatureType],
) -> SplitResult<()> {
    match config.find_feature_by_column(column) {
        None => {
            info!(
                "{description} column {column} is not among the features, \
                 cannot establish its feature type"
            );
            Ok(())
        }
        Some(feature) if expected.contains(&feature.feature_type) => Ok(()),
        Some(feature) => Err(SplitError::config(format!(
            "feature for {} column {column} must be of type {}, got {}",
            description.to_lowercase(),
            expected
                .iter()
                .map(|t| t.as_str())
                .collect::<Vec<_>>()
                .join(" or "),
            feature.feature_type
        ))),
    }
}
