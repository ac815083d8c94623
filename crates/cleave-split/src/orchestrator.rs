use cleave_common::spec::{ModelConfig, PreprocessingParameters, SPLIT_COLUMN};
use cleave_data::{Backend, DataFrame, DatasetSplits};
use log::{info, warn};

use crate::error::SplitResult;
use crate::registry::SplitterRegistry;
use crate::splitter::Splitter;

pub const DEFAULT_RANDOM_SEED: u64 = 42;

/// Resolves the splitter configured in `preprocessing.split`, falling back to the
/// registry default.
pub fn get_splitter(
    preprocessing: &PreprocessingParameters,
    registry: &SplitterRegistry,
) -> SplitResult<Box<dyn Splitter>> {
    match &preprocessing.split {
        Some(params) => registry.get_splitter(params),
        None => registry.default_splitter(),
    }
}

/// Resolves the configured splitter like [`get_splitter`], warning when the dataset has
/// a split column that the default splitter will ignore.
pub fn resolve_splitter(
    df: &DataFrame,
    preprocessing: &PreprocessingParameters,
    registry: &SplitterRegistry,
) -> SplitResult<Box<dyn Splitter>> {
    warn_on_split_column(df, preprocessing, registry);
    get_splitter(preprocessing, registry)
}

/// Splits a dataset into train, validation and test datasets using the splitter
/// configured in the global preprocessing parameters.
pub fn split_dataset(
    df: &DataFrame,
    preprocessing: &PreprocessingParameters,
    backend: &Backend,
    registry: &SplitterRegistry,
    random_seed: u64,
) -> SplitResult<DatasetSplits> {
    let splitter = resolve_splitter(df, preprocessing, registry)?;
    splitter.split(df, backend, random_seed)
}

/// Validates the configured splitter against the model features, then splits the dataset.
pub fn split_dataset_with_config(
    df: &DataFrame,
    config: &ModelConfig,
    backend: &Backend,
    registry: &SplitterRegistry,
    random_seed: u64,
) -> SplitResult<DatasetSplits> {
    let splitter = resolve_splitter(df, &config.preprocessing, registry)?;
    split_with_splitter(df, config, splitter.as_ref(), backend, random_seed)
}

/// Validates an already resolved splitter against the model features, then splits the dataset.
pub fn split_with_splitter(
    df: &DataFrame,
    config: &ModelConfig,
    splitter: &dyn Splitter,
    backend: &Backend,
    random_seed: u64,
) -> SplitResult<DatasetSplits> {
    splitter.validate(config)?;
    let splits = splitter.split(df, backend, random_seed)?;
    let [train, validation, test] = splits.sizes();
    info!(
        "Split {} rows with the {} splitter: train {train}, validation {validation}, test {test}",
        df.num_rows(),
        splitter.name()
    );
    Ok(splits)
}

/// Returns whether a warning was logged.
pub(crate) fn warn_on_split_column(
    df: &DataFrame,
    preprocessing: &PreprocessingParameters,
    registry: &SplitterRegistry,
) -> bool {
    if preprocessing.split.is_none() && df.has_column(SPLIT_COLUMN) {
        warn!(
            "Detected '{SPLIT_COLUMN}' column in the data, but using default split type \
             '{}'. Did you mean to set split type to 'fixed'?",
            registry.default_type()
        );
        return true;
    }
    false
}
