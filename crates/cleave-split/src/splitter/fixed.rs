use arrow::array::{ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use cleave_common::spec::{Fold, SPLIT_COLUMN};
use cleave_data::error::DataResult;
use cleave_data::{Backend, DataFrame, DatasetSplits};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::SplitResult;
use crate::splitter::Splitter;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixedSplitConfig {
    pub column: String,
}

impl Default for FixedSplitConfig {
    fn default() -> Self {
        Self {
            column: SPLIT_COLUMN.to_string(),
        }
    }
}

/// Assigns rows to folds using the labels stored in an existing column.
///
/// Rows keep their order and partition layout. Rows whose label is null or
/// outside `{0, 1, 2}` belong to no fold, and so do floating point labels with a
/// fractional part and strings that are not integers.
#[derive(Debug, Clone)]
pub struct FixedSplitter {
    column: String,
}

impl FixedSplitter {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }
}

impl Default for FixedSplitter {
    fn default() -> Self {
        Self::new(SPLIT_COLUMN)
    }
}

impl From<FixedSplitConfig> for FixedSplitter {
    fn from(config: FixedSplitConfig) -> Self {
        Self::new(config.column)
    }
}

impl Splitter for FixedSplitter {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn split(
        &self,
        df: &DataFrame,
        _backend: &Backend,
        _random_seed: u64,
    ) -> SplitResult<DatasetSplits> {
        let index = df.column_index(&self.column)?;
        let mut dropped = 0;
        let splits = df.split_by(|_, batch| {
            let folds = fold_labels(batch.column(index))?;
            dropped += folds.iter().filter(|fold| fold.is_none()).count();
            Ok(folds)
        })?;
        if dropped > 0 {
            warn!(
                "{dropped} rows have a value in split column {} outside of 0, 1 and 2 \
                 and are excluded from every split",
                self.column
            );
        }
        Ok(splits)
    }

    fn required_columns(&self) -> Vec<String> {
        vec![self.column.clone()]
    }
}

fn fold_labels(labels: &ArrayRef) -> DataResult<Vec<Option<Fold>>> {
    if labels.data_type().is_floating() {
        let labels = cast(labels, &DataType::Float64)?;
        return Ok(labels
            .as_primitive::<Float64Type>()
            .iter()
            .map(|label| {
                label
                    .filter(|v| v.fract() == 0.0)
                    .and_then(|v| Fold::from_label(v as i64))
            })
            .collect());
    }
    let labels = cast(labels, &DataType::Int64)?;
    Ok(labels
        .as_primitive::<Int64Type>()
        .iter()
        .map(|label| label.and_then(Fold::from_label))
        .collect())
}
