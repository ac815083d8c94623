use cleave_common::spec::{FeatureType, Fold, ModelConfig};
use cleave_data::datetime::to_timestamps;
use cleave_data::{Backend, DataFrame, DatasetSplits, Probabilities};
use serde::{Deserialize, Serialize};

use crate::error::SplitResult;
use crate::splitter::{check_feature_type, Splitter};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatetimeSplitConfig {
    pub column: String,
    #[serde(default)]
    pub probabilities: Probabilities,
    #[serde(default)]
    pub datetime_format: Option<String>,
    #[serde(default)]
    pub fill_value: String,
}

/// Orders rows by a datetime column and assigns the earliest rows to train,
/// the following rows to validation and the latest rows to test.
#[derive(Debug, Clone)]
pub struct DatetimeSplitter {
    column: String,
    probabilities: Probabilities,
    datetime_format: Option<String>,
    fill_value: String,
}

impl DatetimeSplitter {
    pub fn new(column: impl Into<String>, probabilities: Probabilities) -> Self {
        Self {
            column: column.into(),
            probabilities,
            datetime_format: None,
            fill_value: String::new(),
        }
    }

    pub fn with_datetime_format(mut self, format: impl Into<String>) -> Self {
        self.datetime_format = Some(format.into());
        self
    }

    pub fn with_fill_value(mut self, fill_value: impl Into<String>) -> Self {
        self.fill_value = fill_value.into();
        self
    }
}

impl From<DatetimeSplitConfig> for DatetimeSplitter {
    fn from(config: DatetimeSplitConfig) -> Self {
        Self {
            column: config.column,
            probabilities: config.probabilities,
            datetime_format: config.datetime_format,
            fill_value: config.fill_value,
        }
    }
}

impl Splitter for DatetimeSplitter {
    fn name(&self) -> &'static str {
        "datetime"
    }

    fn split(
        &self,
        df: &DataFrame,
        backend: &Backend,
        _random_seed: u64,
    ) -> SplitResult<DatasetSplits> {
        let engine = backend.df_engine();
        let keys = to_timestamps(
            &df.column(&self.column)?,
            self.datetime_format.as_deref(),
            &self.fill_value,
        )?;
        let sorted = df.sort_by_key(&keys)?;
        let sorted = engine.from_batches(sorted.schema(), sorted.into_partitions())?;
        Ok(engine.split(&sorted, &self.probabilities)?)
    }

    fn validate(&self, config: &ModelConfig) -> SplitResult<()> {
        check_feature_type(config, &self.column, "Datetime split", &[FeatureType::Date])
    }

    fn has_split(&self, fold: Fold) -> bool {
        self.probabilities.get(fold) > 0.0
    }

    fn required_columns(&self) -> Vec<String> {
        vec![self.column.clone()]
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{AsArray, Int64Array, RecordBatch, StringArray};
    use arrow::datatypes::{DataType, Field, Int64Type, Schema};
    use cleave_common::spec::FeatureConfig;

    use super::*;
    use crate::error::SplitError;

    fn frame(dates: Vec<Option<&str>>) -> DataFrame {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("when", DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from_iter_values(0..dates.len() as i64)),
                Arc::new(StringArray::from(dates)),
            ],
        )
        .unwrap();
        DataFrame::from_batch(batch)
    }

    fn ids(df: &DataFrame) -> Vec<i64> {
        df.column("id")
            .unwrap()
            .as_primitive::<Int64Type>()
            .values()
            .to_vec()
    }

    #[test]
    fn test_chronological_split() {
        let df = frame(vec![
            Some("2020-01-04"),
            Some("2020-01-01"),
            None,
            Some("2020-01-03"),
            Some("2020-01-02"),
        ]);
        let splitter = DatetimeSplitter::new("when", Probabilities::new(0.6, 0.2, 0.2).unwrap())
            .with_fill_value("2020-01-05");
        let splits = splitter.split(&df, &Backend::local(), 0).unwrap();
        assert_eq!(ids(&splits.train), vec![1, 4, 3]);
        assert_eq!(ids(&splits.validation), vec![0]);
        assert_eq!(ids(&splits.test), vec![2]);
        assert_eq!(splits.train.schema(), df.schema());
    }

    #[test]
    fn test_missing_values_sort_first_without_fill_value() {
        let df = frame(vec![Some("02/01/2020"), None, Some("01/01/2020")]);
        let splitter = DatetimeSplitter::new("when", Probabilities::new(0.4, 0.0, 0.6).unwrap())
            .with_datetime_format("%d/%m/%Y");
        let splits = splitter.split(&df, &Backend::local(), 0).unwrap();
        assert_eq!(ids(&splits.train), vec![1]);
        assert_eq!(ids(&splits.test), vec![2, 0]);
    }

    #[test]
    fn test_every_fold_has_rows_on_partitioned_engine() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("when", DataType::Int64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from_iter_values(0..1000)),
                Arc::new(Int64Array::from_iter_values((0..1000).rev())),
            ],
        )
        .unwrap();
        let splitter = DatetimeSplitter::new("when", Probabilities::default());
        for num_partitions in [1, 4, 8] {
            let backend = Backend::partitioned(num_partitions).unwrap();
            let df = backend
                .df_engine()
                .from_batches(schema.clone(), vec![batch.clone()])
                .unwrap();
            let splits = splitter.split(&df, &backend, 0).unwrap();
            for (fold, split) in splits.iter() {
                assert!(splitter.has_split(fold));
                assert!(split.num_rows() > 0, "{fold} is empty with {num_partitions} partitions");
            }
            assert_eq!(splits.sizes(), [700, 100, 200]);
            assert_eq!(ids(&splits.train)[0], 999);
            assert_eq!(ids(&splits.test)[199], 0);
        }
    }

    #[test]
    fn test_unparseable_value() {
        let df = frame(vec![Some("2020-01-01"), Some("yesterday")]);
        let splitter = DatetimeSplitter::new("when", Probabilities::default());
        assert!(matches!(
            splitter.split(&df, &Backend::local(), 0),
            Err(SplitError::DataError(_))
        ));
    }

    #[test]
    fn test_validate_requires_date_feature() {
        let splitter = DatetimeSplitter::new("when", Probabilities::default());
        let mut config = ModelConfig::default();
        config.input_features = vec![FeatureConfig::new("when", FeatureType::Text)];
        assert!(matches!(
            splitter.validate(&config),
            Err(SplitError::InvalidConfig(_))
        ));
        config.input_features = vec![FeatureConfig::new("when", FeatureType::Date)];
        assert!(splitter.validate(&config).is_ok());
    }
}
