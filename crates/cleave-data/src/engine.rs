use std::fmt;
use std::sync::Arc;

use arrow::array::RecordBatch;
use arrow::datatypes::SchemaRef;
use cleave_common::spec::Fold;
use log::debug;
use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::{DataError, DataResult};
use crate::frame::{DataFrame, DatasetSplits};
use crate::probabilities::Probabilities;

/// The random number generator used by every split operation.
///
/// A generator is created per call from the caller's seed so that concurrent
/// splits never share state.
pub type SplitRng = ChaCha8Rng;

/// The capabilities a dataframe engine offers to dataset splitting.
///
/// Callers branch on [`DataFrameEngine::partitioned`] only, never on the concrete engine.
pub trait DataFrameEngine: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether rows are sharded across independent partitions, in which case
    /// operations needing a global view of the rows are expensive or unsupported.
    fn partitioned(&self) -> bool;

    /// Lays out record batches the way this engine stores data.
    fn from_batches(&self, schema: SchemaRef, batches: Vec<RecordBatch>)
        -> DataResult<DataFrame>;

    /// Assigns every row to a fold independently, partition by partition.
    ///
    /// Each partition draws from its own stream of a generator seeded with `seed`,
    /// so the result does not depend on the order partitions are processed in.
    /// Fold sizes only approximate `probabilities`.
    fn random_split(
        &self,
        df: &DataFrame,
        probabilities: &Probabilities,
        seed: u64,
    ) -> DataResult<DatasetSplits> {
        df.split_by(|partition, batch| {
            let mut rng = SplitRng::seed_from_u64(seed);
            rng.set_stream(partition as u64);
            Ok((0..batch.num_rows())
                .map(|_| Some(probabilities.fold_for(rng.random::<f64>())))
                .collect())
        })
    }

    /// Splits rows in their current order into contiguous train, validation and test ranges.
    fn split(&self, df: &DataFrame, probabilities: &Probabilities) -> DataResult<DatasetSplits>;

    /// Draws `n` folds from the categorical distribution `probabilities`.
    fn random_choice(
        &self,
        rng: &mut SplitRng,
        probabilities: &Probabilities,
        n: usize,
    ) -> DataResult<Vec<Fold>> {
        let distribution = WeightedIndex::<f64>::new(probabilities.as_array())
            .map_err(|e| DataError::invalid(format!("invalid split probabilities: {e}")))?;
        (0..n)
            .map(|_| {
                let index = distribution.sample(rng);
                Fold::ALL
                    .get(index)
                    .copied()
                    .ok_or_else(|| DataError::internal(format!("invalid fold index: {index}")))
            })
            .collect()
    }
}

/// An engine keeping all rows in a single partition.
///
/// Splits are exact to the row.
#[derive(Debug, Clone, Default)]
pub struct LocalEngine;

impl DataFrameEngine for LocalEngine {
    fn name(&self) -> &'static str {
        "local"
    }

    fn partitioned(&self) -> bool {
        false
    }

    fn from_batches(
        &self,
        schema: SchemaRef,
        batches: Vec<RecordBatch>,
    ) -> DataResult<DataFrame> {
        DataFrame::try_new(schema, batches)?.coalesced()
    }

    fn split(&self, df: &DataFrame, probabilities: &Probabilities) -> DataResult<DatasetSplits> {
        let n = df.num_rows();
        let (d1, d2) = probabilities.cut_points(n);
        Ok(DatasetSplits {
            train: df.slice(0, d1)?,
            validation: df.slice(d1, d2 - d1)?,
            test: df.slice(d2, n - d2)?,
        })
    }
}

/// An engine sharding rows across a fixed number of partitions.
///
/// Splits operate on whole partitions or within partitions, trading exact fold
/// sizes for partition locality.
#[derive(Debug, Clone)]
pub struct PartitionedEngine {
    num_partitions: usize,
}

impl PartitionedEngine {
    pub fn try_new(num_partitions: usize) -> DataResult<Self> {
        if num_partitions == 0 {
            return Err(DataError::invalid("number of partitions must be positive"));
        }
        Ok(Self { num_partitions })
    }

    pub fn num_partitions(&self) -> usize {
        self.num_partitions
    }
}

impl DataFrameEngine for PartitionedEngine {
    fn name(&self) -> &'static str {
        "partitioned"
    }

    fn partitioned(&self) -> bool {
        true
    }

    fn from_batches(
        &self,
        schema: SchemaRef,
        batches: Vec<RecordBatch>,
    ) -> DataResult<DataFrame> {
        DataFrame::try_new(schema, batches)?.repartition(self.num_partitions)
    }

    /// Assigns whole partitions to folds, in partition order.
    ///
    /// The rows are first spread over more partitions when there are too few for every
    /// fold with a positive probability to receive one.
    fn split(&self, df: &DataFrame, probabilities: &Probabilities) -> DataResult<DatasetSplits> {
        let min_partitions = probabilities.min_partitions();
        let mut partitions = if df.num_partitions() < min_partitions {
            debug!(
                "Repartitioning {} partitions into {min_partitions} partitions before splitting",
                df.num_partitions()
            );
            df.repartition(min_partitions)?.into_partitions()
        } else {
            df.partitions().to_vec()
        };
        let num_partitions = partitions.len();
        let (d1, d2) = probabilities.cut_points(partitions.len());
        let test = partitions.split_off(d2);
        let validation = partitions.split_off(d1);
        debug!(
            "Split {num_partitions} partitions into {d1}, {}, {} partitions",
            validation.len(),
            test.len()
        );
        Ok(DatasetSplits {
            train: DataFrame::try_new(df.schema(), partitions)?,
            validation: DataFrame::try_new(df.schema(), validation)?,
            test: DataFrame::try_new(df.schema(), test)?,
        })
    }
}

/// The execution backend handed to splitters.
#[derive(Debug, Clone)]
pub struct Backend {
    df_engine: Arc<dyn DataFrameEngine>,
}

impl Backend {
    pub fn new(df_engine: Arc<dyn DataFrameEngine>) -> Self {
        Self { df_engine }
    }

    pub fn local() -> Self {
        Self::new(Arc::new(LocalEngine))
    }

    pub fn partitioned(num_partitions: usize) -> DataResult<Self> {
        Ok(Self::new(Arc::new(PartitionedEngine::try_new(
            num_partitions,
        )?)))
    }

    pub fn df_engine(&self) -> &dyn DataFrameEngine {
        self.df_engine.as_ref()
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{AsArray, Int64Array};
    use arrow::datatypes::{DataType, Field, Int64Type, Schema};

    use super::*;

    fn batch(range: std::ops::Range<i64>) -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![Field::new("id", DataType::Int64, false)]));
        RecordBatch::try_new(schema, vec![Arc::new(Int64Array::from_iter_values(range))]).unwrap()
    }

    fn ids(df: &DataFrame) -> Vec<i64> {
        df.column("id")
            .unwrap()
            .as_primitive::<Int64Type>()
            .values()
            .to_vec()
    }

    #[test]
    fn test_local_engine_layout_and_split() {
        let engine = LocalEngine;
        let b = batch(0..100);
        let df = engine
            .from_batches(b.schema(), vec![b.slice(0, 40), b.slice(40, 60)])
            .unwrap();
        assert_eq!(df.num_partitions(), 1);

        let splits = engine.split(&df, &Probabilities::default()).unwrap();
        assert_eq!(splits.sizes(), [70, 10, 20]);
        assert_eq!(ids(&splits.validation), (70..80).collect::<Vec<_>>());
    }

    #[test]
    fn test_partitioned_engine_split_by_partition() {
        let engine = PartitionedEngine::try_new(10).unwrap();
        let b = batch(0..100);
        let df = engine.from_batches(b.schema(), vec![b]).unwrap();
        assert_eq!(df.num_partitions(), 10);

        let splits = engine.split(&df, &Probabilities::default()).unwrap();
        assert_eq!(
            [
                splits.train.num_partitions(),
                splits.validation.num_partitions(),
                splits.test.num_partitions()
            ],
            [7, 1, 2]
        );
        assert_eq!(ids(&splits.test), (80..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_partitioned_engine_gives_every_fold_a_partition() {
        let p = Probabilities::default();
        for num_partitions in [1, 4, 8] {
            let engine = PartitionedEngine::try_new(num_partitions).unwrap();
            let b = batch(0..1000);
            let df = engine.from_batches(b.schema(), vec![b]).unwrap();
            let splits = engine.split(&df, &p).unwrap();
            assert_eq!(splits.sizes(), [700, 100, 200], "{num_partitions} partitions");
            assert_eq!(ids(&splits.validation), (700..800).collect::<Vec<_>>());
        }

        let engine = PartitionedEngine::try_new(8).unwrap();
        let b = batch(0..1000);
        let df = engine.from_batches(b.schema(), vec![b]).unwrap();
        let p = Probabilities::new(0.5, 0.0, 0.5).unwrap();
        assert_eq!(engine.split(&df, &p).unwrap().sizes(), [500, 0, 500]);
    }

    #[test]
    fn test_random_split_assigns_every_row_once() {
        let engine = PartitionedEngine::try_new(4).unwrap();
        let b = batch(0..1000);
        let df = engine.from_batches(b.schema(), vec![b]).unwrap();
        let p = Probabilities::default();

        let splits = engine.random_split(&df, &p, 42).unwrap();
        let mut all = splits.iter().flat_map(|(_, df)| ids(df)).collect::<Vec<_>>();
        all.sort();
        assert_eq!(all, (0..1000).collect::<Vec<_>>());
        for (fold, df) in splits.iter() {
            let expected = p.get(fold) * 1000.0;
            assert!((df.num_rows() as f64 - expected).abs() < 60.0);
        }

        let again = engine.random_split(&df, &p, 42).unwrap();
        assert_eq!(ids(&again.train), ids(&splits.train));
    }

    #[test]
    fn test_random_choice_skips_zero_probability() {
        let engine = LocalEngine;
        let p = Probabilities::new(0.5, 0.0, 0.5).unwrap();
        let mut rng = SplitRng::seed_from_u64(1);
        let folds = engine.random_choice(&mut rng, &p, 500).unwrap();
        assert_eq!(folds.len(), 500);
        assert!(!folds.contains(&Fold::Validation));
        assert!(folds.contains(&Fold::Train));
        assert!(folds.contains(&Fold::Test));
    }

    #[test]
    fn test_backend() {
        assert!(!Backend::local().df_engine().partitioned());
        assert!(Backend::partitioned(2).unwrap().df_engine().partitioned());
        assert!(Backend::partitioned(0).is_err());
    }
}
