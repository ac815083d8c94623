use arrow::array::{new_empty_array, ArrayRef, BooleanArray, RecordBatch, UInt64Array};
use arrow::compute::{concat, concat_batches, filter_record_batch, take_record_batch};
use arrow::datatypes::SchemaRef;
use cleave_common::spec::Fold;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{DataError, DataResult};

/// An ordered, possibly partitioned table.
///
/// Every partition shares the dataframe schema. Operations never modify `self`;
/// they return new dataframes that share the underlying Arrow buffers where possible.
#[derive(Debug, Clone)]
pub struct DataFrame {
    schema: SchemaRef,
    partitions: Vec<RecordBatch>,
}

impl DataFrame {
    pub fn try_new(schema: SchemaRef, partitions: Vec<RecordBatch>) -> DataResult<Self> {
        if let Some(batch) = partitions.iter().find(|b| *b.schema() != *schema) {
            return Err(DataError::invalid(format!(
                "partition schema {} does not match dataframe schema {}",
                batch.schema(),
                schema
            )));
        }
        Ok(Self { schema, partitions })
    }

    pub fn from_batch(batch: RecordBatch) -> Self {
        Self {
            schema: batch.schema(),
            partitions: vec![batch],
        }
    }

    pub fn empty(schema: SchemaRef) -> Self {
        Self {
            schema,
            partitions: vec![],
        }
    }

    pub fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    pub fn partitions(&self) -> &[RecordBatch] {
        &self.partitions
    }

    pub fn into_partitions(self) -> Vec<RecordBatch> {
        self.partitions
    }

    pub fn num_partitions(&self) -> usize {
        self.partitions.len()
    }

    pub fn num_rows(&self) -> usize {
        self.partitions.iter().map(|b| b.num_rows()).sum()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.schema.column_with_name(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> DataResult<usize> {
        self.schema
            .index_of(name)
            .map_err(|_| DataError::missing_column(name))
    }

    /// Returns the named column with all partitions concatenated.
    pub fn column(&self, name: &str) -> DataResult<ArrayRef> {
        let index = self.column_index(name)?;
        let arrays = self
            .partitions
            .iter()
            .map(|b| b.column(index).as_ref())
            .collect::<Vec<_>>();
        match arrays.as_slice() {
            [] => Ok(new_empty_array(self.schema.field(index).data_type())),
            [array] => Ok(array.slice(0, array.len())),
            _ => Ok(concat(&arrays)?),
        }
    }

    /// Returns all rows as a single record batch.
    pub fn coalesce(&self) -> DataResult<RecordBatch> {
        match self.partitions.as_slice() {
            [batch] => Ok(batch.clone()),
            _ => Ok(concat_batches(&self.schema, &self.partitions)?),
        }
    }

    pub fn coalesced(&self) -> DataResult<DataFrame> {
        Ok(Self::from_batch(self.coalesce()?))
    }

    /// Redistributes rows into `n` contiguous partitions of near-equal size,
    /// keeping the row order.
    pub fn repartition(&self, n: usize) -> DataResult<DataFrame> {
        if n == 0 {
            return Err(DataError::invalid("number of partitions must be positive"));
        }
        let batch = self.coalesce()?;
        let total = batch.num_rows();
        let (size, remainder) = (total / n, total % n);
        let mut offset = 0;
        let partitions = (0..n)
            .map(|i| {
                let length = size + usize::from(i < remainder);
                let partition = batch.slice(offset, length);
                offset += length;
                partition
            })
            .collect();
        Ok(Self {
            schema: self.schema.clone(),
            partitions,
        })
    }

    /// Gathers rows by global position into a single partition.
    pub fn take(&self, indices: &[usize]) -> DataResult<DataFrame> {
        let batch = self.coalesce()?;
        let indices = UInt64Array::from_iter_values(indices.iter().map(|&i| i as u64));
        Ok(Self::from_batch(take_record_batch(&batch, &indices)?))
    }

    pub fn slice(&self, offset: usize, length: usize) -> DataResult<DataFrame> {
        let batch = self.coalesce()?;
        if offset + length > batch.num_rows() {
            return Err(DataError::invalid(format!(
                "slice [{offset}, {}) out of bounds for {} rows",
                offset + length,
                batch.num_rows()
            )));
        }
        Ok(Self::from_batch(batch.slice(offset, length)))
    }

    /// Returns every row in a random order (a full-fraction sample without replacement).
    pub fn shuffle<R: Rng + ?Sized>(&self, rng: &mut R) -> DataResult<DataFrame> {
        let mut indices = (0..self.num_rows()).collect::<Vec<_>>();
        indices.shuffle(rng);
        self.take(&indices)
    }

    /// Stable ascending sort by an externally computed key, one key per row.
    ///
    /// The sorted rows are laid out in as many partitions as the input had.
    pub fn sort_by_key(&self, keys: &[i64]) -> DataResult<DataFrame> {
        if keys.len() != self.num_rows() {
            return Err(DataError::invalid(format!(
                "expected {} sort keys, got {}",
                self.num_rows(),
                keys.len()
            )));
        }
        let mut indices = (0..keys.len()).collect::<Vec<_>>();
        indices.sort_by_key(|&i| keys[i]);
        let sorted = self.take(&indices)?;
        if self.num_partitions() > 1 {
            sorted.repartition(self.num_partitions())
        } else {
            Ok(sorted)
        }
    }

    /// Splits rows into folds using labels computed per partition.
    ///
    /// `labeler` receives the partition index and batch and returns one label per row.
    /// Rows labelled `None` are left out of every fold. Each fold keeps the input
    /// partition layout and the row order within each partition.
    pub fn split_by<F>(&self, mut labeler: F) -> DataResult<DatasetSplits>
    where
        F: FnMut(usize, &RecordBatch) -> DataResult<Vec<Option<Fold>>>,
    {
        let mut folds: [Vec<RecordBatch>; 3] = Default::default();
        for (i, batch) in self.partitions.iter().enumerate() {
            let labels = labeler(i, batch)?;
            if labels.len() != batch.num_rows() {
                return Err(DataError::internal(format!(
                    "partition {i} has {} rows but {} fold labels",
                    batch.num_rows(),
                    labels.len()
                )));
            }
            for fold in Fold::ALL {
                let mask = labels
                    .iter()
                    .map(|label| Some(*label == Some(fold)))
                    .collect::<BooleanArray>();
                folds[fold.index()].push(filter_record_batch(batch, &mask)?);
            }
        }
        let [train, validation, test] = folds.map(|partitions| Self {
            schema: self.schema.clone(),
            partitions,
        });
        Ok(DatasetSplits {
            train,
            validation,
            test,
        })
    }

    /// Splits rows into folds using one label per row in global row order.
    pub fn split_on_labels(&self, labels: &[Option<Fold>]) -> DataResult<DatasetSplits> {
        if labels.len() != self.num_rows() {
            return Err(DataError::invalid(format!(
                "expected {} fold labels, got {}",
                self.num_rows(),
                labels.len()
            )));
        }
        let mut offset = 0;
        self.split_by(|_, batch| {
            let end = offset + batch.num_rows();
            let partition_labels = labels[offset..end].to_vec();
            offset = end;
            Ok(partition_labels)
        })
    }
}

/// The train, validation and test datasets produced by a split.
#[derive(Debug, Clone)]
pub struct DatasetSplits {
    pub train: DataFrame,
    pub validation: DataFrame,
    pub test: DataFrame,
}

impl DatasetSplits {
    pub fn get(&self, fold: Fold) -> &DataFrame {
        match fold {
            Fold::Train => &self.train,
            Fold::Validation => &self.validation,
            Fold::Test => &self.test,
        }
    }

    /// Row counts in fold order.
    pub fn sizes(&self) -> [usize; 3] {
        Fold::ALL.map(|fold| self.get(fold).num_rows())
    }

    pub fn iter(&self) -> impl Iterator<Item = (Fold, &DataFrame)> {
        Fold::ALL.into_iter().map(|fold| (fold, self.get(fold)))
    }

    pub fn into_tuple(self) -> (DataFrame, DataFrame, DataFrame) {
        (self.train, self.validation, self.test)
    }
}
