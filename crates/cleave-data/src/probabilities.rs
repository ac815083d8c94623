use cleave_common::spec::Fold;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{DataError, DataResult};

const SUM_TOLERANCE: f64 = 1e-6;

/// Train, validation and test proportions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Probabilities([f64; 3]);

impl Probabilities {
    pub fn new(train: f64, validation: f64, test: f64) -> DataResult<Self> {
        let values = [train, validation, test];
        if values.iter().any(|p| !p.is_finite() || *p < 0.0) {
            return Err(DataError::invalid(format!(
                "split probabilities must be non-negative and finite: {values:?}"
            )));
        }
        let sum: f64 = values.iter().sum();
        if sum <= 0.0 {
            return Err(DataError::invalid(
                "at least one split probability must be positive",
            ));
        }
        if (sum - 1.0).abs() > SUM_TOLERANCE {
            warn!("Split probabilities {values:?} sum to {sum} instead of 1.0");
        }
        Ok(Self(values))
    }

    pub fn get(&self, fold: Fold) -> f64 {
        self.0[fold.index()]
    }

    pub fn as_array(&self) -> [f64; 3] {
        self.0
    }

    /// Returns the exclusive end of the train and validation ranges over `n` items.
    ///
    /// The test range `[d2, n)` receives the rounding remainder.
    pub fn cut_points(&self, n: usize) -> (usize, usize) {
        let count = |p: f64| (p * n as f64).floor() as usize;
        let d1 = count(self.0[0]).min(n);
        let d2 = (d1 + count(self.0[1])).min(n);
        (d1, d2)
    }

    /// The fewest items for which [`Probabilities::cut_points`] gives every fold with a
    /// positive probability at least one item.
    pub fn min_partitions(&self) -> usize {
        let smallest = self
            .0
            .iter()
            .copied()
            .filter(|p| *p > 0.0)
            .fold(f64::INFINITY, f64::min);
        let start = (1.0 / smallest).ceil().max(1.0) as usize;
        (start..=start.saturating_mul(4))
            .find(|&n| self.covers(n))
            .unwrap_or(start)
    }

    fn covers(&self, n: usize) -> bool {
        let (d1, d2) = self.cut_points(n);
        let sizes = [d1, d2 - d1, n - d2];
        Fold::ALL
            .into_iter()
            .all(|fold| self.get(fold) == 0.0 || sizes[fold.index()] > 0)
    }

    /// Maps a uniform draw in `[0, 1)` to a fold using the normalized cumulative distribution.
    pub fn fold_for(&self, draw: f64) -> Fold {
        let sum: f64 = self.0.iter().sum();
        let train = self.0[0] / sum;
        let validation = train + self.0[1] / sum;
        if draw < train {
            Fold::Train
        } else if draw < validation || self.0[2] == 0.0 {
            Fold::Validation
        } else {
            Fold::Test
        }
    }
}

impl Default for Probabilities {
    fn default() -> Self {
        Self([0.7, 0.1, 0.2])
    }
}

impl TryFrom<Vec<f64>> for Probabilities {
    type Error = DataError;

    fn try_from(value: Vec<f64>) -> DataResult<Self> {
        match value.as_slice() {
            [train, validation, test] => Self::new(*train, *validation, *test),
            _ => Err(DataError::invalid(format!(
                "expected 3 split probabilities, got {}",
                value.len()
            ))),
        }
    }
}

impl From<Probabilities> for Vec<f64> {
    fn from(value: Probabilities) -> Self {
        value.0.to_vec()
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cut_points() {
        let p = Probabilities::default();
        assert_eq!(p.cut_points(100), (70, 80));
        assert_eq!(p.cut_points(7), (4, 4));
        assert_eq!(p.cut_points(0), (0, 0));

        let p = Probabilities::new(0.5, 0.5, 0.0).unwrap();
        assert_eq!(p.cut_points(11), (5, 10));
    }

    #[test]
    fn test_min_partitions() {
        assert_eq!(Probabilities::default().min_partitions(), 10);
        assert_eq!(Probabilities::new(0.5, 0.0, 0.5).unwrap().min_partitions(), 2);
        assert_eq!(Probabilities::new(1.0, 0.0, 0.0).unwrap().min_partitions(), 1);
        assert_eq!(Probabilities::new(0.6, 0.3, 0.1).unwrap().min_partitions(), 10);

        let p = Probabilities::new(0.45, 0.1, 0.45).unwrap();
        let n = p.min_partitions();
        let (d1, d2) = p.cut_points(n);
        assert!(d1 > 0 && d2 > d1 && n > d2);
    }

    #[test]
    fn test_invalid_probabilities() {
        assert!(Probabilities::new(-0.1, 0.6, 0.5).is_err());
        assert!(Probabilities::new(f64::NAN, 0.5, 0.5).is_err());
        assert!(Probabilities::new(0.0, 0.0, 0.0).is_err());
        assert!(Probabilities::try_from(vec![0.5, 0.5]).is_err());
    }

    #[test]
    fn test_fold_for_draw() {
        let p = Probabilities::default();
        assert_eq!(p.fold_for(0.0), Fold::Train);
        assert_eq!(p.fold_for(0.75), Fold::Validation);
        assert_eq!(p.fold_for(0.95), Fold::Test);

        let p = Probabilities::new(0.8, 0.2, 0.0).unwrap();
        assert_eq!(p.fold_for(0.999_999), Fold::Validation);
    }

    #[test]
    fn test_deserialize() {
        let p: Probabilities = serde_json::from_str("[0.6, 0.2, 0.2]").unwrap();
        assert_eq!(p.get(Fold::Train), 0.6);
        assert!(serde_json::from_str::<Probabilities>("[0.6, 0.2]").is_err());
    }
}
