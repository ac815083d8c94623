use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the three dataset subsets produced by a split.
///
/// The discriminant is the fold label stored in split columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fold {
    Train = 0,
    Validation = 1,
    Test = 2,
}

impl Fold {
    pub const ALL: [Fold; 3] = [Fold::Train, Fold::Validation, Fold::Test];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_label(label: i64) -> Option<Self> {
        match label {
            0 => Some(Fold::Train),
            1 => Some(Fold::Validation),
            2 => Some(Fold::Test),
            _ => None,
        }
    }
}

impl fmt::Display for Fold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fold::Train => write!(f, "train"),
            Fold::Validation => write!(f, "validation"),
            Fold::Test => write!(f, "test"),
        }
    }
}
