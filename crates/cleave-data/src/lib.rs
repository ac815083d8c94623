//! Columnar dataframes and the engine capabilities dataset splitting relies on.
//!
//! A [`DataFrame`] is a list of Arrow record batches (partitions) sharing one schema.
//! A [`DataFrameEngine`] decides how rows are laid out across partitions and
//! implements the split primitives that depend on that layout.

pub mod datetime;
pub mod engine;
pub mod error;
pub mod frame;
pub mod io;
pub mod probabilities;

pub use engine::{Backend, DataFrameEngine, LocalEngine, PartitionedEngine, SplitRng};
pub use frame::{DataFrame, DatasetSplits};
pub use probabilities::Probabilities;
