//! Splitting datasets into train, validation and test folds.

pub mod error;
pub mod orchestrator;
pub mod registry;
pub mod splitter;

pub use orchestrator::{
    get_splitter, resolve_splitter, split_dataset, split_dataset_with_config,
    split_with_splitter, DEFAULT_RANDOM_SEED,
};
pub use registry::SplitterRegistry;
pub use splitter::Splitter;
