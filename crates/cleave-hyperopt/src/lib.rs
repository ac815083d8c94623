//! Hyperparameter search over model configs.
//!
//! A [`HyperoptConfig`] declares search spaces keyed by dotted parameter paths.
//! The [`TrialSampler`] turns them into per-trial parameters, which
//! [`substitute_parameters`] applies to the model config, and the
//! [`SerialExecutor`] runs each trial through a caller-provided [`TrialRunner`].

pub mod config;
pub mod error;
pub mod executor;
pub mod results;
pub mod sampler;
pub mod space;
pub mod substitution;

pub use config::HyperoptConfig;
pub use executor::{PlannedTrial, SerialExecutor, TrialRunner};
pub use results::{HyperoptResults, TrialResult};
pub use sampler::{TrialParameters, TrialSampler};
pub use space::SearchSpace;
pub use substitution::substitute_parameters;
