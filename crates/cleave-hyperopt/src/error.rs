use cleave_common::error::CommonError;
use thiserror::Error;

pub type HyperoptResult<T> = Result<T, HyperoptError>;

#[derive(Debug, Error)]
pub enum HyperoptError {
    #[error("invalid search space for {0}: {1}")]
    InvalidSpace(String, String),
    #[error("invalid hyperopt config: {0}")]
    InvalidConfig(String),
    #[error("invalid parameter {0}: {1}")]
    InvalidParameter(String, String),
    #[error("no hyperopt trial completed successfully out of {0}")]
    NoSuccessfulTrials(usize),
    #[error("error in JSON serde: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    CommonError(#[from] CommonError),
}

impl HyperoptError {
    pub fn space(name: impl Into<String>, message: impl Into<String>) -> Self {
        HyperoptError::InvalidSpace(name.into(), message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        HyperoptError::InvalidConfig(message.into())
    }

    pub fn parameter(name: impl Into<String>, message: impl Into<String>) -> Self {
        HyperoptError::InvalidParameter(name.into(), message.into())
    }
}
