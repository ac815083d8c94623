use cleave_common::error::CommonError;
use cleave_data::error::DataError;
use thiserror::Error;

pub type SplitResult<T> = Result<T, SplitError>;

#[derive(Debug, Error)]
pub enum SplitError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("not supported: {0}")]
    NotSupported(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    DataError(#[from] DataError),
}

impl SplitError {
    pub fn invalid(message: impl Into<String>) -> Self {
        SplitError::InvalidArgument(message.into())
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        SplitError::NotSupported(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        SplitError::InvalidConfig(message.into())
    }
}

impl From<CommonError> for SplitError {
    fn from(error: CommonError) -> Self {
        SplitError::DataError(error.into())
    }
}

impl From<serde_json::Error> for SplitError {
    fn from(error: serde_json::Error) -> Self {
        SplitError::InvalidConfig(error.to_string())
    }
}
