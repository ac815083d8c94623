use arrow_schema::ArrowError;
use cleave_common::error::CommonError;
use thiserror::Error;

pub type DataResult<T> = Result<T, DataError>;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("missing column: {0}")]
    MissingColumn(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("not supported: {0}")]
    NotSupported(String),
    #[error("internal error: {0}")]
    InternalError(String),
    #[error("error in Arrow: {0}")]
    ArrowError(#[from] ArrowError),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DataError {
    pub fn missing_column(name: impl Into<String>) -> Self {
        DataError::MissingColumn(name.into())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        DataError::InvalidArgument(message.into())
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        DataError::NotSupported(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        DataError::InternalError(message.into())
    }
}

impl From<CommonError> for DataError {
    fn from(error: CommonError) -> Self {
        match error {
            CommonError::InvalidArgument(message) => DataError::InvalidArgument(message),
        }
    }
}
