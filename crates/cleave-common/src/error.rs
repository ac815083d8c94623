use thiserror::Error;

pub type CommonResult<T> = Result<T, CommonError>;

#[derive(Debug, Error)]
pub enum CommonError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl CommonError {
    pub fn invalid(message: impl Into<String>) -> Self {
        CommonError::InvalidArgument(message.into())
    }
}

impl From<serde_json::Error> for CommonError {
    fn from(error: serde_json::Error) -> Self {
        CommonError::invalid(error.to_string())
    }
}
