//! Dataset store errors

use thiserror::Error;

/// Result type for dataset operations
pub type DatasetResult<T> = Result<T, DatasetError>;

/// Errors raised while adding, removing or building datasets
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DatasetError {
    /// Id is empty, whitespace-only, or contains an underscore
    #[error("Invalid dataset id: '{0}'")]
    InvalidId(String),

    /// A dataset with this id is already loaded
    #[error("Dataset already exists: {0}")]
    AlreadyExists(String),

    /// No dataset with this id is loaded
    #[error("Dataset not found: {0}")]
    NotFound(String),

    /// A record does not match its kind's declared fields
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

impl DatasetError {
    /// Stable error code string
    pub fn code(&self) -> &'static str {
        match self {
            DatasetError::InvalidId(_) => "INSIGHT_DATASET_INVALID_ID",
            DatasetError::AlreadyExists(_) => "INSIGHT_DATASET_EXISTS",
            DatasetError::NotFound(_) => "INSIGHT_DATASET_NOT_FOUND",
            DatasetError::InvalidRecord(_) => "INSIGHT_DATASET_INVALID_RECORD",
        }
    }

    /// Not-found is the only error that does not indicate a bad request
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatasetError::NotFound(_))
    }
}
