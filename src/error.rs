//! Error types for the homeval crate

use thiserror::Error;

/// Result type alias for homeval operations
pub type Result<T> = std::result::Result<T, HomevalError>;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum HomevalError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Preprocessing error: {0}")]
    PreprocessingError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Computation error: {0}")]
    ComputationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<polars::error::PolarsError> for HomevalError {
    fn from(err: polars::error::PolarsError) -> Self {
        HomevalError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for HomevalError {
    fn from(err: serde_json::Error) -> Self {
        HomevalError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for HomevalError {
    fn from(err: ndarray::ShapeError) -> Self {
        HomevalError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HomevalError::DataError("bad csv".to_string());
        assert_eq!(err.to_string(), "Data error: bad csv");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: HomevalError = io_err.into();
        assert!(matches!(err, HomevalError::IoError(_)));
    }
}
