//! Error types for parameter conversion and model I/O

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Invalid parameter: {field} - {reason}")]
    InvalidParameter { field: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl ModelError {
    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ModelError::InvalidParameter {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

pub type ModelResult<T> = Result<T, ModelError>;
