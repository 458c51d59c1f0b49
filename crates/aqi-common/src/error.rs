//! Error types for the heatmap pipeline.

use thiserror::Error;

/// Result type alias using AqiError.
pub type AqiResult<T> = Result<T, AqiError>;

/// Primary error type for pipeline operations.
#[derive(Debug, Error)]
pub enum AqiError {
    // === Input Errors ===
    #[error("Invalid grid sample: {0}")]
    InvalidSample(String),

    #[error("Invalid grid step: {0}")]
    InvalidStep(String),

    #[error("Invalid threshold set: {0}")]
    InvalidThresholds(String),

    // === Data Errors ===
    #[error("Grid data not available: {0}")]
    DataNotAvailable(String),

    #[error("Failed to decode grid payload: {0}")]
    DecodeError(String),

    // === Contouring Errors ===
    #[error("Contouring failed: {0}")]
    ContourError(String),

    // === Infrastructure Errors ===
    #[error("Backend request failed: {0}")]
    BackendError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AqiError {
    /// Whether the caller can retry the operation on a later refresh.
    ///
    /// A recoverable error degrades the visualization for one cycle but
    /// must never tear down the host view.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AqiError::BackendError(_) | AqiError::DataNotAvailable(_) | AqiError::DecodeError(_)
        )
    }
}

impl From<serde_json::Error> for AqiError {
    fn from(err: serde_json::Error) -> Self {
        AqiError::DecodeError(format!("JSON error: {}", err))
    }
}
