//! Error Handling
//!
//! Application-level error type for the orchestration facade. Remote-call
//! failures are not propagated through this type: they are classified by
//! `museboard_inference::InferenceError` and surfaced into session state
//! (modality-scoped slots, the credential flag) by the currentness-gated
//! publish steps. `AppError` covers what the facade itself can reject.

use thiserror::Error;

use museboard_core::CoreError;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

// Domain rejections surface to the caller as validation errors.
impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) | CoreError::NotFound(msg) => Self::Validation(msg),
            CoreError::Internal(msg) => Self::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AppError::validation("prompt must not be empty");
        assert_eq!(err.to_string(), "Validation error: prompt must not be empty");
    }

    #[test]
    fn test_core_error_converts_to_validation() {
        let err: AppError = CoreError::validation("entity already exists: Moon").into();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
