//! Error types for Polyglot services
//!
//! Provides a comprehensive error handling system with:
//! - Distinct error types for different failure modes
//! - Error codes for machine-readable identification
//! - Conversions from collaborator and I/O errors

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationError,
    DimensionMismatch,

    // Index errors (4xxx)
    IndexError,
    PersistenceError,

    // External collaborator errors (8xxx)
    DetectionError,
    TranslationError,
    EmbeddingError,
    EmbeddingTimeout,
    GenerationError,
    UpstreamError,

    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
    SerializationError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            // Validation (1xxx)
            ErrorCode::ValidationError => 1001,
            ErrorCode::DimensionMismatch => 1002,

            // Index (4xxx)
            ErrorCode::IndexError => 4001,
            ErrorCode::PersistenceError => 4002,

            // External (8xxx)
            ErrorCode::DetectionError => 8001,
            ErrorCode::TranslationError => 8002,
            ErrorCode::EmbeddingError => 8003,
            ErrorCode::EmbeddingTimeout => 8004,
            ErrorCode::GenerationError => 8005,
            ErrorCode::UpstreamError => 8006,

            // Internal (9xxx)
            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::SerializationError => 9003,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    // Index errors
    #[error("Index error: {message}")]
    Index { message: String },

    #[error("Persistence error: {message}")]
    Persistence { message: String },

    // External collaborator errors
    #[error("Language detection error: {message}")]
    Detection { message: String },

    #[error("Translation error: {message}")]
    Translation { message: String },

    #[error("Embedding service error: {message}")]
    Embedding { message: String },

    #[error("Embedding timeout after {timeout_ms}ms")]
    EmbeddingTimeout { timeout_ms: u64 },

    #[error("Generation error: {message}")]
    Generation { message: String },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    // Internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::DimensionMismatch { .. } => ErrorCode::DimensionMismatch,
            AppError::Index { .. } => ErrorCode::IndexError,
            AppError::Persistence { .. } => ErrorCode::PersistenceError,
            AppError::Detection { .. } => ErrorCode::DetectionError,
            AppError::Translation { .. } => ErrorCode::TranslationError,
            AppError::Embedding { .. } => ErrorCode::EmbeddingError,
            AppError::EmbeddingTimeout { .. } => ErrorCode::EmbeddingTimeout,
            AppError::Generation { .. } => ErrorCode::GenerationError,
            AppError::HttpClient(_) => ErrorCode::UpstreamError,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
            AppError::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Check if this error came from an external collaborator call
    pub fn is_collaborator_error(&self) -> bool {
        matches!(
            self.code().as_code(),
            8001..=8999
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Persistence {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = AppError::DimensionMismatch {
            expected: 1024,
            actual: 768,
        };
        assert_eq!(err.code(), ErrorCode::DimensionMismatch);
        assert_eq!(err.code().as_code(), 1002);
    }

    #[test]
    fn test_collaborator_error_range() {
        let err = AppError::Translation {
            message: "upstream closed".into(),
        };
        assert!(err.is_collaborator_error());

        let err = AppError::Persistence {
            message: "disk full".into(),
        };
        assert!(!err.is_collaborator_error());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: AppError = io.into();
        assert_eq!(err.code(), ErrorCode::PersistenceError);
    }
}
