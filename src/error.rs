//! Error types for lodestone

use thiserror::Error;

use crate::backend::BackendError;
use crate::embedding::EmbeddingError;

/// Result type alias using the lodestone error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for lodestone
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Index not found: {0}")]
    IndexNotFound(String),

    #[error("Index already exists: {0}")]
    IndexExists(String),

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Document already exists: {0}")]
    DocumentExists(String),

    #[error("Rebuild already in progress for index: {0}")]
    RebuildInProgress(String),

    #[error("Embedding provider error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Vector backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Document store corrupted: {0}")]
    CorruptStore(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Stable machine-readable code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::IndexNotFound(_) => "INDEX_NOT_FOUND",
            Self::IndexExists(_) => "INDEX_ALREADY_EXISTS",
            Self::DocumentNotFound(_) => "DOCUMENT_NOT_FOUND",
            Self::DocumentExists(_) => "DOCUMENT_ALREADY_EXISTS",
            Self::RebuildInProgress(_) => "REBUILD_IN_PROGRESS",
            Self::Embedding(_) | Self::Backend(_) => "BACKEND_ERROR",
            Self::CorruptStore(_) => "CORRUPT_STORE",
            Self::Io(_) | Self::Serialization(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_stable() {
        assert_eq!(Error::Validation("x".into()).code(), "VALIDATION_ERROR");
        assert_eq!(Error::IndexNotFound("x".into()).code(), "INDEX_NOT_FOUND");
        assert_eq!(Error::IndexExists("x".into()).code(), "INDEX_ALREADY_EXISTS");
        assert_eq!(
            Error::RebuildInProgress("x".into()).code(),
            "REBUILD_IN_PROGRESS"
        );
    }
}
