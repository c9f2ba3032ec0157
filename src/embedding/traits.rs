//! Embedding provider trait and error contract

use async_trait::async_trait;
use thiserror::Error;

/// Errors an embedding provider can surface
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Trait for embedding providers
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Get model name
    fn model_name(&self) -> &str;

    /// Compute embeddings for texts
    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}
