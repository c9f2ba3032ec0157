//! Backend traits for vector search

use thiserror::Error;

/// Errors surfaced by a vector backend
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("index build failed: {0}")]
    Build(String),

    #[error("search failed: {0}")]
    Search(String),
}

/// Trait for constructing vector indexes
///
/// `build` consumes a full snapshot of vectors and returns a searcher over
/// them; the caller owns swapping the returned searcher into service.
pub trait VectorBackend: Send + Sync {
    fn build(&self, vectors: Vec<Vec<f32>>) -> Result<Box<dyn VectorSearcher>, BackendError>;
}

/// Trait for searching a built vector index
pub trait VectorSearcher: Send + Sync {
    /// Search for nearest neighbors
    ///
    /// Returns (ordinal, score) pairs ordered by descending similarity,
    /// where ordinals are offsets into the vector order given to `build`.
    fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<(usize, f32)>, BackendError>;

    /// Get the number of vectors in the index
    fn len(&self) -> usize;

    /// Check if the index is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
