//! Simulated embedding provider
//!
//! Produces deterministic vectors from token hashes without any external
//! service, so indexes can be built and queried offline and in tests. Texts
//! sharing tokens land near each other under cosine similarity.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use async_trait::async_trait;

use super::traits::{EmbeddingError, EmbeddingProvider};

const DEFAULT_DIMENSIONS: usize = 256;

/// Deterministic hash-based embedding provider
pub struct SimulatedEmbedding {
    model_name: String,
    dimensions: usize,
}

impl SimulatedEmbedding {
    /// Create a simulated provider with the default dimensionality
    pub fn new(model_name: String) -> Self {
        Self::with_dimensions(model_name, DEFAULT_DIMENSIONS)
    }

    pub fn with_dimensions(model_name: String, dimensions: usize) -> Self {
        Self {
            model_name,
            dimensions,
        }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        for token in tokenize(text) {
            // Two hash-derived positions per token spread collisions out
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let h = hasher.finish();

            let first = (h % self.dimensions as u64) as usize;
            let second = ((h >> 17) % self.dimensions as u64) as usize;
            let sign = if h & 1 == 0 { 1.0 } else { -1.0 };

            vector[first] += 1.0;
            vector[second] += sign * 0.5;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }

        vector
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

#[async_trait]
impl EmbeddingProvider for SimulatedEmbedding {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn embed(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}
