//! Flat backend - exact cosine similarity over the full vector set
//!
//! No approximation structure: every query scans all vectors. Vectors are
//! normalized once at build time so search is a plain dot product.

use super::traits::{BackendError, VectorBackend, VectorSearcher};

/// Exact-scan backend
pub struct FlatBackend;

/// Searcher over normalized vectors
pub struct FlatSearcher {
    vectors: Vec<Vec<f32>>,
    dimensions: usize,
}

impl VectorBackend for FlatBackend {
    fn build(&self, vectors: Vec<Vec<f32>>) -> Result<Box<dyn VectorSearcher>, BackendError> {
        let dimensions = vectors.first().map_or(0, |v| v.len());

        let mut normalized = Vec::with_capacity(vectors.len());
        for (i, mut vector) in vectors.into_iter().enumerate() {
            if vector.len() != dimensions {
                return Err(BackendError::Build(format!(
                    "vector {} has dimension {}, expected {}",
                    i,
                    vector.len(),
                    dimensions
                )));
            }
            let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm > 0.0 {
                for value in &mut vector {
                    *value /= norm;
                }
            }
            normalized.push(vector);
        }

        Ok(Box::new(FlatSearcher {
            vectors: normalized,
            dimensions,
        }))
    }
}

impl VectorSearcher for FlatSearcher {
    fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<(usize, f32)>, BackendError> {
        if self.vectors.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dimensions {
            return Err(BackendError::Search(format!(
                "query has dimension {}, index has {}",
                query.len(),
                self.dimensions
            )));
        }

        let norm: f32 = query.iter().map(|x| x * x).sum::<f32>().sqrt();
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(ordinal, vector)| {
                let dot: f32 = vector.iter().zip(query).map(|(a, b)| a * b).sum();
                let score = if norm > 0.0 { dot / norm } else { 0.0 };
                (ordinal, score)
            })
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(top_k);

        Ok(scored)
    }

    fn len(&self) -> usize {
        self.vectors.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_and_search_ranks_by_cosine() {
        let searcher = FlatBackend
            .build(vec![
                vec![1.0, 0.0, 0.0],
                vec![0.0, 1.0, 0.0],
                vec![0.9, 0.1, 0.0],
            ])
            .unwrap();

        let results = searcher.search(&[1.0, 0.0, 0.0], 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, 0);
        assert_eq!(results[1].0, 2);
        assert!(results[0].1 >= results[1].1);
    }

    #[test]
    fn test_dimension_mismatch_is_build_error() {
        let err = FlatBackend
            .build(vec![vec![1.0, 0.0], vec![1.0, 0.0, 0.0]])
            .err()
            .unwrap();
        assert!(matches!(err, BackendError::Build(_)));
    }

    #[test]
    fn test_query_dimension_mismatch_is_search_error() {
        let searcher = FlatBackend.build(vec![vec![1.0, 0.0]]).unwrap();
        let err = searcher.search(&[1.0, 0.0, 0.0], 1).err().unwrap();
        assert!(matches!(err, BackendError::Search(_)));
    }

    #[test]
    fn test_empty_index_returns_no_results() {
        let searcher = FlatBackend.build(Vec::new()).unwrap();
        assert!(searcher.is_empty());
        assert!(searcher.search(&[1.0], 5).unwrap().is_empty());
    }
}
