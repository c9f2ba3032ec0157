//! Backend module - pluggable vector search backends
//!
//! The trait pair in [`traits`] is the seam for approximate structures; the
//! shipped implementation is an exact flat scan.

mod flat;
mod traits;

pub use flat::FlatBackend;
pub use traits::{BackendError, VectorBackend, VectorSearcher};

use std::sync::Arc;

/// Supported backend types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    Flat,
}

impl std::str::FromStr for BackendType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "flat" => Ok(Self::Flat),
            _ => Err(format!("Unknown backend: {}", s)),
        }
    }
}

impl BackendType {
    /// Create the backend implementation for this type
    pub fn create(self) -> Arc<dyn VectorBackend> {
        match self {
            BackendType::Flat => Arc::new(FlatBackend),
        }
    }
}
