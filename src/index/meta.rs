//! Index metadata - settings and persisted descriptor

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chunker::Chunker;
use crate::error::Result;

/// Per-index settings fixed at creation time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexSettings {
    /// Chunk size in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Chunk overlap in characters
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

fn default_chunk_size() -> usize {
    512
}

fn default_chunk_overlap() -> usize {
    64
}

impl IndexSettings {
    /// Build the chunker these settings describe, validating them
    pub fn chunker(&self) -> Result<Chunker> {
        Chunker::new(self.chunk_size, self.chunk_overlap)
    }
}

/// Index metadata stored alongside the index's documents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMeta {
    /// Index name, fixed after creation
    pub name: String,

    /// Monotonic rebuild counter; 0 until the first successful rebuild
    #[serde(default)]
    pub version: u64,

    pub settings: IndexSettings,

    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl IndexMeta {
    pub fn new(name: String, settings: IndexSettings) -> Self {
        Self {
            name,
            version: 0,
            settings,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    /// Load metadata from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let meta: IndexMeta = serde_json::from_str(&content)?;
        Ok(meta)
    }

    /// Save metadata to a JSON file, atomically
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}
