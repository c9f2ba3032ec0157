//! Index manager - registry of named indexes and rebuild orchestration
//!
//! The manager owns index creation, lookup, deletion, and rebuild dispatch.
//! Rebuilds run as background tasks decoupled from the request that
//! triggered them: the caller gets an immediate acknowledgment and observes
//! completion by polling index status.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::backend::VectorBackend;
use crate::embedding::EmbeddingProvider;
use crate::error::{Error, Result};

use super::handle::{ActiveIndex, BuildJob, IndexHandle, IndexStatus};
use super::meta::{IndexMeta, IndexSettings};

/// Validate an index name: `[A-Za-z0-9_-]{1,64}`
pub fn validate_index_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > 64 {
        return Err(Error::Validation(format!(
            "index name must be 1-64 characters: '{}'",
            name
        )));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(Error::Validation(format!(
            "index name may only contain alphanumerics, '_', '-': '{}'",
            name
        )));
    }
    Ok(())
}

/// Registry of all indexes plus the injected collaborators
pub struct IndexManager {
    indexes_dir: PathBuf,
    indexes: RwLock<HashMap<String, Arc<IndexHandle>>>,
    embedder: Arc<dyn EmbeddingProvider>,
    backend: Arc<dyn VectorBackend>,
}

impl IndexManager {
    /// Open the manager over a data directory, loading any persisted indexes
    pub fn open(
        data_dir: &std::path::Path,
        embedder: Arc<dyn EmbeddingProvider>,
        backend: Arc<dyn VectorBackend>,
    ) -> Result<Self> {
        let indexes_dir = data_dir.join("indexes");
        std::fs::create_dir_all(&indexes_dir)?;

        let mut indexes = HashMap::new();
        for entry in std::fs::read_dir(&indexes_dir)? {
            let path = entry?.path();
            if !path.is_dir() || !path.join("meta.json").exists() {
                continue;
            }
            match IndexHandle::open(&path) {
                Ok(handle) => {
                    indexes.insert(handle.name().to_string(), handle);
                }
                Err(e) => {
                    warn!("Failed to load index at {:?}: {}", path, e);
                }
            }
        }

        info!(
            "Index manager ready: {} indexes in {:?}",
            indexes.len(),
            indexes_dir
        );

        Ok(Self {
            indexes_dir,
            indexes: RwLock::new(indexes),
            embedder,
            backend,
        })
    }

    /// Create a new, empty index
    pub async fn create(&self, name: &str, settings: IndexSettings) -> Result<IndexStatus> {
        validate_index_name(name)?;
        // Surface invalid chunking settings before touching disk
        settings.chunker()?;

        let mut indexes = self.indexes.write().await;
        if indexes.contains_key(name) {
            return Err(Error::IndexExists(name.to_string()));
        }

        let root = self.indexes_dir.join(name);
        let handle = IndexHandle::create(&root, IndexMeta::new(name.to_string(), settings))?;
        let status = handle.status().await;
        indexes.insert(name.to_string(), handle);

        info!("Created index '{}'", name);
        Ok(status)
    }

    /// Get an index handle by name
    pub async fn get(&self, name: &str) -> Result<Arc<IndexHandle>> {
        self.indexes
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| Error::IndexNotFound(name.to_string()))
    }

    /// Status of every index, sorted by name
    pub async fn list(&self) -> Vec<IndexStatus> {
        let handles: Vec<Arc<IndexHandle>> =
            self.indexes.read().await.values().cloned().collect();

        let mut statuses = Vec::with_capacity(handles.len());
        for handle in handles {
            statuses.push(handle.status().await);
        }
        statuses.sort_by(|a, b| a.name.cmp(&b.name));
        statuses
    }

    /// Delete an index and all its documents, chunks, and vector data
    ///
    /// An in-flight rebuild notices the deletion at swap time and discards
    /// its output.
    pub async fn delete(&self, name: &str) -> Result<()> {
        let handle = {
            let mut indexes = self.indexes.write().await;
            indexes
                .remove(name)
                .ok_or_else(|| Error::IndexNotFound(name.to_string()))?
        };

        handle.mark_deleted();
        std::fs::remove_dir_all(handle.root())?;
        info!("Deleted index '{}'", name);
        Ok(())
    }

    /// Start a background rebuild of an index
    ///
    /// Returns once the build task is spawned; the join handle is exposed so
    /// callers that need completion (tests, CLI polling shortcuts) can await
    /// it, but the service surface never does.
    pub async fn rebuild(&self, name: &str) -> Result<JoinHandle<()>> {
        let handle = self.get(name).await?;
        let job = handle.begin_build().await?;

        let embedder = self.embedder.clone();
        let backend = self.backend.clone();
        let task_handle = handle.clone();

        Ok(tokio::spawn(async move {
            let snapshot_epoch = job.snapshot_epoch;
            let outcome = run_build(job, embedder, backend).await;
            task_handle.complete_build(outcome, snapshot_epoch).await;
        }))
    }
}

/// Embed the snapshot and hand it to the backend
///
/// Runs outside any index lock; both collaborators may be slow.
async fn run_build(
    job: BuildJob,
    embedder: Arc<dyn EmbeddingProvider>,
    backend: Arc<dyn VectorBackend>,
) -> Result<ActiveIndex> {
    let texts: Vec<&str> = job.chunks.iter().map(|c| c.text.as_str()).collect();
    let vectors = embedder.embed(&texts).await?;
    let searcher = backend.build(vectors)?;

    Ok(ActiveIndex {
        searcher,
        chunks: job.chunks,
        version: job.target_version,
    })
}
