//! Per-index runtime - document mutations, lifecycle state, active searcher
//!
//! Each index is an independent unit of concurrency: one `RwLock` guards its
//! store, state, and active vector structure, and nothing here ever locks
//! across indexes. Embedding and backend calls never run under this lock;
//! mutation only updates the store and flips the staleness state, deferring
//! all build work to rebuild time.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::backend::VectorSearcher;
use crate::chunker::Chunker;
use crate::error::{Error, Result};
use crate::filter::MetadataFilter;
use crate::store::{make_chunks, validate_document_id, Document, DocumentStore};

use super::meta::{IndexMeta, IndexSettings};
use super::state::IndexState;

/// Snapshot of one chunk as it was handed to the vector backend
#[derive(Debug, Clone)]
pub struct IndexedChunk {
    pub chunk_id: String,
    pub document_id: String,
    pub text: String,
    pub metadata: Value,
}

/// A successfully built vector structure with its chunk snapshot
///
/// Self-contained: semantic queries against this version resolve text and
/// metadata from the snapshot, so results stay consistent with the build
/// even while documents mutate underneath.
pub struct ActiveIndex {
    pub searcher: Box<dyn VectorSearcher>,
    /// Ordinal-aligned with the vectors given to the backend
    pub chunks: Vec<IndexedChunk>,
    pub version: u64,
}

/// Incoming document for an add request
#[derive(Debug, Clone, Deserialize)]
pub struct NewDocument {
    /// Caller-supplied id; generated when absent
    pub id: Option<String>,
    pub content: String,
    #[serde(default)]
    pub metadata: Option<Value>,
}

/// Per-document outcome of an add request
#[derive(Debug, Clone, Serialize)]
pub struct DocumentAddResult {
    pub id: String,
    pub chunk_count: usize,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Point-in-time view of an index for listings and status polling
#[derive(Debug, Clone, Serialize)]
pub struct IndexStatus {
    pub name: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_cause: Option<String>,
    pub version: u64,
    pub document_count: usize,
    pub chunk_count: usize,
    /// Chunks served by the active vector structure, if any
    pub indexed_chunk_count: usize,
    pub settings: IndexSettings,
    pub created_at: chrono::DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<chrono::DateTime<Utc>>,
}

pub(crate) struct IndexInner {
    pub meta: IndexMeta,
    pub state: IndexState,
    pub store: DocumentStore,
    pub chunker: Chunker,
    /// Mutation counter; compared against a build's snapshot to decide
    /// whether deferred staleness applies at completion
    pub epoch: u64,
    pub active: Option<Arc<ActiveIndex>>,
}

/// Snapshot handed to a background build task
pub(crate) struct BuildJob {
    pub chunks: Vec<IndexedChunk>,
    pub snapshot_epoch: u64,
    pub target_version: u64,
}

/// One index: documents, lifecycle state, and the active vector structure
pub struct IndexHandle {
    name: String,
    root: PathBuf,
    inner: RwLock<IndexInner>,
    deleted: AtomicBool,
}

impl IndexHandle {
    /// Create a new, empty index on disk
    pub fn create(root: &Path, meta: IndexMeta) -> Result<Arc<Self>> {
        let chunker = meta.settings.chunker()?;
        std::fs::create_dir_all(root)?;
        let store = DocumentStore::create(&root.join("documents"))?;
        meta.save(&root.join("meta.json"))?;

        Ok(Arc::new(Self {
            name: meta.name.clone(),
            root: root.to_path_buf(),
            inner: RwLock::new(IndexInner {
                meta,
                state: IndexState::Empty,
                store,
                chunker,
                epoch: 0,
                active: None,
            }),
            deleted: AtomicBool::new(false),
        }))
    }

    /// Open an existing index from disk
    ///
    /// Built vector structures are not persisted, so a non-empty index
    /// reopens as `Stale` and needs one rebuild before serving semantic
    /// queries. A corrupt document store surfaces as `Failed`; no silent
    /// recovery.
    pub fn open(root: &Path) -> Result<Arc<Self>> {
        let meta = IndexMeta::load(&root.join("meta.json"))?;
        let chunker = meta.settings.chunker()?;

        let (store, state) = match DocumentStore::open(&root.join("documents")) {
            Ok(store) => {
                let state = if store.is_empty() {
                    IndexState::Empty
                } else {
                    IndexState::Stale
                };
                (store, state)
            }
            Err(Error::CorruptStore(cause)) => {
                warn!("Index '{}' store is corrupt: {}", meta.name, cause);
                (
                    DocumentStore::create(&root.join("documents"))?,
                    IndexState::Failed { cause },
                )
            }
            Err(e) => return Err(e),
        };

        Ok(Arc::new(Self {
            name: meta.name.clone(),
            root: root.to_path_buf(),
            inner: RwLock::new(IndexInner {
                meta,
                state,
                store,
                chunker,
                epoch: 0,
                active: None,
            }),
            deleted: AtomicBool::new(false),
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub(crate) fn mark_deleted(&self) {
        self.deleted.store(true, Ordering::SeqCst);
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted.load(Ordering::SeqCst)
    }

    /// Current status snapshot
    pub async fn status(&self) -> IndexStatus {
        let inner = self.inner.read().await;
        IndexStatus {
            name: self.name.clone(),
            status: inner.state.name(),
            failure_cause: inner.state.failure_cause().map(str::to_string),
            version: inner.meta.version,
            document_count: inner.store.len(),
            chunk_count: inner.store.chunk_count(),
            indexed_chunk_count: inner.active.as_ref().map_or(0, |a| a.chunks.len()),
            settings: inner.meta.settings.clone(),
            created_at: inner.meta.created_at,
            updated_at: inner.meta.updated_at,
        }
    }

    /// The last successfully built vector structure, if any
    ///
    /// Reads are always served from this even while the index is stale or
    /// building; staleness is advisory, never blocking.
    pub async fn active(&self) -> Option<Arc<ActiveIndex>> {
        self.inner.read().await.active.clone()
    }

    /// Add one or more documents; per-document outcomes, one failure never
    /// aborts its siblings
    pub async fn add_documents(
        &self,
        docs: Vec<NewDocument>,
        update_if_exists: bool,
    ) -> Result<Vec<DocumentAddResult>> {
        let mut inner = self.inner.write().await;
        let mut results = Vec::with_capacity(docs.len());
        let mut mutated = false;

        for doc in docs {
            let id = doc
                .id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

            let outcome = Self::add_one(&mut inner, &id, doc.content, doc.metadata, update_if_exists);
            match outcome {
                Ok(result) => {
                    mutated = true;
                    results.push(result);
                }
                Err(e) => results.push(DocumentAddResult {
                    id,
                    chunk_count: 0,
                    status: "failed",
                    error: Some(e.to_string()),
                }),
            }
        }

        if mutated {
            Self::note_mutation(&self.root, &mut inner)?;
        }
        Ok(results)
    }

    fn add_one(
        inner: &mut IndexInner,
        id: &str,
        content: String,
        metadata: Option<Value>,
        update_if_exists: bool,
    ) -> Result<DocumentAddResult> {
        validate_document_id(id)?;
        if content.is_empty() {
            return Err(Error::Validation("content must not be empty".into()));
        }

        let exists = inner.store.contains(id);
        if exists && !update_if_exists {
            return Err(Error::DocumentExists(id.to_string()));
        }

        let chunks = make_chunks(id, &inner.chunker, &content);
        let chunk_count = chunks.len();
        let now = Utc::now();
        let doc = Document {
            id: id.to_string(),
            content,
            metadata: metadata.unwrap_or_else(|| Value::Object(serde_json::Map::new())),
            chunks,
            revision: 1,
            created_at: now,
            updated_at: now,
            seq: 0,
        };

        if exists {
            inner.store.put(doc)?;
        } else {
            inner.store.insert(doc)?;
        }

        Ok(DocumentAddResult {
            id: id.to_string(),
            chunk_count,
            status: if exists { "updated" } else { "added" },
            error: None,
        })
    }

    /// Get a document by id
    pub async fn get_document(&self, id: &str) -> Result<Document> {
        let inner = self.inner.read().await;
        inner.store.get(id).cloned()
    }

    /// List documents in insertion order, optionally filtered by metadata
    pub async fn list_documents(&self, filter: Option<&MetadataFilter>) -> Vec<Document> {
        let inner = self.inner.read().await;
        inner
            .store
            .list()
            .into_iter()
            .filter(|doc| filter.map_or(true, |f| f.matches(&doc.metadata)))
            .cloned()
            .collect()
    }

    /// Replace a document's content (re-chunking it) and/or metadata
    pub async fn update_document(
        &self,
        id: &str,
        content: Option<String>,
        metadata: Option<Value>,
        merge_metadata: bool,
    ) -> Result<Document> {
        let mut inner = self.inner.write().await;
        let mut doc = inner.store.get(id)?.clone();

        if let Some(content) = content {
            if content.is_empty() {
                return Err(Error::Validation("content must not be empty".into()));
            }
            doc.chunks = make_chunks(id, &inner.chunker, &content);
            doc.content = content;
        }
        if let Some(metadata) = metadata {
            doc.metadata = if merge_metadata {
                merge_values(doc.metadata, metadata)
            } else {
                metadata
            };
        }
        doc.updated_at = Utc::now();

        let updated = inner.store.put(doc)?.clone();
        Self::note_mutation(&self.root, &mut inner)?;
        Ok(updated)
    }

    /// Update only a document's metadata
    pub async fn patch_metadata(&self, id: &str, metadata: Value, merge: bool) -> Result<Document> {
        let mut inner = self.inner.write().await;
        let patched = inner.store.patch_metadata(id, metadata, merge)?.clone();
        Self::note_mutation(&self.root, &mut inner)?;
        Ok(patched)
    }

    /// Delete a document
    pub async fn delete_document(&self, id: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.store.delete(id)?;
        Self::note_mutation(&self.root, &mut inner)?;
        Ok(())
    }

    /// Delete documents by id list or by metadata filter
    pub async fn bulk_delete(
        &self,
        ids: Option<&[String]>,
        filter: Option<&MetadataFilter>,
    ) -> Result<usize> {
        let mut inner = self.inner.write().await;
        let deleted = match (ids, filter) {
            (Some(ids), _) => inner.store.bulk_delete(ids)?,
            (None, Some(filter)) => inner.store.delete_matching(filter)?,
            (None, None) => {
                return Err(Error::Validation(
                    "bulk delete requires document_ids or a metadata filter".into(),
                ))
            }
        };
        if deleted > 0 {
            Self::note_mutation(&self.root, &mut inner)?;
        }
        Ok(deleted)
    }

    /// Current chunks with their document metadata, in insertion order
    ///
    /// Grep search scans the live store rather than the built snapshot.
    pub async fn current_chunks(&self) -> Vec<IndexedChunk> {
        let inner = self.inner.read().await;
        snapshot_chunks(&inner.store)
    }

    /// Record a document mutation: bump the epoch and apply the staleness
    /// transition (deferred while a build is in flight)
    fn note_mutation(root: &Path, inner: &mut IndexInner) -> Result<()> {
        inner.epoch += 1;
        inner.state = inner.state.after_mutation();
        inner.meta.updated_at = Some(Utc::now());
        inner.meta.save(&root.join("meta.json"))?;
        Ok(())
    }

    /// Enter the building state and snapshot the chunk set
    ///
    /// The only exclusive transition: a second rebuild request while one is
    /// in flight is a conflict, surfaced and never auto-retried.
    pub(crate) async fn begin_build(&self) -> Result<BuildJob> {
        let mut inner = self.inner.write().await;
        if inner.state.is_building() {
            return Err(Error::RebuildInProgress(self.name.clone()));
        }

        let chunks = snapshot_chunks(&inner.store);

        let job = BuildJob {
            chunks,
            snapshot_epoch: inner.epoch,
            target_version: inner.meta.version + 1,
        };
        inner.state = IndexState::Building;
        info!(
            "Index '{}' rebuild started: {} chunks, target version {}",
            self.name,
            job.chunks.len(),
            job.target_version
        );
        Ok(job)
    }

    /// Apply a finished build: swap the active structure in atomically, or
    /// record the failure cause
    pub(crate) async fn complete_build(
        &self,
        outcome: Result<ActiveIndex>,
        snapshot_epoch: u64,
    ) {
        if self.is_deleted() {
            info!(
                "Index '{}' was deleted mid-build, discarding build output",
                self.name
            );
            return;
        }

        let mut inner = self.inner.write().await;
        match outcome {
            Ok(active) => {
                inner.meta.version = active.version;
                inner.meta.updated_at = Some(Utc::now());
                let meta_path = self.root.join("meta.json");
                if let Err(e) = inner.meta.save(&meta_path) {
                    warn!("Failed to persist metadata for '{}': {}", self.name, e);
                }

                // Mutations that landed during the build take effect now
                inner.state = if inner.epoch > snapshot_epoch {
                    IndexState::Stale
                } else {
                    IndexState::Ready
                };
                info!(
                    "Index '{}' rebuild complete: version {}, {} chunks, state {}",
                    self.name,
                    active.version,
                    active.chunks.len(),
                    inner.state.name()
                );
                inner.active = Some(Arc::new(active));
            }
            Err(e) => {
                warn!("Index '{}' rebuild failed: {}", self.name, e);
                // Previous active structure, if any, keeps serving reads
                inner.state = IndexState::Failed {
                    cause: e.to_string(),
                };
            }
        }
    }
}

/// Chunks with their document metadata, in document insertion order
fn snapshot_chunks(store: &DocumentStore) -> Vec<IndexedChunk> {
    store
        .list()
        .into_iter()
        .flat_map(|doc| {
            doc.chunks.iter().map(move |chunk| IndexedChunk {
                chunk_id: chunk.id.clone(),
                document_id: doc.id.clone(),
                text: chunk.text.clone(),
                metadata: doc.metadata.clone(),
            })
        })
        .collect()
}

fn merge_values(base: Value, patch: Value) -> Value {
    match (base, patch) {
        (Value::Object(mut base), Value::Object(patch)) => {
            for (k, v) in patch {
                base.insert(k, v);
            }
            Value::Object(base)
        }
        (_, patch) => patch,
    }
}
