//! Document store - durable per-index map of document id to content
//!
//! Each document is one JSON file under the index's `documents/` directory,
//! written via a temp file and an atomic rename so concurrent readers never
//! observe a partially written document. Listing order is insertion order,
//! tracked explicitly through a per-document sequence number rather than map
//! iteration order.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::chunker::Chunker;
use crate::error::{Error, Result};
use crate::filter::MetadataFilter;

/// A bounded passage of document text indexed as one retrieval unit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    pub id: String,
    pub document_id: String,
    /// Ordinal of this chunk within its document
    pub position: usize,
    /// Character offset of the chunk start within the document content
    pub offset: usize,
    pub text: String,
}

/// A stored document with its chunks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub id: String,
    pub content: String,
    #[serde(default = "empty_metadata")]
    pub metadata: Value,
    pub chunks: Vec<Chunk>,
    pub revision: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Insertion sequence, used to keep listing order stable across restarts
    #[serde(default)]
    pub(crate) seq: u64,
}

fn empty_metadata() -> Value {
    Value::Object(serde_json::Map::new())
}

/// Split document content into chunks using the index's chunker
pub fn make_chunks(doc_id: &str, chunker: &Chunker, content: &str) -> Vec<Chunk> {
    chunker
        .chunk(content)
        .into_iter()
        .enumerate()
        .map(|(position, piece)| Chunk {
            id: format!("{}_chunk_{}", doc_id, position),
            document_id: doc_id.to_string(),
            position,
            offset: piece.offset,
            text: piece.text,
        })
        .collect()
}

/// Validate a caller-supplied document id
///
/// Ids become file names, so the accepted alphabet is restricted.
pub fn validate_document_id(id: &str) -> Result<()> {
    if id.is_empty() || id.len() > 128 {
        return Err(Error::Validation(format!(
            "document id must be 1-128 characters: '{}'",
            id
        )));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
    {
        return Err(Error::Validation(format!(
            "document id may only contain alphanumerics, '_', '-', '.': '{}'",
            id
        )));
    }
    Ok(())
}

/// Durable map of document id to document for one index
#[derive(Debug)]
pub struct DocumentStore {
    dir: PathBuf,
    docs: HashMap<String, Document>,
    /// Document ids in insertion order
    order: Vec<String>,
    next_seq: u64,
}

impl DocumentStore {
    /// Create an empty store at `dir`
    pub fn create(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            docs: HashMap::new(),
            order: Vec::new(),
            next_seq: 0,
        })
    }

    /// Open an existing store, loading every persisted document
    ///
    /// An unparseable document file is a corruption of the store and is
    /// surfaced as an error rather than skipped.
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;

        let mut docs = HashMap::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let content = std::fs::read_to_string(&path)?;
            let doc: Document = serde_json::from_str(&content).map_err(|e| {
                Error::CorruptStore(format!("unreadable document file {:?}: {}", path, e))
            })?;
            docs.insert(doc.id.clone(), doc);
        }

        let mut order: Vec<String> = docs.keys().cloned().collect();
        order.sort_by_key(|id| (docs[id].seq, id.clone()));
        let next_seq = docs.values().map(|d| d.seq + 1).max().unwrap_or(0);

        Ok(Self {
            dir: dir.to_path_buf(),
            docs,
            order,
            next_seq,
        })
    }

    fn doc_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    /// Write a document file atomically: temp file in the same directory,
    /// then rename over the final path.
    fn persist(&self, doc: &Document) -> Result<()> {
        let final_path = self.doc_path(&doc.id);
        let tmp_path = self.dir.join(format!(".{}.json.tmp", doc.id));
        let json = serde_json::to_string_pretty(doc)?;
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, final_path)?;
        Ok(())
    }

    /// Insert a new document; fails if the id is already present
    pub fn insert(&mut self, mut doc: Document) -> Result<&Document> {
        if self.docs.contains_key(&doc.id) {
            return Err(Error::DocumentExists(doc.id));
        }
        doc.seq = self.next_seq;
        self.next_seq += 1;
        self.persist(&doc)?;
        self.order.push(doc.id.clone());
        let id = doc.id.clone();
        self.docs.insert(id.clone(), doc);
        Ok(&self.docs[&id])
    }

    /// Upsert a document, preserving creation time and insertion order on
    /// replacement
    pub fn put(&mut self, mut doc: Document) -> Result<&Document> {
        match self.docs.get(&doc.id) {
            Some(existing) => {
                doc.seq = existing.seq;
                doc.created_at = existing.created_at;
                doc.revision = existing.revision + 1;
                self.persist(&doc)?;
                let id = doc.id.clone();
                self.docs.insert(id.clone(), doc);
                Ok(&self.docs[&id])
            }
            None => self.insert(doc),
        }
    }

    /// Get a document by id
    pub fn get(&self, id: &str) -> Result<&Document> {
        self.docs
            .get(id)
            .ok_or_else(|| Error::DocumentNotFound(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.docs.contains_key(id)
    }

    /// All documents in insertion order
    pub fn list(&self) -> Vec<&Document> {
        self.order.iter().map(|id| &self.docs[id]).collect()
    }

    /// Delete a document and its file
    pub fn delete(&mut self, id: &str) -> Result<Document> {
        let doc = self
            .docs
            .remove(id)
            .ok_or_else(|| Error::DocumentNotFound(id.to_string()))?;
        self.order.retain(|existing| existing != id);
        let path = self.doc_path(id);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(doc)
    }

    /// Delete several documents; unknown ids are skipped. Returns the number
    /// actually deleted.
    pub fn bulk_delete(&mut self, ids: &[String]) -> Result<usize> {
        let mut deleted = 0;
        for id in ids {
            if self.docs.contains_key(id) {
                self.delete(id)?;
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    /// Delete every document whose metadata matches the filter
    pub fn delete_matching(&mut self, filter: &MetadataFilter) -> Result<usize> {
        let matching: Vec<String> = self
            .order
            .iter()
            .filter(|id| filter.matches(&self.docs[*id].metadata))
            .cloned()
            .collect();
        self.bulk_delete(&matching)
    }

    /// Update only a document's metadata; merge or replace
    pub fn patch_metadata(&mut self, id: &str, metadata: Value, merge: bool) -> Result<&Document> {
        let mut doc = self.get(id)?.clone();
        doc.metadata = if merge {
            match (doc.metadata, metadata) {
                (Value::Object(mut base), Value::Object(patch)) => {
                    for (k, v) in patch {
                        base.insert(k, v);
                    }
                    Value::Object(base)
                }
                (_, patch) => patch,
            }
        } else {
            metadata
        };
        doc.revision += 1;
        doc.updated_at = Utc::now();
        self.persist(&doc)?;
        self.docs.insert(id.to_string(), doc);
        Ok(&self.docs[id])
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn chunk_count(&self) -> usize {
        self.docs.values().map(|d| d.chunks.len()).sum()
    }

    /// All chunks in document insertion order, chunk position order within
    /// each document
    pub fn all_chunks(&self) -> Vec<&Chunk> {
        self.order
            .iter()
            .flat_map(|id| self.docs[id].chunks.iter())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn new_doc(id: &str, content: &str, metadata: Value) -> Document {
        let chunker = Chunker::new(64, 8).unwrap();
        let now = Utc::now();
        Document {
            id: id.to_string(),
            content: content.to_string(),
            metadata,
            chunks: make_chunks(id, &chunker, content),
            revision: 1,
            created_at: now,
            updated_at: now,
            seq: 0,
        }
    }

    #[test]
    fn test_insert_then_get_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = DocumentStore::create(tmp.path()).unwrap();

        let doc = new_doc("doc-1", "some document content", json!({"category": "manual"}));
        store.insert(doc.clone()).unwrap();

        let fetched = store.get("doc-1").unwrap();
        assert_eq!(fetched.id, doc.id);
        assert_eq!(fetched.content, doc.content);
        assert_eq!(fetched.metadata, doc.metadata);
        assert_eq!(fetched.chunks, doc.chunks);
        assert_eq!(fetched.revision, 1);
    }

    #[test]
    fn test_insert_duplicate_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = DocumentStore::create(tmp.path()).unwrap();

        store.insert(new_doc("a", "first", json!({}))).unwrap();
        let err = store.insert(new_doc("a", "second", json!({}))).unwrap_err();
        assert!(matches!(err, Error::DocumentExists(_)));
    }

    #[test]
    fn test_put_bumps_revision_and_keeps_order() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = DocumentStore::create(tmp.path()).unwrap();

        store.insert(new_doc("a", "first", json!({}))).unwrap();
        store.insert(new_doc("b", "second", json!({}))).unwrap();
        store.put(new_doc("a", "first updated", json!({}))).unwrap();

        let listed: Vec<&str> = store.list().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(listed, vec!["a", "b"]);
        assert_eq!(store.get("a").unwrap().revision, 2);
    }

    #[test]
    fn test_list_preserves_insertion_order_across_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        {
            let mut store = DocumentStore::create(tmp.path()).unwrap();
            for id in ["zeta", "alpha", "mid"] {
                store.insert(new_doc(id, "content", json!({}))).unwrap();
            }
        }

        let store = DocumentStore::open(tmp.path()).unwrap();
        let listed: Vec<&str> = store.list().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(listed, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_delete_and_missing_get() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = DocumentStore::create(tmp.path()).unwrap();

        store.insert(new_doc("a", "content", json!({}))).unwrap();
        store.delete("a").unwrap();

        assert!(matches!(store.get("a"), Err(Error::DocumentNotFound(_))));
        assert!(matches!(store.delete("a"), Err(Error::DocumentNotFound(_))));
        assert!(!tmp.path().join("a.json").exists());
    }

    #[test]
    fn test_bulk_delete_skips_unknown_ids() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = DocumentStore::create(tmp.path()).unwrap();

        store.insert(new_doc("a", "content", json!({}))).unwrap();
        store.insert(new_doc("b", "content", json!({}))).unwrap();

        let deleted = store
            .bulk_delete(&["a".into(), "missing".into()])
            .unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_delete_matching_filter() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = DocumentStore::create(tmp.path()).unwrap();

        store
            .insert(new_doc("a", "x", json!({"category": "manual"})))
            .unwrap();
        store
            .insert(new_doc("b", "y", json!({"category": "policy"})))
            .unwrap();

        let filter = serde_json::from_value(json!({"category": {"==": "manual"}})).unwrap();
        let deleted = store.delete_matching(&filter).unwrap();
        assert_eq!(deleted, 1);
        assert!(store.contains("b"));
        assert!(!store.contains("a"));
    }

    #[test]
    fn test_patch_metadata_merge_and_replace() {
        let tmp = tempfile::tempdir().unwrap();
        let mut store = DocumentStore::create(tmp.path()).unwrap();

        store
            .insert(new_doc("a", "x", json!({"category": "manual", "year": 2020})))
            .unwrap();

        store
            .patch_metadata("a", json!({"year": 2024}), true)
            .unwrap();
        assert_eq!(
            store.get("a").unwrap().metadata,
            json!({"category": "manual", "year": 2024})
        );

        store
            .patch_metadata("a", json!({"only": "this"}), false)
            .unwrap();
        assert_eq!(store.get("a").unwrap().metadata, json!({"only": "this"}));
        assert_eq!(store.get("a").unwrap().revision, 3);
    }

    #[test]
    fn test_open_surfaces_corruption() {
        let tmp = tempfile::tempdir().unwrap();
        {
            let mut store = DocumentStore::create(tmp.path()).unwrap();
            store.insert(new_doc("a", "content", json!({}))).unwrap();
        }
        std::fs::write(tmp.path().join("broken.json"), "{not json").unwrap();

        let err = DocumentStore::open(tmp.path()).unwrap_err();
        assert!(matches!(err, Error::CorruptStore(_)));
    }

    #[test]
    fn test_validate_document_id() {
        assert!(validate_document_id("doc-1.txt").is_ok());
        assert!(validate_document_id("").is_err());
        assert!(validate_document_id("has/slash").is_err());
        assert!(validate_document_id(&"x".repeat(200)).is_err());
    }

    #[test]
    fn test_chunk_ids_follow_document() {
        let chunker = Chunker::new(8, 2).unwrap();
        let chunks = make_chunks("doc", &chunker, "abcdefghijklmnop");
        assert!(chunks.len() > 1);
        assert_eq!(chunks[0].id, "doc_chunk_0");
        assert_eq!(chunks[1].id, "doc_chunk_1");
        assert_eq!(chunks[1].offset, 6);
    }
}
