//! API request and response models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::filter::MetadataFilter;
use crate::index::{DocumentAddResult, IndexSettings, IndexStatus, NewDocument};
use crate::search::{BatchResultItem, QuerySpec, SearchResult};
use crate::store::Document;

/// Standard response envelope: `{success, data}` or `{success, error}`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn fail(code: &str, message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorBody {
                code: code.to_string(),
                message,
            }),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub embedding_provider: String,
    pub embedding_model: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateIndexRequest {
    pub name: String,
    #[serde(default)]
    pub settings: Option<IndexSettings>,
}

#[derive(Debug, Serialize)]
pub struct IndexListResponse {
    pub indexes: Vec<IndexStatus>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct RebuildResponse {
    pub message: &'static str,
    pub index: IndexStatus,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
}

/// Single or bulk document add
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AddDocumentsRequest {
    Bulk {
        documents: Vec<NewDocument>,
        #[serde(default)]
        update_if_exists: bool,
    },
    Single(NewDocument),
}

impl AddDocumentsRequest {
    pub fn into_parts(self) -> (Vec<NewDocument>, bool) {
        match self {
            Self::Bulk {
                documents,
                update_if_exists,
            } => (documents, update_if_exists),
            Self::Single(doc) => (vec![doc], false),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AddDocumentsResponse {
    pub results: Vec<DocumentAddResult>,
}

#[derive(Debug, Deserialize)]
pub struct ListDocumentsParams {
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_per_page")]
    pub per_page: usize,
}

fn default_page() -> usize {
    1
}

fn default_per_page() -> usize {
    50
}

#[derive(Debug, Serialize)]
pub struct PaginationInfo {
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub total_pages: usize,
}

/// Document summary for listings
#[derive(Debug, Serialize)]
pub struct DocumentInfo {
    pub id: String,
    pub content_preview: String,
    pub metadata: Value,
    pub chunk_count: usize,
    pub revision: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Document> for DocumentInfo {
    fn from(doc: &Document) -> Self {
        let content_preview: String = if doc.content.chars().count() > 200 {
            let mut preview: String = doc.content.chars().take(200).collect();
            preview.push_str("...");
            preview
        } else {
            doc.content.clone()
        };

        Self {
            id: doc.id.clone(),
            content_preview,
            metadata: doc.metadata.clone(),
            chunk_count: doc.chunks.len(),
            revision: doc.revision,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListDocumentsResponse {
    pub documents: Vec<DocumentInfo>,
    pub pagination: PaginationInfo,
}

#[derive(Debug, Serialize)]
pub struct ChunkInfo {
    pub chunk_id: String,
    pub position: usize,
    pub offset: usize,
    pub text: String,
}

/// Full document detail including its chunks
#[derive(Debug, Serialize)]
pub struct DocumentDetail {
    pub id: String,
    pub content: String,
    pub metadata: Value,
    pub chunks: Vec<ChunkInfo>,
    pub chunk_count: usize,
    pub revision: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Document> for DocumentDetail {
    fn from(doc: Document) -> Self {
        let chunks: Vec<ChunkInfo> = doc
            .chunks
            .iter()
            .map(|chunk| ChunkInfo {
                chunk_id: chunk.id.clone(),
                position: chunk.position,
                offset: chunk.offset,
                text: chunk.text.clone(),
            })
            .collect();

        Self {
            id: doc.id,
            content: doc.content,
            metadata: doc.metadata,
            chunk_count: chunks.len(),
            chunks,
            revision: doc.revision,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateDocumentRequest {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub metadata: Option<Value>,
    #[serde(default = "default_true")]
    pub merge_metadata: bool,
}

#[derive(Debug, Deserialize)]
pub struct PatchMetadataRequest {
    pub metadata: Value,
    #[serde(default = "default_true")]
    pub merge: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    #[serde(default)]
    pub document_ids: Option<Vec<String>>,
    #[serde(default)]
    pub filter: Option<MetadataFilter>,
}

#[derive(Debug, Serialize)]
pub struct BulkDeleteResponse {
    pub deleted_count: usize,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub total_found: usize,
    pub query_time_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct BatchSearchRequest {
    pub queries: Vec<QuerySpec>,
}

#[derive(Debug, Serialize)]
pub struct BatchSearchResponse {
    pub results: Vec<BatchResultItem>,
    pub query_time_ms: u64,
}
