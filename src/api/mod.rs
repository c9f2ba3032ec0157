//! HTTP API - service surface over the index manager and search engine
//!
//! Every response uses the `{success, data}` / `{success, error}` envelope
//! with stable machine-readable error codes.

pub mod models;

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Path, Query, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::error::Error;
use crate::index::IndexManager;
use crate::search::{GrepQuery, HybridQuery, SearchEngine, SemanticQuery};

use models::*;

/// Shared state handed to every handler
pub struct AppState {
    pub manager: Arc<IndexManager>,
    pub engine: Arc<SearchEngine>,
    pub embedding_provider: String,
    pub embedding_model: String,
}

/// Build the API router
pub fn router(state: Arc<AppState>, cors: bool) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/indexes", get(list_indexes).post(create_index))
        .route("/indexes/:name", get(get_index).delete(delete_index))
        .route("/indexes/:name/rebuild", post(rebuild_index))
        .route(
            "/indexes/:name/documents",
            get(list_documents).post(add_documents),
        )
        .route(
            "/indexes/:name/documents/bulk-delete",
            post(bulk_delete_documents),
        )
        .route(
            "/indexes/:name/documents/:doc_id",
            get(get_document).put(update_document).delete(delete_document),
        )
        .route(
            "/indexes/:name/documents/:doc_id/metadata",
            patch(patch_document_metadata),
        )
        .route("/indexes/:name/search", post(search_semantic))
        .route("/indexes/:name/search/grep", post(search_grep))
        .route("/indexes/:name/search/hybrid", post(search_hybrid))
        .route("/indexes/:name/search/batch", post(search_batch))
        .with_state(state);

    if cors {
        app = app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    app
}

/// Map domain errors to HTTP statuses, keeping the response envelope
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::IndexNotFound(_) | Error::DocumentNotFound(_) => StatusCode::NOT_FOUND,
            Error::IndexExists(_) | Error::DocumentExists(_) | Error::RebuildInProgress(_) => {
                StatusCode::CONFLICT
            }
            Error::Embedding(_) | Error::Backend(_) => StatusCode::BAD_GATEWAY,
            Error::CorruptStore(_) | Error::Io(_) | Error::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(ApiResponse::fail(self.code(), self.to_string()));
        (status, body).into_response()
    }
}

/// JSON extractor whose rejection uses the error envelope
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(Error::Validation(rejection.body_text())),
        }
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, Error>;

fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::ok(data)))
}

async fn health(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::ok(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        embedding_provider: state.embedding_provider.clone(),
        embedding_model: state.embedding_model.clone(),
    }))
}

async fn list_indexes(State(state): State<Arc<AppState>>) -> ApiResult<IndexListResponse> {
    let indexes = state.manager.list().await;
    let total = indexes.len();
    ok(IndexListResponse { indexes, total })
}

async fn create_index(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateIndexRequest>,
) -> ApiResult<crate::index::IndexStatus> {
    let settings = req.settings.unwrap_or_default();
    let status = state.manager.create(&req.name, settings).await?;
    ok(status)
}

async fn get_index(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<crate::index::IndexStatus> {
    let handle = state.manager.get(&name).await?;
    ok(handle.status().await)
}

async fn delete_index(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<DeleteResponse> {
    state.manager.delete(&name).await?;
    ok(DeleteResponse {
        message: format!("Index '{}' deleted", name),
    })
}

async fn rebuild_index(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<RebuildResponse> {
    // Spawns the build and acknowledges immediately; completion is observed
    // by polling the index status
    state.manager.rebuild(&name).await?;
    let handle = state.manager.get(&name).await?;
    ok(RebuildResponse {
        message: "Index rebuild started",
        index: handle.status().await,
    })
}

async fn add_documents(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    ApiJson(req): ApiJson<AddDocumentsRequest>,
) -> ApiResult<AddDocumentsResponse> {
    let handle = state.manager.get(&name).await?;
    let (documents, update_if_exists) = req.into_parts();
    if documents.is_empty() {
        return Err(Error::Validation("no documents provided".into()));
    }
    let results = handle.add_documents(documents, update_if_exists).await?;
    ok(AddDocumentsResponse { results })
}

async fn list_documents(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(params): Query<ListDocumentsParams>,
) -> ApiResult<ListDocumentsResponse> {
    if params.page == 0 || params.per_page == 0 {
        return Err(Error::Validation("page and per_page must be positive".into()));
    }

    let handle = state.manager.get(&name).await?;
    let all = handle.list_documents(None).await;
    let total = all.len();
    let total_pages = total.div_ceil(params.per_page);

    let documents: Vec<DocumentInfo> = all
        .iter()
        .skip((params.page - 1) * params.per_page)
        .take(params.per_page)
        .map(DocumentInfo::from)
        .collect();

    ok(ListDocumentsResponse {
        documents,
        pagination: PaginationInfo {
            page: params.page,
            per_page: params.per_page,
            total,
            total_pages,
        },
    })
}

async fn get_document(
    State(state): State<Arc<AppState>>,
    Path((name, doc_id)): Path<(String, String)>,
) -> ApiResult<DocumentDetail> {
    let handle = state.manager.get(&name).await?;
    let doc = handle.get_document(&doc_id).await?;
    ok(DocumentDetail::from(doc))
}

async fn update_document(
    State(state): State<Arc<AppState>>,
    Path((name, doc_id)): Path<(String, String)>,
    ApiJson(req): ApiJson<UpdateDocumentRequest>,
) -> ApiResult<DocumentDetail> {
    if req.content.is_none() && req.metadata.is_none() {
        return Err(Error::Validation(
            "update requires content and/or metadata".into(),
        ));
    }
    let handle = state.manager.get(&name).await?;
    let doc = handle
        .update_document(&doc_id, req.content, req.metadata, req.merge_metadata)
        .await?;
    ok(DocumentDetail::from(doc))
}

async fn patch_document_metadata(
    State(state): State<Arc<AppState>>,
    Path((name, doc_id)): Path<(String, String)>,
    ApiJson(req): ApiJson<PatchMetadataRequest>,
) -> ApiResult<DocumentDetail> {
    let handle = state.manager.get(&name).await?;
    let doc = handle.patch_metadata(&doc_id, req.metadata, req.merge).await?;
    ok(DocumentDetail::from(doc))
}

async fn delete_document(
    State(state): State<Arc<AppState>>,
    Path((name, doc_id)): Path<(String, String)>,
) -> ApiResult<DeleteResponse> {
    let handle = state.manager.get(&name).await?;
    handle.delete_document(&doc_id).await?;
    ok(DeleteResponse {
        message: format!("Document '{}' deleted", doc_id),
    })
}

async fn bulk_delete_documents(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    ApiJson(req): ApiJson<BulkDeleteRequest>,
) -> ApiResult<BulkDeleteResponse> {
    let handle = state.manager.get(&name).await?;
    let deleted_count = handle
        .bulk_delete(req.document_ids.as_deref(), req.filter.as_ref())
        .await?;
    ok(BulkDeleteResponse { deleted_count })
}

async fn search_semantic(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    ApiJson(query): ApiJson<SemanticQuery>,
) -> ApiResult<SearchResponse> {
    let start = Instant::now();
    let handle = state.manager.get(&name).await?;
    let results = state.engine.semantic(&handle, &query).await?;
    ok(SearchResponse {
        total_found: results.len(),
        results,
        query_time_ms: start.elapsed().as_millis() as u64,
    })
}

async fn search_grep(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    ApiJson(query): ApiJson<GrepQuery>,
) -> ApiResult<SearchResponse> {
    let start = Instant::now();
    let handle = state.manager.get(&name).await?;
    let results = state.engine.grep(&handle, &query).await?;
    ok(SearchResponse {
        total_found: results.len(),
        results,
        query_time_ms: start.elapsed().as_millis() as u64,
    })
}

async fn search_hybrid(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    ApiJson(query): ApiJson<HybridQuery>,
) -> ApiResult<SearchResponse> {
    let start = Instant::now();
    let handle = state.manager.get(&name).await?;
    let results = state.engine.hybrid(&handle, &query).await?;
    ok(SearchResponse {
        total_found: results.len(),
        results,
        query_time_ms: start.elapsed().as_millis() as u64,
    })
}

async fn search_batch(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    ApiJson(req): ApiJson<BatchSearchRequest>,
) -> ApiResult<BatchSearchResponse> {
    let start = Instant::now();
    let handle = state.manager.get(&name).await?;
    let results = state.engine.batch(&handle, req.queries).await;
    ok(BatchSearchResponse {
        results,
        query_time_ms: start.elapsed().as_millis() as u64,
    })
}
