//! Search module - semantic, grep, hybrid, and batch query orchestration
//!
//! Semantic queries run against the last successfully built vector
//! structure; grep queries scan the live document store. Hybrid runs both
//! concurrently and fuses the rankings.

mod fusion;
mod grep;

pub use fusion::{reciprocal_rank_fusion, FusionParams};

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::SearchConfig;
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::filter::MetadataFilter;
use crate::index::IndexHandle;

/// Which ranker produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchSource {
    Semantic,
    Grep,
    Hybrid,
}

/// One ranked search hit
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub document_id: String,
    pub chunk_id: String,
    pub score: f32,
    pub source: SearchSource,
    pub content: String,
    pub metadata: Value,
}

/// Semantic query parameters
#[derive(Debug, Clone, Deserialize)]
pub struct SemanticQuery {
    pub query: String,
    #[serde(default)]
    pub top_k: Option<usize>,
    #[serde(default)]
    pub filter: Option<MetadataFilter>,
}

/// Grep query parameters
#[derive(Debug, Clone, Deserialize)]
pub struct GrepQuery {
    pub pattern: String,
    #[serde(default)]
    pub top_k: Option<usize>,
    /// Treat the pattern as a regex instead of a literal
    #[serde(default)]
    pub regex: bool,
    #[serde(default = "default_case_insensitive")]
    pub case_insensitive: bool,
    #[serde(default)]
    pub filter: Option<MetadataFilter>,
}

fn default_case_insensitive() -> bool {
    true
}

/// Hybrid query parameters: both parameter sets plus fusion tuning
#[derive(Debug, Clone, Deserialize)]
pub struct HybridQuery {
    pub query: String,
    /// Grep pattern; defaults to the semantic query text
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub top_k: Option<usize>,
    #[serde(default)]
    pub regex: bool,
    #[serde(default = "default_case_insensitive")]
    pub case_insensitive: bool,
    #[serde(default)]
    pub filter: Option<MetadataFilter>,
    #[serde(default)]
    pub semantic_weight: Option<f32>,
    #[serde(default)]
    pub grep_weight: Option<f32>,
    #[serde(default)]
    pub rrf_constant: Option<f32>,
}

/// Kind discriminator for batch query specs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    #[default]
    Semantic,
    Grep,
    Hybrid,
}

/// One query inside a batch request
#[derive(Debug, Clone, Deserialize)]
pub struct QuerySpec {
    #[serde(default)]
    pub kind: QueryKind,
    /// Query text; doubles as the grep pattern
    pub query: String,
    #[serde(default)]
    pub top_k: Option<usize>,
    #[serde(default)]
    pub regex: bool,
    #[serde(default = "default_case_insensitive")]
    pub case_insensitive: bool,
    #[serde(default)]
    pub filter: Option<MetadataFilter>,
}

/// Per-item outcome of a batch search
#[derive(Debug, Serialize)]
pub struct BatchResultItem {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<SearchResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<BatchItemError>,
}

#[derive(Debug, Serialize)]
pub struct BatchItemError {
    pub code: &'static str,
    pub message: String,
}

/// Candidate multiplier applied before post-filtering
const FETCH_HEADROOM: usize = 5;

/// Query orchestrator over index handles
pub struct SearchEngine {
    embedder: Arc<dyn EmbeddingProvider>,
    config: SearchConfig,
}

impl SearchEngine {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, config: SearchConfig) -> Self {
        Self { embedder, config }
    }

    /// Resolve a requested top_k: default when absent, clamped to the
    /// configured maximum rather than rejected
    fn clamp_top_k(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.config.default_top_k)
            .min(self.config.max_top_k)
    }

    /// Semantic similarity search against the active vector structure
    ///
    /// An index that was never built (or is empty) yields no results rather
    /// than an error.
    pub async fn semantic(
        &self,
        index: &IndexHandle,
        query: &SemanticQuery,
    ) -> Result<Vec<SearchResult>> {
        let top_k = self.clamp_top_k(query.top_k);
        self.semantic_ranked(index, &query.query, top_k, query.filter.as_ref())
            .await
    }

    async fn semantic_ranked(
        &self,
        index: &IndexHandle,
        text: &str,
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<SearchResult>> {
        let active = match index.active().await {
            Some(active) => active,
            None => return Ok(Vec::new()),
        };
        if active.searcher.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let embeddings = self.embedder.embed(&[text]).await?;
        let query_vector = &embeddings[0];

        // Over-fetch to leave headroom for post-filtering
        let fetch_k = top_k.saturating_mul(FETCH_HEADROOM);
        let hits = active.searcher.search(query_vector, fetch_k)?;

        let mut results = Vec::with_capacity(top_k);
        for (ordinal, score) in hits {
            if results.len() >= top_k {
                break;
            }
            let chunk = match active.chunks.get(ordinal) {
                Some(chunk) => chunk,
                None => continue,
            };
            if let Some(filter) = filter {
                if !filter.matches(&chunk.metadata) {
                    continue;
                }
            }
            results.push(SearchResult {
                document_id: chunk.document_id.clone(),
                chunk_id: chunk.chunk_id.clone(),
                score,
                source: SearchSource::Semantic,
                content: chunk.text.clone(),
                metadata: chunk.metadata.clone(),
            });
        }

        Ok(results)
    }

    /// Pattern search over the live chunk set
    pub async fn grep(&self, index: &IndexHandle, query: &GrepQuery) -> Result<Vec<SearchResult>> {
        let top_k = self.clamp_top_k(query.top_k);
        let chunks = index.current_chunks().await;
        let mut results = grep::grep_chunks(
            &chunks,
            &query.pattern,
            query.case_insensitive,
            query.regex,
            query.filter.as_ref(),
        )?;
        results.truncate(top_k);
        Ok(results)
    }

    /// Hybrid search: semantic and grep run concurrently, rankings fused by
    /// weighted reciprocal rank
    pub async fn hybrid(
        &self,
        index: &IndexHandle,
        query: &HybridQuery,
    ) -> Result<Vec<SearchResult>> {
        let top_k = self.clamp_top_k(query.top_k);
        let fetch_k = top_k.saturating_mul(FETCH_HEADROOM);
        let pattern = query.pattern.as_deref().unwrap_or(&query.query);

        let semantic_fut = self.semantic_ranked(index, &query.query, fetch_k, query.filter.as_ref());
        let grep_fut = async {
            let chunks = index.current_chunks().await;
            grep::grep_chunks(
                &chunks,
                pattern,
                query.case_insensitive,
                query.regex,
                query.filter.as_ref(),
            )
            .map(|mut results| {
                results.truncate(fetch_k);
                results
            })
        };

        let (semantic, grep) = tokio::join!(semantic_fut, grep_fut);

        let params = FusionParams {
            semantic_weight: query.semantic_weight.unwrap_or(self.config.semantic_weight),
            grep_weight: query.grep_weight.unwrap_or(self.config.grep_weight),
            constant: query.rrf_constant.unwrap_or(self.config.rrf_constant),
        };
        let mut fused = reciprocal_rank_fusion(semantic?, grep?, &params);
        fused.truncate(top_k);
        Ok(fused)
    }

    /// Evaluate a batch of query specs independently
    ///
    /// Results preserve input order; one query's failure is reported in its
    /// own slot and never aborts sibling queries.
    pub async fn batch(&self, index: &IndexHandle, specs: Vec<QuerySpec>) -> Vec<BatchResultItem> {
        let futures = specs.into_iter().map(|spec| self.run_spec(index, spec));
        futures::future::join_all(futures).await
    }

    async fn run_spec(&self, index: &IndexHandle, spec: QuerySpec) -> BatchResultItem {
        let outcome = match spec.kind {
            QueryKind::Semantic => {
                self.semantic(
                    index,
                    &SemanticQuery {
                        query: spec.query,
                        top_k: spec.top_k,
                        filter: spec.filter,
                    },
                )
                .await
            }
            QueryKind::Grep => {
                self.grep(
                    index,
                    &GrepQuery {
                        pattern: spec.query,
                        top_k: spec.top_k,
                        regex: spec.regex,
                        case_insensitive: spec.case_insensitive,
                        filter: spec.filter,
                    },
                )
                .await
            }
            QueryKind::Hybrid => {
                self.hybrid(
                    index,
                    &HybridQuery {
                        query: spec.query,
                        pattern: None,
                        top_k: spec.top_k,
                        regex: spec.regex,
                        case_insensitive: spec.case_insensitive,
                        filter: spec.filter,
                        semantic_weight: None,
                        grep_weight: None,
                        rrf_constant: None,
                    },
                )
                .await
            }
        };

        match outcome {
            Ok(results) => BatchResultItem {
                success: true,
                results: Some(results),
                error: None,
            },
            Err(e) => BatchResultItem {
                success: false,
                results: None,
                error: Some(BatchItemError {
                    code: e.code(),
                    message: e.to_string(),
                }),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::FlatBackend;
    use crate::embedding::{EmbeddingError, SimulatedEmbedding};
    use crate::index::{IndexManager, IndexSettings, NewDocument};

    use async_trait::async_trait;
    use serde_json::json;

    async fn seeded_manager(dir: &std::path::Path) -> IndexManager {
        let manager = IndexManager::open(
            dir,
            Arc::new(SimulatedEmbedding::new("simulated".into())),
            Arc::new(FlatBackend),
        )
        .unwrap();

        manager.create("docs", IndexSettings::default()).await.unwrap();
        let handle = manager.get("docs").await.unwrap();
        handle
            .add_documents(
                vec![
                    NewDocument {
                        id: Some("rust".into()),
                        content: "rust async runtime and task scheduling".into(),
                        metadata: Some(json!({"category": "manual"})),
                    },
                    NewDocument {
                        id: Some("garden".into()),
                        content: "planting tomatoes in early spring".into(),
                        metadata: Some(json!({"category": "policy"})),
                    },
                    NewDocument {
                        id: Some("tokio".into()),
                        content: "tokio task scheduling internals".into(),
                        metadata: Some(json!({"category": "manual"})),
                    },
                ],
                false,
            )
            .await
            .unwrap();
        manager.rebuild("docs").await.unwrap().await.unwrap();
        manager
    }

    fn engine() -> SearchEngine {
        SearchEngine::new(
            Arc::new(SimulatedEmbedding::new("simulated".into())),
            SearchConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_semantic_search_ranks_related_content() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = seeded_manager(tmp.path()).await;
        let handle = manager.get("docs").await.unwrap();

        let results = engine()
            .semantic(
                &handle,
                &SemanticQuery {
                    query: "async task scheduling".into(),
                    top_k: Some(2),
                    filter: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert!(results
            .iter()
            .all(|r| r.document_id == "rust" || r.document_id == "tokio"));
        assert!(results[0].score >= results[1].score);
        assert!(results.iter().all(|r| r.source == SearchSource::Semantic));
    }

    #[tokio::test]
    async fn test_semantic_filter_applies_after_fetch() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = seeded_manager(tmp.path()).await;
        let handle = manager.get("docs").await.unwrap();

        let results = engine()
            .semantic(
                &handle,
                &SemanticQuery {
                    query: "spring tomatoes".into(),
                    top_k: Some(10),
                    filter: Some(
                        serde_json::from_value(json!({"category": {"==": "manual"}})).unwrap(),
                    ),
                },
            )
            .await
            .unwrap();

        assert!(results.iter().all(|r| r.metadata["category"] == "manual"));
    }

    #[tokio::test]
    async fn test_semantic_on_never_built_index_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = IndexManager::open(
            tmp.path(),
            Arc::new(SimulatedEmbedding::new("simulated".into())),
            Arc::new(FlatBackend),
        )
        .unwrap();
        manager.create("docs", IndexSettings::default()).await.unwrap();
        let handle = manager.get("docs").await.unwrap();

        let results = engine()
            .semantic(
                &handle,
                &SemanticQuery {
                    query: "anything".into(),
                    top_k: None,
                    filter: None,
                },
            )
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_top_k_above_max_is_clamped() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = seeded_manager(tmp.path()).await;
        let handle = manager.get("docs").await.unwrap();

        let config = SearchConfig {
            max_top_k: 2,
            ..SearchConfig::default()
        };
        let engine = SearchEngine::new(
            Arc::new(SimulatedEmbedding::new("simulated".into())),
            config,
        );

        // Not rejected: silently clamped to max_top_k
        let results = engine
            .grep(
                &handle,
                &GrepQuery {
                    pattern: "t".into(),
                    top_k: Some(10_000),
                    regex: false,
                    case_insensitive: true,
                    filter: None,
                },
            )
            .await
            .unwrap();
        assert!(results.len() <= 2);
    }

    #[tokio::test]
    async fn test_hybrid_is_deterministic() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = seeded_manager(tmp.path()).await;
        let handle = manager.get("docs").await.unwrap();

        let query = HybridQuery {
            query: "task scheduling".into(),
            pattern: None,
            top_k: Some(5),
            regex: false,
            case_insensitive: true,
            filter: None,
            semantic_weight: None,
            grep_weight: None,
            rrf_constant: None,
        };

        let engine = engine();
        let first: Vec<String> = engine
            .hybrid(&handle, &query)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.chunk_id)
            .collect();
        for _ in 0..5 {
            let again: Vec<String> = engine
                .hybrid(&handle, &query)
                .await
                .unwrap()
                .into_iter()
                .map(|r| r.chunk_id)
                .collect();
            assert_eq!(first, again);
        }
        assert!(!first.is_empty());
    }

    #[tokio::test]
    async fn test_batch_preserves_order_and_isolates_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let manager = seeded_manager(tmp.path()).await;
        let handle = manager.get("docs").await.unwrap();

        // Semantic queries fail at embed time; grep queries are unaffected
        let engine = SearchEngine::new(Arc::new(DownEmbedding), SearchConfig::default());

        let items = engine
            .batch(
                &handle,
                vec![
                    QuerySpec {
                        kind: QueryKind::Grep,
                        query: "scheduling".into(),
                        top_k: Some(5),
                        regex: false,
                        case_insensitive: true,
                        filter: None,
                    },
                    QuerySpec {
                        kind: QueryKind::Semantic,
                        query: "scheduling".into(),
                        top_k: Some(5),
                        regex: false,
                        case_insensitive: true,
                        filter: None,
                    },
                    QuerySpec {
                        kind: QueryKind::Grep,
                        query: "tomatoes".into(),
                        top_k: Some(5),
                        regex: false,
                        case_insensitive: true,
                        filter: None,
                    },
                ],
            )
            .await;

        assert_eq!(items.len(), 3);
        assert!(items[0].success);
        assert!(!items[1].success);
        assert_eq!(items[1].error.as_ref().unwrap().code, "BACKEND_ERROR");
        assert!(items[2].success);
        assert_eq!(
            items[2].results.as_ref().unwrap()[0].document_id,
            "garden"
        );
    }

    /// Provider that is always unavailable
    struct DownEmbedding;

    #[async_trait]
    impl EmbeddingProvider for DownEmbedding {
        fn dimensions(&self) -> usize {
            4
        }

        fn model_name(&self) -> &str {
            "down"
        }

        async fn embed(
            &self,
            _texts: &[&str],
        ) -> std::result::Result<Vec<Vec<f32>>, EmbeddingError> {
            Err(EmbeddingError::Unavailable("connection refused".into()))
        }
    }
}
