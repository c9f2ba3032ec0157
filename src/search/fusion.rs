//! Reciprocal-rank fusion of semantic and grep result lists
//!
//! Each result at 1-indexed rank `r` in a list with weight `w` contributes
//! `w / (r + c)` to its chunk's fused score. The constant `c` defaults to 60
//! (Cormack, Clarke & Buettcher, SIGIR 2009): smaller values emphasize top
//! ranks, larger values flatten the weighting.

use std::collections::HashMap;

use super::{SearchResult, SearchSource};

/// Fusion tuning, resolved from config plus per-request overrides
#[derive(Debug, Clone, Copy)]
pub struct FusionParams {
    pub semantic_weight: f32,
    pub grep_weight: f32,
    pub constant: f32,
}

/// Fuse two ranked lists into one ordering
///
/// Ties break by semantic rank (results absent from the semantic list sort
/// last), then document id, then chunk id, so a fixed pair of input lists
/// always produces the same output order.
pub fn reciprocal_rank_fusion(
    semantic: Vec<SearchResult>,
    grep: Vec<SearchResult>,
    params: &FusionParams,
) -> Vec<SearchResult> {
    struct Entry {
        result: SearchResult,
        score: f32,
        semantic_rank: usize,
    }

    let mut entries: HashMap<String, Entry> = HashMap::new();

    for (rank, result) in semantic.into_iter().enumerate() {
        let rank = rank + 1;
        entries.insert(
            result.chunk_id.clone(),
            Entry {
                result,
                score: params.semantic_weight / (rank as f32 + params.constant),
                semantic_rank: rank,
            },
        );
    }

    for (rank, result) in grep.into_iter().enumerate() {
        let contribution = params.grep_weight / ((rank + 1) as f32 + params.constant);
        entries
            .entry(result.chunk_id.clone())
            .and_modify(|entry| entry.score += contribution)
            .or_insert(Entry {
                result,
                score: contribution,
                semantic_rank: usize::MAX,
            });
    }

    let mut fused: Vec<Entry> = entries.into_values().collect();
    fused.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.semantic_rank.cmp(&b.semantic_rank))
            .then(a.result.document_id.cmp(&b.result.document_id))
            .then(a.result.chunk_id.cmp(&b.result.chunk_id))
    });

    fused
        .into_iter()
        .map(|entry| {
            let mut result = entry.result;
            result.score = entry.score;
            result.source = SearchSource::Hybrid;
            result
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result(doc: &str, chunk: &str, score: f32, source: SearchSource) -> SearchResult {
        SearchResult {
            document_id: doc.to_string(),
            chunk_id: chunk.to_string(),
            score,
            source,
            content: String::new(),
            metadata: json!({}),
        }
    }

    fn params() -> FusionParams {
        FusionParams {
            semantic_weight: 1.0,
            grep_weight: 1.0,
            constant: 60.0,
        }
    }

    #[test]
    fn test_overlapping_results_rank_first() {
        let semantic = vec![
            result("d1", "c1", 0.9, SearchSource::Semantic),
            result("d2", "c2", 0.8, SearchSource::Semantic),
        ];
        let grep = vec![
            result("d3", "c3", 4.0, SearchSource::Grep),
            result("d1", "c1", 2.0, SearchSource::Grep),
        ];

        let fused = reciprocal_rank_fusion(semantic, grep, &params());
        assert_eq!(fused.len(), 3);
        // c1 appears in both lists: 1/(1+60) + 1/(2+60)
        assert_eq!(fused[0].chunk_id, "c1");
        let expected = 1.0 / 61.0 + 1.0 / 62.0;
        assert!((fused[0].score - expected).abs() < 1e-6);
        assert!(fused.iter().all(|r| r.source == SearchSource::Hybrid));
    }

    #[test]
    fn test_weights_shift_ordering() {
        let semantic = vec![result("d1", "c1", 0.9, SearchSource::Semantic)];
        let grep = vec![result("d2", "c2", 5.0, SearchSource::Grep)];

        let grep_heavy = FusionParams {
            semantic_weight: 0.1,
            grep_weight: 2.0,
            constant: 60.0,
        };
        let fused = reciprocal_rank_fusion(semantic.clone(), grep.clone(), &grep_heavy);
        assert_eq!(fused[0].chunk_id, "c2");

        let semantic_heavy = FusionParams {
            semantic_weight: 2.0,
            grep_weight: 0.1,
            constant: 60.0,
        };
        let fused = reciprocal_rank_fusion(semantic, grep, &semantic_heavy);
        assert_eq!(fused[0].chunk_id, "c1");
    }

    #[test]
    fn test_reproducible_for_fixed_inputs() {
        let semantic = vec![
            result("d1", "c1", 0.9, SearchSource::Semantic),
            result("d2", "c2", 0.8, SearchSource::Semantic),
            result("d3", "c3", 0.7, SearchSource::Semantic),
        ];
        let grep = vec![
            result("d3", "c3", 9.0, SearchSource::Grep),
            result("d4", "c4", 5.0, SearchSource::Grep),
        ];

        let first: Vec<String> =
            reciprocal_rank_fusion(semantic.clone(), grep.clone(), &params())
                .into_iter()
                .map(|r| r.chunk_id)
                .collect();
        for _ in 0..10 {
            let again: Vec<String> =
                reciprocal_rank_fusion(semantic.clone(), grep.clone(), &params())
                    .into_iter()
                    .map(|r| r.chunk_id)
                    .collect();
            assert_eq!(first, again);
        }
    }

    #[test]
    fn test_equal_scores_tie_break_by_semantic_rank_then_doc_id() {
        // Two chunks each only in one list at the same rank position get
        // identical scores; the semantic one wins
        let semantic = vec![result("zz", "zz_chunk_0", 0.9, SearchSource::Semantic)];
        let grep = vec![result("aa", "aa_chunk_0", 3.0, SearchSource::Grep)];

        let fused = reciprocal_rank_fusion(semantic, grep, &params());
        assert_eq!(fused[0].chunk_id, "zz_chunk_0");
        assert_eq!(fused[1].chunk_id, "aa_chunk_0");
    }

    #[test]
    fn test_empty_lists() {
        let fused = reciprocal_rank_fusion(Vec::new(), Vec::new(), &params());
        assert!(fused.is_empty());

        let only_grep = vec![result("d1", "c1", 1.0, SearchSource::Grep)];
        let fused = reciprocal_rank_fusion(Vec::new(), only_grep, &params());
        assert_eq!(fused.len(), 1);
    }
}
