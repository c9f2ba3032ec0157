//! Grep search - literal or regex pattern scan over stored chunk text

use regex::RegexBuilder;

use crate::error::{Error, Result};
use crate::filter::MetadataFilter;
use crate::index::IndexedChunk;

use super::{SearchResult, SearchSource};

/// Scan chunks for pattern matches and rank them
///
/// Ranking: match count descending, then first match position ascending,
/// then chunk order (document insertion order). The score is the match
/// count. `pattern` is treated literally unless `use_regex` is set.
pub fn grep_chunks(
    chunks: &[IndexedChunk],
    pattern: &str,
    case_insensitive: bool,
    use_regex: bool,
    filter: Option<&MetadataFilter>,
) -> Result<Vec<SearchResult>> {
    let source = if use_regex {
        pattern.to_string()
    } else {
        regex::escape(pattern)
    };
    let re = RegexBuilder::new(&source)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|e| Error::Validation(format!("invalid pattern: {}", e)))?;

    struct Match<'a> {
        chunk: &'a IndexedChunk,
        count: usize,
        first_position: usize,
        order: usize,
    }

    let mut matches = Vec::new();
    for (order, chunk) in chunks.iter().enumerate() {
        if let Some(filter) = filter {
            if !filter.matches(&chunk.metadata) {
                continue;
            }
        }

        let mut count = 0;
        let mut first_position = None;
        for found in re.find_iter(&chunk.text) {
            count += 1;
            if first_position.is_none() {
                first_position = Some(found.start());
            }
        }

        if let Some(first_position) = first_position {
            matches.push(Match {
                chunk,
                count,
                first_position,
                order,
            });
        }
    }

    matches.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then(a.first_position.cmp(&b.first_position))
            .then(a.order.cmp(&b.order))
    });

    Ok(matches
        .into_iter()
        .map(|m| SearchResult {
            document_id: m.chunk.document_id.clone(),
            chunk_id: m.chunk.chunk_id.clone(),
            score: m.count as f32,
            source: SearchSource::Grep,
            content: m.chunk.text.clone(),
            metadata: m.chunk.metadata.clone(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chunk(doc: &str, position: usize, text: &str, metadata: serde_json::Value) -> IndexedChunk {
        IndexedChunk {
            chunk_id: format!("{}_chunk_{}", doc, position),
            document_id: doc.to_string(),
            text: text.to_string(),
            metadata,
        }
    }

    #[test]
    fn test_ranks_by_match_count_then_position() {
        let chunks = vec![
            chunk("a", 0, "prefix then error once", json!({})),
            chunk("b", 0, "error error error", json!({})),
            chunk("c", 0, "error at the start, error again", json!({})),
        ];

        let results = grep_chunks(&chunks, "error", true, false, None).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].document_id, "b");
        assert_eq!(results[0].score, 3.0);
        // Same count: earlier first match wins
        assert_eq!(results[1].document_id, "c");
        assert_eq!(results[2].document_id, "a");
    }

    #[test]
    fn test_literal_by_default() {
        let chunks = vec![chunk("a", 0, "value a.b here", json!({}))];
        // '.' is literal, so "a.b" matches "a.b" but "axb" would not
        let results = grep_chunks(&chunks, "a.b", true, false, None).unwrap();
        assert_eq!(results.len(), 1);

        let chunks = vec![chunk("a", 0, "value axb here", json!({}))];
        let results = grep_chunks(&chunks, "a.b", true, false, None).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_regex_mode_and_invalid_pattern() {
        let chunks = vec![chunk("a", 0, "code-1234 mentioned", json!({}))];
        let results = grep_chunks(&chunks, r"code-\d+", true, true, None).unwrap();
        assert_eq!(results.len(), 1);

        let err = grep_chunks(&chunks, "[unclosed", true, true, None).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_case_sensitivity_flag() {
        let chunks = vec![chunk("a", 0, "ERROR in caps", json!({}))];
        assert_eq!(
            grep_chunks(&chunks, "error", true, false, None).unwrap().len(),
            1
        );
        assert!(grep_chunks(&chunks, "error", false, false, None)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_filter_applies() {
        let chunks = vec![
            chunk("a", 0, "shared term", json!({"category": "manual"})),
            chunk("b", 0, "shared term", json!({"category": "policy"})),
        ];
        let filter = serde_json::from_value(json!({"category": {"==": "manual"}})).unwrap();
        let results = grep_chunks(&chunks, "shared", true, false, Some(&filter)).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document_id, "a");
    }
}
