//! Retriever: top-k chunks for a query
//!
//! The query signature is computed with the index's own scheme. Results are
//! ordered by descending similarity, ties by chunk order; chunks with zero
//! similarity are never returned.

use crate::knowledge::indexer::ChunkIndex;
use crate::knowledge::signature::similarity;
use serde::Serialize;
use tracing::debug;

/// One retrieved chunk
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkMatch {
    pub ordinal: usize,
    pub source: String,
    pub page: usize,
    pub text: String,
    pub score: f64,
}

/// Search `index` for `query`; empty index or degenerate query gives `[]`
pub fn search(query: &str, index: &ChunkIndex, top_k: usize) -> Vec<ChunkMatch> {
    if index.is_empty() || top_k == 0 || query.trim().is_empty() {
        return Vec::new();
    }

    let query_signature = index.scheme().signature(query);
    if query_signature.is_empty() {
        debug!("Query has no indexed terms");
        return Vec::new();
    }

    let mut scored: Vec<(usize, f64)> = index
        .chunks()
        .iter()
        .enumerate()
        .map(|(i, chunk)| (i, similarity(&query_signature, &chunk.signature)))
        .filter(|(_, score)| *score > 0.0)
        .collect();

    // Stable sort keeps chunk order among equal scores
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(top_k);

    let matches: Vec<ChunkMatch> = scored
        .into_iter()
        .map(|(i, score)| {
            let chunk = &index.chunks()[i];
            ChunkMatch {
                ordinal: chunk.ordinal,
                source: chunk.source.clone(),
                page: chunk.page,
                text: chunk.text.clone(),
                score,
            }
        })
        .collect();

    debug!(results = matches.len(), top_k, "Knowledge search complete");
    matches
}

/// Retriever bound to a default result count
#[derive(Debug, Clone, Copy)]
pub struct Retriever {
    top_k: usize,
}

impl Default for Retriever {
    fn default() -> Self {
        Self { top_k: 5 }
    }
}

impl Retriever {
    pub fn new(top_k: usize) -> Self {
        Self { top_k }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn search(&self, query: &str, index: &ChunkIndex) -> Vec<ChunkMatch> {
        search(query, index, self.top_k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::indexer::{IndexParams, KnowledgeIndexer};
    use crate::knowledge::loader::SourceDocument;
    use sori_common::config::SignatureKind;

    fn docs() -> Vec<SourceDocument> {
        vec![
            SourceDocument::from_text("breath.txt", "호흡 훈련은 스트레스 완화에 도움이 된다"),
            SourceDocument::from_text("walk.txt", "햇빛 산책은 저활력 개선에 좋다"),
            SourceDocument::from_text("sleep.txt", "수면 위생과 취침 전 루틴"),
            SourceDocument::from_text("breath2.txt", "호흡 훈련은 스트레스 완화에 도움이 된다"),
        ]
    }

    fn index(kind: SignatureKind) -> ChunkIndex {
        KnowledgeIndexer::new(IndexParams {
            signature: kind,
            ..IndexParams::default()
        })
        .build(&docs())
    }

    #[test]
    fn test_best_match_first_and_ties_in_order() {
        let results = search("스트레스 완화 호흡", &index(SignatureKind::TfIdf), 5);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].source, "breath.txt");
        assert_eq!(results[1].source, "breath2.txt");
        assert_eq!(results[0].score, results[1].score);
    }

    #[test]
    fn test_top_k_limits_results() {
        let results = search("호흡 산책 수면", &index(SignatureKind::TfIdf), 2);
        assert_eq!(results.len(), 2);
        assert!(results[0].score >= results[1].score);
    }

    #[test]
    fn test_zero_scores_are_dropped() {
        assert!(search("zzz 완전히 무관한 질의", &index(SignatureKind::TfIdf), 5).is_empty());
    }

    #[test]
    fn test_empty_index_and_query() {
        let empty = KnowledgeIndexer::default().build(&[]);
        assert!(search("호흡", &empty, 5).is_empty());
        assert!(search("   ", &index(SignatureKind::TfIdf), 5).is_empty());
        assert!(search("호흡", &index(SignatureKind::TfIdf), 0).is_empty());
    }

    #[test]
    fn test_ngram_scheme_search() {
        let results = Retriever::new(1).search("햇빛 산책", &index(SignatureKind::NGram));
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, "walk.txt");
    }

    #[test]
    fn test_search_is_repeatable() {
        let idx = index(SignatureKind::TfIdf);
        let first = search("스트레스 수면", &idx, 5);
        for _ in 0..5 {
            assert_eq!(search("스트레스 수면", &idx, 5), first);
        }
    }
}
