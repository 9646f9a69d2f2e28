//! Hybrid retrieval: dense and lexical hits merged by Reciprocal Rank Fusion.

pub mod fusion;

use anyhow::Result;
use std::sync::Arc;

use ragbench_core::config::RetrievalSettings;
use ragbench_core::traits::{DenseSearch, HybridSearch, LexicalSearch};
use ragbench_core::types::RetrievedChunk;

pub use fusion::reciprocal_rank_fusion;

pub struct HybridSearchEngine {
    lexical: Arc<dyn LexicalSearch>,
    dense: Arc<dyn DenseSearch>,
    rrf_k: u32,
    candidate_multiplier: usize,
}

impl HybridSearchEngine {
    pub fn new(lexical: Arc<dyn LexicalSearch>, dense: Arc<dyn DenseSearch>, settings: &RetrievalSettings) -> Self {
        Self { lexical, dense, rrf_k: settings.rrf_k, candidate_multiplier: settings.candidate_multiplier.max(1) }
    }
}

impl HybridSearch for HybridSearchEngine {
    fn search_hybrid(&self, vector: &[f32], phrase: &str, k: usize) -> Result<Vec<RetrievedChunk>> {
        if k == 0 { return Ok(vec![]); }
        let pool = k.saturating_mul(self.candidate_multiplier);
        let dense_hits = self.dense.search_by_vector(vector, pool)?;
        let text_hits = self.lexical.search_text(phrase, pool)?;
        tracing::debug!(dense = dense_hits.len(), lexical = text_hits.len(), phrase, "fusing hybrid candidates");
        Ok(reciprocal_rank_fusion(&[dense_hits, text_hits], self.rrf_k, k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragbench_core::types::ChunkId;

    struct FixedDense(Vec<RetrievedChunk>);
    impl DenseSearch for FixedDense {
        fn search_by_vector(&self, _v: &[f32], k: usize) -> Result<Vec<RetrievedChunk>> {
            Ok(self.0.iter().take(k).cloned().collect())
        }
        fn search_within(&self, _v: &[f32], _c: &[ChunkId], _k: usize) -> Result<Vec<RetrievedChunk>> {
            unreachable!("hybrid search never filters")
        }
    }

    struct FixedLexical(Vec<RetrievedChunk>);
    impl LexicalSearch for FixedLexical {
        fn search_text(&self, phrase: &str, k: usize) -> Result<Vec<RetrievedChunk>> {
            if phrase.trim().is_empty() { return Ok(vec![]); }
            Ok(self.0.iter().take(k).cloned().collect())
        }
        fn matching_ids(&self, _phrase: &str) -> Result<Vec<ChunkId>> {
            Ok(self.0.iter().map(|c| c.id.clone()).collect())
        }
    }

    fn engine(dense: Vec<RetrievedChunk>, lexical: Vec<RetrievedChunk>) -> HybridSearchEngine {
        HybridSearchEngine::new(Arc::new(FixedLexical(lexical)), Arc::new(FixedDense(dense)), &RetrievalSettings::default())
    }

    #[test]
    fn chunk_in_both_lists_wins_and_is_not_duplicated() {
        let e = engine(
            vec![RetrievedChunk::new("a", "A", 0.9), RetrievedChunk::new("b", "B", 0.8)],
            vec![RetrievedChunk::new("b", "B", 7.0), RetrievedChunk::new("c", "C", 3.0)],
        );
        let hits = e.search_hybrid(&[0.0], "phrase", 5).unwrap();
        let ids: Vec<_> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn empty_phrase_falls_back_to_dense_order() {
        let e = engine(vec![RetrievedChunk::new("a", "A", 0.9), RetrievedChunk::new("b", "B", 0.8)], vec![RetrievedChunk::new("z", "Z", 1.0)]);
        let hits = e.search_hybrid(&[0.0], "  ", 5).unwrap();
        assert_eq!(hits.iter().map(|h| h.id.as_str()).collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn result_never_exceeds_k() {
        let dense = (0..10).map(|i| RetrievedChunk::new(format!("d{i}"), "", 1.0)).collect();
        let lexical = (0..10).map(|i| RetrievedChunk::new(format!("l{i}"), "", 1.0)).collect();
        assert_eq!(engine(dense, lexical).search_hybrid(&[0.0], "x", 3).unwrap().len(), 3);
    }
}
