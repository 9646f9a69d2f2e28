//! Provider seams. Every call is blocking from the caller's point of view;
//! implementations own their own timeouts and runtimes.

use crate::types::{ChunkId, RetrievedChunk, Topic, TopicId};

pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;

    fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("embedder returned no vector"))
    }
}

pub trait DenseSearch: Send + Sync {
    /// Top `k` chunks by descending similarity to `vector`.
    fn search_by_vector(&self, vector: &[f32], k: usize) -> anyhow::Result<Vec<RetrievedChunk>>;

    /// Like [`DenseSearch::search_by_vector`] but only over `candidates`.
    /// Scores are `1 - distance` under the store's distance metric.
    fn search_within(
        &self,
        vector: &[f32],
        candidates: &[ChunkId],
        k: usize,
    ) -> anyhow::Result<Vec<RetrievedChunk>>;
}

pub trait LexicalSearch: Send + Sync {
    /// Ranked full-text search. Every analyzed term of `phrase` must match;
    /// a phrase with no searchable terms matches nothing.
    fn search_text(&self, phrase: &str, k: usize) -> anyhow::Result<Vec<RetrievedChunk>>;

    /// Ids of every chunk matching `phrase` under the same predicate as
    /// [`LexicalSearch::search_text`].
    fn matching_ids(&self, phrase: &str) -> anyhow::Result<Vec<ChunkId>>;
}

pub trait HybridSearch: Send + Sync {
    /// At most `k` deduplicated chunks ranked by a score fusing both signals.
    fn search_hybrid(
        &self,
        vector: &[f32],
        phrase: &str,
        k: usize,
    ) -> anyhow::Result<Vec<RetrievedChunk>>;
}

pub trait LanguageModel: Send + Sync {
    fn complete(&self, system_prompt: &str, user_message: &str, temperature: f32) -> anyhow::Result<String>;
}

pub trait TopicSource: Send + Sync {
    fn topic(&self, id: TopicId) -> anyhow::Result<Topic>;
    fn topic_path(&self, id: TopicId) -> anyhow::Result<String>;
}
