//! Domain types shared by the document store, the providers and the experiment.

use serde::{Deserialize, Serialize};

pub type ChunkId = String;
pub type TopicId = u32;

/// A chunk of a source document that is independently indexed.
///
/// - `id`: globally unique chunk identifier (`"{doc_id}:{chunk_index}"`)
/// - `doc_id`: stable document identity (file stem)
/// - `doc_path`: original path to the source file
/// - `category`: hierarchical facet derived from the directory (e.g. "/network/transport")
/// - `content`: the text payload of the chunk
/// - `chunk_index`/`total_chunks`: position within the parent document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: ChunkId,
    pub doc_id: String,
    pub doc_path: String,
    pub category: String,
    pub content: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
}

/// A topic as declared in the experiment's topic list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRef {
    pub id: TopicId,
    pub name: String,
}

impl TopicRef {
    pub fn new(id: TopicId, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }
}

/// A fully resolved topic. Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: TopicId,
    pub name: String,
    /// Hierarchical path, root first (e.g. "Network > Application Layer > HTTP").
    pub path: String,
}

/// The minimal surface returned by every retrieval provider.
///
/// `score` is provider-specific but higher is always better: cosine
/// similarity for dense search, BM25 rank for lexical search and a fused
/// rank for hybrid search. Scores are never comparable across providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub id: ChunkId,
    pub content: String,
    pub score: f32,
}

impl RetrievedChunk {
    pub fn new(id: impl Into<ChunkId>, content: impl Into<String>, score: f32) -> Self {
        Self { id: id.into(), content: content.into(), score }
    }
}

/// Which scale a strategy's scores live on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreKind {
    CosineSimilarity,
    LexicalRank,
    FusedRank,
}
