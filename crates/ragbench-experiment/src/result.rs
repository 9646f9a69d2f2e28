use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};
use std::fmt;

use ragbench_core::types::{RetrievedChunk, ScoreKind, TopicId, TopicRef};

use crate::strategy::Strategy;

/// Characters of chunk content kept in the persisted report.
pub const PREVIEW_CHARS: usize = 100;

/// The exact query inputs a strategy used, untruncated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryUsed {
    /// `passage` is the text that was embedded.
    Dense { passage: String },
    Lexical { keyword: String },
    Hybrid { passage: String, keyword: String },
    FilteredDense { filter: String, passage: String },
    Failed { error: String },
}

impl fmt::Display for QueryUsed {
    /// Abbreviated one-line form for terminals.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryUsed::Dense { passage } => write!(f, "Vector: {}", ellipsize(passage, 100)),
            QueryUsed::Lexical { keyword } => write!(f, "Keyword: {keyword}"),
            QueryUsed::Hybrid { passage, keyword } => {
                write!(f, "Vector: {} | Keyword: {keyword}", ellipsize(passage, 60))
            }
            QueryUsed::FilteredDense { filter, passage } => {
                write!(f, "Filter: {filter} | Vector: {}", ellipsize(passage, 60))
            }
            QueryUsed::Failed { error } => write!(f, "ERROR: {error}"),
        }
    }
}

/// Leading `max_chars` characters of `text`, cut on a char boundary.
pub fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

fn ellipsize(text: &str, max_chars: usize) -> String {
    let head = preview(text, max_chars);
    if head.len() < text.len() { format!("{head}...") } else { head.to_string() }
}

/// Arithmetic mean of chunk scores; `0.0` for an empty list.
pub fn mean_score(chunks: &[RetrievedChunk]) -> f64 {
    if chunks.is_empty() {
        return 0.0;
    }
    chunks.iter().map(|c| f64::from(c.score)).sum::<f64>() / chunks.len() as f64
}

/// One cell of the strategy x topic matrix.
///
/// Full chunk content is kept in memory. Serialization reduces each chunk to
/// `{id, similarity, preview}`.
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentResult {
    #[serde(rename = "method")]
    strategy: Strategy,
    #[serde(rename = "category_id")]
    topic_id: TopicId,
    #[serde(rename = "category_name")]
    topic_name: String,
    query_used: QueryUsed,
    score_kind: ScoreKind,
    #[serde(serialize_with = "serialize_previews")]
    chunks: Vec<RetrievedChunk>,
    #[serde(rename = "avg_similarity")]
    avg_score: f64,
}

impl ExperimentResult {
    pub fn new(strategy: Strategy, topic: &TopicRef, query_used: QueryUsed, chunks: Vec<RetrievedChunk>) -> Self {
        Self {
            strategy,
            topic_id: topic.id,
            topic_name: topic.name.clone(),
            query_used,
            score_kind: strategy.score_kind(),
            avg_score: mean_score(&chunks),
            chunks,
        }
    }

    pub fn failed(strategy: Strategy, topic: &TopicRef, error: impl Into<String>) -> Self {
        Self::new(strategy, topic, QueryUsed::Failed { error: error.into() }, Vec::new())
    }

    pub fn strategy(&self) -> Strategy { self.strategy }
    pub fn topic_id(&self) -> TopicId { self.topic_id }
    pub fn topic_name(&self) -> &str { &self.topic_name }
    pub fn query_used(&self) -> &QueryUsed { &self.query_used }
    pub fn score_kind(&self) -> ScoreKind { self.score_kind }
    pub fn chunks(&self) -> &[RetrievedChunk] { &self.chunks }
    pub fn avg_score(&self) -> f64 { self.avg_score }

    pub fn error(&self) -> Option<&str> {
        match &self.query_used {
            QueryUsed::Failed { error } => Some(error),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct ChunkPreview<'a> {
    id: &'a str,
    similarity: f32,
    preview: &'a str,
}

fn serialize_previews<S: Serializer>(chunks: &[RetrievedChunk], serializer: S) -> Result<S::Ok, S::Error> {
    let mut seq = serializer.serialize_seq(Some(chunks.len()))?;
    for chunk in chunks {
        seq.serialize_element(&ChunkPreview {
            id: &chunk.id,
            similarity: chunk.score,
            preview: preview(&chunk.content, PREVIEW_CHARS),
        })?;
    }
    seq.end()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, score: f32) -> RetrievedChunk {
        RetrievedChunk::new(id, format!("content of {id}"), score)
    }

    #[test]
    fn mean_of_empty_is_zero() {
        assert_eq!(mean_score(&[]), 0.0);
    }

    #[test]
    fn mean_of_uniform_scores_is_that_score() {
        let chunks: Vec<_> = (0..7).map(|i| chunk(&i.to_string(), 0.625)).collect();
        assert_eq!(mean_score(&chunks), 0.625);
        assert_eq!(mean_score(&[chunk("a", 1.0), chunk("b", 0.5)]), 0.75);
    }

    #[test]
    fn preview_respects_char_boundaries() {
        assert_eq!(preview("abc", 10), "abc");
        assert_eq!(preview("abcdef", 3), "abc");
        assert_eq!(preview("혼잡 제어 알고리즘", 2), "혼잡");
        assert_eq!(preview("", 5), "");
    }

    #[test]
    fn failure_record_is_empty_with_zero_score() {
        let topic = TopicRef::new(17, "error detection");
        let record = ExperimentResult::failed(Strategy::KeywordOnly, &topic, "index missing");
        assert!(record.chunks().is_empty());
        assert_eq!(record.avg_score(), 0.0);
        assert_eq!(record.error(), Some("index missing"));
        assert_eq!(record.score_kind(), ScoreKind::LexicalRank);
    }

    #[test]
    fn serialized_chunks_are_previews() {
        let long = "x".repeat(250);
        let topic = TopicRef::new(30, "connection management");
        let record = ExperimentResult::new(
            Strategy::HydeVector,
            &topic,
            QueryUsed::Dense { passage: "y".repeat(400) },
            vec![RetrievedChunk::new("tcp:1", long.clone(), 0.5)],
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["method"], "HyDE + Vector");
        assert_eq!(json["category_id"], 30);
        assert_eq!(json["score_kind"], "cosine_similarity");
        assert_eq!(json["query_used"]["kind"], "dense");
        assert_eq!(json["query_used"]["passage"].as_str().unwrap().len(), 400);
        assert_eq!(json["chunks"][0]["preview"].as_str().unwrap().len(), PREVIEW_CHARS);
        assert_eq!(json["chunks"][0]["similarity"], 0.5);
        assert!(json["chunks"][0].get("content").is_none());
        assert_eq!(record.chunks()[0].content, long);
    }

    #[test]
    fn display_abbreviates_long_queries() {
        let q = QueryUsed::Hybrid { passage: "v".repeat(80), keyword: "tcp".into() };
        assert_eq!(q.to_string(), format!("Vector: {}... | Keyword: tcp", "v".repeat(60)));
        assert_eq!(QueryUsed::Lexical { keyword: "mac address".into() }.to_string(), "Keyword: mac address");
    }
}
