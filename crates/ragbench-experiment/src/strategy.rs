use anyhow::Result;
use serde::{Serialize, Serializer};
use std::fmt;

use ragbench_core::traits::{DenseSearch, Embedder, HybridSearch, LanguageModel, LexicalSearch};
use ragbench_core::types::{ScoreKind, Topic, TopicRef};

use crate::query::{extract_keywords, generate_hypothetical_document, KeywordPrompt};
use crate::result::{ExperimentResult, QueryUsed};

/// Providers and knobs shared by every strategy within a run.
#[derive(Clone, Copy)]
pub struct StrategyContext<'a> {
    pub embedder: &'a dyn Embedder,
    pub dense: &'a dyn DenseSearch,
    pub lexical: &'a dyn LexicalSearch,
    pub hybrid: &'a dyn HybridSearch,
    pub llm: &'a dyn LanguageModel,
    pub top_k: usize,
    /// Temperature for hypothetical-document synthesis.
    pub hyde_temperature: f32,
    /// Temperature for keyword extraction.
    pub keyword_temperature: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    HydeVector,
    CategoryVector,
    KeywordOnly,
    HybridTopicKeyword,
    HybridHydeKeywords,
    HybridHydeKeywordsStrict,
    KeywordFilterVectorSort,
}

/// Every strategy, in the order the harness runs them.
pub const CATALOG: [Strategy; 7] = [
    Strategy::HydeVector,
    Strategy::CategoryVector,
    Strategy::KeywordOnly,
    Strategy::HybridTopicKeyword,
    Strategy::HybridHydeKeywords,
    Strategy::HybridHydeKeywordsStrict,
    Strategy::KeywordFilterVectorSort,
];

impl Strategy {
    /// Stable name written to the report.
    pub fn name(self) -> &'static str {
        match self {
            Strategy::HydeVector => "HyDE + Vector",
            Strategy::CategoryVector => "Category Direct + Vector",
            Strategy::KeywordOnly => "Keyword Only",
            Strategy::HybridTopicKeyword => "Hybrid (Vector + Keyword)",
            Strategy::HybridHydeKeywords => "Hybrid (HyDE Keywords)",
            Strategy::HybridHydeKeywordsStrict => "Hybrid (HyDE Keywords v2)",
            Strategy::KeywordFilterVectorSort => "Keyword Filter -> Vector Sort",
        }
    }

    pub fn score_kind(self) -> ScoreKind {
        match self {
            Strategy::HydeVector | Strategy::CategoryVector | Strategy::KeywordFilterVectorSort => {
                ScoreKind::CosineSimilarity
            }
            Strategy::KeywordOnly => ScoreKind::LexicalRank,
            Strategy::HybridTopicKeyword | Strategy::HybridHydeKeywords | Strategy::HybridHydeKeywordsStrict => {
                ScoreKind::FusedRank
            }
        }
    }

    /// Build this strategy's query for `topic` and retrieve `ctx.top_k` chunks.
    ///
    /// Provider errors are returned unchanged; provider output is kept in the
    /// order and length it was returned.
    pub fn run(self, topic: &Topic, ctx: &StrategyContext<'_>) -> Result<ExperimentResult> {
        let k = ctx.top_k;
        let (query_used, chunks) = match self {
            Strategy::HydeVector => {
                let passage = hypothetical(topic, ctx)?;
                let vector = ctx.embedder.embed(&passage)?;
                (QueryUsed::Dense { passage }, ctx.dense.search_by_vector(&vector, k)?)
            }
            Strategy::CategoryVector => {
                let text = format!("{} {}", topic.name, topic.path);
                let vector = ctx.embedder.embed(&text)?;
                (QueryUsed::Dense { passage: text }, ctx.dense.search_by_vector(&vector, k)?)
            }
            Strategy::KeywordOnly => {
                let chunks = ctx.lexical.search_text(&topic.name, k)?;
                (QueryUsed::Lexical { keyword: topic.name.clone() }, chunks)
            }
            Strategy::HybridTopicKeyword => {
                let passage = hypothetical(topic, ctx)?;
                let vector = ctx.embedder.embed(&passage)?;
                let chunks = ctx.hybrid.search_hybrid(&vector, &topic.name, k)?;
                (QueryUsed::Hybrid { passage, keyword: topic.name.clone() }, chunks)
            }
            Strategy::HybridHydeKeywords | Strategy::HybridHydeKeywordsStrict => {
                let prompt = if self == Strategy::HybridHydeKeywords { KeywordPrompt::Basic } else { KeywordPrompt::Searchable };
                let passage = hypothetical(topic, ctx)?;
                let vector = ctx.embedder.embed(&passage)?;
                let keywords = extract_keywords(ctx.llm, &passage, prompt, ctx.keyword_temperature)?;
                let chunks = ctx.hybrid.search_hybrid(&vector, &keywords, k)?;
                (QueryUsed::Hybrid { passage, keyword: keywords }, chunks)
            }
            Strategy::KeywordFilterVectorSort => {
                let passage = hypothetical(topic, ctx)?;
                let vector = ctx.embedder.embed(&passage)?;
                let candidates = ctx.lexical.matching_ids(&topic.name)?;
                tracing::debug!(candidates = candidates.len(), filter = %topic.name, "lexical pre-filter");
                let chunks = ctx.dense.search_within(&vector, &candidates, k)?;
                (QueryUsed::FilteredDense { filter: topic.name.clone(), passage }, chunks)
            }
        };
        let topic_ref = TopicRef::new(topic.id, topic.name.clone());
        Ok(ExperimentResult::new(self, &topic_ref, query_used, chunks))
    }
}

fn hypothetical(topic: &Topic, ctx: &StrategyContext<'_>) -> Result<String> {
    generate_hypothetical_document(ctx.llm, topic, ctx.hyde_temperature)
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Strategy {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}
