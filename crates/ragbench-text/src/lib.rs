//! ragbench-text
//!
//! Tantivy-backed lexical store. Chunks are indexed with an English analyzer
//! (lowercase, stop words, stemming) and searched with all-terms-must-match
//! semantics, ranked by BM25.

pub mod tantivy_utils;
pub mod index;
pub mod search;

pub use index::LexicalIndex;
