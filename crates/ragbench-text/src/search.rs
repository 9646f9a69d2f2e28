use anyhow::Result;
use tantivy::collector::{DocSetCollector, TopDocs};
use tantivy::query::{BooleanQuery, Occur, Query, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Value};
use tantivy::{Index, TantivyDocument, Term};

use ragbench_core::traits::LexicalSearch;
use ragbench_core::types::{ChunkId, RetrievedChunk};

use crate::index::LexicalIndex;
use crate::tantivy_utils::{analyze, ChunkFields};

/// Conjunction of every analyzed term of `phrase`, or `None` when the
/// phrase has no searchable terms (only stop words, punctuation, nothing).
fn all_terms_query(index: &Index, fields: &ChunkFields, phrase: &str) -> Result<Option<BooleanQuery>> {
	let terms = analyze(index, phrase)?;
	if terms.is_empty() { return Ok(None); }
	let clauses: Vec<(Occur, Box<dyn Query>)> = terms
		.iter()
		.map(|t| {
			let term = Term::from_field_text(fields.text, t);
			(Occur::Must, Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs)) as Box<dyn Query>)
		})
		.collect();
	Ok(Some(BooleanQuery::new(clauses)))
}

fn stored_str(doc: &TantivyDocument, field: Field) -> String {
	doc.get_first(field).and_then(|v| v.as_str()).unwrap_or("").to_string()
}

impl LexicalSearch for LexicalIndex {
	fn search_text(&self, phrase: &str, k: usize) -> Result<Vec<RetrievedChunk>> {
		let (index, fields) = self.handle()?;
		let Some(query) = all_terms_query(&index, &fields, phrase)? else {
			tracing::debug!(phrase, "phrase has no searchable terms");
			return Ok(vec![]);
		};
		if k == 0 { return Ok(vec![]); }
		let reader = index.reader()?;
		let searcher = reader.searcher();
		let top_docs = searcher.search(&query, &TopDocs::with_limit(k))?;
		let mut hits = Vec::with_capacity(top_docs.len());
		for (score, addr) in top_docs {
			let doc: TantivyDocument = searcher.doc(addr)?;
			hits.push(RetrievedChunk::new(stored_str(&doc, fields.id), stored_str(&doc, fields.text), score));
		}
		tracing::debug!(phrase, hits = hits.len(), "lexical search");
		Ok(hits)
	}

	fn matching_ids(&self, phrase: &str) -> Result<Vec<ChunkId>> {
		let (index, fields) = self.handle()?;
		let Some(query) = all_terms_query(&index, &fields, phrase)? else { return Ok(vec![]); };
		let reader = index.reader()?;
		let searcher = reader.searcher();
		let addresses = searcher.search(&query, &DocSetCollector)?;
		let mut ids = Vec::with_capacity(addresses.len());
		for addr in addresses {
			let doc: TantivyDocument = searcher.doc(addr)?;
			ids.push(stored_str(&doc, fields.id));
		}
		ids.sort();
		tracing::debug!(phrase, matches = ids.len(), "lexical filter");
		Ok(ids)
	}
}
