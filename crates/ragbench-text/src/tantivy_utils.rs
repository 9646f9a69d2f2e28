use tantivy::schema::{Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, STORED, STRING};
use tantivy::tokenizer::{Language, LowerCaser, RemoveLongFilter, SimpleTokenizer, Stemmer, StopWordFilter, TextAnalyzer};
use tantivy::Index;

pub const ENGLISH_ANALYZER: &str = "english_text";

#[derive(Debug, Clone, Copy)]
pub struct ChunkFields {
	pub id: Field,
	pub doc_id: Field,
	pub doc_path: Field,
	pub category: Field,
	pub text: Field,
}

impl ChunkFields {
	pub fn from_schema(schema: &Schema) -> tantivy::Result<Self> {
		Ok(Self {
			id: schema.get_field("id")?,
			doc_id: schema.get_field("doc_id")?,
			doc_path: schema.get_field("doc_path")?,
			category: schema.get_field("category")?,
			text: schema.get_field("text")?,
		})
	}
}

pub fn build_schema() -> Schema {
	let mut schema_builder = Schema::builder();
	schema_builder.add_text_field("id", STRING | STORED);
	schema_builder.add_text_field("doc_id", STRING | STORED);
	schema_builder.add_text_field("doc_path", STRING | STORED);
	schema_builder.add_text_field("category", STRING | STORED);
	let text_field_indexing = TextFieldIndexing::default().set_tokenizer(ENGLISH_ANALYZER).set_index_option(IndexRecordOption::WithFreqsAndPositions);
	let text_options = TextOptions::default().set_indexing_options(text_field_indexing).set_stored();
	schema_builder.add_text_field("text", text_options);
	schema_builder.build()
}

/// Registers the analyzer used for both indexing and query terms, the
/// counterpart of Postgres' `english` text-search configuration.
pub fn register_tokenizer(index: &Index) {
	let stop_words = [
		"a","an","and","are","as","at","be","by","for","from","has","he","in","is","it","its","of","on","that","the","to","was","will","with","or","but","not","this","these","they","them","their","there","then","than","so","if","when","where","why","how","what","which","who","whom","whose","can","could","should","would","may","might","must","shall","do","does","did","have","had","having",
	];
	let tokenizer = TextAnalyzer::builder(SimpleTokenizer::default())
		.filter(RemoveLongFilter::limit(40))
		.filter(LowerCaser)
		.filter(StopWordFilter::remove(stop_words.into_iter().map(|s| s.to_string())))
		.filter(Stemmer::new(Language::English))
		.build();
	index.tokenizers().register(ENGLISH_ANALYZER, tokenizer);
}

/// Analyzed, de-duplicated terms of `phrase`, in first-seen order.
pub fn analyze(index: &Index, phrase: &str) -> anyhow::Result<Vec<String>> {
	let mut analyzer = index
		.tokenizers()
		.get(ENGLISH_ANALYZER)
		.ok_or_else(|| anyhow::anyhow!("tokenizer '{}' is not registered", ENGLISH_ANALYZER))?;
	let mut terms: Vec<String> = Vec::new();
	let mut stream = analyzer.token_stream(phrase);
	while stream.advance() {
		let text = &stream.token().text;
		if !terms.iter().any(|t| t == text) { terms.push(text.clone()); }
	}
	Ok(terms)
}
