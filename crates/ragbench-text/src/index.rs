use anyhow::Result;
use std::path::{Path, PathBuf};
use tantivy::{doc, Index, IndexWriter};

use ragbench_core::types::DocumentChunk;

use crate::tantivy_utils::{build_schema, register_tokenizer, ChunkFields};

const WRITER_HEAP_BYTES: usize = 50_000_000;

enum Storage {
	Dir(PathBuf),
	Memory(Index),
}

/// Handle to a lexical index. An on-disk index is only a location: every
/// operation opens the index, its reader and searcher, and drops them when it
/// returns, so a missing or broken index fails the call rather than the handle.
pub struct LexicalIndex {
	storage: Storage,
}

impl LexicalIndex {
	/// Create an empty index at `index_dir`, replacing whatever was there.
	pub fn create(index_dir: &Path) -> Result<Self> {
		if index_dir.exists() { std::fs::remove_dir_all(index_dir)?; }
		std::fs::create_dir_all(index_dir)?;
		Index::create_in_dir(index_dir, build_schema())?;
		Ok(Self::open(index_dir))
	}

	/// Refer to an existing index. Nothing is read until the first operation.
	pub fn open(index_dir: &Path) -> Self {
		Self { storage: Storage::Dir(index_dir.to_path_buf()) }
	}

	/// In-memory index, used by tests and one-off queries.
	pub fn in_memory() -> Self {
		Self { storage: Storage::Memory(Index::create_in_ram(build_schema())) }
	}

	/// Open the index with the analyzer registered, plus its field handles.
	pub(crate) fn handle(&self) -> Result<(Index, ChunkFields)> {
		let index = match &self.storage {
			Storage::Dir(dir) => Index::open_in_dir(dir)
				.map_err(|e| anyhow::anyhow!("failed to open lexical index at {}: {}", dir.display(), e))?,
			Storage::Memory(index) => index.clone(),
		};
		register_tokenizer(&index);
		let fields = ChunkFields::from_schema(&index.schema())?;
		Ok((index, fields))
	}

	pub fn index(&self, chunks: &[DocumentChunk]) -> Result<()> {
		let (index, fields) = self.handle()?;
		let mut index_writer: IndexWriter = index.writer(WRITER_HEAP_BYTES)?;
		for c in chunks {
			index_writer.add_document(doc!(
				fields.id => c.id.clone(),
				fields.doc_id => c.doc_id.clone(),
				fields.doc_path => c.doc_path.clone(),
				fields.category => c.category.clone(),
				fields.text => c.content.clone(),
			))?;
		}
		index_writer.commit()?;
		tracing::info!(chunks = chunks.len(), "committed lexical index");
		Ok(())
	}

	pub fn num_docs(&self) -> Result<u64> {
		let (index, _) = self.handle()?;
		Ok(index.reader()?.searcher().num_docs())
	}
}
