use anyhow::{anyhow, Result};
use arrow_array::{FixedSizeListArray, Int32Array, RecordBatch, RecordBatchIterator, StringArray};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;

use ragbench_core::types::DocumentChunk;

use crate::schema::build_arrow_schema;
use crate::VectorStore;

const BATCH_SIZE: usize = 1000;

impl VectorStore {
	/// Append `chunks` with their `embeddings`, creating the table on first write.
	pub fn index(&self, chunks: &[DocumentChunk], embeddings: &[Vec<f32>]) -> Result<()> {
		if chunks.is_empty() { tracing::warn!("no chunks to index"); return Ok(()); }
		if chunks.len() != embeddings.len() {
			return Err(anyhow!("{} chunks but {} embeddings", chunks.len(), embeddings.len()));
		}
		if let Some((i, e)) = embeddings.iter().enumerate().find(|(_, e)| e.len() != self.dim) {
			return Err(anyhow!("embedding for chunk {} has dimension {}, expected {}", chunks[i].id, e.len(), self.dim));
		}
		tracing::info!(chunks = chunks.len(), table = %self.table_name, "indexing into LanceDB");
		let pb = ProgressBar::new(chunks.len() as u64);
		if let Ok(style) = ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} chunks ({percent}%) {msg}") {
			pb.set_style(style.progress_chars("#>-"));
		}
		self.runtime.block_on(async {
			let db = self.connect().await?;
			for (batch_chunks, batch_vectors) in chunks.chunks(BATCH_SIZE).zip(embeddings.chunks(BATCH_SIZE)) {
				let record_batch = self.to_record_batch(batch_chunks, batch_vectors)?;
				let schema = record_batch.schema();
				let reader = Box::new(RecordBatchIterator::new(vec![Ok(record_batch)].into_iter(), schema));
				if db.table_names().execute().await?.contains(&self.table_name) {
					db.open_table(&self.table_name).execute().await?.add(reader).execute().await?;
				} else {
					db.create_table(&self.table_name, reader).execute().await?;
				}
				pb.inc(batch_chunks.len() as u64);
			}
			Ok::<(), anyhow::Error>(())
		})?;
		pb.finish_with_message("done");
		tracing::info!(chunks = chunks.len(), "LanceDB indexing completed");
		Ok(())
	}

	fn to_record_batch(&self, chunks: &[DocumentChunk], vectors: &[Vec<f32>]) -> Result<RecordBatch> {
		let dim = i32::try_from(self.dim)?;
		let record_batch = RecordBatch::try_new(build_arrow_schema(dim), vec![
			Arc::new(StringArray::from_iter_values(chunks.iter().map(|c| c.id.as_str()))),
			Arc::new(StringArray::from_iter_values(chunks.iter().map(|c| c.doc_id.as_str()))),
			Arc::new(StringArray::from_iter_values(chunks.iter().map(|c| c.doc_path.as_str()))),
			Arc::new(StringArray::from_iter_values(chunks.iter().map(|c| c.category.as_str()))),
			Arc::new(StringArray::from_iter_values(chunks.iter().map(|c| c.content.as_str()))),
			Arc::new(Int32Array::from_iter_values(chunks.iter().map(|c| c.chunk_index as i32))),
			Arc::new(Int32Array::from_iter_values(chunks.iter().map(|c| c.total_chunks as i32))),
			Arc::new(FixedSizeListArray::from_iter_primitive::<arrow_array::types::Float32Type, _, _>(
				vectors.iter().map(|v| Some(v.iter().map(|&x| Some(x)).collect::<Vec<_>>())),
				dim,
			)),
		])?;
		Ok(record_batch)
	}
}
