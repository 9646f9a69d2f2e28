use anyhow::{anyhow, Result};
use arrow_array::{Float32Array, RecordBatch, StringArray};
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::DistanceType;

use ragbench_core::traits::DenseSearch;
use ragbench_core::types::{ChunkId, RetrievedChunk};

use crate::VectorStore;

/// `id IN (...)` predicate with single quotes escaped.
pub fn id_filter(ids: &[ChunkId]) -> String {
	let list = ids.iter().map(|id| format!("'{}'", id.replace('\'', "''"))).collect::<Vec<_>>().join(",");
	format!("id IN ({})", list)
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
	batch
		.column_by_name(name)
		.and_then(|c| c.as_any().downcast_ref::<StringArray>())
		.ok_or_else(|| anyhow!("result batch is missing string column '{}'", name))
}

fn batch_to_chunks(batch: &RecordBatch) -> Result<Vec<RetrievedChunk>> {
	let ids = string_column(batch, "id")?;
	let contents = string_column(batch, "content")?;
	let distances = batch
		.column_by_name("_distance")
		.and_then(|c| c.as_any().downcast_ref::<Float32Array>())
		.ok_or_else(|| anyhow!("result batch is missing '_distance'"))?;
	Ok((0..batch.num_rows())
		.map(|i| RetrievedChunk::new(ids.value(i), contents.value(i), 1.0 - distances.value(i)))
		.collect())
}

impl VectorStore {
	async fn nearest(&self, vector: &[f32], filter: Option<String>, k: usize) -> Result<Vec<RetrievedChunk>> {
		let (_db, table) = self.open_table().await?;
		let mut query = table.vector_search(vector.to_vec())?.distance_type(DistanceType::Cosine).limit(k);
		if let Some(filter) = filter { query = query.only_if(filter); }
		let mut stream = query.execute().await?;
		let mut hits = Vec::new();
		while let Some(batch) = stream.try_next().await? {
			hits.extend(batch_to_chunks(&batch)?);
		}
		hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
		hits.truncate(k);
		Ok(hits)
	}

	fn check_query(&self, vector: &[f32]) -> Result<()> {
		if vector.len() != self.dim {
			return Err(anyhow!("query vector has dimension {}, store expects {}", vector.len(), self.dim));
		}
		Ok(())
	}
}

impl DenseSearch for VectorStore {
	fn search_by_vector(&self, vector: &[f32], k: usize) -> Result<Vec<RetrievedChunk>> {
		self.check_query(vector)?;
		if k == 0 { return Ok(vec![]); }
		let hits = self.runtime.block_on(self.nearest(vector, None, k))?;
		tracing::debug!(k, hits = hits.len(), "dense search");
		Ok(hits)
	}

	fn search_within(&self, vector: &[f32], candidates: &[ChunkId], k: usize) -> Result<Vec<RetrievedChunk>> {
		self.check_query(vector)?;
		if k == 0 || candidates.is_empty() { return Ok(vec![]); }
		let hits = self.runtime.block_on(self.nearest(vector, Some(id_filter(candidates)), k))?;
		tracing::debug!(k, candidates = candidates.len(), hits = hits.len(), "filtered dense search");
		Ok(hits)
	}
}
