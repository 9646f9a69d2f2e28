//! Reciprocal Rank Fusion: score = Σ 1/(k + rank_i)
//!
//! Combines ranked lists without normalizing their heterogeneous scores.

use std::collections::HashMap;

use ragbench_core::types::RetrievedChunk;

/// Fuse ranked lists (best first). `rank` is 1-based. A chunk present in
/// several lists appears once, carrying the sum of its contributions and the
/// content from the first list that returned it. Ties break by id so the
/// output is deterministic. At most `limit` chunks are returned.
pub fn reciprocal_rank_fusion(lists: &[Vec<RetrievedChunk>], rrf_k: u32, limit: usize) -> Vec<RetrievedChunk> {
    let mut fused: HashMap<&str, (f64, &str)> = HashMap::new();
    for list in lists {
        for (rank, chunk) in list.iter().enumerate() {
            let contribution = 1.0 / (f64::from(rrf_k) + (rank + 1) as f64);
            fused
                .entry(chunk.id.as_str())
                .and_modify(|(score, _)| *score += contribution)
                .or_insert((contribution, chunk.content.as_str()));
        }
    }
    let mut merged: Vec<(&str, f64, &str)> = fused.into_iter().map(|(id, (score, content))| (id, score, content)).collect();
    merged.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then_with(|| a.0.cmp(b.0)));
    merged.truncate(limit);
    merged.into_iter().map(|(id, score, content)| RetrievedChunk::new(id, content, score as f32)).collect()
}
