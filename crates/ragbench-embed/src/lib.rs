//! Embedding providers.
//!
//! [`HttpEmbedder`] talks to an OpenAI-compatible `/embeddings` endpoint.
//! [`HashEmbedder`] is a deterministic, L2-normalized token-hashing stand-in
//! used for offline runs and tests; `APP_USE_FAKE_EMBEDDINGS=1` selects it.

mod hash;
mod http;

pub use hash::HashEmbedder;
pub use http::HttpEmbedder;

use anyhow::Result;
use ragbench_core::config::EmbeddingSettings;
use ragbench_core::traits::Embedder;

pub fn fake_embeddings_requested() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

pub fn get_default_embedder(settings: &EmbeddingSettings) -> Result<Box<dyn Embedder>> {
    if settings.use_fake || fake_embeddings_requested() {
        tracing::info!(dim = settings.dimension, "using hash embedder");
        return Ok(Box::new(HashEmbedder::new(settings.dimension)));
    }
    tracing::info!(model = %settings.model, base_url = %settings.base_url, "using HTTP embedder");
    Ok(Box::new(HttpEmbedder::from_settings(settings)?))
}
