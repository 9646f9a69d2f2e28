use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use ragbench_core::config::EmbeddingSettings;
use ragbench_core::traits::Embedder;

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    index: usize,
    embedding: Vec<f32>,
}

/// Client for an OpenAI-compatible `POST {base_url}/embeddings` endpoint.
pub struct HttpEmbedder {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    dim: usize,
    batch_size: usize,
}

impl HttpEmbedder {
    pub fn from_settings(settings: &EmbeddingSettings) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("failed to build embedding HTTP client")?;
        let api_key = std::env::var(&settings.api_key_env).ok().filter(|k| !k.is_empty());
        if api_key.is_none() {
            tracing::warn!(env = %settings.api_key_env, "no embedding API key set; sending unauthenticated requests");
        }
        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", settings.base_url.trim_end_matches('/')),
            model: settings.model.clone(),
            api_key,
            dim: settings.dimension,
            batch_size: settings.batch_size.max(1),
        })
    }

    fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut req = self.client.post(&self.endpoint).json(&EmbeddingRequest { model: &self.model, input: texts });
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req.send().with_context(|| format!("embedding request to {} failed", self.endpoint))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(anyhow!("embedding endpoint returned {}: {}", status, body));
        }
        let parsed: EmbeddingResponse = resp.json().context("malformed embedding response")?;
        into_vectors(parsed, texts.len(), self.dim)
    }
}

/// Order vectors by their `index` and check count and dimension.
fn into_vectors(mut parsed: EmbeddingResponse, expected: usize, dim: usize) -> Result<Vec<Vec<f32>>> {
    if parsed.data.len() != expected {
        return Err(anyhow!("expected {} embeddings, got {}", expected, parsed.data.len()));
    }
    parsed.data.sort_by_key(|d| d.index);
    parsed
        .data
        .into_iter()
        .map(|d| {
            if d.embedding.len() == dim { Ok(d.embedding) } else { Err(anyhow!("embedding dimension {} does not match configured {}", d.embedding.len(), dim)) }
        })
        .collect()
}

impl Embedder for HttpEmbedder {
    fn dim(&self) -> usize { self.dim }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            tracing::debug!(texts = batch.len(), model = %self.model, "embedding batch");
            out.extend(self.request(batch)?);
        }
        Ok(out)
    }
}
