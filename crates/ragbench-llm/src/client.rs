use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use ragbench_core::config::LlmSettings;
use ragbench_core::traits::LanguageModel;

const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(8);

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("endpoint returned {status}: {body}")]
    Status { status: reqwest::StatusCode, body: String },
    #[error("malformed completion response: {0}")]
    Malformed(String),
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Blocking client for `POST {base_url}/chat/completions`.
///
/// Rate limits (429) and server errors (5xx) are retried with exponential
/// backoff up to `max_retries` times; other failures are returned at once.
pub struct ChatClient {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    max_retries: u32,
}

impl ChatClient {
    pub fn from_settings(settings: &LlmSettings) -> Result<Self, ChatError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(ChatError::Client)?;
        let api_key = std::env::var(&settings.api_key_env).ok().filter(|k| !k.is_empty());
        if api_key.is_none() {
            tracing::warn!(env = %settings.api_key_env, "no LLM API key set; sending unauthenticated requests");
        }
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", settings.base_url.trim_end_matches('/')),
            model: settings.model.clone(),
            api_key,
            max_retries: settings.max_retries,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn send(&self, request: &ChatRequest<'_>) -> Result<String, ChatError> {
        let mut backoff = INITIAL_BACKOFF;
        let mut attempt = 0;
        loop {
            let mut req = self.client.post(&self.endpoint).json(request);
            if let Some(key) = &self.api_key {
                req = req.bearer_auth(key);
            }
            let outcome = req
                .send()
                .map_err(|source| ChatError::Transport { url: self.endpoint.clone(), source })
                .and_then(|resp| {
                    let status = resp.status();
                    if status.is_success() {
                        resp.text().map_err(|source| ChatError::Transport { url: self.endpoint.clone(), source })
                    } else {
                        Err(ChatError::Status { status, body: resp.text().unwrap_or_default() })
                    }
                });
            match outcome {
                Ok(body) => return parse_completion(&body),
                Err(err) if attempt < self.max_retries && is_retryable(&err) => {
                    attempt += 1;
                    tracing::debug!(attempt, max = self.max_retries, ?backoff, error = %err, "retrying chat completion");
                    std::thread::sleep(backoff);
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
                Err(err) => return Err(err),
            }
        }
    }
}

fn is_retryable(err: &ChatError) -> bool {
    match err {
        ChatError::Status { status, .. } => status.as_u16() == 429 || status.is_server_error(),
        ChatError::Transport { source, .. } => source.is_timeout() || source.is_connect(),
        ChatError::Client(_) | ChatError::Malformed(_) => false,
    }
}

/// Text of the first choice. A choice with `null` content yields an empty string.
fn parse_completion(body: &str) -> Result<String, ChatError> {
    let parsed: ChatResponse = serde_json::from_str(body).map_err(|e| ChatError::Malformed(e.to_string()))?;
    parsed
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content.unwrap_or_default())
        .ok_or_else(|| ChatError::Malformed("response has no choices".to_string()))
}

impl LanguageModel for ChatClient {
    fn complete(&self, system_prompt: &str, user_message: &str, temperature: f32) -> anyhow::Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage { role: "system", content: system_prompt },
                ChatMessage { role: "user", content: user_message },
            ],
            temperature,
        };
        tracing::debug!(model = %self.model, temperature, "chat completion");
        Ok(self.send(&request)?)
    }
}
