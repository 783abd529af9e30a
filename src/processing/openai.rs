//! Remote embeddings through an OpenAI-compatible `/embeddings` endpoint.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::{MatcherError, MatcherResult};
use crate::models::config::EmbeddingConfig;
use crate::processing::embedding::Embedder;

const PROVIDER: &str = "openai";
const DEFAULT_MODEL: &str = "text-embedding-3-small";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

pub struct OpenAiEmbedder {
    client: reqwest::blocking::Client,
    endpoint: Url,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

fn service_error(message: impl Into<String>) -> MatcherError {
    MatcherError::EmbeddingService {
        provider: PROVIDER.to_string(),
        message: message.into(),
    }
}

impl OpenAiEmbedder {
    /// The API key comes from the config or the `OPENAI_API_KEY` variable.
    pub fn new(config: &EmbeddingConfig) -> MatcherResult<Self> {
        let api_key = match &config.api_key {
            Some(key) if !key.is_empty() => key.clone(),
            _ => std::env::var("OPENAI_API_KEY")
                .map_err(|_| service_error("OPENAI_API_KEY environment variable not set"))?,
        };

        let endpoint = Url::parse(&config.api_base)
            .and_then(|base| base.join("embeddings"))
            .map_err(|e| service_error(format!("invalid api_base {}: {e}", config.api_base)))?;

        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| service_error(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            api_key,
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl Embedder for OpenAiEmbedder {
    fn provider(&self) -> &str {
        PROVIDER
    }

    fn embed_many(&mut self, texts: &[String]) -> MatcherResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        log::debug!("Requesting {} embeddings from {}", texts.len(), self.endpoint);

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .map_err(|e| service_error(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            log::error!("Embedding API returned {status}");
            return Err(service_error(format!("API returned {status}: {detail}")));
        }

        let mut parsed: EmbeddingResponse = response
            .json()
            .map_err(|e| service_error(format!("failed to parse response: {e}")))?;

        // Entries carry their input position; do not rely on response order.
        parsed.data.sort_by_key(|item| item.index);
        Ok(parsed.data.into_iter().map(|item| item.embedding).collect())
    }
}
