//! Embeddings from an OpenAI-compatible `/v1/embeddings` endpoint.
//!
//! Works against the hosted OpenAI API and against self-hosted servers that
//! expose the same route (text-embeddings-inference, vLLM, Ollama, ...), so a
//! sentence-transformers model such as `all-MiniLM-L6-v2` can back the index.
//!
//! This module is only available when the `openai` feature is enabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::RagConfig;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// Base URL of the hosted OpenAI API.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const PROVIDER: &str = "openai-compatible";

fn unavailable(message: impl Into<String>) -> RagError {
    RagError::EmbeddingUnavailable { provider: PROVIDER.to_string(), message: message.into() }
}

/// An [`EmbeddingProvider`] calling an OpenAI-compatible embeddings API.
///
/// One HTTP request is sent per batch.
///
/// # Configuration
///
/// - `base_url` – defaults to [`DEFAULT_BASE_URL`], or `OPENAI_BASE_URL` in
///   [`from_env`](Self::from_env).
/// - `model` – the model name sent with every request.
/// - `dimensions` – expected vector length; also sent to the API so models
///   with Matryoshka support truncate to it.
/// - `api_key` – optional for self-hosted servers; `OPENAI_API_KEY` in
///   [`from_env`](Self::from_env).
pub struct OpenAiEmbeddingProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    dimensions: usize,
    send_dimensions: bool,
}

impl std::fmt::Debug for OpenAiEmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiEmbeddingProvider")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("dimensions", &self.dimensions)
            .finish_non_exhaustive()
    }
}

impl OpenAiEmbeddingProvider {
    /// Create a provider for `model` producing `dimensions`-long vectors.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfiguration`] if the model is blank or
    /// `dimensions` is zero.
    pub fn new(model: impl Into<String>, dimensions: usize) -> Result<Self> {
        let model = model.into();
        if model.trim().is_empty() {
            return Err(RagError::InvalidConfiguration("embedding model must not be empty".into()));
        }
        if dimensions == 0 {
            return Err(RagError::InvalidConfiguration(
                "embedding dimensions must be greater than zero".into(),
            ));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            model,
            dimensions,
            send_dimensions: false,
        })
    }

    /// Create a provider for the configured model, reading `OPENAI_BASE_URL`
    /// and `OPENAI_API_KEY` from the environment when set.
    pub fn from_env(config: &RagConfig) -> Result<Self> {
        let mut provider = Self::new(&config.embeddings_model, config.embedding_dimensions)?;
        if let Ok(url) = std::env::var("OPENAI_BASE_URL") {
            provider = provider.with_base_url(url);
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            provider = provider.with_api_key(key);
        }
        Ok(provider)
    }

    /// Set the API base URL, e.g. `http://localhost:8080/v1`.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Authenticate requests with a bearer token.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into()).filter(|k| !k.is_empty());
        self
    }

    /// Ask the API to truncate vectors to the configured dimensions.
    pub fn with_dimension_request(mut self, send: bool) -> Self {
        self.send_dimensions = send;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/embeddings", self.base_url)
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
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

/// Order embeddings by their `index` and check count and length.
fn collect_embeddings(
    mut data: Vec<EmbeddingData>,
    expected: usize,
    dimensions: usize,
) -> Result<Vec<Vec<f32>>> {
    if data.len() != expected {
        return Err(unavailable(format!("expected {expected} embeddings, got {}", data.len())));
    }
    data.sort_by_key(|d| d.index);
    data.into_iter()
        .map(|d| {
            if d.embedding.len() == dimensions {
                Ok(d.embedding)
            } else {
                Err(RagError::DimensionMismatch { expected: dimensions, actual: d.embedding.len() })
            }
        })
        .collect()
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| unavailable("API returned no embedding"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!(batch_size = texts.len(), model = %self.model, "requesting embeddings");

        let body = EmbeddingRequest {
            model: &self.model,
            input: texts,
            dimensions: self.send_dimensions.then_some(self.dimensions),
        };
        let mut request = self.client.post(self.endpoint()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            error!(url = %self.endpoint(), error = %e, "embedding request failed");
            unavailable(format!("request failed: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            error!(%status, "embedding API error");
            return Err(unavailable(format!("API returned {status}: {detail}")));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| unavailable(format!("failed to parse response: {e}")))?;
        collect_embeddings(parsed.data, texts.len(), self.dimensions)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
