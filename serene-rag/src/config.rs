//! Configuration for the RAG manager.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Name of the snapshot file inside [`RagConfig::index_dir`].
pub const INDEX_FILE_NAME: &str = "index.bin";

/// Configuration parameters for the RAG manager.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Whether retrieval is enabled at all.
    pub enabled: bool,
    /// Directory scanned for `.md` / `.txt` source documents.
    pub documents_dir: PathBuf,
    /// Directory holding the persisted index snapshot.
    pub index_dir: PathBuf,
    /// Identifier of the embedding model.
    pub embeddings_model: String,
    /// Dimensionality of the embedding model.
    pub embedding_dimensions: usize,
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of top results to return from vector search.
    pub top_k: usize,
    /// Minimum cosine similarity for results (results below this are filtered out).
    pub similarity_threshold: f32,
    /// Upper bound, in characters, of the context block built from results.
    pub max_context_length: usize,
    /// Budget for embedding plus search on the query path.
    #[serde(with = "duration_millis")]
    pub query_timeout: Duration,
    /// Number of chunks sent to the embedding provider per call during ingestion.
    pub embed_batch_size: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            documents_dir: PathBuf::from("data/documents"),
            index_dir: PathBuf::from("data/index"),
            embeddings_model: "all-MiniLM-L6-v2".to_string(),
            embedding_dimensions: 384,
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 3,
            similarity_threshold: 0.0,
            max_context_length: 2000,
            query_timeout: Duration::from_secs(5),
            embed_batch_size: 32,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Build a configuration from `RAG_*` environment variables, falling back
    /// to the defaults for unset variables.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfiguration`] if a variable cannot be
    /// parsed or the resulting configuration is inconsistent.
    pub fn from_env() -> Result<Self> {
        let mut builder = Self::builder();
        let defaults = RagConfig::default();

        if let Some(enabled) = env_var("RAG_ENABLED") {
            builder = builder.enabled(enabled.eq_ignore_ascii_case("true"));
        }
        if let Some(dir) = env_var("RAG_DOCUMENTS_DIR") {
            builder = builder.documents_dir(dir);
        }
        if let Some(dir) = env_var("RAG_INDEX_DIR") {
            builder = builder.index_dir(dir);
        }
        if let Some(model) = env_var("RAG_EMBEDDINGS_MODEL") {
            builder = builder.embeddings_model(model);
        }
        builder = builder
            .embedding_dimensions(parse_env(
                "RAG_EMBEDDING_DIMENSIONS",
                defaults.embedding_dimensions,
            )?)
            .chunk_size(parse_env("RAG_CHUNK_SIZE", defaults.chunk_size)?)
            .chunk_overlap(parse_env("RAG_CHUNK_OVERLAP", defaults.chunk_overlap)?)
            .max_context_length(parse_env("RAG_MAX_CONTEXT_LENGTH", defaults.max_context_length)?)
            .top_k(parse_env("RAG_SEARCH_K", defaults.top_k)?)
            .similarity_threshold(parse_env(
                "RAG_SIMILARITY_THRESHOLD",
                defaults.similarity_threshold,
            )?)
            .query_timeout(Duration::from_millis(parse_env(
                "RAG_QUERY_TIMEOUT_MS",
                defaults.query_timeout.as_millis() as u64,
            )?))
            .embed_batch_size(parse_env("RAG_EMBED_BATCH_SIZE", defaults.embed_batch_size)?);

        builder.build()
    }

    /// Full path of the persisted snapshot.
    pub fn index_path(&self) -> PathBuf {
        self.index_dir.join(INDEX_FILE_NAME)
    }
}

fn env_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: FromStr>(key: &str, default: T) -> Result<T> {
    match env_var(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            RagError::InvalidConfiguration(format!("{key} has an unparsable value '{raw}'"))
        }),
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Enable or disable retrieval.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.config.enabled = enabled;
        self
    }

    /// Set the source documents directory.
    pub fn documents_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.documents_dir = dir.into();
        self
    }

    /// Set the directory holding the persisted snapshot.
    pub fn index_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.index_dir = dir.into();
        self
    }

    /// Set the embedding model identifier.
    pub fn embeddings_model(mut self, model: impl Into<String>) -> Self {
        self.config.embeddings_model = model.into();
        self
    }

    /// Set the embedding dimensionality.
    pub fn embedding_dimensions(mut self, dimensions: usize) -> Self {
        self.config.embedding_dimensions = dimensions;
        self
    }

    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of top results to return from vector search.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the minimum similarity threshold for filtering results.
    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = threshold;
        self
    }

    /// Set the maximum length of a rendered context block.
    pub fn max_context_length(mut self, length: usize) -> Self {
        self.config.max_context_length = length;
        self
    }

    /// Set the query-path timeout.
    pub fn query_timeout(mut self, timeout: Duration) -> Self {
        self.config.query_timeout = timeout;
        self
    }

    /// Set how many chunks are embedded per provider call.
    pub fn embed_batch_size(mut self, size: usize) -> Self {
        self.config.embed_batch_size = size;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfiguration`] if:
    /// - `chunk_size == 0` or `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    /// - `embed_batch_size == 0` or `embedding_dimensions == 0`
    pub fn build(self) -> Result<RagConfig> {
        if self.config.chunk_size == 0 {
            return Err(RagError::InvalidConfiguration(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.config.chunk_overlap >= self.config.chunk_size {
            return Err(RagError::InvalidConfiguration(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.config.chunk_overlap, self.config.chunk_size
            )));
        }
        if self.config.top_k == 0 {
            return Err(RagError::InvalidConfiguration(
                "top_k must be greater than zero".to_string(),
            ));
        }
        if self.config.embed_batch_size == 0 {
            return Err(RagError::InvalidConfiguration(
                "embed_batch_size must be greater than zero".to_string(),
            ));
        }
        if self.config.embedding_dimensions == 0 {
            return Err(RagError::InvalidConfiguration(
                "embedding_dimensions must be greater than zero".to_string(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = RagConfig::builder().build().unwrap();
        assert_eq!(config, RagConfig::default());
        assert_eq!(config.index_path(), PathBuf::from("data/index").join(INDEX_FILE_NAME));
    }

    #[test]
    fn rejects_overlap_not_smaller_than_chunk_size() {
        let err = RagConfig::builder().chunk_size(100).chunk_overlap(100).build().unwrap_err();
        assert!(matches!(err, RagError::InvalidConfiguration(_)));
    }

    #[test]
    fn rejects_zero_sizes() {
        assert!(RagConfig::builder().chunk_size(0).chunk_overlap(0).build().is_err());
        assert!(RagConfig::builder().top_k(0).build().is_err());
        assert!(RagConfig::builder().embed_batch_size(0).build().is_err());
        assert!(RagConfig::builder().embedding_dimensions(0).build().is_err());
    }

    #[test]
    fn serializes_timeout_as_millis() {
        let config =
            RagConfig::builder().query_timeout(Duration::from_millis(1500)).build().unwrap();
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["query_timeout"], 1500);

        let back: RagConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back.query_timeout, Duration::from_millis(1500));
    }
}
