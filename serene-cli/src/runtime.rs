use std::sync::Arc;

use serene_rag::{EmbeddingProvider, HashingEmbedder, RagConfig, RagManager};
use tracing::debug;

use crate::cli::{Cli, EmbedderKind};

/// Configuration shared by the commands of one invocation.
#[derive(Debug, Clone)]
pub struct Runtime {
    pub config: RagConfig,
    pub embedder: EmbedderKind,
}

impl Runtime {
    /// `RAG_*` environment configuration with the command-line overrides
    /// applied.
    pub fn from_cli(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = RagConfig::from_env()?;
        if let Some(dir) = &cli.documents_dir {
            config.documents_dir = dir.clone();
        }
        if let Some(dir) = &cli.index_dir {
            config.index_dir = dir.clone();
        }
        Ok(Self { config, embedder: cli.embedder })
    }

    /// Open the manager over the configured index, loading its snapshot.
    pub fn manager(&self) -> anyhow::Result<RagManager> {
        let provider: Arc<dyn EmbeddingProvider> = match self.embedder {
            EmbedderKind::Hashing => {
                Arc::new(HashingEmbedder::new(self.config.embedding_dimensions))
            }
            #[cfg(feature = "openai")]
            EmbedderKind::Openai => {
                Arc::new(serene_rag::OpenAiEmbeddingProvider::from_env(&self.config)?)
            }
        };
        debug!(
            model = provider.model_id(),
            index = %self.config.index_path().display(),
            "opening index"
        );
        Ok(RagManager::builder().config(self.config.clone()).embedding_provider(provider).build()?)
    }
}
