//! RAG manager orchestrator.
//!
//! The [`RagManager`] owns the [`VectorIndex`] and the [`DocumentStore`] and
//! runs every workflow over them: ingestion (chunk → embed → insert →
//! register → persist), queries (embed → search → map back to documents),
//! removal, reindexing and status reporting.
//!
//! Mutations are serialized by a writer lock and applied to a private copy
//! of the state. The copy is persisted first and only then swapped in, so
//! readers see either the old or the new state, and the in-memory state
//! never runs ahead of the snapshot on disk.
//!
//! # Example
//!
//! ```rust,ignore
//! use serene_rag::{Document, HashingEmbedder, RagConfig, RagManager};
//!
//! let manager = RagManager::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(HashingEmbedder::new(384)))
//!     .build()?;
//!
//! manager.ingest(document).await?;
//! let results = manager.query("breathing techniques", 2).await;
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::chunking::{Chunker, FixedSizeChunker};
use crate::config::RagConfig;
use crate::context::build_context;
use crate::document::{Category, Chunk, Document, QueryResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::index::{EntryId, EntryMetadata, VectorIndex};
use crate::loader::{first_heading, load_documents};
use crate::persist::{self, IndexHeader};
use crate::store::{DocumentRecord, DocumentStore};

/// Title given to [`RagManager::add_text`] documents without a title or heading.
pub const DEFAULT_TEXT_TITLE: &str = "Manually added document";

#[derive(Debug, Clone)]
struct State {
    index: VectorIndex,
    store: DocumentStore,
}

impl State {
    fn empty(dimension: usize) -> Self {
        Self { index: VectorIndex::with_dimension(dimension), store: DocumentStore::new() }
    }
}

/// One document that made it into the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestedDocument {
    /// Identifier of the document.
    pub document_id: String,
    /// Number of chunks (and index entries) stored for it.
    pub chunk_count: usize,
    /// Whether an earlier version of the document was replaced.
    pub replaced: bool,
}

/// A document a batch ingestion could not store.
#[derive(Debug)]
pub struct IngestFailure {
    /// Identifier of the document.
    pub document_id: String,
    /// Why it failed. Nothing of the document was kept.
    pub error: RagError,
}

/// Outcome of [`RagManager::ingest_batch`] and [`RagManager::ingest_directory`].
#[derive(Debug, Default)]
pub struct IngestSummary {
    /// Newly ingested or replaced documents.
    pub ingested: Vec<IngestedDocument>,
    /// Documents already indexed with identical content.
    pub unchanged: Vec<String>,
    /// Documents that failed; the rest of the batch was still applied.
    pub failed: Vec<IngestFailure>,
}

impl IngestSummary {
    /// Total chunks stored by this batch.
    pub fn chunk_count(&self) -> usize {
        self.ingested.iter().map(|doc| doc.chunk_count).sum()
    }

    fn changed(&self) -> bool {
        !self.ingested.is_empty()
    }
}

/// Outcome of [`RagManager::reindex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReindexReport {
    /// Documents re-embedded.
    pub document_count: usize,
    /// Entries in the rebuilt index.
    pub entry_count: usize,
}

/// Point-in-time report on the manager's state.
#[derive(Debug, Clone, Serialize)]
pub struct RagStatus {
    /// Whether retrieval is enabled in the configuration.
    pub enabled: bool,
    /// Registered documents.
    pub document_count: usize,
    /// Entries in the in-memory index.
    pub entry_count: usize,
    /// Vector dimension of the in-memory index.
    pub dimension: Option<usize>,
    /// Model id of the configured embedding provider.
    pub model_id: String,
    /// Location of the snapshot.
    pub index_path: PathBuf,
    /// Header of the snapshot on disk, if one could be read.
    pub on_disk: Option<IndexHeader>,
    /// Why the snapshot on disk could not be read, if it exists but is unusable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_error: Option<String>,
    /// Whether the snapshot on disk describes the in-memory state.
    pub in_sync: bool,
    /// Documents per category.
    pub categories: BTreeMap<Category, usize>,
}

/// The RAG orchestrator.
///
/// Construct one via [`RagManager::builder()`]. The manager is `Send +
/// Sync`; share it behind an `Arc` between the ingestion and query paths.
pub struct RagManager {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    chunker: Arc<dyn Chunker>,
    state: RwLock<Arc<State>>,
    writer: Mutex<()>,
}

impl std::fmt::Debug for RagManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagManager")
            .field("config", &self.config)
            .field("model_id", &self.embedding_provider.model_id())
            .finish_non_exhaustive()
    }
}

impl RagManager {
    /// Create a new [`RagManagerBuilder`].
    pub fn builder() -> RagManagerBuilder {
        RagManagerBuilder::default()
    }

    /// Return a reference to the manager configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    async fn current(&self) -> Arc<State> {
        Arc::clone(&*self.state.read().await)
    }

    /// Persist `next` and make it the current state.
    async fn commit(&self, next: State) -> Result<()> {
        let path = self.config.index_path();
        let model_id = self.embedding_provider.model_id();
        persist::write_snapshot(&path, &next.index, &next.store, model_id).inspect_err(|e| {
            error!(path = %path.display(), error = %e, "failed to persist index")
        })?;
        *self.state.write().await = Arc::new(next);
        Ok(())
    }

    fn unavailable(&self, message: impl Into<String>) -> RagError {
        RagError::EmbeddingUnavailable {
            provider: self.embedding_provider.model_id().to_string(),
            message: message.into(),
        }
    }

    /// Embed chunk texts in batches of `embed_batch_size`.
    async fn embed_chunks(&self, document_id: &str, chunks: &[Chunk]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(chunks.len());
        for (batch_index, batch) in chunks.chunks(self.config.embed_batch_size).enumerate() {
            let texts: Vec<&str> = batch.iter().map(|chunk| chunk.text.as_str()).collect();
            let embedded = self.embedding_provider.embed_batch(&texts).await.map_err(|e| match e {
                RagError::EmbeddingUnavailable { .. } => e,
                other => self.unavailable(other.to_string()),
            })?;
            if embedded.len() != batch.len() {
                return Err(self.unavailable(format!(
                    "expected {} embeddings, got {}",
                    batch.len(),
                    embedded.len()
                )));
            }
            debug!(
                document.id = document_id,
                batch = batch_index,
                size = batch.len(),
                "embedded batch"
            );
            vectors.extend(embedded);
        }
        Ok(vectors)
    }

    /// Chunk, embed and insert one document into `state`.
    ///
    /// On error `state` is left exactly as it was.
    async fn apply_ingest(
        &self,
        state: &mut State,
        document: Document,
    ) -> Result<IngestedDocument> {
        if state.store.contains(&document.id) {
            return Err(RagError::DuplicateId(document.id));
        }

        let chunks = self.chunker.chunk(&document);
        let vectors = self.embed_chunks(&document.id, &chunks).await?;

        let mut entry_ids: Vec<EntryId> = Vec::with_capacity(chunks.len());
        for (chunk, vector) in chunks.into_iter().zip(vectors) {
            let metadata =
                EntryMetadata { chunk, title: document.title.clone(), category: document.category };
            match state.index.insert(vector, metadata) {
                Ok(id) => entry_ids.push(id),
                Err(e) => {
                    state.index.remove_many(&entry_ids);
                    return Err(e);
                }
            }
        }

        let document_id = document.id.clone();
        let chunk_count = entry_ids.len();
        if let Err(e) = state.store.add_with_entries(document, entry_ids.clone()) {
            state.index.remove_many(&entry_ids);
            return Err(e);
        }
        Ok(IngestedDocument { document_id, chunk_count, replaced: false })
    }

    /// Ingest one document: chunk → embed (batched) → insert → register → persist.
    ///
    /// A document without an id is given one. All-or-nothing: on any failure
    /// no entry of the document remains in the index and the snapshot on disk
    /// is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Ingestion`] carrying the document id and the cause
    /// ([`RagError::DuplicateId`], [`RagError::EmbeddingUnavailable`],
    /// [`RagError::DimensionMismatch`] or [`RagError::Persistence`]).
    pub async fn ingest(&self, mut document: Document) -> Result<IngestedDocument> {
        let _writer = self.writer.lock().await;
        DocumentStore::ensure_id(&mut document);
        let document_id = document.id.clone();

        let mut next = State::clone(&*self.current().await);
        let outcome = match self.apply_ingest(&mut next, document).await {
            Ok(ingested) => self.commit(next).await.map(|()| ingested),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(ingested) => {
                info!(
                    document.id = %document_id,
                    chunk_count = ingested.chunk_count,
                    "ingested document"
                );
                Ok(ingested)
            }
            Err(e) => {
                error!(document.id = %document_id, error = %e, "ingestion failed");
                Err(e.during_ingestion(&document_id))
            }
        }
    }

    /// Ingest several documents with a single snapshot write.
    ///
    /// A document whose id is already registered is skipped when its title,
    /// category and text are unchanged, and replaced otherwise; `force`
    /// replaces every registered document. Each document is all-or-nothing
    /// and a failure does not stop the batch. An id that repeats within the
    /// batch fails with [`RagError::DuplicateId`]; the first occurrence wins.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Persistence`] if the final snapshot cannot be
    /// written; none of the batch is then applied.
    pub async fn ingest_batch(
        &self,
        documents: impl IntoIterator<Item = Document>,
        force: bool,
    ) -> Result<IngestSummary> {
        let _writer = self.writer.lock().await;
        let mut next = State::clone(&*self.current().await);
        let mut summary = IngestSummary::default();
        let mut seen = HashSet::new();

        for mut document in documents {
            DocumentStore::ensure_id(&mut document);
            let document_id = document.id.clone();

            // Ids are unique within a batch; the first occurrence wins.
            if !seen.insert(document_id.clone()) {
                warn!(document.id = %document_id, "duplicate document id in batch");
                let error = RagError::DuplicateId(document_id.clone());
                summary.failed.push(IngestFailure { document_id, error });
                continue;
            }

            let previous = match next.store.get(&document_id) {
                Some(existing) if !force && same_content(existing, &document) => {
                    debug!(document.id = %document_id, "document unchanged");
                    summary.unchanged.push(document_id);
                    continue;
                }
                Some(_) => Some(remove_from(&mut next, &document_id)?),
                None => None,
            };

            match self.apply_ingest(&mut next, document).await {
                Ok(mut ingested) => {
                    ingested.replaced = previous.is_some();
                    info!(
                        document.id = %document_id,
                        chunk_count = ingested.chunk_count,
                        replaced = ingested.replaced,
                        "ingested document"
                    );
                    summary.ingested.push(ingested);
                }
                Err(e) => {
                    error!(document.id = %document_id, error = %e, "ingestion failed");
                    if let Some((record, entries)) = previous {
                        next.index.restore(entries);
                        next.store.add_with_entries(record.document, record.entry_ids)?;
                    }
                    summary.failed.push(IngestFailure { document_id, error: e });
                }
            }
        }

        if summary.changed() {
            self.commit(next).await?;
        }
        info!(
            ingested = summary.ingested.len(),
            unchanged = summary.unchanged.len(),
            failed = summary.failed.len(),
            chunk_count = summary.chunk_count(),
            "batch ingestion finished"
        );
        Ok(summary)
    }

    /// Load every document below the configured documents directory and
    /// ingest them with [`ingest_batch`](Self::ingest_batch).
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed or the snapshot
    /// cannot be written.
    pub async fn ingest_directory(&self, force: bool) -> Result<IngestSummary> {
        let dir = &self.config.documents_dir;
        let documents = load_documents(dir)?;
        info!(dir = %dir.display(), document_count = documents.len(), force, "indexing documents");
        self.ingest_batch(documents, force).await
    }

    /// Ingest raw text as a new document with a generated id.
    ///
    /// The title defaults to the first Markdown heading of `text`, then to
    /// [`DEFAULT_TEXT_TITLE`].
    ///
    /// # Errors
    ///
    /// Same as [`ingest`](Self::ingest).
    pub async fn add_text(
        &self,
        text: &str,
        title: Option<&str>,
        category: Category,
    ) -> Result<IngestedDocument> {
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .or_else(|| first_heading(text))
            .unwrap_or_else(|| DEFAULT_TEXT_TITLE.to_string());
        self.ingest(Document::new("", title, text.trim(), category)).await
    }

    /// Remove a document and every index entry computed from it, then persist.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::NotFound`] if the document is not registered, or
    /// [`RagError::Persistence`] if the snapshot cannot be written (the
    /// document then stays).
    pub async fn remove(&self, id: &str) -> Result<Document> {
        let _writer = self.writer.lock().await;
        let mut next = State::clone(&*self.current().await);
        let (record, entries) = remove_from(&mut next, id)?;
        self.commit(next).await?;
        info!(document.id = id, entry_count = entries.len(), "removed document");
        Ok(record.document)
    }

    /// Rebuild the index from scratch from the registered documents.
    ///
    /// Every document is re-chunked and re-embedded with the current
    /// provider and chunking settings. All-or-nothing: if any document fails
    /// the previous index stays in place.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Ingestion`] for the first document that fails, or
    /// [`RagError::Persistence`] if the snapshot cannot be written.
    pub async fn reindex(&self) -> Result<ReindexReport> {
        let _writer = self.writer.lock().await;
        let current = self.current().await;
        let mut next = State::empty(self.embedding_provider.dimensions());

        for document in current.store.list() {
            self.apply_ingest(&mut next, document.clone()).await.map_err(|e| {
                error!(document.id = %document.id, error = %e, "reindex failed");
                e.during_ingestion(&document.id)
            })?;
        }

        let report =
            ReindexReport { document_count: next.store.len(), entry_count: next.index.len() };
        self.commit(next).await?;
        info!(
            document_count = report.document_count,
            entry_count = report.entry_count,
            "reindexed documents"
        );
        Ok(report)
    }

    /// Drop every document and entry and delete the snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Io`] if the snapshot exists but cannot be deleted.
    pub async fn clear(&self) -> Result<()> {
        let _writer = self.writer.lock().await;
        let path = self.config.index_path();
        let removed = persist::remove_snapshot(&path)?;
        *self.state.write().await = Arc::new(State::empty(self.embedding_provider.dimensions()));
        info!(path = %path.display(), snapshot_removed = removed, "cleared index");
        Ok(())
    }

    /// Embed `text`, search the index and map the hits back to documents.
    ///
    /// Unlike [`query`](Self::query) this surfaces errors and applies no
    /// timeout. Results below the configured `similarity_threshold` are
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingUnavailable`] or
    /// [`RagError::DimensionMismatch`].
    pub async fn try_query(&self, text: &str, k: usize) -> Result<Vec<QueryResult>> {
        let state = self.current().await;
        if state.index.is_empty() || k == 0 || text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedding_provider.embed(text).await.map_err(|e| match e {
            RagError::EmbeddingUnavailable { .. } => e,
            other => self.unavailable(other.to_string()),
        })?;
        let neighbors = state.index.search(&query_embedding, k)?;

        let threshold = self.config.similarity_threshold;
        let results: Vec<QueryResult> = neighbors
            .into_iter()
            .map(|neighbor| {
                let score = neighbor.similarity();
                let metadata = neighbor.metadata;
                let title = state
                    .store
                    .get(&metadata.chunk.document_id)
                    .map_or(metadata.title, |document| document.title.clone());
                QueryResult {
                    chunk_text: metadata.chunk.text,
                    title,
                    score,
                    document_id: metadata.chunk.document_id,
                    category: metadata.category,
                }
            })
            .filter(|result| result.score >= threshold)
            .collect();

        debug!(result_count = results.len(), k, "query completed");
        Ok(results)
    }

    /// Return up to `k` chunks relevant to `text`, most similar first.
    ///
    /// Never fails: an empty or unreadable index, a failing embedder or a
    /// call exceeding the configured `query_timeout` all yield an empty
    /// result. Disabled retrieval also yields an empty result.
    pub async fn query(&self, text: &str, k: usize) -> Vec<QueryResult> {
        self.query_with_timeout(text, k, self.config.query_timeout).await
    }

    /// [`query`](Self::query) with an explicit time limit.
    pub async fn query_with_timeout(
        &self,
        text: &str,
        k: usize,
        limit: Duration,
    ) -> Vec<QueryResult> {
        if !self.config.enabled {
            return Vec::new();
        }
        match tokio::time::timeout(limit, self.try_query(text, k)).await {
            Ok(Ok(results)) => results,
            Ok(Err(e)) => {
                warn!(error = %e, "query failed, continuing without retrieved context");
                Vec::new()
            }
            Err(_) => {
                warn!(
                    timeout_ms = limit.as_millis() as u64,
                    "query timed out, continuing without retrieved context"
                );
                Vec::new()
            }
        }
    }

    /// [`query`](Self::query) with the text prefixed by the category name,
    /// which steers lexical and semantic embedders towards that topic.
    /// General queries are passed through unchanged.
    pub async fn query_in_category(
        &self,
        text: &str,
        category: Category,
        k: usize,
    ) -> Vec<QueryResult> {
        match category {
            Category::General => self.query(text, k).await,
            other => self.query(&format!("{other}: {text}"), k).await,
        }
    }

    /// Query with the configured `top_k` and render the results with
    /// [`build_context`], bounded by `max_context_length`.
    ///
    /// Returns an empty string when nothing relevant was found.
    pub async fn context_for_query(&self, text: &str, category: Category) -> String {
        let results = self.query_in_category(text, category, self.config.top_k).await;
        if results.is_empty() {
            debug!("no relevant documents for query");
            return String::new();
        }
        build_context(&results, self.config.max_context_length)
    }

    /// All registered documents in insertion order.
    pub async fn documents(&self) -> Vec<Document> {
        self.current().await.store.list().cloned().collect()
    }

    /// Registered documents of one category, in insertion order.
    pub async fn documents_in_category(&self, category: Category) -> Vec<Document> {
        self.current().await.store.by_category(category).cloned().collect()
    }

    /// Number of documents per category.
    pub async fn category_counts(&self) -> BTreeMap<Category, usize> {
        self.current().await.store.category_counts()
    }

    /// Look up one document.
    pub async fn document(&self, id: &str) -> Option<Document> {
        self.current().await.store.get(id).cloned()
    }

    /// Report counts, dimension and whether the snapshot on disk matches.
    pub async fn status(&self) -> RagStatus {
        let state = self.current().await;
        let index_path = self.config.index_path();
        let model_id = self.embedding_provider.model_id().to_string();

        let (on_disk, disk_error) = match persist::read_header(&index_path) {
            Ok(header) => (Some(header), None),
            Err(RagError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => (None, None),
            Err(e) => (None, Some(e.to_string())),
        };

        let in_sync = disk_error.is_none()
            && match &on_disk {
                Some(header) => {
                    header.entry_count == state.index.len() as u64
                        && header.document_count == state.store.len() as u64
                        && header.dimension == state.index.dimension()
                        && header.next_id == state.index.next_id()
                        && header.model_id == model_id
                }
                None => state.store.is_empty() && state.index.is_empty(),
            };

        RagStatus {
            enabled: self.config.enabled,
            document_count: state.store.len(),
            entry_count: state.index.len(),
            dimension: state.index.dimension(),
            model_id,
            index_path,
            on_disk,
            disk_error,
            in_sync,
            categories: state.store.category_counts(),
        }
    }
}

fn same_content(existing: &Document, candidate: &Document) -> bool {
    existing.title == candidate.title
        && existing.category == candidate.category
        && existing.text == candidate.text
}

/// Unregister `id` and cascade to its index entries.
fn remove_from(
    state: &mut State,
    id: &str,
) -> Result<(DocumentRecord, Vec<crate::index::IndexEntry>)> {
    let record = state.store.remove(id)?;
    let entries = state.index.take_many(&record.entry_ids);
    Ok((record, entries))
}

/// Builder for constructing a [`RagManager`].
///
/// `config` and `embedding_provider` are required. The chunker defaults to
/// a [`FixedSizeChunker`] built from the configuration.
///
/// [`build()`](RagManagerBuilder::build) loads the snapshot at
/// [`RagConfig::index_path`] when one exists. A snapshot that cannot be
/// decoded is logged and ignored; the manager then starts empty and
/// [`RagManager::status`] reports it out of sync until the next write.
#[derive(Default)]
pub struct RagManagerBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    chunker: Option<Arc<dyn Chunker>>,
}

impl RagManagerBuilder {
    /// Set the manager configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Override the chunking strategy.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Build the [`RagManager`], loading the persisted snapshot if present.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfiguration`] if a required field is
    /// missing or the chunking parameters are invalid.
    pub fn build(self) -> Result<RagManager> {
        let config = self
            .config
            .ok_or_else(|| RagError::InvalidConfiguration("config is required".to_string()))?;
        let embedding_provider = self.embedding_provider.ok_or_else(|| {
            RagError::InvalidConfiguration("embedding_provider is required".to_string())
        })?;
        let chunker: Arc<dyn Chunker> = match self.chunker {
            Some(chunker) => chunker,
            None => Arc::new(FixedSizeChunker::new(config.chunk_size, config.chunk_overlap)?),
        };

        let state = load_state(&config, embedding_provider.as_ref());
        Ok(RagManager {
            config,
            embedding_provider,
            chunker,
            state: RwLock::new(Arc::new(state)),
            writer: Mutex::new(()),
        })
    }
}

fn load_state(config: &RagConfig, provider: &dyn EmbeddingProvider) -> State {
    let path = config.index_path();
    match persist::read_snapshot(&path) {
        Ok(snapshot) => {
            let header = &snapshot.header;
            if header.model_id != provider.model_id()
                || header.dimension.is_some_and(|d| d != provider.dimensions())
            {
                warn!(
                    path = %path.display(),
                    stored_model = %header.model_id,
                    configured_model = provider.model_id(),
                    "index was built with a different embedding model, run reindex"
                );
            }
            info!(
                path = %path.display(),
                document_count = snapshot.store.len(),
                entry_count = snapshot.index.len(),
                "loaded index"
            );
            State { index: snapshot.index, store: snapshot.store }
        }
        Err(RagError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no index snapshot, starting empty");
            State::empty(provider.dimensions())
        }
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "ignoring unusable index snapshot, starting empty"
            );
            State::empty(provider.dimensions())
        }
    }
}
