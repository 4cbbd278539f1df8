//! Retrieval-augmented generation core for the Serene support assistant.
//!
//! This crate provides:
//! - Overlapping fixed-size chunking of source documents
//! - An [`EmbeddingProvider`] seam with an offline [`HashingEmbedder`] and,
//!   behind the `openai` feature, an OpenAI-compatible HTTP provider
//! - An exact cosine [`VectorIndex`] with deterministic tie-breaking
//! - A [`DocumentStore`] and a crash-safe on-disk snapshot of both
//! - The [`RagManager`] running ingestion, queries, removal, reindexing and
//!   status reporting over them
//! - Directory loading with YAML front matter and a bundled example corpus
//!
//! Queries never fail: an empty index, an unreachable embedder or a timeout
//! yields an empty result, so retrieval stays an enrichment for the caller.

pub mod chunking;
pub mod config;
pub mod context;
pub mod corpus;
pub mod document;
pub mod embedding;
pub mod error;
pub mod index;
pub mod loader;
pub mod manager;
pub mod persist;
pub mod store;

#[cfg(feature = "openai")]
pub mod openai;

pub use chunking::{ChunkSpans, Chunker, FixedSizeChunker, Span};
pub use config::{INDEX_FILE_NAME, RagConfig, RagConfigBuilder};
pub use context::build_context;
pub use corpus::{CorpusReport, EXAMPLE_DOCUMENTS, ExampleDocument, write_example_corpus};
pub use document::{Category, Chunk, Document, QueryResult};
pub use embedding::{EmbeddingProvider, HashingEmbedder};
pub use error::{RagError, Result};
pub use index::{DistanceMetric, EntryId, EntryMetadata, IndexEntry, Neighbor, VectorIndex};
pub use loader::{discover_document_files, load_documents};
pub use manager::{
    IngestFailure, IngestSummary, IngestedDocument, RagManager, RagManagerBuilder, RagStatus,
    ReindexReport,
};
pub use persist::{FORMAT_VERSION, IndexHeader, Snapshot};
pub use store::{DocumentRecord, DocumentStore};

#[cfg(feature = "openai")]
pub use openai::OpenAiEmbeddingProvider;
