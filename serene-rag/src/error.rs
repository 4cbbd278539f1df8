//! Error types for the `serene-rag` crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in RAG operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// Chunking, index or manager parameters are inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A vector's length disagrees with the dimension of the index.
    #[error("Dimension mismatch: index expects {expected}, got {actual}")]
    DimensionMismatch {
        /// The dimension fixed for the index.
        expected: usize,
        /// The length of the offending vector.
        actual: usize,
    },

    /// A document with the same identifier is already registered.
    #[error("Document '{0}' already exists")]
    DuplicateId(String),

    /// A document or index entry does not exist.
    #[error("{kind} '{id}' not found")]
    NotFound {
        /// What was looked up (`document`, `index entry`, ...).
        kind: &'static str,
        /// The identifier that was looked up.
        id: String,
    },

    /// A persisted snapshot is truncated or internally inconsistent.
    #[error("Corrupt index: {0}")]
    CorruptIndex(String),

    /// A persisted snapshot was written by an incompatible format version.
    #[error("Index format version {found} is not supported (expected {expected})")]
    VersionMismatch {
        /// The format version this build reads and writes.
        expected: u32,
        /// The format version found in the file.
        found: u32,
    },

    /// The embedding backend failed or timed out.
    #[error("Embedding unavailable ({provider}): {message}")]
    EmbeddingUnavailable {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A source file could not be turned into a document.
    #[error("Invalid document {}: {message}", path.display())]
    InvalidDocument {
        /// The offending file.
        path: PathBuf,
        /// A description of the failure.
        message: String,
    },

    /// Ingestion of one document failed; nothing of it was kept.
    #[error("Ingestion of document '{document_id}' failed: {source}")]
    Ingestion {
        /// The document that was being ingested.
        document_id: String,
        /// The underlying failure.
        #[source]
        source: Box<RagError>,
    },

    /// Writing the snapshot to disk failed. The previous snapshot is intact.
    #[error("Failed to persist index to {}: {message}", path.display())]
    Persistence {
        /// The snapshot path.
        path: PathBuf,
        /// A description of the failure.
        message: String,
    },

    /// An I/O error outside of snapshot writing.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RagError {
    /// Shorthand for a missing document.
    pub fn document_not_found(id: impl Into<String>) -> Self {
        Self::NotFound { kind: "document", id: id.into() }
    }

    /// Wrap `self` with the id of the document whose ingestion it aborted.
    pub fn during_ingestion(self, document_id: impl Into<String>) -> Self {
        match self {
            // Already attributed.
            err @ Self::Ingestion { .. } => err,
            other => Self::Ingestion { document_id: document_id.into(), source: Box::new(other) },
        }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
