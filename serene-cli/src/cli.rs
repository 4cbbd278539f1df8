use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serene_rag::Category;

#[derive(Parser, Debug)]
#[command(name = "serene", version, about = "Manage the Serene document index")]
pub struct Cli {
    /// Directory scanned by `index` and written by `create-examples`.
    /// Overrides `RAG_DOCUMENTS_DIR`.
    #[arg(long, global = true, value_name = "DIR")]
    pub documents_dir: Option<PathBuf>,

    /// Directory holding the index snapshot. Overrides `RAG_INDEX_DIR`.
    #[arg(long, global = true, value_name = "DIR")]
    pub index_dir: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Print command results as JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Embedding provider used to index and query.
    #[arg(long, global = true, value_enum, default_value_t = EmbedderKind::Hashing)]
    pub embedder: EmbedderKind,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmbedderKind {
    /// Offline feature hashing. Needs no model server.
    Hashing,
    /// An OpenAI-compatible `/embeddings` endpoint.
    #[cfg(feature = "openai")]
    Openai,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show document and entry counts and whether the snapshot is in sync.
    Status,

    /// Index the documents directory. Unchanged documents are skipped.
    Index {
        /// Re-embed every document even if its content is unchanged.
        #[arg(long)]
        force: bool,
    },

    /// Rebuild the whole index with the current embedder and chunk settings.
    Reindex,

    /// Search the index.
    Search {
        /// Text to search for.
        query: String,
        /// Steer the search towards one category.
        #[arg(short, long)]
        category: Option<Category>,
        /// Number of results to return. Defaults to `RAG_SEARCH_K`.
        #[arg(short, long)]
        k: Option<usize>,
    },

    /// Add a piece of text as a new document.
    Add {
        /// Document body.
        text: String,
        /// Document title. Defaults to the first heading of the text.
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long, default_value_t = Category::General)]
        category: Category,
    },

    /// Remove a document and its index entries.
    Remove {
        /// Document id, as shown by `list-docs`.
        id: String,
    },

    /// Write the bundled example documents into the documents directory.
    CreateExamples {
        /// Replace files that already exist.
        #[arg(long)]
        overwrite: bool,
    },

    /// List indexed documents.
    ListDocs {
        /// Only list documents of this category.
        #[arg(short, long)]
        category: Option<Category>,
    },

    /// Drop every document and delete the snapshot.
    Clean,

    /// Run the safety screen over a message.
    Screen {
        /// Message to screen.
        message: String,
        /// JSON keyword file replacing the default phrase lists.
        #[arg(long, value_name = "FILE")]
        keywords: Option<PathBuf>,
    },
}
