//! # Quickstart
//!
//! Builds a manager over a temporary directory with the offline
//! `HashingEmbedder`, indexes the bundled example corpus, runs a few queries
//! and prints the context that would be handed to the chat model.
//!
//! Needs no API keys or model server.
//!
//! Run: `cargo run -p serene-demos --bin quickstart`

use std::sync::Arc;

use serene_rag::{Category, HashingEmbedder, RagConfig, RagManager, write_example_corpus};
use serene_safety::{KeywordSet, SafetyScreen, Screening};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    serene_telemetry::init_telemetry("warn")?;

    let temp = tempfile::tempdir()?;
    let config = RagConfig::builder()
        .documents_dir(temp.path().join("documents"))
        .index_dir(temp.path().join("index"))
        .chunk_size(400)
        .chunk_overlap(80)
        .top_k(2)
        .max_context_length(900)
        .build()?;

    // The corpus lands in documents_dir with YAML front matter.
    let corpus = write_example_corpus(&config.documents_dir, false)?;
    println!("Wrote {} example documents", corpus.created.len());

    let manager = RagManager::builder()
        .config(config)
        .embedding_provider(Arc::new(HashingEmbedder::new(256)))
        .build()?;

    let summary = manager.ingest_directory(false).await?;
    for doc in &summary.ingested {
        println!("  {} -> {} chunk(s)", doc.document_id, doc.chunk_count);
    }

    let screen = SafetyScreen::new(&KeywordSet::default())?;
    let messages = [
        ("How can I calm down with breathing exercises?", Category::Anxiety),
        ("I keep comparing myself to others", Category::SelfEsteem),
        ("Work deadlines are overwhelming me", Category::Stress),
    ];

    for (message, category) in messages {
        println!("\nMessage: \"{message}\"");
        if let Screening::Crisis(signal) = screen.screen(message) {
            println!("  crisis phrases found: {}", signal.matched.join(", "));
            continue;
        }

        let results = manager.query_in_category(message, category, 2).await;
        for (i, result) in results.iter().enumerate() {
            println!(
                "  {}. [score={:.4}] {} ({})",
                i + 1,
                result.score,
                result.title,
                result.category
            );
        }

        let context = manager.context_for_query(message, category).await;
        if context.is_empty() {
            println!("  (no context)");
        } else {
            println!("\n{context}");
        }
    }

    let status = manager.status().await;
    println!(
        "\n{} documents, {} entries, snapshot {}",
        status.document_count,
        status.entry_count,
        if status.in_sync { "in sync" } else { "out of sync" }
    );
    Ok(())
}
