use std::io::Write;

use serde_json::json;
use serene_rag::{Category, RagStatus};

use super::write_json;
use crate::runtime::Runtime;

const SNIPPET_CHARS: usize = 160;

/// Run the `serene status` command.
pub async fn run_status(runtime: &Runtime, json: bool, out: &mut dyn Write) -> anyhow::Result<()> {
    let status = runtime.manager()?.status().await;
    if json {
        return write_json(out, &status);
    }

    writeln!(out, "Retrieval:   {}", if status.enabled { "enabled" } else { "disabled" })?;
    writeln!(out, "Documents:   {}", status.document_count)?;
    writeln!(out, "Entries:     {}", status.entry_count)?;
    match status.dimension {
        Some(dimension) => writeln!(out, "Dimension:   {dimension}")?,
        None => writeln!(out, "Dimension:   -")?,
    }
    writeln!(out, "Model:       {}", status.model_id)?;
    writeln!(out, "Index file:  {}", status.index_path.display())?;
    writeln!(out, "Snapshot:    {}", snapshot_state(&status))?;
    if !status.categories.is_empty() {
        writeln!(out, "Categories:")?;
        for (category, count) in &status.categories {
            writeln!(out, "  {category}: {count}")?;
        }
    }
    Ok(())
}

fn snapshot_state(status: &RagStatus) -> String {
    match (&status.disk_error, &status.on_disk) {
        (Some(error), _) => format!("unreadable ({error})"),
        (None, None) if status.in_sync => "not written yet".to_string(),
        (None, None) => "missing".to_string(),
        (None, Some(header)) if header.model_id != status.model_id => {
            format!("built with {}, run `serene reindex`", header.model_id)
        }
        (None, Some(_)) if status.in_sync => "in sync".to_string(),
        (None, Some(_)) => "out of sync".to_string(),
    }
}

/// Run the `serene search` command.
pub async fn run_search(
    runtime: &Runtime,
    query: &str,
    category: Option<Category>,
    k: Option<usize>,
    json: bool,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let manager = runtime.manager()?;
    let k = k.unwrap_or(runtime.config.top_k);
    let results =
        manager.query_in_category(query, category.unwrap_or(Category::General), k).await;

    if json {
        return write_json(out, &results);
    }
    if results.is_empty() {
        writeln!(out, "No relevant documents found.")?;
        return Ok(());
    }
    for (rank, result) in results.iter().enumerate() {
        writeln!(
            out,
            "{}. {} [{}] score {:.3} ({})",
            rank + 1,
            result.title,
            result.category,
            result.score,
            result.document_id
        )?;
        writeln!(out, "   {}", snippet(&result.chunk_text))?;
    }
    Ok(())
}

/// First characters of `text` on one line.
fn snippet(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= SNIPPET_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(SNIPPET_CHARS).collect();
    format!("{}...", cut.trim_end())
}

/// Run the `serene list-docs` command.
pub async fn run_list_docs(
    runtime: &Runtime,
    category: Option<Category>,
    json: bool,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let manager = runtime.manager()?;
    let documents = match category {
        Some(category) => manager.documents_in_category(category).await,
        None => manager.documents().await,
    };

    if json {
        let listed: Vec<_> = documents
            .iter()
            .map(|d| {
                json!({
                    "id": d.id,
                    "title": d.title,
                    "category": d.category,
                    "source_path": d.source_path,
                    "created_at": d.created_at,
                })
            })
            .collect();
        return write_json(out, &listed);
    }
    if documents.is_empty() {
        writeln!(out, "No documents indexed.")?;
        return Ok(());
    }
    for doc in &documents {
        writeln!(out, "{}  [{}]  {}", doc.id, doc.category, doc.title)?;
    }
    Ok(())
}
