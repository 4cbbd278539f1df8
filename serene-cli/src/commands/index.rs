use std::io::Write;

use serde_json::json;
use serene_rag::Category;

use super::write_json;
use crate::runtime::Runtime;

/// Run the `serene index` command.
///
/// Fails after printing the summary if any document could not be indexed;
/// the documents that did succeed stay indexed.
pub async fn run_index(
    runtime: &Runtime,
    force: bool,
    json: bool,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let manager = runtime.manager()?;
    let summary = manager.ingest_directory(force).await?;

    if json {
        let failed: Vec<_> = summary
            .failed
            .iter()
            .map(|f| json!({ "document_id": f.document_id, "error": f.error.to_string() }))
            .collect();
        write_json(
            out,
            &json!({
                "ingested": summary.ingested,
                "unchanged": summary.unchanged,
                "failed": failed,
            }),
        )?;
    } else {
        for doc in &summary.ingested {
            let verb = if doc.replaced { "updated" } else { "indexed" };
            writeln!(out, "{verb} {} ({} chunks)", doc.document_id, doc.chunk_count)?;
        }
        for failure in &summary.failed {
            writeln!(out, "failed  {}: {}", failure.document_id, failure.error)?;
        }
        writeln!(
            out,
            "Indexed {} documents ({} chunks), {} unchanged, {} failed.",
            summary.ingested.len(),
            summary.chunk_count(),
            summary.unchanged.len(),
            summary.failed.len()
        )?;
    }

    if !summary.failed.is_empty() {
        anyhow::bail!("{} document(s) could not be indexed", summary.failed.len());
    }
    Ok(())
}

/// Run the `serene reindex` command.
pub async fn run_reindex(runtime: &Runtime, json: bool, out: &mut dyn Write) -> anyhow::Result<()> {
    let report = runtime.manager()?.reindex().await?;
    if json {
        write_json(out, &report)?;
    } else {
        writeln!(
            out,
            "Reindexed {} documents ({} entries).",
            report.document_count, report.entry_count
        )?;
    }
    Ok(())
}

/// Run the `serene add` command.
pub async fn run_add(
    runtime: &Runtime,
    text: &str,
    title: Option<&str>,
    category: Category,
    json: bool,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let added = runtime.manager()?.add_text(text, title, category).await?;
    if json {
        write_json(out, &added)?;
    } else {
        writeln!(out, "Added document {} ({} chunks).", added.document_id, added.chunk_count)?;
    }
    Ok(())
}

/// Run the `serene remove` command.
pub async fn run_remove(
    runtime: &Runtime,
    id: &str,
    json: bool,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let removed = runtime.manager()?.remove(id).await?;
    if json {
        write_json(out, &json!({ "id": removed.id, "title": removed.title }))?;
    } else {
        writeln!(out, "Removed document {} ({}).", removed.id, removed.title)?;
    }
    Ok(())
}

/// Run the `serene clean` command.
pub async fn run_clean(runtime: &Runtime, json: bool, out: &mut dyn Write) -> anyhow::Result<()> {
    runtime.manager()?.clear().await?;
    if json {
        write_json(out, &json!({ "cleared": true }))?;
    } else {
        writeln!(out, "Index cleared.")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::test_util::TestDirs;

    #[tokio::test]
    async fn index_then_index_again_skips_unchanged() {
        let dirs = TestDirs::new();
        dirs.run(&["create-examples"]).await.unwrap();

        let first = dirs.run(&["index"]).await.unwrap();
        assert!(first.contains("indexed breathing-techniques ("));
        assert!(
            first.ends_with("Indexed 3 documents (6 chunks), 0 unchanged, 0 failed.\n"),
            "{first}"
        );

        let second = dirs.run(&["index"]).await.unwrap();
        assert_eq!(second, "Indexed 0 documents (0 chunks), 3 unchanged, 0 failed.\n");

        let forced = dirs.run(&["index", "--force"]).await.unwrap();
        assert!(forced.contains("updated self-esteem-exercises ("));
        assert!(forced.contains("Indexed 3 documents"));
    }

    #[tokio::test]
    async fn add_then_remove() {
        let dirs = TestDirs::new();
        let added = dirs
            .run(&["add", "# Grounding\n\nName five things you can see.", "--category", "anxiety"])
            .await
            .unwrap();
        assert!(added.starts_with("Added document "));
        assert!(added.ends_with(" (1 chunks).\n"));

        let id = added
            .trim_start_matches("Added document ")
            .split(' ')
            .next()
            .unwrap()
            .to_string();
        let listed = dirs.run(&["list-docs"]).await.unwrap();
        assert!(listed.contains(&format!("{id}  [Anxiety]  Grounding")));

        let removed = dirs.run(&["remove", &id]).await.unwrap();
        assert_eq!(removed, format!("Removed document {id} (Grounding).\n"));
    }

    #[tokio::test]
    async fn removing_unknown_document_fails() {
        let dirs = TestDirs::new();
        let err = dirs.run(&["remove", "ghost"]).await.unwrap_err();
        assert!(err.to_string().contains("'ghost' not found"));
    }

    #[tokio::test]
    async fn clean_and_reindex() {
        let dirs = TestDirs::new();
        dirs.run(&["create-examples"]).await.unwrap();
        dirs.run(&["index"]).await.unwrap();

        assert_eq!(
            dirs.run(&["reindex"]).await.unwrap(),
            "Reindexed 3 documents (6 entries).\n"
        );
        assert_eq!(dirs.run(&["clean"]).await.unwrap(), "Index cleared.\n");
        assert_eq!(dirs.run(&["list-docs"]).await.unwrap(), "No documents indexed.\n");
    }
}
