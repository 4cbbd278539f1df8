use std::io::Write;

use serde_json::json;
use serene_rag::write_example_corpus;

use super::write_json;
use crate::runtime::Runtime;

/// Run the `serene create-examples` command.
pub fn run_create_examples(
    runtime: &Runtime,
    overwrite: bool,
    json: bool,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let dir = &runtime.config.documents_dir;
    let report = write_example_corpus(dir, overwrite)?;

    if json {
        return write_json(out, &json!({ "created": report.created, "skipped": report.skipped }));
    }
    for path in &report.created {
        writeln!(out, "created {}", path.display())?;
    }
    for path in &report.skipped {
        writeln!(out, "skipped {} (exists, use --overwrite to replace)", path.display())?;
    }
    writeln!(
        out,
        "Wrote {} example documents to {}. Run `serene index` to index them.",
        report.created.len(),
        dir.display()
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::test_util::TestDirs;

    #[tokio::test]
    async fn existing_files_are_kept_unless_overwritten() {
        let dirs = TestDirs::new();

        let first = dirs.run(&["create-examples"]).await.unwrap();
        assert_eq!(first.lines().filter(|l| l.starts_with("created ")).count(), 3);
        assert!(dirs.documents.join("breathing_techniques.md").is_file());

        let second = dirs.run(&["create-examples"]).await.unwrap();
        assert_eq!(second.lines().filter(|l| l.starts_with("skipped ")).count(), 3);
        assert!(second.contains("Wrote 0 example documents"));

        let third = dirs.run(&["create-examples", "--overwrite"]).await.unwrap();
        assert!(third.contains("Wrote 3 example documents"));
    }
}
