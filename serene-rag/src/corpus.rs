//! Bundled example documents.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::Result;
use crate::persist::write_atomically;

/// A bundled document: its file name and Markdown source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExampleDocument {
    /// File name written below the documents directory.
    pub file_name: &'static str,
    /// Markdown source, including front matter.
    pub content: &'static str,
}

/// The example corpus shipped with the crate.
pub const EXAMPLE_DOCUMENTS: &[ExampleDocument] = &[
    ExampleDocument {
        file_name: "breathing_techniques.md",
        content: include_str!("../corpus/breathing_techniques.md"),
    },
    ExampleDocument {
        file_name: "stress_management_techniques.md",
        content: include_str!("../corpus/stress_management_techniques.md"),
    },
    ExampleDocument {
        file_name: "self_esteem_exercises.md",
        content: include_str!("../corpus/self_esteem_exercises.md"),
    },
];

/// Outcome of [`write_example_corpus`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorpusReport {
    /// Files written.
    pub created: Vec<PathBuf>,
    /// Files left alone because they already existed.
    pub skipped: Vec<PathBuf>,
}

/// Write the example corpus into `dir`, creating it if needed.
///
/// Existing files are kept unless `overwrite` is set.
pub fn write_example_corpus(dir: impl AsRef<Path>, overwrite: bool) -> Result<CorpusReport> {
    let dir = dir.as_ref();
    let mut report = CorpusReport::default();
    for example in EXAMPLE_DOCUMENTS {
        let path = dir.join(example.file_name);
        if path.exists() && !overwrite {
            report.skipped.push(path);
            continue;
        }
        write_atomically(&path, example.content.as_bytes())?;
        report.created.push(path);
    }
    info!(
        dir = %dir.display(),
        created = report.created.len(),
        skipped = report.skipped.len(),
        "wrote example corpus"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Category;
    use crate::loader::load_documents;

    #[test]
    fn writes_then_skips_existing_files() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("documents");

        let first = write_example_corpus(&dir, false).unwrap();
        assert_eq!(first.created.len(), EXAMPLE_DOCUMENTS.len());
        assert!(first.skipped.is_empty());

        let second = write_example_corpus(&dir, false).unwrap();
        assert!(second.created.is_empty());
        assert_eq!(second.skipped.len(), EXAMPLE_DOCUMENTS.len());

        let forced = write_example_corpus(&dir, true).unwrap();
        assert_eq!(forced.created.len(), EXAMPLE_DOCUMENTS.len());
    }

    #[test]
    fn bundled_documents_load_with_categories() {
        let temp = tempfile::tempdir().unwrap();
        write_example_corpus(temp.path(), false).unwrap();

        let docs = load_documents(temp.path()).unwrap();
        let summary: Vec<(&str, Category)> =
            docs.iter().map(|d| (d.id.as_str(), d.category)).collect();
        assert_eq!(
            summary,
            vec![
                ("breathing-techniques", Category::Anxiety),
                ("self-esteem-exercises", Category::SelfEsteem),
                ("stress-management-techniques", Category::Stress),
            ]
        );
        assert_eq!(docs[0].title, "Breathing Techniques for Anxiety");
        assert!(docs[0].text.starts_with("# Breathing Techniques"));
    }
}
