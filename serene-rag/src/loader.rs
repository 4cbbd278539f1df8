//! Loading source documents from a directory tree.
//!
//! Every non-blank `.md` / `.txt` file below the root becomes one
//! [`Document`]. A file may start with YAML front matter:
//!
//! ```text
//! ---
//! id: box-breathing
//! title: Box Breathing
//! category: Anxiety
//! ---
//! # Box Breathing
//! ...
//! ```
//!
//! Missing fields are inferred: the title from the first Markdown heading
//! (else the file stem), the category from the first directory below the
//! root that names one (else General), and the id from the relative path.

use std::fs;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::document::{Category, Document};
use crate::error::{RagError, Result};

/// File extensions picked up by [`load_documents`].
pub const SUPPORTED_EXTENSIONS: &[&str] = &["md", "txt"];

#[derive(Debug, Default, Deserialize)]
struct FrontMatter {
    id: Option<String>,
    title: Option<String>,
    category: Option<String>,
}

/// List supported files below `root`, sorted by path.
///
/// A missing root yields an empty list.
pub fn discover_document_files(root: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let root = root.as_ref();
    if !root.exists() {
        return Ok(Vec::new());
    }
    if !root.is_dir() {
        return Err(RagError::InvalidDocument {
            path: root.to_path_buf(),
            message: "documents root is not a directory".to_string(),
        });
    }

    let mut files = WalkDir::new(root)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext))
        })
        .map(|entry| entry.into_path())
        .collect::<Vec<_>>();

    files.sort();
    Ok(files)
}

/// Load every supported, non-blank file below `root`.
///
/// Unreadable or malformed files are logged and skipped so one bad file does
/// not block the rest of the corpus.
pub fn load_documents(root: impl AsRef<Path>) -> Result<Vec<Document>> {
    let root = root.as_ref();
    let mut documents = Vec::new();
    for path in discover_document_files(root)? {
        match load_document(root, &path) {
            Ok(Some(document)) => {
                debug!(document.id = %document.id, path = %path.display(), "loaded document");
                documents.push(document);
            }
            Ok(None) => debug!(path = %path.display(), "skipping blank file"),
            Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable document"),
        }
    }
    Ok(documents)
}

/// Load one file. Returns `Ok(None)` for blank files.
pub fn load_document(root: &Path, path: &Path) -> Result<Option<Document>> {
    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(None);
    }

    let created_at = fs::metadata(path)
        .and_then(|meta| meta.modified())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now());

    parse_document(root, path, &content).map(|mut document| {
        document.created_at = created_at;
        Some(document)
    })
}

/// Build a document from file contents. `root` is used for id and category
/// inference only; nothing is read from disk.
pub fn parse_document(root: &Path, path: &Path, content: &str) -> Result<Document> {
    let normalized = content.replace("\r\n", "\n");
    let (front_matter, body) = split_front_matter(path, &normalized)?;
    let relative = path.strip_prefix(root).unwrap_or(path);

    let category = match front_matter.category.as_deref() {
        Some(raw) => raw.parse().map_err(|_| RagError::InvalidDocument {
            path: path.to_path_buf(),
            message: format!("unknown category '{raw}'"),
        })?,
        None => category_from_path(relative),
    };

    let title = front_matter
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .or_else(|| first_heading(body))
        .unwrap_or_else(|| file_stem(path));

    let id = front_matter
        .id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| id_from_path(relative));

    Ok(Document::new(id, title, body.trim(), category).with_source_path(path))
}

fn split_front_matter<'a>(path: &Path, content: &'a str) -> Result<(FrontMatter, &'a str)> {
    let Some(rest) = content.strip_prefix("---\n") else {
        return Ok((FrontMatter::default(), content));
    };

    let (raw, body) = if let Some(raw) = rest.strip_prefix("---") {
        ("", raw)
    } else if let Some(end) = rest.find("\n---") {
        (&rest[..end], &rest[end + 4..])
    } else {
        return Err(RagError::InvalidDocument {
            path: path.to_path_buf(),
            message: "missing closing front matter delimiter (`---`)".to_string(),
        });
    };

    let front_matter = if raw.trim().is_empty() {
        FrontMatter::default()
    } else {
        serde_yaml::from_str(raw).map_err(|e| RagError::InvalidDocument {
            path: path.to_path_buf(),
            message: format!("invalid front matter: {e}"),
        })?
    };
    Ok((front_matter, body))
}

pub(crate) fn first_heading(body: &str) -> Option<String> {
    body.lines()
        .map(str::trim_start)
        .find(|line| line.starts_with('#'))
        .map(|line| line.trim_start_matches('#').trim().to_string())
        .filter(|title| !title.is_empty())
}

fn file_stem(path: &Path) -> String {
    path.file_stem().map_or_else(|| "Untitled".to_string(), |s| s.to_string_lossy().into_owned())
}

fn category_from_path(relative: &Path) -> Category {
    let Some(parent) = relative.parent() else {
        return Category::General;
    };
    parent
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => name.to_str(),
            _ => None,
        })
        .find_map(|name| name.parse().ok())
        .unwrap_or_default()
}

fn id_from_path(relative: &Path) -> String {
    let without_ext = relative.with_extension("");
    let mut out = String::new();
    for c in without_ext.to_string_lossy().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if matches!(c, ' ' | '-' | '_' | '/' | '\\' | '.') && !out.ends_with('-') {
            out.push('-');
        }
    }
    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() { "document".to_string() } else { trimmed.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_title_category_and_id() {
        let root = Path::new("/docs");
        let path = Path::new("/docs/anxiety/breathing_techniques.md");
        let doc = parse_document(root, path, "# Breathing Techniques\n\nInhale for 4.").unwrap();
        assert_eq!(doc.title, "Breathing Techniques");
        assert_eq!(doc.category, Category::Anxiety);
        assert_eq!(doc.id, "anxiety-breathing-techniques");
        assert_eq!(doc.source_path.as_deref(), Some(path));
    }

    #[test]
    fn front_matter_wins() {
        let content =
            "---\nid: box\ntitle: Box Breathing\ncategory: Self-esteem\n---\n# Other\nBody";
        let doc = parse_document(Path::new("/d"), Path::new("/d/stress/x.md"), content).unwrap();
        assert_eq!(doc.id, "box");
        assert_eq!(doc.title, "Box Breathing");
        assert_eq!(doc.category, Category::SelfEsteem);
        assert_eq!(doc.text, "# Other\nBody");
    }

    #[test]
    fn distinct_paths_can_share_an_id() {
        let root = Path::new("/docs");
        let id = |path: &str| parse_document(root, Path::new(path), "body").unwrap().id;
        assert_eq!(id("/docs/a b.md"), "a-b");
        assert_eq!(id("/docs/a-b.md"), "a-b");
        assert_eq!(id("/docs/Anxiety/x.md"), id("/docs/anxiety/x.md"));
    }

    #[test]
    fn falls_back_to_file_stem_and_general() {
        let doc = parse_document(Path::new("/d"), Path::new("/d/notes.txt"), "plain text").unwrap();
        assert_eq!(doc.title, "notes");
        assert_eq!(doc.category, Category::General);
        assert_eq!(doc.id, "notes");
    }

    #[test]
    fn rejects_unknown_category_and_unterminated_front_matter() {
        let bad_category = "---\ncategory: Hobbies\n---\nbody";
        assert!(matches!(
            parse_document(Path::new("/d"), Path::new("/d/a.md"), bad_category),
            Err(RagError::InvalidDocument { .. })
        ));
        let unterminated = "---\ntitle: x\nbody";
        assert!(parse_document(Path::new("/d"), Path::new("/d/a.md"), unterminated).is_err());
    }

    #[test]
    fn loads_supported_files_only() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("stress")).unwrap();
        fs::write(root.join("stress/stop.md"), "# STOP Technique\nStop, breathe.").unwrap();
        fs::write(root.join("gratitude.txt"), "Write three things.").unwrap();
        fs::write(root.join("blank.md"), "   \n").unwrap();
        fs::write(root.join("image.png"), "not text").unwrap();

        let docs = load_documents(root).unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["gratitude", "stress-stop"]);
        assert_eq!(docs[1].category, Category::Stress);
    }

    #[test]
    fn missing_root_is_empty() {
        let temp = tempfile::tempdir().unwrap();
        assert!(load_documents(temp.path().join("absent")).unwrap().is_empty());
    }
}
