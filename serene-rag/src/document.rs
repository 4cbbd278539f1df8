//! Data types for documents, chunks, and query results.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use bincode::{Decode, Encode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RagError;

/// Topic a document belongs to.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    Encode, Decode,
)]
pub enum Category {
    #[default]
    General,
    Anxiety,
    Depression,
    Stress,
    Relationships,
    #[serde(rename = "Self-esteem")]
    SelfEsteem,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Category; 6] = [
        Category::General,
        Category::Anxiety,
        Category::Depression,
        Category::Stress,
        Category::Relationships,
        Category::SelfEsteem,
    ];

    /// Human-readable name, as used in configuration and prompts.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::General => "General",
            Category::Anxiety => "Anxiety",
            Category::Depression => "Depression",
            Category::Stress => "Stress",
            Category::Relationships => "Relationships",
            Category::SelfEsteem => "Self-esteem",
        }
    }

    /// Lower-case, dash-separated form used for directory names.
    pub fn slug(self) -> &'static str {
        match self {
            Category::General => "general",
            Category::Anxiety => "anxiety",
            Category::Depression => "depression",
            Category::Stress => "stress",
            Category::Relationships => "relationships",
            Category::SelfEsteem => "self-esteem",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = RagError;

    /// Case-insensitive; `-`, `_` and spaces are ignored, so `Self-esteem`,
    /// `self_esteem` and `selfesteem` all parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Category::ALL
            .into_iter()
            .find(|category| category.slug().replace('-', "") == key)
            .ok_or_else(|| RagError::InvalidConfiguration(format!("unknown category '{s}'")))
    }
}

/// A source document.
///
/// Immutable once indexed; changing a document means removing it and
/// ingesting the new version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique identifier. Left empty, one is assigned on registration.
    pub id: String,
    /// Display title, usually the first heading.
    pub title: String,
    /// The raw text content.
    pub text: String,
    /// Topic of the document.
    pub category: Category,
    /// File the document was loaded from, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_path: Option<PathBuf>,
    /// When the document was created.
    pub created_at: DateTime<Utc>,
}

impl Document {
    /// Create a document stamped with the current time.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        text: impl Into<String>,
        category: Category,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            text: text.into(),
            category,
            source_path: None,
            created_at: Utc::now(),
        }
    }

    /// Attach the file the document came from.
    pub fn with_source_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_path = Some(path.into());
        self
    }
}

/// A contiguous span of a [`Document`]'s text.
///
/// Offsets count characters (Unicode scalar values), not bytes; `end` is
/// exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct Chunk {
    /// The ID of the parent [`Document`].
    pub document_id: String,
    /// Position of this chunk within its document, starting at zero.
    pub ordinal: usize,
    /// Character offset of the first character.
    pub start: usize,
    /// Character offset one past the last character.
    pub end: usize,
    /// The text of the span.
    pub text: String,
}

impl Chunk {
    /// Length of the span in characters.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// One retrieved chunk as handed to the caller for prompt assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    /// Text of the matching chunk.
    pub chunk_text: String,
    /// Title of the chunk's document.
    pub title: String,
    /// Cosine similarity with the query; higher is more relevant.
    pub score: f32,
    /// Identifier of the chunk's document.
    pub document_id: String,
    /// Category of the chunk's document.
    pub category: Category,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parses_loosely() {
        assert_eq!("Self-esteem".parse::<Category>().unwrap(), Category::SelfEsteem);
        assert_eq!("self_esteem".parse::<Category>().unwrap(), Category::SelfEsteem);
        assert_eq!("ANXIETY".parse::<Category>().unwrap(), Category::Anxiety);
        assert!("hobbies".parse::<Category>().is_err());
    }

    #[test]
    fn category_serializes_with_display_name() {
        let json = serde_json::to_string(&Category::SelfEsteem).unwrap();
        assert_eq!(json, "\"Self-esteem\"");
        for category in Category::ALL {
            assert_eq!(category.to_string().parse::<Category>().unwrap(), category);
        }
    }
}
