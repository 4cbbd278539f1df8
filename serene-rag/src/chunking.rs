//! Document chunking.
//!
//! [`FixedSizeChunker`] splits text into windows of at most `chunk_size`
//! characters. Consecutive windows start `chunk_size - chunk_overlap`
//! characters apart, so neighbours share `chunk_overlap` characters and the
//! windows cover the whole text without gaps. Offsets are in characters, so
//! multi-byte text is never cut inside a code point.

use std::iter::FusedIterator;

use crate::document::{Chunk, Document};
use crate::error::{RagError, Result};

/// A strategy for splitting documents into chunks.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` if the document has empty text.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Splits text into fixed-size chunks by character count with overlap.
///
/// # Example
///
/// ```rust,ignore
/// use serene_rag::FixedSizeChunker;
///
/// let chunker = FixedSizeChunker::new(100, 20)?;
/// let spans: Vec<_> = chunker.spans(&text).map(|s| (s.start, s.end)).collect();
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size`: maximum number of characters per chunk
    /// * `chunk_overlap`: number of characters shared by consecutive chunks
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfiguration`] if `chunk_size` is zero or
    /// `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RagError::InvalidConfiguration(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(RagError::InvalidConfiguration(format!(
                "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self { chunk_size, chunk_overlap })
    }

    /// Maximum number of characters per chunk.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of characters shared by consecutive chunks.
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Distance between the starts of consecutive chunks.
    pub fn step(&self) -> usize {
        self.chunk_size - self.chunk_overlap
    }

    /// Lazily split `text` into spans.
    ///
    /// A text no longer than `chunk_size` yields exactly one span covering
    /// it. Longer texts yield a span at every multiple of [`step`](Self::step)
    /// below the text length; the trailing spans are shorter than
    /// `chunk_size`.
    pub fn spans<'a>(&self, text: &'a str) -> ChunkSpans<'a> {
        let mut boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        boundaries.push(text.len());
        let char_count = boundaries.len() - 1;
        ChunkSpans {
            text,
            boundaries,
            char_count,
            chunk_size: self.chunk_size,
            step: self.step(),
            next_start: Some(0).filter(|_| char_count > 0),
        }
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        self.spans(&document.text)
            .enumerate()
            .map(|(ordinal, span)| Chunk {
                document_id: document.id.clone(),
                ordinal,
                start: span.start,
                end: span.end,
                text: span.text.to_string(),
            })
            .collect()
    }
}

/// A borrowed span produced by [`ChunkSpans`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span<'a> {
    /// Character offset of the first character.
    pub start: usize,
    /// Character offset one past the last character.
    pub end: usize,
    /// The text of the span.
    pub text: &'a str,
}

/// Iterator over the spans of one text. See [`FixedSizeChunker::spans`].
#[derive(Debug, Clone)]
pub struct ChunkSpans<'a> {
    text: &'a str,
    /// Byte offset of every character, plus the text length.
    boundaries: Vec<usize>,
    char_count: usize,
    chunk_size: usize,
    step: usize,
    next_start: Option<usize>,
}

impl<'a> Iterator for ChunkSpans<'a> {
    type Item = Span<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.next_start?;
        let end = (start + self.chunk_size).min(self.char_count);

        self.next_start = if self.char_count <= self.chunk_size {
            None
        } else {
            Some(start + self.step).filter(|next| *next < self.char_count)
        };

        Some(Span { start, end, text: &self.text[self.boundaries[start]..self.boundaries[end]] })
    }
}

impl FusedIterator for ChunkSpans<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Category;

    fn spans_of(chunker: &FixedSizeChunker, text: &str) -> Vec<(usize, usize)> {
        chunker.spans(text).map(|s| (s.start, s.end)).collect()
    }

    #[test]
    fn rejects_invalid_parameters() {
        assert!(matches!(FixedSizeChunker::new(0, 0), Err(RagError::InvalidConfiguration(_))));
        assert!(matches!(FixedSizeChunker::new(10, 10), Err(RagError::InvalidConfiguration(_))));
        assert!(matches!(FixedSizeChunker::new(10, 11), Err(RagError::InvalidConfiguration(_))));
        assert!(FixedSizeChunker::new(10, 9).is_ok());
    }

    #[test]
    fn breathing_document_spans() {
        let chunker = FixedSizeChunker::new(100, 20).unwrap();
        let text = "b".repeat(250);
        assert_eq!(spans_of(&chunker, &text), vec![(0, 100), (80, 180), (160, 250), (240, 250)]);
    }

    #[test]
    fn short_text_is_one_chunk() {
        let chunker = FixedSizeChunker::new(100, 20).unwrap();
        let text = "x".repeat(90);
        assert_eq!(spans_of(&chunker, &text), vec![(0, 90)]);
        assert_eq!(spans_of(&chunker, &"x".repeat(100)), vec![(0, 100)]);
    }

    #[test]
    fn empty_text_has_no_chunks() {
        let chunker = FixedSizeChunker::new(100, 20).unwrap();
        assert_eq!(chunker.spans("").count(), 0);
    }

    #[test]
    fn zero_overlap_tiles_the_text() {
        let chunker = FixedSizeChunker::new(4, 0).unwrap();
        let spans: Vec<&str> = chunker.spans("abcdefghij").map(|s| s.text).collect();
        assert_eq!(spans, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn offsets_count_characters_not_bytes() {
        let chunker = FixedSizeChunker::new(3, 1).unwrap();
        let spans: Vec<Span<'_>> = chunker.spans("ñañaña").collect();
        assert_eq!(spans[0].text, "ñañ");
        assert_eq!((spans[1].start, spans[1].end), (2, 5));
        assert_eq!(spans[1].text, "ñañ");
    }

    #[test]
    fn chunk_carries_document_id_and_ordinal() {
        let chunker = FixedSizeChunker::new(5, 1).unwrap();
        let doc = Document::new("doc-1", "Title", "hello world", Category::General);
        let chunks = chunker.chunk(&doc);
        assert_eq!(chunks.len(), 3);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.ordinal, i);
            assert_eq!(chunk.document_id, "doc-1");
            assert_eq!(chunk.len(), chunk.text.chars().count());
        }
    }

    #[test]
    fn iterator_is_fused() {
        let chunker = FixedSizeChunker::new(5, 0).unwrap();
        let mut spans = chunker.spans("abc");
        assert!(spans.next().is_some());
        assert!(spans.next().is_none());
        assert!(spans.next().is_none());
    }
}
