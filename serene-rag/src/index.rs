//! Exact nearest-neighbour index over chunk embeddings.
//!
//! The metric is cosine distance (`1 - cosine similarity`, range `0..=2`).
//! Results are ordered by ascending distance; equal distances keep insertion
//! order, so earlier-inserted entries win ties. A zero vector has distance
//! `1.0` to everything.

use std::path::Path;

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::document::{Category, Chunk};
use crate::error::{RagError, Result};
use crate::persist;
use crate::store::DocumentStore;

/// Identifier assigned by the index on insertion. Never reused.
pub type EntryId = u64;

/// Distance metric of an index. Stored in the snapshot header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum DistanceMetric {
    Cosine,
}

impl DistanceMetric {
    /// Identifier written to snapshot headers and status reports.
    pub fn as_str(self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "cosine",
        }
    }
}

/// Back-reference from an entry to the chunk it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct EntryMetadata {
    /// The embedded chunk.
    pub chunk: Chunk,
    /// Title of the chunk's document.
    pub title: String,
    /// Category of the chunk's document.
    pub category: Category,
}

/// A stored vector with its metadata.
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct IndexEntry {
    /// Identifier assigned on insertion.
    pub id: EntryId,
    /// The embedding.
    pub vector: Vec<f32>,
    /// What the embedding was computed from.
    pub metadata: EntryMetadata,
}

/// One search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    /// The matching entry.
    pub entry_id: EntryId,
    /// The entry's metadata.
    pub metadata: EntryMetadata,
    /// Cosine distance to the query vector.
    pub distance: f32,
}

impl Neighbor {
    /// Cosine similarity, the complement of [`distance`](Self::distance).
    pub fn similarity(&self) -> f32 {
        1.0 - self.distance
    }
}

/// Exact cosine-distance index.
///
/// Entries are kept in insertion order. The dimension is fixed either when
/// the index is created with [`with_dimension`](Self::with_dimension) or by
/// the first insertion; every later vector must match it.
///
/// # Example
///
/// ```rust,ignore
/// use serene_rag::VectorIndex;
///
/// let mut index = VectorIndex::with_dimension(384);
/// let id = index.insert(embedding, metadata)?;
/// let hits = index.search(&query, 3)?;
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VectorIndex {
    dimension: Option<usize>,
    entries: Vec<IndexEntry>,
    next_id: EntryId,
}

impl VectorIndex {
    /// Create an empty index whose dimension is fixed by the first insertion.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty index with a fixed dimension.
    pub fn with_dimension(dimension: usize) -> Self {
        Self { dimension: Some(dimension), ..Self::default() }
    }

    pub(crate) fn from_parts(
        dimension: Option<usize>,
        entries: Vec<IndexEntry>,
        next_id: EntryId,
    ) -> Self {
        Self { dimension, entries, next_id }
    }

    /// The fixed dimension, if any.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// The distance metric. Always cosine.
    pub fn metric(&self) -> DistanceMetric {
        DistanceMetric::Cosine
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The id the next insertion will receive.
    pub fn next_id(&self) -> EntryId {
        self.next_id
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Look up an entry by id.
    pub fn get(&self, id: EntryId) -> Option<&IndexEntry> {
        self.position(id).map(|pos| &self.entries[pos])
    }

    fn position(&self, id: EntryId) -> Option<usize> {
        // Ids increase with insertion order, so entries are sorted by id.
        self.entries.binary_search_by_key(&id, |entry| entry.id).ok()
    }

    fn check_dimension(&self, actual: usize) -> Result<()> {
        match self.dimension {
            Some(expected) if expected != actual => {
                Err(RagError::DimensionMismatch { expected, actual })
            }
            _ => Ok(()),
        }
    }

    /// Store a vector and return its new id.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DimensionMismatch`] if the vector's length differs
    /// from the index dimension; the index is left unchanged.
    pub fn insert(&mut self, vector: Vec<f32>, metadata: EntryMetadata) -> Result<EntryId> {
        self.check_dimension(vector.len())?;
        if vector.is_empty() {
            return Err(RagError::DimensionMismatch {
                expected: self.dimension.unwrap_or(1),
                actual: 0,
            });
        }
        if self.dimension.is_none() {
            self.dimension = Some(vector.len());
        }

        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(IndexEntry { id, vector, metadata });
        Ok(id)
    }

    /// Delete one entry.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::NotFound`] if no entry has this id.
    pub fn remove(&mut self, id: EntryId) -> Result<IndexEntry> {
        let pos = self
            .position(id)
            .ok_or_else(|| RagError::NotFound { kind: "index entry", id: id.to_string() })?;
        Ok(self.entries.remove(pos))
    }

    /// Delete every listed entry that exists; returns how many were removed.
    pub fn remove_many(&mut self, ids: &[EntryId]) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| !ids.contains(&entry.id));
        before - self.entries.len()
    }

    /// Remove and return every listed entry that exists, in id order.
    pub(crate) fn take_many(&mut self, ids: &[EntryId]) -> Vec<IndexEntry> {
        let (taken, kept): (Vec<IndexEntry>, Vec<IndexEntry>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|entry| ids.contains(&entry.id));
        self.entries = kept;
        taken
    }

    /// Put back entries returned by [`take_many`](Self::take_many).
    pub(crate) fn restore(&mut self, entries: Vec<IndexEntry>) {
        self.entries.extend(entries);
        self.entries.sort_by_key(|entry| entry.id);
    }

    /// Delete every entry belonging to `document_id`; returns how many were removed.
    pub fn remove_document(&mut self, document_id: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.metadata.chunk.document_id != document_id);
        before - self.entries.len()
    }

    /// Drop every entry. The dimension and id counter are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Return the `k` entries closest to `query`, nearest first.
    ///
    /// An empty index yields an empty result. Fewer than `k` entries yield
    /// all of them.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DimensionMismatch`] if the query length differs
    /// from the dimension of a non-empty index.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        self.check_dimension(query.len())?;

        let query_norm = norm(query);
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(pos, entry)| (pos, cosine_distance(query, query_norm, &entry.vector)))
            .collect();

        // Stable sort: ties stay in insertion order.
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(pos, distance)| {
                let entry = &self.entries[pos];
                Neighbor { entry_id: entry.id, metadata: entry.metadata.clone(), distance }
            })
            .collect())
    }

    /// Persist the index atomically to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Persistence`] if the snapshot cannot be written;
    /// any previous file at `path` is left intact.
    pub fn save(&self, path: &Path, model_id: &str) -> Result<()> {
        persist::write_snapshot(path, self, &DocumentStore::new(), model_id)
    }

    /// Restore an index written by [`save`](Self::save) or by the manager.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::CorruptIndex`] or [`RagError::VersionMismatch`]
    /// if the file is not a valid snapshot, [`RagError::Io`] if it cannot be
    /// read.
    pub fn load(path: &Path) -> Result<Self> {
        persist::read_snapshot(path).map(|snapshot| snapshot.index)
    }
}

fn norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Cosine distance between `query` (with precomputed norm) and `v`.
fn cosine_distance(query: &[f32], query_norm: f32, v: &[f32]) -> f32 {
    let v_norm = norm(v);
    if query_norm == 0.0 || v_norm == 0.0 {
        return 1.0;
    }
    let dot: f32 = query.iter().zip(v).map(|(x, y)| x * y).sum();
    (1.0 - dot / (query_norm * v_norm)).clamp(0.0, 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(document_id: &str, ordinal: usize) -> EntryMetadata {
        EntryMetadata {
            chunk: Chunk {
                document_id: document_id.to_string(),
                ordinal,
                start: 0,
                end: 1,
                text: format!("{document_id}#{ordinal}"),
            },
            title: document_id.to_string(),
            category: Category::General,
        }
    }

    #[test]
    fn dimension_is_fixed_by_first_insert() {
        let mut index = VectorIndex::new();
        assert_eq!(index.dimension(), None);
        index.insert(vec![1.0, 0.0], meta("a", 0)).unwrap();
        assert_eq!(index.dimension(), Some(2));

        let err = index.insert(vec![1.0, 0.0, 0.0], meta("a", 1)).unwrap_err();
        assert!(matches!(err, RagError::DimensionMismatch { expected: 2, actual: 3 }));
        assert_eq!(index.len(), 1);
        assert_eq!(index.next_id(), 1);
    }

    #[test]
    fn configured_dimension_rejects_first_insert() {
        let mut index = VectorIndex::with_dimension(3);
        let before = index.clone();
        assert!(index.insert(vec![1.0, 0.0], meta("a", 0)).is_err());
        assert_eq!(index, before);
    }

    #[test]
    fn empty_vector_is_rejected() {
        let mut index = VectorIndex::new();
        assert!(index.insert(Vec::new(), meta("a", 0)).is_err());
        assert_eq!(index.dimension(), None);
    }

    #[test]
    fn search_orders_by_distance() {
        let mut index = VectorIndex::new();
        index.insert(vec![0.0, 1.0], meta("far", 0)).unwrap();
        index.insert(vec![1.0, 0.0], meta("near", 0)).unwrap();
        index.insert(vec![1.0, 1.0], meta("mid", 0)).unwrap();

        let hits = index.search(&[1.0, 0.0], 3).unwrap();
        let order: Vec<&str> = hits.iter().map(|h| h.metadata.title.as_str()).collect();
        assert_eq!(order, vec!["near", "mid", "far"]);
        assert!(hits[0].distance.abs() < 1e-6);
        assert!((hits[0].similarity() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn ties_go_to_earlier_insertions() {
        let mut index = VectorIndex::new();
        let first = index.insert(vec![1.0, 0.0], meta("a", 0)).unwrap();
        let second = index.insert(vec![2.0, 0.0], meta("b", 0)).unwrap();
        let third = index.insert(vec![0.5, 0.0], meta("c", 0)).unwrap();

        let hits = index.search(&[3.0, 0.0], 2).unwrap();
        assert_eq!(hits.iter().map(|h| h.entry_id).collect::<Vec<_>>(), vec![first, second]);
        let all = index.search(&[3.0, 0.0], 10).unwrap();
        assert_eq!(all.last().map(|h| h.entry_id), Some(third));
    }

    #[test]
    fn search_on_empty_index_is_empty() {
        let index = VectorIndex::with_dimension(4);
        assert!(index.search(&[1.0, 0.0, 0.0, 0.0], 3).unwrap().is_empty());
        // Even a mismatched query is not an error when there is nothing to compare.
        assert!(index.search(&[1.0], 3).unwrap().is_empty());
    }

    #[test]
    fn search_rejects_mismatched_query() {
        let mut index = VectorIndex::new();
        index.insert(vec![1.0, 0.0], meta("a", 0)).unwrap();
        assert!(matches!(index.search(&[1.0], 1), Err(RagError::DimensionMismatch { .. })));
    }

    #[test]
    fn remove_and_cascade() {
        let mut index = VectorIndex::new();
        let a0 = index.insert(vec![1.0, 0.0], meta("a", 0)).unwrap();
        index.insert(vec![1.0, 0.1], meta("a", 1)).unwrap();
        index.insert(vec![0.0, 1.0], meta("b", 0)).unwrap();

        assert_eq!(index.remove(a0).unwrap().metadata.chunk.ordinal, 0);
        assert!(matches!(index.remove(a0), Err(RagError::NotFound { .. })));

        assert_eq!(index.remove_document("a"), 1);
        assert_eq!(index.len(), 1);
        assert_eq!(index.remove_document("a"), 0);
        assert_eq!(index.entries()[0].metadata.chunk.document_id, "b");
    }

    #[test]
    fn ids_are_not_reused() {
        let mut index = VectorIndex::new();
        let a = index.insert(vec![1.0], meta("a", 0)).unwrap();
        index.remove(a).unwrap();
        let b = index.insert(vec![1.0], meta("a", 0)).unwrap();
        assert_ne!(a, b);
        assert!(index.get(b).is_some());
        assert!(index.get(a).is_none());
    }

    #[test]
    fn zero_vectors_sit_at_distance_one() {
        let mut index = VectorIndex::new();
        index.insert(vec![0.0, 0.0], meta("zero", 0)).unwrap();
        let hits = index.search(&[1.0, 0.0], 1).unwrap();
        assert!((hits[0].distance - 1.0).abs() < 1e-6);
    }
}
