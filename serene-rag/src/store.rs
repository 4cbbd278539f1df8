//! Registry of ingested documents.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use uuid::Uuid;

use crate::document::{Category, Document};
use crate::error::{RagError, Result};
use crate::index::EntryId;

/// A registered document and the index entries computed from it.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRecord {
    /// The document.
    pub document: Document,
    /// Index entries holding this document's chunks, in chunk order.
    pub entry_ids: Vec<EntryId>,
}

/// Documents keyed by id, iterated in insertion order.
///
/// The store only tracks which index entries belong to which document;
/// removing the entries themselves is the caller's job (see
/// [`RagManager::remove`](crate::RagManager::remove)).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentStore {
    records: IndexMap<String, DocumentRecord>,
}

impl DocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_records(records: impl IntoIterator<Item = DocumentRecord>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|record| (record.document.id.clone(), record))
                .collect(),
        }
    }

    /// Give `document` a fresh id if it has none.
    pub fn ensure_id(document: &mut Document) {
        if document.id.trim().is_empty() {
            document.id = Uuid::new_v4().to_string();
        }
    }

    /// Register a document and return its id.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DuplicateId`] if the id is already registered.
    pub fn add(&mut self, mut document: Document) -> Result<String> {
        Self::ensure_id(&mut document);
        self.add_with_entries(document, Vec::new())
    }

    pub(crate) fn add_with_entries(
        &mut self,
        document: Document,
        entry_ids: Vec<EntryId>,
    ) -> Result<String> {
        if self.records.contains_key(&document.id) {
            return Err(RagError::DuplicateId(document.id));
        }
        let id = document.id.clone();
        self.records.insert(id.clone(), DocumentRecord { document, entry_ids });
        Ok(id)
    }

    /// Unregister a document, returning its record.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::NotFound`] if the id is not registered.
    pub fn remove(&mut self, id: &str) -> Result<DocumentRecord> {
        self.records.shift_remove(id).ok_or_else(|| RagError::document_not_found(id))
    }

    /// Look up a document.
    pub fn get(&self, id: &str) -> Option<&Document> {
        self.records.get(id).map(|record| &record.document)
    }

    /// Look up a document together with its entry ids.
    pub fn record(&self, id: &str) -> Option<&DocumentRecord> {
        self.records.get(id)
    }

    /// Whether the id is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    /// All documents in insertion order.
    pub fn list(&self) -> impl Iterator<Item = &Document> {
        self.records.values().map(|record| &record.document)
    }

    /// All records in insertion order.
    pub fn records(&self) -> impl Iterator<Item = &DocumentRecord> {
        self.records.values()
    }

    /// Documents of one category, in insertion order.
    pub fn by_category(&self, category: Category) -> impl Iterator<Item = &Document> {
        self.list().filter(move |document| document.category == category)
    }

    /// Number of documents per category. Categories without documents are omitted.
    pub fn category_counts(&self) -> BTreeMap<Category, usize> {
        let mut counts = BTreeMap::new();
        for document in self.list() {
            *counts.entry(document.category).or_insert(0) += 1;
        }
        counts
    }

    /// Number of registered documents.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no documents are registered.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total number of entry ids across all documents.
    pub fn entry_count(&self) -> usize {
        self.records.values().map(|record| record.entry_ids.len()).sum()
    }

    /// Replace one record's entry ids.
    pub(crate) fn set_entries(&mut self, id: &str, entry_ids: Vec<EntryId>) -> Result<()> {
        let record = self.records.get_mut(id).ok_or_else(|| RagError::document_not_found(id))?;
        record.entry_ids = entry_ids;
        Ok(())
    }

    /// Drop every document.
    pub fn clear(&mut self) {
        self.records.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, category: Category) -> Document {
        Document::new(id, format!("Title {id}"), "text", category)
    }

    #[test]
    fn add_assigns_missing_ids() {
        let mut store = DocumentStore::new();
        let id = store.add(doc("", Category::General)).unwrap();
        assert!(!id.is_empty());
        assert_eq!(store.get(&id).unwrap().id, id);
    }

    #[test]
    fn add_rejects_duplicates() {
        let mut store = DocumentStore::new();
        store.add(doc("a", Category::General)).unwrap();
        let err = store.add(doc("a", Category::Stress)).unwrap_err();
        assert!(matches!(err, RagError::DuplicateId(id) if id == "a"));
        assert_eq!(store.get("a").unwrap().category, Category::General);
    }

    #[test]
    fn remove_missing_is_not_found() {
        let mut store = DocumentStore::new();
        assert!(matches!(store.remove("nope"), Err(RagError::NotFound { .. })));
    }

    #[test]
    fn list_keeps_insertion_order_across_removals() {
        let mut store = DocumentStore::new();
        for id in ["c", "a", "b", "d"] {
            store.add(doc(id, Category::General)).unwrap();
        }
        store.remove("a").unwrap();
        let ids: Vec<&str> = store.list().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "d"]);
    }

    #[test]
    fn enumerates_by_category() {
        let mut store = DocumentStore::new();
        store.add(doc("breathing", Category::Anxiety)).unwrap();
        store.add(doc("stop", Category::Stress)).unwrap();
        store.add(doc("grounding", Category::Anxiety)).unwrap();

        let anxiety: Vec<&str> =
            store.by_category(Category::Anxiety).map(|d| d.id.as_str()).collect();
        assert_eq!(anxiety, vec!["breathing", "grounding"]);

        let counts = store.category_counts();
        assert_eq!(counts.get(&Category::Anxiety), Some(&2));
        assert_eq!(counts.get(&Category::Stress), Some(&1));
        assert_eq!(counts.get(&Category::Depression), None);
    }

    #[test]
    fn tracks_entry_ids() {
        let mut store = DocumentStore::new();
        store.add_with_entries(doc("a", Category::General), vec![0, 1, 2]).unwrap();
        assert_eq!(store.entry_count(), 3);
        store.set_entries("a", vec![7]).unwrap();
        assert_eq!(store.record("a").unwrap().entry_ids, vec![7]);
        assert!(store.set_entries("b", vec![]).is_err());
    }
}
