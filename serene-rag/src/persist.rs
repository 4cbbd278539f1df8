//! On-disk snapshot of the index and the document store.
//!
//! Layout: the 4-byte magic `SRIX`, the format version as a little-endian
//! `u32`, then three `bincode` values: [`IndexHeader`], the index entries and
//! the document records. Snapshots are written to a temporary file in the
//! target directory, synced, and renamed over the previous snapshot, so a
//! reader only ever sees a complete old or a complete new file.

use std::fs::{self, File};
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

use bincode::config::standard as bincode_config;
use bincode::{Decode, Encode, decode_from_slice, decode_from_std_read, encode_to_vec};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::document::{Category, Document};
use crate::error::{RagError, Result};
use crate::index::{DistanceMetric, EntryId, IndexEntry, VectorIndex};
use crate::store::{DocumentRecord, DocumentStore};

const MAGIC: &[u8; 4] = b"SRIX";

/// Snapshot format written by this build.
pub const FORMAT_VERSION: u32 = 1;

/// Summary stored at the front of every snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Encode, Decode)]
pub struct IndexHeader {
    /// Repeats the version that precedes the header.
    pub format_version: u32,
    /// Distance metric of the stored vectors.
    pub metric: DistanceMetric,
    /// Vector dimension, unset for an index that never held a vector.
    pub dimension: Option<usize>,
    /// Number of stored entries.
    pub entry_count: u64,
    /// Number of stored documents.
    pub document_count: u64,
    /// Id the next inserted entry receives.
    pub next_id: EntryId,
    /// Embedding model the vectors were produced with.
    pub model_id: String,
}

#[derive(Debug, Clone, Encode, Decode)]
struct StoredDocument {
    id: String,
    title: String,
    text: String,
    category: Category,
    source_path: Option<String>,
    created_at_ms: i64,
    entry_ids: Vec<EntryId>,
}

impl From<&DocumentRecord> for StoredDocument {
    fn from(record: &DocumentRecord) -> Self {
        let document = &record.document;
        Self {
            id: document.id.clone(),
            title: document.title.clone(),
            text: document.text.clone(),
            category: document.category,
            source_path: document.source_path.as_ref().map(|p| p.to_string_lossy().into_owned()),
            created_at_ms: document.created_at.timestamp_millis(),
            entry_ids: record.entry_ids.clone(),
        }
    }
}

impl StoredDocument {
    fn into_record(self) -> Result<DocumentRecord> {
        let created_at = DateTime::<Utc>::from_timestamp_millis(self.created_at_ms)
            .ok_or_else(|| {
                RagError::CorruptIndex(format!("document '{}' has an invalid timestamp", self.id))
            })?;
        Ok(DocumentRecord {
            document: Document {
                id: self.id,
                title: self.title,
                text: self.text,
                category: self.category,
                source_path: self.source_path.map(PathBuf::from),
                created_at,
            },
            entry_ids: self.entry_ids,
        })
    }
}

/// A fully decoded and validated snapshot.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// The header as stored.
    pub header: IndexHeader,
    /// The restored index.
    pub index: VectorIndex,
    /// The restored document store.
    pub store: DocumentStore,
}

fn encode_snapshot(
    index: &VectorIndex,
    store: &DocumentStore,
    model_id: &str,
) -> std::result::Result<Vec<u8>, bincode::error::EncodeError> {
    let header = IndexHeader {
        format_version: FORMAT_VERSION,
        metric: index.metric(),
        dimension: index.dimension(),
        entry_count: index.len() as u64,
        document_count: store.len() as u64,
        next_id: index.next_id(),
        model_id: model_id.to_string(),
    };
    let documents: Vec<StoredDocument> = store.records().map(StoredDocument::from).collect();

    let mut bytes = Vec::new();
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    bytes.extend(encode_to_vec(&header, bincode_config())?);
    bytes.extend(encode_to_vec(index.entries(), bincode_config())?);
    bytes.extend(encode_to_vec(&documents, bincode_config())?);
    Ok(bytes)
}

/// Atomically write `index` and `store` to `path`.
///
/// # Errors
///
/// Returns [`RagError::Persistence`] if any step fails. The file previously
/// at `path`, if any, is left untouched.
pub fn write_snapshot(
    path: &Path,
    index: &VectorIndex,
    store: &DocumentStore,
    model_id: &str,
) -> Result<()> {
    let bytes = encode_snapshot(index, store, model_id).map_err(|e| RagError::Persistence {
        path: path.to_path_buf(),
        message: format!("encoding failed: {e}"),
    })?;
    write_atomically(path, &bytes)?;
    debug!(path = %path.display(), bytes = bytes.len(), entries = index.len(), "snapshot written");
    Ok(())
}

/// Write `bytes` to `path` via a synced temporary file and a rename.
pub(crate) fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let persistence_err =
        |message: String| RagError::Persistence { path: path.to_path_buf(), message };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)
        .map_err(|e| persistence_err(format!("cannot create {}: {e}", dir.display())))?;

    let mut tmp = NamedTempFile::new_in(dir)
        .map_err(|e| persistence_err(format!("cannot create temporary file: {e}")))?;
    tmp.write_all(bytes).map_err(|e| persistence_err(format!("write failed: {e}")))?;
    tmp.as_file().sync_all().map_err(|e| persistence_err(format!("sync failed: {e}")))?;
    tmp.persist(path).map_err(|e| persistence_err(format!("rename failed: {}", e.error)))?;
    // The new file is in place; a failed directory sync only weakens
    // durability across power loss.
    if let Err(e) = sync_dir(dir) {
        warn!(dir = %dir.display(), error = %e, "failed to sync snapshot directory");
    }
    Ok(())
}

/// Flush the directory entry so the rename survives a power loss.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

fn check_preamble(preamble: &[u8]) -> Result<()> {
    if preamble.len() < 8 || &preamble[..4] != MAGIC {
        return Err(RagError::CorruptIndex("missing snapshot magic".to_string()));
    }
    let found = u32::from_le_bytes([preamble[4], preamble[5], preamble[6], preamble[7]]);
    if found != FORMAT_VERSION {
        return Err(RagError::VersionMismatch { expected: FORMAT_VERSION, found });
    }
    Ok(())
}

fn decode_part<T: Decode<()>>(bytes: &[u8], offset: &mut usize, what: &str) -> Result<T> {
    let (value, read) = decode_from_slice(&bytes[*offset..], bincode_config())
        .map_err(|e| RagError::CorruptIndex(format!("cannot decode {what}: {e}")))?;
    *offset += read;
    Ok(value)
}

/// Read and validate a snapshot.
///
/// # Errors
///
/// - [`RagError::Io`] if the file cannot be read (including when it is missing)
/// - [`RagError::VersionMismatch`] if it was written by another format version
/// - [`RagError::CorruptIndex`] if it is truncated, has trailing bytes, or
///   its header disagrees with its contents
pub fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let bytes = fs::read(path)?;
    check_preamble(&bytes)?;

    let mut offset = 8;
    let header: IndexHeader = decode_part(&bytes, &mut offset, "header")?;
    let entries: Vec<IndexEntry> = decode_part(&bytes, &mut offset, "entries")?;
    let documents: Vec<StoredDocument> = decode_part(&bytes, &mut offset, "documents")?;
    if offset != bytes.len() {
        return Err(RagError::CorruptIndex(format!(
            "{} trailing bytes after snapshot",
            bytes.len() - offset
        )));
    }

    validate(&header, &entries, &documents)?;

    let index = VectorIndex::from_parts(header.dimension, entries, header.next_id);
    let records =
        documents.into_iter().map(StoredDocument::into_record).collect::<Result<Vec<_>>>()?;
    let store = DocumentStore::from_records(records);
    if store.len() as u64 != header.document_count {
        return Err(RagError::CorruptIndex("duplicate document ids".to_string()));
    }

    Ok(Snapshot { header, index, store })
}

fn validate(
    header: &IndexHeader,
    entries: &[IndexEntry],
    documents: &[StoredDocument],
) -> Result<()> {
    if header.format_version != FORMAT_VERSION {
        return Err(RagError::CorruptIndex(format!(
            "header declares format {} inside a version {FORMAT_VERSION} file",
            header.format_version
        )));
    }
    if header.entry_count != entries.len() as u64 {
        return Err(RagError::CorruptIndex(format!(
            "header declares {} entries, file holds {}",
            header.entry_count,
            entries.len()
        )));
    }
    if header.document_count != documents.len() as u64 {
        return Err(RagError::CorruptIndex(format!(
            "header declares {} documents, file holds {}",
            header.document_count,
            documents.len()
        )));
    }

    match header.dimension {
        None if !entries.is_empty() => {
            return Err(RagError::CorruptIndex("entries stored without a dimension".to_string()));
        }
        Some(dimension) => {
            if let Some(bad) = entries.iter().find(|entry| entry.vector.len() != dimension) {
                return Err(RagError::CorruptIndex(format!(
                    "entry {} has dimension {}, header declares {dimension}",
                    bad.id,
                    bad.vector.len()
                )));
            }
        }
        None => {}
    }

    let mut previous: Option<EntryId> = None;
    for entry in entries {
        if previous.is_some_and(|prev| entry.id <= prev) || entry.id >= header.next_id {
            return Err(RagError::CorruptIndex(format!("entry id {} is out of order", entry.id)));
        }
        previous = Some(entry.id);
    }

    for document in documents {
        for id in &document.entry_ids {
            if entries.binary_search_by_key(id, |entry| entry.id).is_err() {
                return Err(RagError::CorruptIndex(format!(
                    "document '{}' references missing entry {id}",
                    document.id
                )));
            }
        }
    }

    Ok(())
}

/// Read only the header of a snapshot.
///
/// # Errors
///
/// Same as [`read_snapshot`], limited to the preamble and header.
pub fn read_header(path: &Path) -> Result<IndexHeader> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut preamble = [0u8; 8];
    reader.read_exact(&mut preamble).map_err(|_| {
        RagError::CorruptIndex("file is shorter than the snapshot preamble".to_string())
    })?;
    check_preamble(&preamble)?;
    decode_from_std_read(&mut reader, bincode_config())
        .map_err(|e| RagError::CorruptIndex(format!("cannot decode header: {e}")))
}

/// Delete the snapshot at `path`. Returns whether a file was removed.
pub fn remove_snapshot(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Chunk;
    use crate::index::EntryMetadata;

    #[cfg(unix)]
    #[test]
    fn directory_sync_needs_an_existing_directory() {
        let temp = tempfile::tempdir().unwrap();
        assert!(sync_dir(temp.path()).is_ok());
        assert!(sync_dir(&temp.path().join("missing")).is_err());
    }

    #[test]
    fn atomic_write_replaces_and_leaves_no_temporary_files() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("nested").join("file.bin");
        write_atomically(&path, b"first").unwrap();
        write_atomically(&path, b"second").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"second");
        let names: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("file.bin")]);
    }

    fn populated() -> (VectorIndex, DocumentStore) {
        let mut index = VectorIndex::new();
        let mut ids = Vec::new();
        let vectors = [vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]];
        for (ordinal, vector) in vectors.into_iter().enumerate() {
            let chunk = Chunk {
                document_id: "breathing".to_string(),
                ordinal,
                start: ordinal * 10,
                end: ordinal * 10 + 10,
                text: format!("chunk {ordinal}"),
            };
            let metadata = EntryMetadata {
                chunk,
                title: "Breathing".to_string(),
                category: Category::Anxiety,
            };
            ids.push(index.insert(vector, metadata).unwrap());
        }
        let document = Document::new("breathing", "Breathing", "text", Category::Anxiety)
            .with_source_path("docs/breathing.md");
        let store = DocumentStore::from_records([DocumentRecord { document, entry_ids: ids }]);
        (index, store)
    }

    #[test]
    fn snapshot_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/index.bin");
        let (index, store) = populated();

        write_snapshot(&path, &index, &store, "model-x").unwrap();
        let snapshot = read_snapshot(&path).unwrap();

        assert_eq!(snapshot.index, index);
        assert_eq!(snapshot.header.model_id, "model-x");
        assert_eq!(snapshot.header.dimension, Some(3));
        let restored = snapshot.store.get("breathing").unwrap();
        let original = store.get("breathing").unwrap();
        assert_eq!(restored.source_path, original.source_path);
        assert_eq!(restored.created_at.timestamp_millis(), original.created_at.timestamp_millis());
        assert_eq!(snapshot.store.record("breathing").unwrap().entry_ids, vec![0, 1]);

        assert_eq!(read_header(&path).unwrap(), snapshot.header);
    }

    #[test]
    fn rejects_wrong_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.bin");
        fs::write(&path, b"FAISS index").unwrap();
        assert!(matches!(read_snapshot(&path), Err(RagError::CorruptIndex(_))));
        assert!(matches!(read_header(&path), Err(RagError::CorruptIndex(_))));
    }

    #[test]
    fn rejects_other_versions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.bin");
        let (index, store) = populated();
        write_snapshot(&path, &index, &store, "m").unwrap();

        let mut bytes = fs::read(&path).unwrap();
        bytes[4..8].copy_from_slice(&2u32.to_le_bytes());
        fs::write(&path, &bytes).unwrap();

        let err = read_snapshot(&path).unwrap_err();
        assert!(matches!(err, RagError::VersionMismatch { expected: 1, found: 2 }));
    }

    #[test]
    fn rejects_truncated_and_padded_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.bin");
        let (index, store) = populated();
        write_snapshot(&path, &index, &store, "m").unwrap();
        let bytes = fs::read(&path).unwrap();

        fs::write(&path, &bytes[..bytes.len() - 5]).unwrap();
        assert!(matches!(read_snapshot(&path), Err(RagError::CorruptIndex(_))));

        let mut padded = bytes.clone();
        padded.push(0);
        fs::write(&path, &padded).unwrap();
        assert!(matches!(read_snapshot(&path), Err(RagError::CorruptIndex(_))));
    }

    #[test]
    fn rejects_header_count_disagreement() {
        let (index, store) = populated();
        let mut header = IndexHeader {
            format_version: FORMAT_VERSION,
            metric: DistanceMetric::Cosine,
            dimension: Some(3),
            entry_count: 5,
            document_count: 1,
            next_id: index.next_id(),
            model_id: "m".to_string(),
        };
        let documents: Vec<StoredDocument> = store.records().map(StoredDocument::from).collect();
        assert!(validate(&header, index.entries(), &documents).is_err());

        header.entry_count = 2;
        header.dimension = Some(4);
        assert!(validate(&header, index.entries(), &documents).is_err());

        header.dimension = Some(3);
        assert!(validate(&header, index.entries(), &documents).is_ok());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_snapshot(&dir.path().join("absent.bin")).unwrap_err();
        assert!(matches!(err, RagError::Io(e) if e.kind() == std::io::ErrorKind::NotFound));
    }

    #[test]
    fn remove_snapshot_reports_presence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.bin");
        assert!(!remove_snapshot(&path).unwrap());
        fs::write(&path, b"x").unwrap();
        assert!(remove_snapshot(&path).unwrap());
        assert!(!path.exists());
    }
}
