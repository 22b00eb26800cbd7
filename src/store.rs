//! Snapshot persistence.
//!
//! The diff baseline is one JSON array of canonical entries stored under a
//! fixed key. There is no schema version field; format changes mean a
//! manual migration. The snapshot is replaced wholesale after every diff
//! cycle, so a sparse-but-successful fetch becomes the new baseline with
//! no rollback.

use crate::error::StoreError;
use crate::model::CanonicalEntry;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Fixed key the entry snapshot lives under.
pub const SNAPSHOT_KEY: &str = "entries.json";

/// Opaque key-value blob storage.
pub trait BlobStore {
    fn write(&mut self, key: &str, bytes: &[u8]) -> Result<(), StoreError>;
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;
}

/// Directory-backed store. Writes go through a temp file in the same
/// directory and rename into place, so a crashed run never leaves a
/// truncated blob behind.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl BlobStore for FsBlobStore {
    fn write(&mut self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&self.root)?;
        tmp.write_all(bytes)?;
        tmp.persist(self.root.join(key))
            .map_err(|err| StoreError::Io(err.error))?;
        Ok(())
    }

    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match fs::read(self.root.join(key)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

/// In-memory store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemBlobStore {
    blobs: HashMap<String, Vec<u8>>,
}

impl BlobStore for MemBlobStore {
    fn write(&mut self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        self.blobs.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.blobs.get(key).cloned())
    }
}

/// Snapshot repository over a blob store.
pub struct SnapshotStore<S> {
    store: S,
}

impl<S: BlobStore> SnapshotStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Load the previous snapshot. `Ok(None)` means no snapshot exists
    /// yet; callers treat read and parse errors the same way and start
    /// from a fresh fetch.
    pub fn load(&self) -> Result<Option<Vec<CanonicalEntry>>, StoreError> {
        let Some(bytes) = self.store.read(SNAPSHOT_KEY)? else {
            return Ok(None);
        };
        let entries = serde_json::from_slice(&bytes)?;
        Ok(Some(entries))
    }

    /// Replace the snapshot wholesale. On failure the on-disk copy goes
    /// stale while the caller's in-memory baseline still advances; the
    /// next successful write repairs it.
    pub fn save(&mut self, entries: &[CanonicalEntry]) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(entries)?;
        self.store.write(SNAPSHOT_KEY, &bytes)
    }
}
