//! In-memory document store for testing.

use crate::codec::{self, Indent};
use crate::document::Document;
use crate::error::{StorageError, StorageResult};
use crate::store::DocumentStore;
use parking_lot::RwLock;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Pseudo-path reported in errors raised by [`InMemoryStore`].
const MEMORY_PATH: &str = ":memory:";

/// An in-memory document store.
///
/// The document is kept as serialized JSON bytes, so a `load` goes through
/// the same codec as the file store. Suitable for:
/// - Unit tests
/// - Ephemeral databases that don't need persistence
///
/// Writes can be made to fail on demand to exercise error paths, and the
/// store counts loads and stores so tests can check whether a layer above
/// touched "disk".
///
/// # Example
///
/// ```rust
/// use tabledb_storage::{Document, DocumentStore, InMemoryStore};
///
/// let store = InMemoryStore::new();
/// assert!(!store.exists());
/// store.store(&Document::new()).unwrap();
/// assert_eq!(store.data().unwrap(), b"{}");
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    data: RwLock<Option<Vec<u8>>>,
    indent: Indent,
    fail_writes: AtomicBool,
    loads: AtomicU64,
    stores: AtomicU64,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with pre-existing raw contents.
    ///
    /// Useful for testing malformed input.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self {
            data: RwLock::new(Some(data)),
            ..Self::default()
        }
    }

    /// Creates a store holding an encoded copy of `doc`.
    ///
    /// # Panics
    ///
    /// Panics if the document cannot be encoded, which cannot happen for
    /// documents built from JSON values.
    #[must_use]
    pub fn with_document(doc: &Document) -> Self {
        let bytes = codec::encode(doc, Indent::Compact).expect("document encodes");
        Self::with_data(bytes)
    }

    /// Returns a copy of the stored bytes, if any.
    #[must_use]
    pub fn data(&self) -> Option<Vec<u8>> {
        self.data.read().clone()
    }

    /// Makes subsequent `store` calls fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of `load` calls so far.
    #[must_use]
    pub fn load_count(&self) -> u64 {
        self.loads.load(Ordering::SeqCst)
    }

    /// Number of successful `store` calls so far.
    #[must_use]
    pub fn store_count(&self) -> u64 {
        self.stores.load(Ordering::SeqCst)
    }
}

impl DocumentStore for InMemoryStore {
    fn load(&self) -> StorageResult<Document> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let data = self.data.read();
        let bytes = data.as_deref().ok_or_else(|| StorageError::Read {
            path: PathBuf::from(MEMORY_PATH),
            source: io::Error::new(io::ErrorKind::NotFound, "no document stored"),
        })?;
        codec::decode(bytes).map_err(|source| StorageError::Malformed {
            path: PathBuf::from(MEMORY_PATH),
            source,
        })
    }

    fn store(&self, doc: &Document) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Write {
                path: PathBuf::from(MEMORY_PATH),
                source: io::Error::other("injected write failure"),
            });
        }
        let bytes = codec::encode(doc, self.indent).map_err(StorageError::Encode)?;
        *self.data.write() = Some(bytes);
        self.stores.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn exists(&self) -> bool {
        self.data.read().as_ref().is_some_and(|d| !d.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_new_is_absent() {
        let store = InMemoryStore::new();
        assert!(!store.exists());
        assert!(store.data().is_none());
        assert!(matches!(store.load(), Err(StorageError::Read { .. })));
    }

    #[test]
    fn memory_store_then_load() {
        let store = InMemoryStore::new();
        let mut doc = Document::new();
        doc.insert_table("users");

        store.store(&doc).unwrap();
        assert!(store.exists());
        assert_eq!(store.load().unwrap(), doc);
        assert_eq!(store.store_count(), 1);
        assert_eq!(store.load_count(), 1);
    }

    #[test]
    fn memory_with_document() {
        let mut doc = Document::new();
        doc.insert_table("posts");
        let store = InMemoryStore::with_document(&doc);
        assert_eq!(store.load().unwrap(), doc);
    }

    #[test]
    fn memory_malformed_data() {
        let store = InMemoryStore::with_data(b"[1, 2]".to_vec());
        let err = store.load().unwrap_err();
        assert!(matches!(err, StorageError::Malformed { .. }));
    }

    #[test]
    fn memory_injected_write_failure() {
        let store = InMemoryStore::new();
        store.set_fail_writes(true);

        let err = store.store(&Document::new()).unwrap_err();
        assert!(err.is_write_error());
        assert!(!store.exists());
        assert_eq!(store.store_count(), 0);

        store.set_fail_writes(false);
        store.store(&Document::new()).unwrap();
        assert_eq!(store.store_count(), 1);
    }
}
