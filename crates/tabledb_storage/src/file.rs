//! File-based document store.

use crate::codec::{self, Indent};
use crate::document::Document;
use crate::error::{StorageError, StorageResult};
use crate::store::DocumentStore;
use parking_lot::Mutex;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A document store backed by a single JSON file.
///
/// # Durability
///
/// `store()` writes the full document to a sibling temporary file, syncs it
/// and renames it over the target. Readers therefore see either the old or
/// the new document, never a torn write.
///
/// # Thread Safety
///
/// Concurrent `store()` calls are serialized by an internal lock. There is
/// no cross-process locking: two processes writing the same file lose
/// updates.
///
/// # Example
///
/// ```no_run
/// use tabledb_storage::{Document, DocumentStore, Indent, JsonFileStore};
/// use std::path::Path;
///
/// let store = JsonFileStore::new(Path::new("db.json"), Indent::Spaces(2));
/// let mut doc = Document::new();
/// doc.insert_table("users");
/// store.store(&doc).unwrap();
/// ```
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    indent: Indent,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Creates a store for the given file path.
    ///
    /// The file is not touched until the first `load` or `store`.
    #[must_use]
    pub fn new(path: &Path, indent: Indent) -> Self {
        Self {
            path: path.to_path_buf(),
            indent,
            write_lock: Mutex::new(()),
        }
    }

    /// Creates a store, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns a write error if the directories cannot be created.
    pub fn open_with_create_dirs(path: &Path, indent: Indent) -> StorageResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StorageError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        Ok(Self::new(path, indent))
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the indentation used on write.
    #[must_use]
    pub fn indent(&self) -> Indent {
        self.indent
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn write_err(&self, source: std::io::Error) -> StorageError {
        StorageError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl DocumentStore for JsonFileStore {
    fn load(&self) -> StorageResult<Document> {
        let bytes = fs::read(&self.path).map_err(|source| StorageError::Read {
            path: self.path.clone(),
            source,
        })?;
        let doc = codec::decode(&bytes).map_err(|source| StorageError::Malformed {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), tables = doc.len(), "loaded document");
        Ok(doc)
    }

    fn store(&self, doc: &Document) -> StorageResult<()> {
        let bytes = codec::encode(doc, self.indent).map_err(StorageError::Encode)?;

        let _guard = self.write_lock.lock();
        let temp_path = self.temp_path();

        let mut file = File::create(&temp_path).map_err(|e| self.write_err(e))?;
        file.write_all(&bytes).map_err(|e| self.write_err(e))?;
        file.sync_all().map_err(|e| self.write_err(e))?;
        drop(file);

        fs::rename(&temp_path, &self.path).map_err(|e| self.write_err(e))?;

        debug!(
            path = %self.path.display(),
            tables = doc.len(),
            bytes = bytes.len(),
            "stored document"
        );
        Ok(())
    }

    fn exists(&self) -> bool {
        fs::metadata(&self.path).is_ok_and(|m| m.is_file() && m.len() > 0)
    }
}
