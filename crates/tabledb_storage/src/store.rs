//! Document store trait definition.

use crate::document::Document;
use crate::error::StorageResult;

/// Whole-document persistence for TableDB.
///
/// A store holds exactly one [`Document`]. Every `store` call replaces the
/// persisted state with the given document; there is no incremental write.
///
/// # Invariants
///
/// - `load` after a successful `store(doc)` returns a document equal to `doc`
/// - `store` either replaces the whole document or fails without a partial write
/// - Stores must be `Send + Sync` so a background flusher can share them
///
/// # Implementors
///
/// - [`super::JsonFileStore`] - For persistent storage
/// - [`super::InMemoryStore`] - For testing
pub trait DocumentStore: Send + Sync {
    /// Reads and parses the whole document.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The document is missing or cannot be read
    /// - The contents are not a JSON object of record arrays
    fn load(&self) -> StorageResult<Document>;

    /// Serializes and writes the whole document.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    fn store(&self, doc: &Document) -> StorageResult<()>;

    /// Returns `true` if a persisted document is present.
    ///
    /// An empty file counts as absent.
    fn exists(&self) -> bool;
}
