//! # TableDB Storage
//!
//! Storage engine for TableDB.
//!
//! This crate provides the lowest layer of TableDB: the in-memory
//! [`Document`] model (named tables of schemaless JSON records) and the
//! stores that persist a whole document at once.
//!
//! ## Design Principles
//!
//! - A store reads and writes the **entire** document in one pass
//! - No partial writes, no appends, no diffing
//! - Stores must be `Send + Sync` so a background flusher can share them
//! - Stores never retry; every failure is reported to the caller
//!
//! ## Available Stores
//!
//! - [`JsonFileStore`] - Persists the document as one JSON file
//! - [`InMemoryStore`] - For testing, with write-failure injection
//!
//! ## Example
//!
//! ```rust
//! use tabledb_storage::{Document, DocumentStore, InMemoryStore};
//!
//! let store = InMemoryStore::new();
//! let mut doc = Document::new();
//! doc.insert_table("users");
//! store.store(&doc).unwrap();
//! assert_eq!(store.load().unwrap(), doc);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod codec;
mod document;
mod error;
mod file;
mod memory;
mod store;

pub use codec::{decode, encode, Indent};
pub use document::{Document, Record, Table, ID_FIELD};
pub use error::{StorageError, StorageResult};
pub use file::JsonFileStore;
pub use memory::InMemoryStore;
pub use store::DocumentStore;
