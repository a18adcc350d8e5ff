//! # TableDB Core
//!
//! Table store for TableDB.
//!
//! This crate provides:
//! - The [`Database`] handle: tables, record CRUD and lifecycle
//! - A write-back cache with a background flusher
//! - The query engine: per-field predicates, sort, skip, limit, projection
//! - Configuration, identifier generation and operation statistics
//!
//! Persistence is delegated to [`tabledb_storage`].

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod config;
mod database;
mod error;
mod id;
pub mod query;
mod stats;

pub use config::{Config, FlushErrorHook};
pub use database::Database;
pub use error::{CoreError, CoreResult};
pub use id::{IdGenerator, SequentialIds, TimeOrderedIds};
pub use query::{Clause, Filter, Predicate, QueryOptions, SortOrder};
pub use stats::{DatabaseStats, StatsSnapshot};
pub use tabledb_storage::{Document, DocumentStore, InMemoryStore, Record, Table, ID_FIELD};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
