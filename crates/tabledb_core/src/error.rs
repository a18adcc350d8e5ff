//! Error types for TableDB core.

use std::io;
use tabledb_storage::StorageError;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in TableDB core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage engine error (read or write).
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// I/O error outside the storage engine.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The operation named a table that has not been created.
    #[error("table not found: {name}")]
    TableNotFound {
        /// Name of the table.
        name: String,
    },

    /// A background flush of the cache failed.
    ///
    /// Never returned from a client call; delivered to the flush error
    /// callback instead.
    #[error("cache flush failed: {source}")]
    Flush {
        /// The storage failure that aborted the flush.
        #[source]
        source: StorageError,
    },

    /// The identifier generator kept producing identifiers already in use.
    #[error("identifier generator produced duplicate id {id} in table {table}")]
    IdCollision {
        /// Table being inserted into.
        table: String,
        /// The last duplicate identifier.
        id: String,
    },

    /// The configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },

    /// Database is closed.
    #[error("database is closed")]
    DatabaseClosed,
}

impl CoreError {
    /// Creates a table not found error.
    pub fn table_not_found(name: impl Into<String>) -> Self {
        Self::TableNotFound { name: name.into() }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Returns `true` if this wraps a storage read failure.
    #[must_use]
    pub fn is_storage_read(&self) -> bool {
        matches!(self, Self::Storage(e) if e.is_read_error())
    }

    /// Returns `true` if this wraps a storage write failure.
    #[must_use]
    pub fn is_storage_write(&self) -> bool {
        matches!(self, Self::Storage(e) | Self::Flush { source: e } if e.is_write_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn table_not_found_message() {
        let err = CoreError::table_not_found("users");
        assert_eq!(err.to_string(), "table not found: users");
    }

    #[test]
    fn storage_families() {
        let read: CoreError = StorageError::Read {
            path: PathBuf::from("db.json"),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        }
        .into();
        assert!(read.is_storage_read());
        assert!(!read.is_storage_write());

        let flush = CoreError::Flush {
            source: StorageError::Write {
                path: PathBuf::from("db.json"),
                source: io::Error::other("disk full"),
            },
        };
        assert!(flush.is_storage_write());
        assert!(flush.to_string().contains("disk full"));
    }
}
