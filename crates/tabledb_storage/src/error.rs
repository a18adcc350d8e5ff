//! Error types for storage operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
///
/// The variants fall into two families: read errors ([`StorageError::Read`],
/// [`StorageError::Malformed`]) and write errors ([`StorageError::Write`],
/// [`StorageError::Encode`]).
#[derive(Debug, Error)]
pub enum StorageError {
    /// The document could not be read.
    #[error("failed to read document at {}: {source}", .path.display())]
    Read {
        /// Location of the document.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The document is not valid JSON or does not have the table shape.
    #[error("malformed document at {}: {source}", .path.display())]
    Malformed {
        /// Location of the document.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// The document could not be written.
    #[error("failed to write document at {}: {source}", .path.display())]
    Write {
        /// Location of the document.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The document could not be serialized.
    #[error("failed to encode document: {0}")]
    Encode(#[source] serde_json::Error),
}

impl StorageError {
    /// Returns `true` for errors raised while loading a document.
    #[must_use]
    pub fn is_read_error(&self) -> bool {
        matches!(self, Self::Read { .. } | Self::Malformed { .. })
    }

    /// Returns `true` for errors raised while storing a document.
    #[must_use]
    pub fn is_write_error(&self) -> bool {
        matches!(self, Self::Write { .. } | Self::Encode(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_families() {
        let read = StorageError::Read {
            path: PathBuf::from("db.json"),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        };
        assert!(read.is_read_error());
        assert!(!read.is_write_error());

        let write = StorageError::Write {
            path: PathBuf::from("db.json"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(write.is_write_error());
        assert!(!write.is_read_error());
    }

    #[test]
    fn display_includes_path() {
        let err = StorageError::Read {
            path: PathBuf::from("data/db.json"),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        };
        let msg = err.to_string();
        assert!(msg.contains("data/db.json"));
        assert!(msg.contains("missing"));
    }
}
