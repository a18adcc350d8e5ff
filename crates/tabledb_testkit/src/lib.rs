//! # TableDB Testkit
//!
//! Test utilities for TableDB.
//!
//! This crate provides:
//! - Test fixtures backed by temporary files
//! - Property-based test generators using proptest
//! - Cross-crate integration test helpers
//! - Concurrency stress utilities
//! - Test logging setup
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tabledb_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_database() {
//!     with_temp_db(|db| {
//!         db.create(&["users"]).unwrap();
//!         // ... test operations
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod integration;
pub mod logging;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
    pub use crate::logging::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use integration::*;
pub use logging::*;
pub use stress::*;
