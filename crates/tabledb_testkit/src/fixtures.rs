//! Test fixtures and database helpers.
//!
//! Provides convenience functions for setting up test databases
//! and common test scenarios.

use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tabledb_core::{Config, Database, Record, SequentialIds};
use tempfile::TempDir;

/// A test database over a temporary file, removed on drop.
pub struct TestDatabase {
    /// The database instance.
    pub db: Database,
    /// Path of the document file.
    path: PathBuf,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: TempDir,
}

impl TestDatabase {
    /// Creates a database with caching disabled.
    pub fn direct() -> Self {
        Self::with_config(|config| config)
    }

    /// Creates a database with the write-back cache enabled.
    pub fn cached(interval: Duration) -> Self {
        Self::with_config(|config| config.cache_interval(interval))
    }

    /// Creates a database from a config tweaked by `configure`.
    ///
    /// The path is set to a file inside a fresh temporary directory and
    /// identifiers are sequential (`id-000001`, ...).
    pub fn with_config(configure: impl FnOnce(Config) -> Config) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("db.json");

        let base = Config::new(&path).id_generator(std::sync::Arc::new(SequentialIds::new("id-")));
        let mut config = configure(base);
        config.path = path.clone();

        let db = Database::open(config).expect("Failed to open test database");
        Self {
            db,
            path,
            _temp_dir: temp_dir,
        }
    }

    /// Returns the document file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the parsed file contents, or `None` if nothing was written.
    pub fn on_disk(&self) -> Option<Value> {
        read_json(&self.path)
    }

    /// Opens a second, uncached handle on the same file.
    pub fn reopen(&self) -> Database {
        Database::open(Config::new(&self.path)).expect("Failed to reopen test database")
    }
}

impl std::ops::Deref for TestDatabase {
    type Target = Database;

    fn deref(&self) -> &Self::Target {
        &self.db
    }
}

/// Reads and parses a JSON file, `None` if it is missing or empty.
pub fn read_json(path: &Path) -> Option<Value> {
    let bytes = std::fs::read(path).ok()?;
    if bytes.is_empty() {
        return None;
    }
    Some(serde_json::from_slice(&bytes).expect("File should hold valid JSON"))
}

/// Converts a `json!` object literal into a record.
///
/// # Panics
///
/// Panics if `value` is not a JSON object.
pub fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// Converts a `json!` array of objects into records.
///
/// # Panics
///
/// Panics if `value` is not an array of objects.
pub fn records(value: Value) -> Vec<Record> {
    match value {
        Value::Array(items) => items.into_iter().map(record).collect(),
        other => panic!("expected a JSON array, got {other}"),
    }
}

/// Runs a test with a temporary uncached database.
///
/// # Example
///
/// ```rust,ignore
/// use tabledb_testkit::with_temp_db;
///
/// #[test]
/// fn my_test() {
///     with_temp_db(|db| {
///         db.create(&["test"]).unwrap();
///         // ... test operations
///     });
/// }
/// ```
pub fn with_temp_db<F, R>(f: F) -> R
where
    F: FnOnce(&Database) -> R,
{
    let test_db = TestDatabase::direct();
    f(&test_db.db)
}

/// Runs a test with a temporary cached database and its file path.
pub fn with_cached_db<F, R>(interval: Duration, f: F) -> R
where
    F: FnOnce(&Database, &Path) -> R,
{
    let test_db = TestDatabase::cached(interval);
    f(&test_db.db, test_db.path())
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;
    use serde_json::json;

    /// Creates a database with a `users` table of `count` records.
    ///
    /// Record `i` has `name = "user{i}"` and `age = 18 + i % 50`.
    pub fn populated_database(count: usize) -> TestDatabase {
        let test_db = TestDatabase::direct();
        test_db.create(&["users"]).expect("Failed to create table");

        let batch = (0..count)
            .map(|i| record(json!({"name": format!("user{i}"), "age": 18 + i % 50})))
            .collect();
        test_db.insert("users", batch).expect("Failed to insert records");

        test_db
    }

    /// Creates a database with `table_count` tables of one record each.
    pub fn multi_table_database(table_count: usize) -> (TestDatabase, Vec<String>) {
        let test_db = TestDatabase::direct();
        let names: Vec<String> = (0..table_count).map(|i| format!("table_{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        test_db.create(&refs).expect("Failed to create tables");

        for (i, name) in names.iter().enumerate() {
            test_db
                .insert(name, vec![record(json!({"table": i}))])
                .expect("Failed to insert record");
        }

        (test_db, names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_database() {
        let test_db = TestDatabase::direct();
        assert!(!test_db.is_caching());
        assert!(test_db.on_disk().is_none());
    }

    #[test]
    fn test_with_temp_db() {
        with_temp_db(|db| {
            db.create(&["test"]).unwrap();
            assert!(db.has_table("test").unwrap());
        });
    }

    #[test]
    fn test_populated_scenario() {
        let test_db = scenarios::populated_database(10);
        assert_eq!(test_db.size(Some("users")).unwrap(), 10);
        assert!(test_db.on_disk().is_some());
    }

    #[test]
    fn test_multi_table_scenario() {
        let (test_db, names) = scenarios::multi_table_database(3);
        assert_eq!(test_db.tables().unwrap(), names);
    }
}
