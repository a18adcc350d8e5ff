//! Database facade.

use crate::cache::TableCache;
use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::id::{IdGenerator, TimeOrderedIds};
use crate::query::{self, Filter, QueryOptions};
use crate::stats::{DatabaseStats, StatsSnapshot};
use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tabledb_storage::{Document, DocumentStore, JsonFileStore, Record, Table, ID_FIELD};
use tracing::{debug, warn};

/// Attempts per record before an identifier collision is reported.
const MAX_ID_ATTEMPTS: usize = 8;

/// Where the current document lives.
enum Backing {
    /// Every operation loads from the store; mutations store before returning.
    Direct {
        store: Arc<dyn DocumentStore>,
        create_if_missing: bool,
        /// Serializes load-modify-store sequences.
        lock: Mutex<()>,
    },
    /// The document lives in a write-back cache.
    Cached(Arc<TableCache>),
}

impl Backing {
    fn read<T>(&self, f: impl FnOnce(&Document) -> CoreResult<T>) -> CoreResult<T> {
        match self {
            Self::Direct {
                store,
                create_if_missing,
                lock,
            } => {
                let _guard = lock.lock();
                let doc = load_document(store.as_ref(), *create_if_missing)?;
                f(&doc)
            }
            Self::Cached(cache) => cache.read(f),
        }
    }

    fn write<T>(
        &self,
        stats: &DatabaseStats,
        f: impl FnOnce(&mut Document) -> CoreResult<T>,
    ) -> CoreResult<T> {
        match self {
            Self::Direct {
                store,
                create_if_missing,
                lock,
            } => {
                let _guard = lock.lock();
                let mut doc = load_document(store.as_ref(), *create_if_missing)?;
                let result = f(&mut doc)?;
                store.store(&doc)?;
                stats.record_store();
                Ok(result)
            }
            Self::Cached(cache) => cache.write(f),
        }
    }
}

/// Loads the document, treating an absent one as empty when allowed.
fn load_document(store: &dyn DocumentStore, create_if_missing: bool) -> CoreResult<Document> {
    if create_if_missing && !store.exists() {
        return Ok(Document::new());
    }
    Ok(store.load()?)
}

fn table<'a>(doc: &'a Document, name: &str) -> CoreResult<&'a Table> {
    doc.table(name)
        .ok_or_else(|| CoreError::table_not_found(name))
}

fn table_mut<'a>(doc: &'a mut Document, name: &str) -> CoreResult<&'a mut Table> {
    doc.table_mut(name)
        .ok_or_else(|| CoreError::table_not_found(name))
}

/// The main database handle.
///
/// A `Database` owns one JSON document file made of named tables. Each
/// table is an ordered list of schemaless records, and every record carries
/// an immutable `_id` assigned at insert time.
///
/// # Persistence Modes
///
/// Without a cache interval every operation reads the file, and every
/// mutation rewrites the whole file before returning. With
/// [`Config::cache_interval`] set, the document is mirrored in memory and a
/// background thread writes it out once per interval; mutations made since
/// the last flush are lost if the process dies.
///
/// # Example
///
/// ```rust,no_run
/// use serde_json::json;
/// use tabledb_core::{Config, Database, Filter, QueryOptions};
///
/// let db = Database::open(Config::new("app.json"))?;
/// db.create(&["users"])?;
///
/// let tom = json!({"name": "Tom", "age": 19}).as_object().cloned().unwrap();
/// db.insert("users", vec![tom])?;
///
/// let adults = db.find(
///     "users",
///     &Filter::new().field("age", |v| v.and_then(|v| v.as_i64()) >= Some(18)),
///     Some(&QueryOptions::new().asc("name").project(["name"])),
/// )?;
/// assert_eq!(adults.len(), 1);
///
/// db.close()?;
/// # Ok::<(), tabledb_core::CoreError>(())
/// ```
pub struct Database {
    /// Configuration.
    config: Config,
    /// Store or cache holding the document.
    backing: Backing,
    /// Source of record identifiers.
    ids: Arc<dyn IdGenerator>,
    /// Operation counters.
    stats: Arc<DatabaseStats>,
    /// Whether the database is open. Operations hold a read guard for
    /// their whole duration.
    is_open: RwLock<bool>,
    /// Serializes `close` calls.
    close_lock: Mutex<()>,
}

impl Database {
    /// Opens the document file named by `config.path`.
    ///
    /// Parent directories are created as needed. The file itself is created
    /// on the first write.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for an unusable configuration, or a storage
    /// error if the existing file cannot be read or parsed.
    pub fn open(config: Config) -> CoreResult<Self> {
        config.validate()?;
        let store = JsonFileStore::open_with_create_dirs(&config.path, config.indent())?;
        Self::open_with_store(config, Arc::new(store))
    }

    /// Opens a database over an arbitrary document store.
    ///
    /// `config.path` is informational here; `config.json_spaces` only
    /// applies if the store honors it.
    ///
    /// # Errors
    ///
    /// Same as [`Database::open`].
    pub fn open_with_store(config: Config, store: Arc<dyn DocumentStore>) -> CoreResult<Self> {
        config.validate()?;

        let stats = Arc::new(DatabaseStats::new());
        let ids = config
            .id_generator
            .clone()
            .unwrap_or_else(|| Arc::new(TimeOrderedIds));

        // Loading once up front surfaces unreadable files at open time.
        let seed = load_document(store.as_ref(), config.create_if_missing)?;

        let backing = match config.cache_interval {
            Some(interval) => {
                let cache = Arc::new(TableCache::new(
                    store,
                    seed,
                    interval,
                    Arc::clone(&stats),
                    config.on_flush_error.clone(),
                ));
                cache.start()?;
                Backing::Cached(cache)
            }
            None => Backing::Direct {
                store,
                create_if_missing: config.create_if_missing,
                lock: Mutex::new(()),
            },
        };

        debug!(
            path = %config.path.display(),
            caching = config.is_caching(),
            "opened database"
        );

        Ok(Self {
            config,
            backing,
            ids,
            stats,
            is_open: RwLock::new(true),
            close_lock: Mutex::new(()),
        })
    }

    // ========================================================================
    // Tables
    // ========================================================================

    /// Creates each named table that does not exist yet.
    ///
    /// Existing tables are left untouched.
    pub fn create(&self, tables: &[&str]) -> CoreResult<()> {
        let _open = self.ensure_open()?;
        self.backing.write(&self.stats, |doc| {
            for name in tables {
                if doc.insert_table(name) {
                    debug!(table = name, "created table");
                }
            }
            Ok(())
        })
    }

    /// Removes each named table. Missing names are ignored.
    pub fn drop(&self, tables: &[&str]) -> CoreResult<()> {
        let _open = self.ensure_open()?;
        self.backing.write(&self.stats, |doc| {
            for name in tables {
                if doc.remove_table(name).is_some() {
                    debug!(table = name, "dropped table");
                }
            }
            Ok(())
        })
    }

    /// Removes every record from each named table, keeping the tables.
    ///
    /// # Errors
    ///
    /// Returns `TableNotFound` if any name is missing; no table is cleared
    /// in that case.
    pub fn clear(&self, tables: &[&str]) -> CoreResult<()> {
        let _open = self.ensure_open()?;
        self.backing.write(&self.stats, |doc| {
            if let Some(missing) = tables.iter().find(|name| !doc.contains(name)) {
                return Err(CoreError::table_not_found(*missing));
            }
            for name in tables {
                table_mut(doc, name)?.clear();
            }
            Ok(())
        })
    }

    /// Returns the number of tables, or the number of records in `table`.
    pub fn size(&self, table: Option<&str>) -> CoreResult<usize> {
        let _open = self.ensure_open()?;
        self.stats.record_read();
        self.backing.read(|doc| match table {
            Some(name) => Ok(self::table(doc, name)?.len()),
            None => Ok(doc.len()),
        })
    }

    /// Returns the table names in document order.
    pub fn tables(&self) -> CoreResult<Vec<String>> {
        let _open = self.ensure_open()?;
        self.backing.read(|doc| Ok(doc.table_names()))
    }

    /// Returns `true` if the table exists.
    pub fn has_table(&self, name: &str) -> CoreResult<bool> {
        let _open = self.ensure_open()?;
        self.backing.read(|doc| Ok(doc.contains(name)))
    }

    // ========================================================================
    // Records
    // ========================================================================

    /// Appends records to `table` and returns the table's full contents.
    ///
    /// Each record gets a fresh `_id` as its first field; any `_id` the
    /// caller supplied is discarded.
    pub fn insert(&self, table: &str, records: Vec<Record>) -> CoreResult<Vec<Record>> {
        let _open = self.ensure_open()?;
        let count = records.len() as u64;

        let contents = self.backing.write(&self.stats, |doc| {
            let target = table_mut(doc, table)?;
            let mut taken: HashSet<String> = target
                .records()
                .iter()
                .filter_map(|r| r.get(ID_FIELD).and_then(Value::as_str))
                .map(str::to_owned)
                .collect();

            let mut stamped = Vec::with_capacity(records.len());
            for record in records {
                let id = self.fresh_id(table, &mut taken)?;
                stamped.push(stamp(record, id));
            }
            target.records_mut().extend(stamped);
            Ok(target.records().to_vec())
        })?;

        self.stats.record_inserts(count);
        debug!(table, count, "inserted records");
        Ok(contents)
    }

    /// Returns the records of `table` matching `filter`, shaped by `options`.
    pub fn find(
        &self,
        table: &str,
        filter: &Filter,
        options: Option<&QueryOptions>,
    ) -> CoreResult<Vec<Record>> {
        let _open = self.ensure_open()?;
        self.stats.record_read();
        self.backing.read(|doc| {
            let source = self::table(doc, table)?;
            Ok(query::select(source.records(), filter, options))
        })
    }

    /// Returns the first record [`Database::find`] would return.
    pub fn find_first(
        &self,
        table: &str,
        filter: &Filter,
        options: Option<&QueryOptions>,
    ) -> CoreResult<Option<Record>> {
        if options.is_some() {
            return Ok(self.find(table, filter, options)?.into_iter().next());
        }

        let _open = self.ensure_open()?;
        self.stats.record_read();
        self.backing.read(|doc| {
            let source = self::table(doc, table)?;
            Ok(source.records().iter().find(|r| filter.matches(r)).cloned())
        })
    }

    /// Returns the number of records [`Database::find`] would return.
    pub fn count(
        &self,
        table: &str,
        filter: &Filter,
        options: Option<&QueryOptions>,
    ) -> CoreResult<usize> {
        if options.is_some() {
            return Ok(self.find(table, filter, options)?.len());
        }

        let _open = self.ensure_open()?;
        self.stats.record_read();
        self.backing.read(|doc| {
            let source = self::table(doc, table)?;
            Ok(source.records().iter().filter(|r| filter.matches(r)).count())
        })
    }

    /// Merges `partial` into every record matching `filter`.
    ///
    /// Fields present in `partial` overwrite or extend the record; other
    /// fields are kept. An `_id` key in `partial` is ignored. Returns the
    /// table's full contents after the update.
    pub fn update(&self, table: &str, filter: &Filter, partial: Record) -> CoreResult<Vec<Record>> {
        let _open = self.ensure_open()?;

        let partial: Record = partial
            .into_iter()
            .filter(|(field, _)| {
                let is_id = field == ID_FIELD;
                if is_id {
                    warn!(table, "ignoring _id in update");
                }
                !is_id
            })
            .collect();

        let (updated, contents) = self.backing.write(&self.stats, |doc| {
            let target = table_mut(doc, table)?;
            let mut updated = 0u64;
            for record in target.records_mut() {
                if !filter.matches(record) {
                    continue;
                }
                for (field, value) in &partial {
                    record.insert(field.clone(), value.clone());
                }
                updated += 1;
            }
            Ok((updated, target.records().to_vec()))
        })?;

        self.stats.record_updates(updated);
        debug!(table, updated, "updated records");
        Ok(contents)
    }

    /// Removes every record matching `filter` and returns how many went.
    pub fn delete(&self, table: &str, filter: &Filter) -> CoreResult<usize> {
        let _open = self.ensure_open()?;
        let removed = self.backing.write(&self.stats, |doc| {
            let records = table_mut(doc, table)?.records_mut();
            let before = records.len();
            records.retain(|r| !filter.matches(r));
            Ok(before - records.len())
        })?;

        self.stats.record_deletes(removed as u64);
        debug!(table, removed, "deleted records");
        Ok(removed)
    }

    /// Removes the first record matching `filter` in table order.
    ///
    /// Returns `1` if a record was removed, `0` otherwise.
    pub fn delete_first(&self, table: &str, filter: &Filter) -> CoreResult<usize> {
        let _open = self.ensure_open()?;
        let removed = self.backing.write(&self.stats, |doc| {
            let records = table_mut(doc, table)?.records_mut();
            match records.iter().position(|r| filter.matches(r)) {
                Some(index) => {
                    records.remove(index);
                    Ok(1)
                }
                None => Ok(0),
            }
        })?;

        self.stats.record_deletes(removed as u64);
        Ok(removed)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Writes the cached document to disk now.
    ///
    /// A no-op when caching is disabled, since every mutation is already
    /// on disk.
    pub fn flush(&self) -> CoreResult<()> {
        let _open = self.ensure_open()?;
        if let Backing::Cached(cache) = &self.backing {
            cache.flush()?;
        }
        Ok(())
    }

    /// Closes the database.
    ///
    /// Stops the background flusher and writes any buffered mutations.
    /// Later operations fail with `DatabaseClosed`. Closing twice is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// If the final flush fails the error is returned, the flusher is
    /// restarted and the database stays open, so `flush` or `close` can be
    /// retried.
    pub fn close(&self) -> CoreResult<()> {
        self.shutdown(true)
    }

    /// Closes the database, optionally reopening it when the final flush
    /// fails.
    ///
    /// The open flag is cleared before the flusher is joined. A flush error
    /// hook calling back into the database then gets `DatabaseClosed`
    /// instead of waiting on a closer that is waiting on it.
    fn shutdown(&self, reopen_on_failure: bool) -> CoreResult<()> {
        // A hook closing the database from the flusher returns here.
        if !self.is_open() {
            return Ok(());
        }
        let _closing = self.close_lock.lock();
        {
            // Waits for in-flight operations to finish.
            let mut is_open = self.is_open.write();
            if !*is_open {
                return Ok(());
            }
            *is_open = false;
        }

        if let Backing::Cached(cache) = &self.backing {
            cache.stop();
            if let Err(e) = cache.flush() {
                if reopen_on_failure {
                    cache.start()?;
                    *self.is_open.write() = true;
                }
                return Err(e.into());
            }
        }

        debug!(path = %self.config.path.display(), "closed database");
        Ok(())
    }

    /// Checks if the database is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        *self.is_open.read()
    }

    /// Ensures the database is open, keeping it open while the guard lives.
    fn ensure_open(&self) -> CoreResult<RwLockReadGuard<'_, bool>> {
        let guard = self.is_open.read();
        if *guard {
            Ok(guard)
        } else {
            Err(CoreError::DatabaseClosed)
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Returns a snapshot of the operation counters.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Returns `true` if the write-back cache is active.
    #[must_use]
    pub fn is_caching(&self) -> bool {
        matches!(self.backing, Backing::Cached(_))
    }

    /// Returns database configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the document file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    fn fresh_id(&self, table: &str, taken: &mut HashSet<String>) -> CoreResult<String> {
        let mut id = self.ids.new_id();
        for _ in 1..MAX_ID_ATTEMPTS {
            if taken.insert(id.clone()) {
                return Ok(id);
            }
            id = self.ids.new_id();
        }
        if taken.insert(id.clone()) {
            return Ok(id);
        }
        Err(CoreError::IdCollision {
            table: table.to_string(),
            id,
        })
    }
}

/// Builds the stored form of a record: `id` first, then the caller's fields.
fn stamp(record: Record, id: String) -> Record {
    let mut stamped = Record::with_capacity(record.len() + 1);
    stamped.insert(ID_FIELD.to_string(), Value::String(id));
    stamped.extend(record.into_iter().filter(|(field, _)| field != ID_FIELD));
    stamped
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.config.path)
            .field("is_open", &self.is_open())
            .field("is_caching", &self.is_caching())
            .finish_non_exhaustive()
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown(false) {
            warn!(error = %e, "failed to close database on drop");
        }
    }
}
