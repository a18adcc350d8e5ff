//! Write-back cache.
//!
//! When caching is enabled the database keeps a complete in-memory mirror of
//! the document. Reads and writes go to the mirror only; a background
//! flusher thread writes the whole mirror to the store once per interval.
//!
//! # Durability
//!
//! Data is durable up to the last successful flush. A crash between flushes
//! loses every mutation made since.
//!
//! # Thread Lifecycle
//!
//! - `start()` clears the stop flag and spawns the flusher
//! - `stop()` sets the stop flag, wakes the flusher and joins it
//! - `start()` after `stop()` resumes periodic flushing
//! - a failed tick is reported and the flusher keeps running

use crate::config::FlushErrorHook;
use crate::error::{CoreError, CoreResult};
use crate::stats::DatabaseStats;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tabledb_storage::{Document, DocumentStore, StorageResult};
use tracing::{debug, error};

/// Mirror plus its dirty flag, guarded together.
struct CacheState {
    mirror: Document,
    dirty: bool,
}

/// In-memory mirror of the document with a periodic flusher.
pub(crate) struct TableCache {
    /// Store the mirror is flushed to.
    store: Arc<dyn DocumentStore>,
    /// The authoritative document while caching is active.
    state: Mutex<CacheState>,
    /// Serializes flushes so snapshots reach the store in order.
    flush_lock: Mutex<()>,
    /// Time between flusher ticks.
    interval: Duration,
    /// Set when the flusher must exit.
    stop: Mutex<bool>,
    /// Wakes the flusher early on stop.
    wakeup: Condvar,
    /// Flusher thread handle.
    flusher: Mutex<Option<JoinHandle<()>>>,
    stats: Arc<DatabaseStats>,
    on_flush_error: Option<FlushErrorHook>,
}

impl TableCache {
    /// Creates a cache seeded with `seed`. The flusher is not started.
    pub(crate) fn new(
        store: Arc<dyn DocumentStore>,
        seed: Document,
        interval: Duration,
        stats: Arc<DatabaseStats>,
        on_flush_error: Option<FlushErrorHook>,
    ) -> Self {
        Self {
            store,
            state: Mutex::new(CacheState {
                mirror: seed,
                dirty: false,
            }),
            flush_lock: Mutex::new(()),
            interval,
            stop: Mutex::new(false),
            wakeup: Condvar::new(),
            flusher: Mutex::new(None),
            stats,
            on_flush_error,
        }
    }

    /// Starts the background flusher. Also restarts it after `stop`.
    pub(crate) fn start(self: &Arc<Self>) -> CoreResult<()> {
        *self.stop.lock() = false;
        let cache = Arc::clone(self);
        let handle = thread::Builder::new()
            .name("tabledb-flush".into())
            .spawn(move || cache.run())?;

        *self.flusher.lock() = Some(handle);
        debug!(interval_ms = self.interval.as_millis() as u64, "cache flusher started");
        Ok(())
    }

    /// Stops the flusher and waits for it to exit. Does not flush.
    pub(crate) fn stop(&self) {
        *self.stop.lock() = true;
        self.wakeup.notify_all();

        let handle = self.flusher.lock().take();
        if let Some(handle) = handle {
            // A flush error hook may close the database from the flusher itself.
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
            debug!("cache flusher stopped");
        }
    }

    /// Runs `f` against the mirror.
    pub(crate) fn read<T>(&self, f: impl FnOnce(&Document) -> CoreResult<T>) -> CoreResult<T> {
        let state = self.state.lock();
        f(&state.mirror)
    }

    /// Runs `f` against the mirror, marking it dirty if `f` succeeds.
    pub(crate) fn write<T>(
        &self,
        f: impl FnOnce(&mut Document) -> CoreResult<T>,
    ) -> CoreResult<T> {
        let mut state = self.state.lock();
        let result = f(&mut state.mirror)?;
        state.dirty = true;
        Ok(result)
    }

    /// Returns `true` if the mirror has changes not yet flushed.
    pub(crate) fn is_dirty(&self) -> bool {
        self.state.lock().dirty
    }

    /// Writes a snapshot of the mirror to the store if it is dirty.
    ///
    /// Returns `true` if a write happened. On failure the mirror stays
    /// dirty, so the next flush writes it again.
    pub(crate) fn flush(&self) -> StorageResult<bool> {
        let _serial = self.flush_lock.lock();

        let snapshot = {
            let mut state = self.state.lock();
            if !state.dirty {
                return Ok(false);
            }
            state.dirty = false;
            state.mirror.clone()
        };

        if let Err(e) = self.store.store(&snapshot) {
            self.state.lock().dirty = true;
            return Err(e);
        }

        self.stats.record_flush();
        debug!(tables = snapshot.len(), "flushed cache");
        Ok(true)
    }

    /// Flusher loop: sleep one interval, flush, repeat until stopped.
    fn run(&self) {
        loop {
            let deadline = Instant::now() + self.interval;
            {
                let mut stop = self.stop.lock();
                while !*stop {
                    if self.wakeup.wait_until(&mut stop, deadline).timed_out() {
                        break;
                    }
                }
                if *stop {
                    break;
                }
            }
            self.tick();
        }
    }

    fn tick(&self) {
        if let Err(source) = self.flush() {
            self.stats.record_flush_failure();
            let err = CoreError::Flush { source };
            error!(error = %err, "background flush failed");
            if let Some(hook) = &self.on_flush_error {
                hook(&err);
            }
        }
    }
}

impl std::fmt::Debug for TableCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableCache")
            .field("interval", &self.interval)
            .field("dirty", &self.is_dirty())
            .field("running", &self.flusher.lock().is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tabledb_storage::InMemoryStore;

    fn cache_over(store: &Arc<InMemoryStore>, interval: Duration) -> Arc<TableCache> {
        let store: Arc<dyn DocumentStore> = Arc::clone(store) as Arc<dyn DocumentStore>;
        Arc::new(TableCache::new(
            store,
            Document::new(),
            interval,
            Arc::new(DatabaseStats::new()),
            None,
        ))
    }

    fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn writes_stay_in_memory_until_flush() {
        let store = Arc::new(InMemoryStore::new());
        let cache = cache_over(&store, Duration::from_secs(60));

        cache
            .write(|doc| {
                doc.insert_table("users");
                Ok(())
            })
            .unwrap();

        assert!(cache.is_dirty());
        assert!(!store.exists());

        assert!(cache.flush().unwrap());
        assert!(!cache.is_dirty());
        assert!(store.load().unwrap().contains("users"));
    }

    #[test]
    fn clean_mirror_is_not_written() {
        let store = Arc::new(InMemoryStore::new());
        let cache = cache_over(&store, Duration::from_secs(60));

        assert!(!cache.flush().unwrap());
        assert_eq!(store.store_count(), 0);
    }

    #[test]
    fn failed_write_closure_leaves_mirror_clean() {
        let store = Arc::new(InMemoryStore::new());
        let cache = cache_over(&store, Duration::from_secs(60));

        let result: CoreResult<()> = cache.write(|_| Err(CoreError::table_not_found("x")));
        assert!(result.is_err());
        assert!(!cache.is_dirty());
    }

    #[test]
    fn failed_flush_keeps_mirror_dirty() {
        let store = Arc::new(InMemoryStore::new());
        let cache = cache_over(&store, Duration::from_secs(60));
        cache
            .write(|doc| {
                doc.insert_table("t");
                Ok(())
            })
            .unwrap();

        store.set_fail_writes(true);
        assert!(cache.flush().is_err());
        assert!(cache.is_dirty());

        store.set_fail_writes(false);
        assert!(cache.flush().unwrap());
        assert!(store.load().unwrap().contains("t"));
    }

    #[test]
    fn flusher_writes_on_tick() {
        let store = Arc::new(InMemoryStore::new());
        let cache = cache_over(&store, Duration::from_millis(10));
        cache.start().unwrap();

        cache
            .write(|doc| {
                doc.insert_table("ticked");
                Ok(())
            })
            .unwrap();

        assert!(wait_for(|| store.exists()));
        assert!(store.load().unwrap().contains("ticked"));
        cache.stop();
    }

    #[test]
    fn flusher_survives_failed_ticks() {
        let store = Arc::new(InMemoryStore::new());
        let failures = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&failures);
        let hook: FlushErrorHook = Arc::new(move |err: &CoreError| {
            assert!(matches!(err, CoreError::Flush { .. }));
            seen.fetch_add(1, Ordering::SeqCst);
        });
        let stats = Arc::new(DatabaseStats::new());
        let cache = Arc::new(TableCache::new(
            Arc::clone(&store) as Arc<dyn DocumentStore>,
            Document::new(),
            Duration::from_millis(10),
            Arc::clone(&stats),
            Some(hook),
        ));

        store.set_fail_writes(true);
        cache.start().unwrap();
        cache
            .write(|doc| {
                doc.insert_table("retry");
                Ok(())
            })
            .unwrap();

        assert!(wait_for(|| failures.load(Ordering::SeqCst) >= 2));
        assert!(stats.flush_failures() >= 2);

        store.set_fail_writes(false);
        assert!(wait_for(|| store.exists()));
        assert!(store.load().unwrap().contains("retry"));
        cache.stop();
    }

    #[test]
    fn stop_is_prompt_and_idempotent() {
        let store = Arc::new(InMemoryStore::new());
        let cache = cache_over(&store, Duration::from_secs(3600));
        cache.start().unwrap();

        let started = Instant::now();
        cache.stop();
        cache.stop();
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn restart_after_stop_resumes_ticks() {
        let store = Arc::new(InMemoryStore::new());
        let cache = cache_over(&store, Duration::from_millis(10));
        cache.start().unwrap();
        cache.stop();

        cache
            .write(|doc| {
                doc.insert_table("late");
                Ok(())
            })
            .unwrap();
        cache.start().unwrap();

        assert!(wait_for(|| store.exists()));
        assert!(store.load().unwrap().contains("late"));
        cache.stop();
    }
}
