//! Database statistics.
//!
//! Counters for monitoring how a database handle is used and how its
//! write-back cache behaves.
//!
//! # Usage
//!
//! ```rust,ignore
//! let db = Database::open(Config::new("db.json"))?;
//! db.create(&["users"])?;
//!
//! let stats = db.stats();
//! println!("Reads: {}", stats.reads);
//! println!("Flush failures: {}", stats.flush_failures);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Database statistics.
///
/// All counters are atomic and can be read while operations are in progress.
/// Values are monotonically increasing.
#[derive(Debug, Default)]
pub struct DatabaseStats {
    // Operation counters
    /// Number of read operations (find, find_first, count, size).
    reads: AtomicU64,
    /// Number of records inserted.
    inserts: AtomicU64,
    /// Number of records modified by update.
    updates: AtomicU64,
    /// Number of records removed by delete or delete_first.
    deletes: AtomicU64,

    // Persistence counters
    /// Number of synchronous document writes (cache disabled).
    stores: AtomicU64,
    /// Number of successful cache flushes.
    flushes: AtomicU64,
    /// Number of failed cache flushes.
    flush_failures: AtomicU64,
}

impl DatabaseStats {
    /// Creates a new stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_read(&self) {
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_inserts(&self, count: u64) {
        self.inserts.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_updates(&self, count: u64) {
        self.updates.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_deletes(&self, count: u64) {
        self.deletes.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_store(&self) {
        self.stores.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_flush(&self) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_flush_failure(&self) {
        self.flush_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of read operations.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Returns the number of records inserted.
    pub fn inserts(&self) -> u64 {
        self.inserts.load(Ordering::Relaxed)
    }

    /// Returns the number of records modified by update.
    pub fn updates(&self) -> u64 {
        self.updates.load(Ordering::Relaxed)
    }

    /// Returns the number of records removed.
    pub fn deletes(&self) -> u64 {
        self.deletes.load(Ordering::Relaxed)
    }

    /// Returns the number of synchronous document writes.
    pub fn stores(&self) -> u64 {
        self.stores.load(Ordering::Relaxed)
    }

    /// Returns the number of successful cache flushes.
    pub fn flushes(&self) -> u64 {
        self.flushes.load(Ordering::Relaxed)
    }

    /// Returns the number of failed cache flushes.
    pub fn flush_failures(&self) -> u64 {
        self.flush_failures.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of all stats.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            reads: self.reads(),
            inserts: self.inserts(),
            updates: self.updates(),
            deletes: self.deletes(),
            stores: self.stores(),
            flushes: self.flushes(),
            flush_failures: self.flush_failures(),
        }
    }
}

/// A point-in-time snapshot of database statistics.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Number of read operations.
    pub reads: u64,
    /// Number of records inserted.
    pub inserts: u64,
    /// Number of records modified by update.
    pub updates: u64,
    /// Number of records removed.
    pub deletes: u64,
    /// Number of synchronous document writes.
    pub stores: u64,
    /// Number of successful cache flushes.
    pub flushes: u64,
    /// Number of failed cache flushes.
    pub flush_failures: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stats_are_zero() {
        let stats = DatabaseStats::new();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn record_operations() {
        let stats = DatabaseStats::new();

        stats.record_read();
        stats.record_read();
        stats.record_inserts(3);
        stats.record_updates(2);
        stats.record_deletes(1);
        stats.record_store();

        let snap = stats.snapshot();
        assert_eq!(snap.reads, 2);
        assert_eq!(snap.inserts, 3);
        assert_eq!(snap.updates, 2);
        assert_eq!(snap.deletes, 1);
        assert_eq!(snap.stores, 1);
    }

    #[test]
    fn concurrent_flush_counters() {
        use std::sync::Arc;
        use std::thread;

        let stats = Arc::new(DatabaseStats::new());
        let mut handles = vec![];

        for _ in 0..8 {
            let s = Arc::clone(&stats);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    s.record_flush();
                    s.record_flush_failure();
                }
            }));
        }

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(stats.flushes(), 800);
        assert_eq!(stats.flush_failures(), 800);
    }
}
