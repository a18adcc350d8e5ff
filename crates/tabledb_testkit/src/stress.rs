//! Stress tests for TableDB.
//!
//! These tests verify behavior under concurrent access. Every public
//! operation is serialized, so concurrent writers must never lose a record.

use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tabledb_core::{Database, Filter, Record};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of operations per thread.
    pub operations: usize,
    /// Number of concurrent threads.
    pub threads: usize,
    /// Table the operations target.
    pub table: String,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 200,
            threads: 4,
            table: "stress".to_string(),
        }
    }
}

fn stress_record(thread: usize, op: usize) -> Record {
    match json!({"thread": thread, "op": op}) {
        serde_json::Value::Object(map) => map,
        _ => Record::new(),
    }
}

/// Runs single-record inserts from several threads at once.
///
/// The table is created if needed.
///
/// # Panics
///
/// Panics if the table cannot be created, for example on a closed database.
pub fn stress_concurrent_inserts(db: Arc<Database>, config: &StressConfig) -> StressTestResult {
    db.create(&[config.table.as_str()])
        .expect("Failed to create stress table");

    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let db = Arc::clone(&db);
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let table = config.table.clone();
            let ops = config.operations;

            thread::spawn(move || {
                for op in 0..ops {
                    match db.insert(&table, vec![stress_record(t, op)]) {
                        Ok(_) => successful.fetch_add(1, Ordering::Relaxed),
                        Err(_) => failed.fetch_add(1, Ordering::Relaxed),
                    };
                }
            })
        })
        .collect();

    for handle in handles {
        let _ = handle.join();
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

/// Runs readers and an updater/deleter concurrently against one table.
///
/// Readers count records while one thread updates and deletes; every call
/// must succeed.
pub fn stress_mixed_operations(db: Arc<Database>, config: &StressConfig) -> StressTestResult {
    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let start = Instant::now();

    let mut handles = Vec::with_capacity(config.threads + 1);
    for _ in 0..config.threads {
        let db = Arc::clone(&db);
        let successful = Arc::clone(&successful);
        let failed = Arc::clone(&failed);
        let table = config.table.clone();
        let ops = config.operations;

        handles.push(thread::spawn(move || {
            for _ in 0..ops {
                match db.count(&table, &Filter::all(), None) {
                    Ok(_) => successful.fetch_add(1, Ordering::Relaxed),
                    Err(_) => failed.fetch_add(1, Ordering::Relaxed),
                };
            }
        }));
    }

    {
        let db = Arc::clone(&db);
        let successful = Arc::clone(&successful);
        let failed = Arc::clone(&failed);
        let table = config.table.clone();
        let ops = config.operations;

        handles.push(thread::spawn(move || {
            for op in 0..ops {
                let filter = Filter::new().eq("op", op);
                let result = if op % 2 == 0 {
                    db.update(&table, &filter, stress_record(usize::MAX, op)).map(|_| ())
                } else {
                    db.delete_first(&table, &filter).map(|_| ())
                };
                match result {
                    Ok(()) => successful.fetch_add(1, Ordering::Relaxed),
                    Err(_) => failed.fetch_add(1, Ordering::Relaxed),
                };
            }
        }));
    }

    for handle in handles {
        let _ = handle.join();
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}
