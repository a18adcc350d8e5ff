//! Cross-crate integration test helpers.
//!
//! Provides a model-checking harness that mirrors table operations into a
//! plain `Vec` and verifies the database agrees with it.

use crate::fixtures::TestDatabase;
use crate::generators::TableOperation;
use serde_json::Value;
use tabledb_core::{Database, Filter, Record, ID_FIELD};

/// Table the harness operates on.
pub const HARNESS_TABLE: &str = "items";

/// A test harness tracking the expected contents of one table.
pub struct IntegrationHarness {
    /// The database under test.
    pub test_db: TestDatabase,
    /// Expected records, without `_id`.
    model: Vec<Record>,
}

impl IntegrationHarness {
    /// Creates a harness over `test_db` with an empty harness table.
    pub fn new(test_db: TestDatabase) -> Self {
        test_db
            .create(&[HARNESS_TABLE])
            .expect("Failed to create harness table");
        Self {
            test_db,
            model: Vec::new(),
        }
    }

    /// Applies an operation to both the database and the model.
    pub fn apply(&mut self, op: &TableOperation) {
        let db = &self.test_db.db;
        match op {
            TableOperation::Insert { records } => {
                db.insert(HARNESS_TABLE, records.clone())
                    .expect("Failed to insert");
                self.model.extend(records.iter().cloned());
            }
            TableOperation::Update {
                below,
                field,
                value,
            } => {
                let mut partial = Record::new();
                partial.insert(field.clone(), value.clone());
                db.update(HARNESS_TABLE, &n_below(*below), partial)
                    .expect("Failed to update");
                for record in self.model.iter_mut().filter(|r| is_below(r, *below)) {
                    record.insert(field.clone(), value.clone());
                }
            }
            TableOperation::Delete { below } => {
                let expected = self.model.iter().filter(|r| is_below(r, *below)).count();
                let removed = db
                    .delete(HARNESS_TABLE, &n_below(*below))
                    .expect("Failed to delete");
                assert_eq!(removed, expected, "delete count mismatch");
                self.model.retain(|r| !is_below(r, *below));
            }
            TableOperation::DeleteFirst { below } => {
                let position = self.model.iter().position(|r| is_below(r, *below));
                let removed = db
                    .delete_first(HARNESS_TABLE, &n_below(*below))
                    .expect("Failed to delete first");
                assert_eq!(removed, usize::from(position.is_some()));
                if let Some(index) = position {
                    self.model.remove(index);
                }
            }
            TableOperation::Clear => {
                db.clear(&[HARNESS_TABLE]).expect("Failed to clear");
                self.model.clear();
            }
        }
    }

    /// Verifies the database table matches the model.
    pub fn verify(&self) {
        verify_table(&self.test_db.db, &self.model);
    }

    /// Verifies a fresh uncached handle sees the model on disk.
    pub fn verify_on_disk(&self) {
        verify_table(&self.test_db.reopen(), &self.model);
    }

    /// Returns the number of records the model expects.
    pub fn tracked_count(&self) -> usize {
        self.model.len()
    }
}

fn verify_table(db: &Database, model: &[Record]) {
    let actual = db
        .find(HARNESS_TABLE, &Filter::all(), None)
        .expect("Failed to read harness table");
    let stripped: Vec<Record> = actual.into_iter().map(without_id).collect();
    assert_eq!(stripped, model, "table contents diverged from model");
}

/// Returns `record` with its `_id` removed.
pub fn without_id(record: Record) -> Record {
    record
        .into_iter()
        .filter(|(field, _)| field != ID_FIELD)
        .collect()
}

fn is_below(record: &Record, bound: i64) -> bool {
    record
        .get("n")
        .and_then(Value::as_i64)
        .is_some_and(|n| n < bound)
}

fn n_below(bound: i64) -> Filter {
    Filter::new().field("n", move |v| {
        v.and_then(Value::as_i64).is_some_and(|n| n < bound)
    })
}
