//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random test data
//! that maintains required invariants.

use proptest::prelude::*;
use serde_json::{Map, Number, Value};
use tabledb_storage::{Document, Record, Table, ID_FIELD};

/// Strategy for generating valid table names.
pub fn table_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z][a-zA-Z0-9_]{0,31}").expect("Invalid regex")
}

/// Strategy for generating field names other than `_id`.
pub fn field_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,11}").expect("Invalid regex")
}

/// Strategy for generating scalar JSON values.
///
/// Floats are quarter steps, so their decimal text parses back exactly.
pub fn scalar_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        (-1_000_000i64..1_000_000)
            .prop_filter_map("finite", |n| Number::from_f64(n as f64 / 4.0).map(Value::Number)),
        prop::string::string_regex("[ -~]{0,16}")
            .expect("Invalid regex")
            .prop_map(Value::String),
    ]
}

/// Strategy for generating nested JSON values up to a small depth.
pub fn value_strategy() -> impl Strategy<Value = Value> {
    scalar_value_strategy().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::vec((field_name_strategy(), inner), 0..4)
                .prop_map(|pairs| Value::Object(pairs.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

/// Strategy for generating records without an `_id` field.
pub fn record_strategy() -> impl Strategy<Value = Record> {
    prop::collection::vec((field_name_strategy(), value_strategy()), 0..6)
        .prop_map(|pairs| pairs.into_iter().collect())
}

/// Strategy for generating records that carry a string `_id`.
pub fn stored_record_strategy() -> impl Strategy<Value = Record> {
    (prop::string::string_regex("[a-f0-9]{8}").expect("Invalid regex"), record_strategy()).prop_map(
        |(id, fields)| {
            let mut record = Record::new();
            record.insert(ID_FIELD.to_string(), Value::String(id));
            record.extend(fields);
            record
        },
    )
}

/// Strategy for generating whole documents with distinct table names.
pub fn document_strategy() -> impl Strategy<Value = Document> {
    prop::collection::vec(
        (
            table_name_strategy(),
            prop::collection::vec(stored_record_strategy(), 0..5),
        ),
        0..4,
    )
    .prop_map(|tables| {
        let mut doc = Document::new();
        for (name, records) in tables {
            if !doc.contains(&name) {
                doc.put_table(Table::with_records(name, records));
            }
        }
        doc
    })
}

/// A table-level operation for model-based tests.
#[derive(Debug, Clone)]
pub enum TableOperation {
    /// Insert records
    Insert {
        /// Records to insert
        records: Vec<Record>,
    },
    /// Set a field on records whose `n` is below a bound
    Update {
        /// Exclusive upper bound on `n`
        below: i64,
        /// Field to set
        field: String,
        /// Value to set
        value: Value,
    },
    /// Delete records whose `n` is below a bound
    Delete {
        /// Exclusive upper bound on `n`
        below: i64,
    },
    /// Delete the first record whose `n` is below a bound
    DeleteFirst {
        /// Exclusive upper bound on `n`
        below: i64,
    },
    /// Empty the table
    Clear,
}

/// Strategy for generating records with an integer `n` field.
pub fn numbered_record_strategy() -> impl Strategy<Value = Record> {
    (0i64..100, record_strategy()).prop_map(|(n, mut record)| {
        record.insert("n".to_string(), Value::from(n));
        record
    })
}

/// Strategy for generating table operations.
pub fn table_operation_strategy() -> impl Strategy<Value = TableOperation> {
    prop_oneof![
        4 => prop::collection::vec(numbered_record_strategy(), 1..4)
            .prop_map(|records| TableOperation::Insert { records }),
        2 => (0i64..100, field_name_strategy(), scalar_value_strategy())
            .prop_filter("n is the key field", |(_, field, _)| field != "n")
            .prop_map(|(below, field, value)| TableOperation::Update { below, field, value }),
        1 => (0i64..100).prop_map(|below| TableOperation::Delete { below }),
        1 => (0i64..100).prop_map(|below| TableOperation::DeleteFirst { below }),
        1 => Just(TableOperation::Clear),
    ]
}

/// Strategy for generating a sequence of operations.
pub fn operation_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<TableOperation>> {
    prop::collection::vec(table_operation_strategy(), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn table_name_is_valid(name in table_name_strategy()) {
            let first = name.chars().next();
            prop_assert!(first.is_some_and(|c| c.is_ascii_alphabetic()));
        }

        #[test]
        fn records_have_no_id(record in record_strategy()) {
            prop_assert!(!record.contains_key(ID_FIELD));
        }

        #[test]
        fn document_tables_are_distinct(doc in document_strategy()) {
            let names = doc.table_names();
            let unique: HashSet<&String> = names.iter().collect();
            prop_assert_eq!(unique.len(), names.len());
        }
    }
}
