//! Query engine.
//!
//! Reads select records with a [`Filter`] (a conjunction of per-field
//! predicates) and then optionally shape the matches with
//! [`QueryOptions`]: sort, skip, limit, projection, always in that order.

mod filter;
mod options;
pub mod pipeline;

pub use filter::{Clause, Filter, Predicate};
pub use options::{QueryOptions, SortOrder};

use tabledb_storage::Record;

/// Returns clones of the records matching `filter`, shaped by `options`.
#[must_use]
pub fn select(records: &[Record], filter: &Filter, options: Option<&QueryOptions>) -> Vec<Record> {
    let matches: Vec<Record> = records
        .iter()
        .filter(|record| filter.matches(record))
        .cloned()
        .collect();

    match options {
        Some(options) => pipeline::apply(matches, options),
        None => matches,
    }
}
