//! Record identifier generation.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Source of `_id` values for inserted records.
///
/// Generated identifiers must be:
/// - Unique across every call on the same generator
/// - Ordered by creation time when compared as strings
pub trait IdGenerator: Send + Sync {
    /// Returns a fresh identifier.
    fn new_id(&self) -> String;
}

/// UUIDv7 identifiers: 48-bit millisecond timestamp followed by random bits.
///
/// The string form sorts in creation order, and identifiers generated in the
/// same millisecond by one process are still monotonic.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimeOrderedIds;

impl IdGenerator for TimeOrderedIds {
    fn new_id(&self) -> String {
        Uuid::now_v7().to_string()
    }
}

/// Deterministic identifiers: a prefix followed by a zero-padded counter.
///
/// Useful in tests that assert on exact `_id` values.
pub struct SequentialIds {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIds {
    /// Creates a generator producing `"{prefix}000001"`, `"{prefix}000002"`, ...
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn new_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}{n:06}", self.prefix)
    }
}

impl fmt::Debug for SequentialIds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequentialIds")
            .field("prefix", &self.prefix)
            .field("next", &self.next.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn time_ordered_is_unique() {
        let ids = TimeOrderedIds;
        let set: HashSet<String> = (0..1000).map(|_| ids.new_id()).collect();
        assert_eq!(set.len(), 1000);
    }

    #[test]
    fn time_ordered_sorts_by_creation() {
        let ids = TimeOrderedIds;
        let generated: Vec<String> = (0..200).map(|_| ids.new_id()).collect();
        let mut sorted = generated.clone();
        sorted.sort();
        assert_eq!(generated, sorted);
    }

    #[test]
    fn time_ordered_parses_as_v7() {
        let id = TimeOrderedIds.new_id();
        let uuid = Uuid::parse_str(&id).unwrap();
        assert_eq!(uuid.get_version_num(), 7);
    }

    #[test]
    fn sequential_counts_up() {
        let ids = SequentialIds::new("rec-");
        assert_eq!(ids.new_id(), "rec-000001");
        assert_eq!(ids.new_id(), "rec-000002");
    }
}
