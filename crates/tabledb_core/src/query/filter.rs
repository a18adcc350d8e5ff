//! Per-field predicate matching.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tabledb_storage::Record;

/// A boolean test applied to one field of a record.
///
/// The argument is the field's current value, or `None` when the record
/// does not have the field. Implemented for every
/// `Fn(Option<&Value>) -> bool + Send + Sync` closure.
pub trait Predicate: Send + Sync {
    /// Returns `true` if the value satisfies the test.
    fn evaluate(&self, value: Option<&Value>) -> bool;
}

impl<F> Predicate for F
where
    F: Fn(Option<&Value>) -> bool + Send + Sync,
{
    fn evaluate(&self, value: Option<&Value>) -> bool {
        self(value)
    }
}

/// The condition attached to one field of a [`Filter`].
#[derive(Clone)]
pub enum Clause {
    /// A predicate evaluated against the field's value.
    Test(Arc<dyn Predicate>),
    /// A plain value in predicate position.
    ///
    /// It is not compared against anything: an inert clause is always
    /// satisfied. Callers that want equality use [`Filter::eq`].
    Inert(Value),
}

impl Clause {
    /// Evaluates the clause against a field value.
    #[must_use]
    pub fn matches(&self, value: Option<&Value>) -> bool {
        match self {
            Self::Test(predicate) => predicate.evaluate(value),
            Self::Inert(_) => true,
        }
    }
}

impl fmt::Debug for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Test(_) => f.write_str("Test(..)"),
            Self::Inert(value) => f.debug_tuple("Inert").field(value).finish(),
        }
    }
}

/// A `where` mapping: field name to clause.
///
/// A record matches when every clause is satisfied by the record's value of
/// that field. Each field holds at most one clause; setting a field again
/// replaces its clause. Clauses are evaluated in the order they were added and
/// evaluation stops at the first failing clause. Fields without a clause are
/// unconstrained, so an empty filter matches every record.
///
/// # Example
///
/// ```rust
/// use serde_json::json;
/// use tabledb_core::Filter;
///
/// let adults_named_tom = Filter::new()
///     .field("age", |v| v.and_then(|v| v.as_i64()).is_some_and(|age| age >= 18))
///     .eq("name", "Tom");
///
/// let record = json!({"name": "Tom", "age": 19});
/// assert!(adults_named_tom.matches(record.as_object().unwrap()));
/// ```
#[derive(Clone, Default)]
pub struct Filter {
    clauses: Vec<(String, Clause)>,
}

impl Filter {
    /// Creates an empty filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a filter that matches every record.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Adds a closure predicate for a field.
    #[must_use]
    pub fn field<F>(self, name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(Option<&Value>) -> bool + Send + Sync + 'static,
    {
        self.predicate(name, predicate)
    }

    /// Adds any [`Predicate`] implementation for a field.
    #[must_use]
    pub fn predicate<P>(self, name: impl Into<String>, predicate: P) -> Self
    where
        P: Predicate + 'static,
    {
        self.clause(name, Clause::Test(Arc::new(predicate)))
    }

    /// Adds a predicate requiring the field to equal `value`.
    #[must_use]
    pub fn eq(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        let expected = value.into();
        self.field(name, move |v| v == Some(&expected))
    }

    /// Adds a non-callable value for a field.
    ///
    /// The clause always passes; see [`Clause::Inert`].
    #[must_use]
    pub fn inert(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clause(name, Clause::Inert(value.into()))
    }

    /// Adds a prepared clause for a field.
    ///
    /// A field already in the filter keeps its position and takes the new
    /// clause.
    #[must_use]
    pub fn clause(mut self, name: impl Into<String>, clause: Clause) -> Self {
        let name = name.into();
        match self.clauses.iter_mut().find(|(field, _)| *field == name) {
            Some(slot) => slot.1 = clause,
            None => self.clauses.push((name, clause)),
        }
        self
    }

    /// Returns `true` if every clause is satisfied by `record`.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        self.clauses
            .iter()
            .all(|(field, clause)| clause.matches(record.get(field)))
    }

    /// Returns the number of clauses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// Returns `true` if the filter has no clauses.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.clauses.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = Filter::all();
        assert!(filter.matches(&record(json!({}))));
        assert!(filter.matches(&record(json!({"a": 1}))));
    }

    #[test]
    fn all_clauses_must_pass() {
        let filter = Filter::new().eq("name", "Tom").eq("age", 19);

        assert!(filter.matches(&record(json!({"name": "Tom", "age": 19}))));
        assert!(!filter.matches(&record(json!({"name": "Tom", "age": 20}))));
        assert!(!filter.matches(&record(json!({"name": "Ann", "age": 19}))));
    }

    #[test]
    fn absent_field_is_none() {
        let filter = Filter::new().field("email", |v| v.is_none());
        assert!(filter.matches(&record(json!({"name": "Tom"}))));
        assert!(!filter.matches(&record(json!({"email": null}))));
    }

    #[test]
    fn inert_clause_passes_vacuously() {
        let filter = Filter::new().inert("name", "Ann");
        assert!(filter.matches(&record(json!({"name": "Tom"}))));
        assert!(filter.matches(&record(json!({}))));
    }

    #[test]
    fn inert_clause_does_not_mask_failing_predicate() {
        let filter = Filter::new().inert("name", "Tom").eq("age", 30);
        assert!(!filter.matches(&record(json!({"name": "Tom", "age": 19}))));
    }

    #[test]
    fn evaluation_short_circuits() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let filter = Filter::new()
            .field("a", |_| false)
            .field("b", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                true
            });

        assert!(!filter.matches(&record(json!({"a": 1, "b": 2}))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn custom_predicate_type() {
        struct Between(i64, i64);

        impl Predicate for Between {
            fn evaluate(&self, value: Option<&Value>) -> bool {
                value
                    .and_then(Value::as_i64)
                    .is_some_and(|n| n >= self.0 && n <= self.1)
            }
        }

        let filter = Filter::new().predicate("age", Between(18, 30));
        assert!(filter.matches(&record(json!({"age": 24}))));
        assert!(!filter.matches(&record(json!({"age": 31}))));
        assert!(!filter.matches(&record(json!({"age": "24"}))));
    }

    #[test]
    fn later_clause_replaces_earlier_for_same_field() {
        let filter = Filter::new().eq("age", 19).eq("name", "Tom").eq("age", 24);

        assert_eq!(filter.len(), 2);
        assert!(filter.matches(&record(json!({"name": "Tom", "age": 24}))));
        assert!(!filter.matches(&record(json!({"name": "Tom", "age": 19}))));
        assert_eq!(format!("{filter:?}").find("\"age\""), Some(1));
    }

    #[test]
    fn debug_lists_fields() {
        let filter = Filter::new().eq("a", 1).inert("b", 2);
        let text = format!("{filter:?}");
        assert!(text.contains("\"a\": Test(..)"));
        assert!(text.contains("\"b\": Inert(Number(2))"));
    }
}
