//! Query options: sort, skip, limit and projection.

use std::cmp::Ordering;

/// Direction of one sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Smallest value first.
    #[default]
    Ascending,
    /// Largest value first.
    Descending,
}

impl SortOrder {
    /// Maps the conventional `1` / `-1` direction flags to an order.
    ///
    /// Negative values mean descending; anything else ascending.
    #[must_use]
    pub const fn from_sign(sign: i64) -> Self {
        if sign < 0 {
            Self::Descending
        } else {
            Self::Ascending
        }
    }

    /// Applies the direction to a natural-order comparison.
    #[must_use]
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Ascending => ordering,
            Self::Descending => ordering.reverse(),
        }
    }
}

/// Options applied to the matches of a `find`-family read.
///
/// Steps always run in the same order: sort, skip, limit, projection.
///
/// # Example
///
/// ```rust
/// use tabledb_core::QueryOptions;
///
/// let page = QueryOptions::new()
///     .desc("age")
///     .asc("name")
///     .skip(20)
///     .limit(10)
///     .project(["name", "age"]);
/// assert_eq!(page.sort.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Sort keys in priority order.
    pub sort: Vec<(String, SortOrder)>,
    /// Number of leading results to drop.
    pub skip: Option<usize>,
    /// Maximum number of results to keep.
    pub limit: Option<usize>,
    /// Fields to keep, in output order. `None` keeps whole records.
    pub projection: Option<Vec<String>>,
}

impl QueryOptions {
    /// Creates options that leave results untouched.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a sort key.
    #[must_use]
    pub fn sort_by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort.push((field.into(), order));
        self
    }

    /// Appends an ascending sort key.
    #[must_use]
    pub fn asc(self, field: impl Into<String>) -> Self {
        self.sort_by(field, SortOrder::Ascending)
    }

    /// Appends a descending sort key.
    #[must_use]
    pub fn desc(self, field: impl Into<String>) -> Self {
        self.sort_by(field, SortOrder::Descending)
    }

    /// Sets the number of results to skip.
    #[must_use]
    pub fn skip(mut self, count: usize) -> Self {
        self.skip = Some(count);
        self
    }

    /// Sets the maximum number of results.
    #[must_use]
    pub fn limit(mut self, count: usize) -> Self {
        self.limit = Some(count);
        self
    }

    /// Sets the projected fields.
    #[must_use]
    pub fn project<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = Some(fields.into_iter().map(Into::into).collect());
        self
    }
}
