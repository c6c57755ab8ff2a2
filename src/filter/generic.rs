//! Generic filtering framework
//!
//! A trait-based approach to row predicates. Filters are composable and
//! report which record fields they read, so callers can tell whether a
//! filter depends on data a source did not provide.

use std::collections::HashSet;
use std::fmt::Debug;
use std::sync::Arc;

/// A predicate over records of type `T`
pub trait RecordFilter<T>: Debug + Send + Sync {
    /// Whether the record passes the filter
    fn matches(&self, record: &T) -> bool;

    /// Names of the record fields this filter reads
    fn required_fields(&self) -> HashSet<String>;
}

/// A shareable type-erased filter
#[derive(Debug)]
pub struct BoxedFilter<T> {
    inner: Arc<dyn RecordFilter<T>>,
}

impl<T> Clone for BoxedFilter<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> BoxedFilter<T> {
    pub fn new<F>(filter: F) -> Self
    where
        F: RecordFilter<T> + 'static,
    {
        Self {
            inner: Arc::new(filter),
        }
    }
}

impl<T> RecordFilter<T> for BoxedFilter<T>
where
    T: Debug,
{
    fn matches(&self, record: &T) -> bool {
        self.inner.matches(record)
    }

    fn required_fields(&self) -> HashSet<String> {
        self.inner.required_fields()
    }
}

/// A filter that combines multiple filters with a logical AND
///
/// An empty combination includes every record.
#[derive(Debug, Clone)]
pub struct AndFilter<T> {
    filters: Vec<BoxedFilter<T>>,
}

impl<T> Default for AndFilter<T> {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
        }
    }
}

impl<T> AndFilter<T> {
    #[must_use]
    pub fn new(filters: Vec<BoxedFilter<T>>) -> Self {
        Self { filters }
    }

    /// Add another filter to the conjunction
    #[must_use]
    pub fn and<F>(mut self, filter: F) -> Self
    where
        F: RecordFilter<T> + 'static,
    {
        self.filters.push(BoxedFilter::new(filter));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl<T> RecordFilter<T> for AndFilter<T>
where
    T: Debug,
{
    fn matches(&self, record: &T) -> bool {
        self.filters.iter().all(|f| f.matches(record))
    }

    fn required_fields(&self) -> HashSet<String> {
        self.filters
            .iter()
            .flat_map(|f| f.required_fields())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct AtLeast(i64);

    impl RecordFilter<i64> for AtLeast {
        fn matches(&self, record: &i64) -> bool {
            *record >= self.0
        }

        fn required_fields(&self) -> HashSet<String> {
            HashSet::from(["VALUE".to_string()])
        }
    }

    #[derive(Debug)]
    struct Even;

    impl RecordFilter<i64> for Even {
        fn matches(&self, record: &i64) -> bool {
            record % 2 == 0
        }

        fn required_fields(&self) -> HashSet<String> {
            HashSet::from(["VALUE".to_string(), "PARITY".to_string()])
        }
    }

    #[test]
    fn test_empty_and_filter_matches_everything() {
        let filter = AndFilter::<i64>::default();
        assert!(filter.is_empty());
        assert!(filter.matches(&-3));
        assert!(filter.required_fields().is_empty());
    }

    #[test]
    fn test_and_filter_requires_every_filter() {
        let filter = AndFilter::new(vec![BoxedFilter::new(AtLeast(10))]).and(Even);
        assert_eq!(filter.len(), 2);
        assert!(filter.matches(&12));
        assert!(!filter.matches(&11));
        assert!(!filter.matches(&8));
        assert_eq!(filter.required_fields().len(), 2);
    }
}
