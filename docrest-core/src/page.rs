//! Pagination parameters and paged result envelopes.
//!
//! Pages are 1-indexed. A page request always translates to
//! `skip = (index - 1) * size` and `limit = size`, regardless of how many documents
//! the collection holds.

use serde::{Deserialize, Serialize};

use crate::query::Filter;

/// A paged read result: the total number of matching documents and one page of them.
///
/// # Example
///
/// ```ignore
/// use docrest::page::Page;
///
/// let page = Page::new(120, vec![doc! { "name": "a" }]);
/// assert_eq!(serde_json::to_value(&page)?["total"], 120);
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Total count of matching items across all pages.
    pub total: u64,
    /// The items contained in this page.
    pub data: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(total: u64, data: Vec<T>) -> Self {
        Self { total, data }
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self { total: 0, data: Vec::new() }
    }
}

/// Page selection for a paged read.
///
/// Only constructible through [`Pagination::new`], so both values are non-zero.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    index: u64,
    size: u64,
}

impl Pagination {
    /// Page sizes accepted from external callers.
    pub const ALLOWED_SIZES: [u64; 4] = [10, 20, 50, 100];

    /// Creates pagination parameters, or `None` when either value is zero.
    ///
    /// A zero (absent) index or size means the read is served unpaged.
    pub fn new(index: u64, size: u64) -> Option<Self> {
        (index > 0 && size > 0).then_some(Self { index, size })
    }

    /// The page number (1-indexed).
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Number of items per page.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Number of matching documents to skip.
    pub fn skip(&self) -> u64 {
        self.index.saturating_sub(1).saturating_mul(self.size)
    }

    /// Maximum number of documents in the page.
    pub fn limit(&self) -> u64 {
        self.size
    }
}

/// How the total of a paged read is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountStrategy {
    /// Count the documents matching the filter. Accurate, may scan.
    Exact,
    /// Read the store-maintained collection size. Cheap, may be stale.
    Estimated,
}

impl CountStrategy {
    /// A filter narrows the set, so its total must be exact; browsing a whole
    /// collection only needs the cheap estimate.
    pub fn for_filter(filter: &Filter) -> Self {
        if filter.is_empty() {
            CountStrategy::Estimated
        } else {
            CountStrategy::Exact
        }
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;

    use super::*;

    #[test]
    fn second_page_of_ten_skips_ten() {
        let page = Pagination::new(2, 10).unwrap();

        assert_eq!(page.skip(), 10);
        assert_eq!(page.limit(), 10);
    }

    #[test]
    fn first_page_skips_nothing() {
        assert_eq!(Pagination::new(1, 50).unwrap().skip(), 0);
    }

    #[test]
    fn zero_index_or_size_is_unpaged() {
        assert_eq!(Pagination::new(0, 10), None);
        assert_eq!(Pagination::new(3, 0), None);
        assert_eq!(Pagination::new(0, 0), None);
    }

    #[test]
    fn zero_index_skip_saturates() {
        let page = Pagination { index: 0, size: 10 };

        assert_eq!(page.skip(), 0);
        assert_eq!(page.limit(), 10);
    }

    #[test]
    fn huge_index_skip_saturates() {
        let page = Pagination::new(u64::MAX, 100).unwrap();

        assert_eq!(page.skip(), u64::MAX);
    }

    #[test]
    fn count_strategy_follows_filter() {
        assert_eq!(CountStrategy::for_filter(&Filter::all()), CountStrategy::Estimated);
        assert_eq!(
            CountStrategy::for_filter(&Filter::from(doc! { "status": "open" })),
            CountStrategy::Exact
        );
    }

    #[test]
    fn page_serializes_as_envelope() {
        let page = Page::new(3, vec!["a".to_string()]);
        let value = serde_json::to_value(&page).unwrap();

        assert_eq!(value, serde_json::json!({ "total": 3, "data": ["a"] }));
    }
}
