//! Translation of compact sort directives and filter mappings into store queries.
//!
//! Sort directives arrive as `"field,direction"` strings where `direction` is `1`
//! (ascending) or `-1` (descending). A list of directives translates into an ordered
//! [`SortSpec`]; the first malformed directive fails the whole list.
//!
//! ```ignore
//! use docrest::query::SortSpec;
//!
//! let sort = SortSpec::parse(["age,-1", "name,1"])?;
//! assert!(sort.allow_disk_use());
//! assert_eq!(sort.to_document(), doc! { "age": -1, "name": 1 });
//! ```
//!
//! Filters are interpreted by the store; the core only distinguishes an empty filter
//! from a non-empty one, which decides the pagination count strategy.

use bson::{Document, doc};

use crate::{
    document::ID_FIELD,
    error::{DocumentStoreError, DocumentStoreResult},
};

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending order, encoded as `1`.
    Asc,
    /// Descending order, encoded as `-1`.
    Desc,
}

impl SortDirection {
    /// Returns the store encoding of this direction.
    pub fn as_i32(self) -> i32 {
        match self {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        }
    }
}

/// A single `(field, direction)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    /// The field name to sort by.
    pub field: String,
    /// The sort direction.
    pub direction: SortDirection,
}

impl Sort {
    /// Parses a compact `"field,direction"` directive.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidSort`] when the directive is not exactly two
    /// comma separated parts, the field is empty, or the direction is not `1` or `-1`.
    pub fn parse(directive: &str) -> DocumentStoreResult<Self> {
        let invalid = || DocumentStoreError::InvalidSort(directive.to_string());

        let mut parts = directive.split(',');
        let (Some(field), Some(direction), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        if field.is_empty() {
            return Err(invalid());
        }

        let direction = match direction.parse::<i32>().map_err(|_| invalid())? {
            1 => SortDirection::Asc,
            -1 => SortDirection::Desc,
            _ => return Err(invalid()),
        };

        Ok(Sort { field: field.to_string(), direction })
    }
}

/// An ordered sort specification.
///
/// An empty specification means "no explicit sort" and resolves to the default
/// last-created-first order (descending by identifier).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSpec {
    keys: Vec<Sort>,
}

impl SortSpec {
    /// Parses a list of compact sort directives, preserving their order.
    ///
    /// # Errors
    ///
    /// Fails with [`DocumentStoreError::InvalidSort`] naming the first malformed entry.
    pub fn parse<I, S>(directives: I) -> DocumentStoreResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(SortSpec {
            keys: directives
                .into_iter()
                .map(|directive| Sort::parse(directive.as_ref()))
                .collect::<DocumentStoreResult<Vec<_>>>()?,
        })
    }

    /// Creates a specification from already parsed keys.
    pub fn new(keys: Vec<Sort>) -> Self {
        SortSpec { keys }
    }

    /// Returns the explicit sort keys in order.
    pub fn keys(&self) -> &[Sort] {
        &self.keys
    }

    /// Returns `true` when no explicit sort was requested.
    pub fn is_default(&self) -> bool {
        self.keys.is_empty()
    }

    /// Explicit sorts may be unindexed and exceed the store's in-memory sort limit,
    /// so they are allowed to spill to disk. The default identifier order never is.
    pub fn allow_disk_use(&self) -> bool {
        !self.keys.is_empty()
    }

    /// Renders the store sort document.
    pub fn to_document(&self) -> Document {
        if self.keys.is_empty() {
            return doc! { ID_FIELD: -1 };
        }

        let mut sort = Document::new();
        for key in &self.keys {
            if !sort.contains_key(&key.field) {
                sort.insert(key.field.clone(), key.direction.as_i32());
            }
        }
        sort
    }
}

/// A predicate over document fields, passed to the store untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter(Document);

impl Filter {
    /// A filter matching every document.
    pub fn all() -> Self {
        Filter(Document::new())
    }

    /// Returns `true` when the filter has no predicates.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the underlying filter document.
    pub fn as_document(&self) -> &Document {
        &self.0
    }

    /// Consumes the filter and returns the underlying document.
    pub fn into_document(self) -> Document {
        self.0
    }
}

impl From<Document> for Filter {
    fn from(document: Document) -> Self {
        Filter(document)
    }
}

impl From<Option<Document>> for Filter {
    fn from(document: Option<Document>) -> Self {
        Filter(document.unwrap_or_default())
    }
}

/// Options forwarded to the store's find call.
#[derive(Debug, Clone, PartialEq)]
pub struct FindOptions {
    /// Rendered sort document.
    pub sort: Document,
    /// Whether the store may spill sort work to secondary storage.
    pub allow_disk_use: bool,
    /// Number of matching documents to skip.
    pub skip: Option<u64>,
    /// Maximum number of documents to return.
    pub limit: Option<u64>,
}

impl FindOptions {
    /// Builds find options from a sort specification, without bounds.
    pub fn sorted(sort: &SortSpec) -> Self {
        FindOptions {
            sort: sort.to_document(),
            allow_disk_use: sort.allow_disk_use(),
            skip: None,
            limit: None,
        }
    }

    /// Sets the skip/limit bounds.
    pub fn bounded(mut self, skip: u64, limit: u64) -> Self {
        self.skip = Some(skip);
        self.limit = Some(limit);
        self
    }
}

impl Default for FindOptions {
    fn default() -> Self {
        FindOptions::sorted(&SortSpec::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_preserves_directive_order() {
        let sort = SortSpec::parse(["age,-1", "name,1", "rank,1"]).unwrap();

        assert_eq!(
            sort.keys(),
            &[
                Sort { field: "age".into(), direction: SortDirection::Desc },
                Sort { field: "name".into(), direction: SortDirection::Asc },
                Sort { field: "rank".into(), direction: SortDirection::Asc },
            ]
        );
        assert_eq!(sort.to_document(), doc! { "age": -1, "name": 1, "rank": 1 });
        assert_eq!(
            sort.to_document().keys().collect::<Vec<_>>(),
            vec!["age", "name", "rank"]
        );
    }

    #[test]
    fn padded_direction_is_rejected() {
        for directive in ["rank, 1", "rank,1 ", "rank,+1x"] {
            assert!(matches!(
                Sort::parse(directive),
                Err(DocumentStoreError::InvalidSort(d)) if d == directive
            ));
        }
    }

    #[test]
    fn explicit_sort_allows_disk_use() {
        assert!(SortSpec::parse(["age,1"]).unwrap().allow_disk_use());
    }

    #[test]
    fn default_sort_is_descending_identifier() {
        let sort = SortSpec::parse(Vec::<String>::new()).unwrap();

        assert!(sort.is_default());
        assert!(!sort.allow_disk_use());
        assert_eq!(sort.to_document(), doc! { "_id": -1 });
    }

    #[test]
    fn malformed_directives_fail() {
        for directive in ["age,2", "age", "age,1,2", ",1", "age,up", "age,1.0", ""] {
            match Sort::parse(directive) {
                Err(DocumentStoreError::InvalidSort(bad)) => assert_eq!(bad, directive),
                other => panic!("expected InvalidSort for {directive:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn one_malformed_entry_fails_the_batch() {
        match SortSpec::parse(["name,1", "age,2", "rank,x"]) {
            Err(DocumentStoreError::InvalidSort(bad)) => assert_eq!(bad, "age,2"),
            other => panic!("expected InvalidSort, got {other:?}"),
        }
    }

    #[test]
    fn filter_emptiness() {
        assert!(Filter::all().is_empty());
        assert!(Filter::from(None).is_empty());
        assert!(!Filter::from(doc! { "name": "a" }).is_empty());
    }

    #[test]
    fn bounded_find_options() {
        let options = FindOptions::sorted(&SortSpec::default()).bounded(10, 10);

        assert_eq!(options.skip, Some(10));
        assert_eq!(options.limit, Some(10));
        assert!(!options.allow_disk_use);
    }
}
