//! Filter evaluation and ordering for in-memory documents.
//!
//! Filters are the store's own query documents (`{ "age": { "$gt": 21 } }`), so this
//! module interprets the subset of that language the service relies on: field
//! equality with array membership, dotted paths, the comparison operators, `$in`,
//! `$nin`, `$exists` and the top-level `$and`, `$or` and `$nor` combinators.

use std::cmp::Ordering;

use bson::{Bson, DateTime, Document, oid::ObjectId};

use docrest_core::error::{BackendError, BackendResult};

/// Comparable representation of BSON values.
///
/// Numeric types are normalized to `f64`. The variant order follows the store's
/// cross-type sort order, so values of different types still sort deterministically.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    MinKey,
    Null,
    Number(f64),
    String(&'a str),
    Map(&'a Document),
    Array(&'a [Bson]),
    Binary(&'a [u8]),
    ObjectId(ObjectId),
    Bool(bool),
    DateTime(DateTime),
    Other,
    MaxKey,
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::MinKey => Comparable::MinKey,
            Bson::Null | Bson::Undefined => Comparable::Null,
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::String(value) | Bson::Symbol(value) => Comparable::String(value),
            Bson::Document(doc) => Comparable::Map(doc),
            Bson::Array(arr) => Comparable::Array(arr),
            Bson::Binary(binary) => Comparable::Binary(&binary.bytes),
            Bson::ObjectId(id) => Comparable::ObjectId(*id),
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::MaxKey => Comparable::MaxKey,
            _ => Comparable::Other,
        }
    }
}

impl Comparable<'_> {
    fn rank(&self) -> u8 {
        match self {
            Comparable::MinKey => 0,
            Comparable::Null => 1,
            Comparable::Number(_) => 2,
            Comparable::String(_) => 3,
            Comparable::Map(_) => 4,
            Comparable::Array(_) => 5,
            Comparable::Binary(_) => 6,
            Comparable::ObjectId(_) => 7,
            Comparable::Bool(_) => 8,
            Comparable::DateTime(_) => 9,
            Comparable::Other => 10,
            Comparable::MaxKey => 11,
        }
    }

    /// Orders two values of the same type class, `None` across type classes.
    fn partial_cmp_same(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::MinKey, Comparable::MinKey)
            | (Comparable::Null, Comparable::Null)
            | (Comparable::MaxKey, Comparable::MaxKey) => Some(Ordering::Equal),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            (Comparable::Binary(a), Comparable::Binary(b)) => a.partial_cmp(b),
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a.partial_cmp(b),
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::Map(a), Comparable::Map(b)) => {
                for ((left_key, left), (right_key, right)) in a.iter().zip(b.iter()) {
                    let ordering = left_key
                        .cmp(right_key)
                        .then_with(|| total_cmp(left, right));
                    if ordering != Ordering::Equal {
                        return Some(ordering);
                    }
                }
                Some(a.len().cmp(&b.len()))
            }
            (Comparable::Array(a), Comparable::Array(b)) => {
                for (left, right) in a.iter().zip(b.iter()) {
                    let ordering = total_cmp(left, right);
                    if ordering != Ordering::Equal {
                        return Some(ordering);
                    }
                }
                Some(a.len().cmp(&b.len()))
            }
            _ => None,
        }
    }
}

impl PartialEq for Comparable<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.partial_cmp_same(other) == Some(Ordering::Equal)
    }
}

/// Total order over BSON values used for sorting.
pub(crate) fn total_cmp(left: &Bson, right: &Bson) -> Ordering {
    let (left, right) = (Comparable::from(left), Comparable::from(right));

    left.rank()
        .cmp(&right.rank())
        .then_with(|| left.partial_cmp_same(&right).unwrap_or(Ordering::Equal))
}

/// Resolves a dotted field path inside a document.
pub(crate) fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;

    for segment in segments {
        current = match current {
            Bson::Document(doc) => doc.get(segment)?,
            Bson::Array(arr) => arr.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }

    Some(current)
}

/// Evaluates store filter documents against in-memory documents.
pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Document,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    /// Returns `true` when the document satisfies every clause of `filter`.
    pub fn matches(&self, filter: &Document) -> BackendResult<bool> {
        for (key, condition) in filter {
            let matched = match key.as_str() {
                "$and" => self.all(clauses(key, condition)?)?,
                "$or" => self.any(clauses(key, condition)?)?,
                "$nor" => !self.any(clauses(key, condition)?)?,
                op if op.starts_with('$') => {
                    return Err(BackendError::Rejected(format!("unknown top level operator: {op}")));
                }
                field => self.field_matches(field, condition)?,
            };

            if !matched {
                return Ok(false);
            }
        }

        Ok(true)
    }

    pub fn filter_documents(
        documents: impl IntoIterator<Item = &'a Document>,
        filter: &Document,
    ) -> BackendResult<Vec<&'a Document>> {
        let mut matched = Vec::new();
        for document in documents {
            if DocumentEvaluator::new(document).matches(filter)? {
                matched.push(document);
            }
        }
        Ok(matched)
    }

    fn all(&self, filters: Vec<&Document>) -> BackendResult<bool> {
        for filter in filters {
            if !self.matches(filter)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn any(&self, filters: Vec<&Document>) -> BackendResult<bool> {
        for filter in filters {
            if self.matches(filter)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn field_matches(&self, field: &str, condition: &Bson) -> BackendResult<bool> {
        let value = lookup(self.document, field);

        match condition {
            Bson::Document(ops) if is_operator_document(ops) => {
                for (op, operand) in ops {
                    if !apply_operator(value, op, operand)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            _ => Ok(equals(value, condition)),
        }
    }
}

fn clauses<'f>(key: &str, condition: &'f Bson) -> BackendResult<Vec<&'f Document>> {
    let invalid = || BackendError::Rejected(format!("{key} must be a nonempty array of documents"));

    match condition {
        Bson::Array(items) if !items.is_empty() => items
            .iter()
            .map(|item| item.as_document().ok_or_else(invalid))
            .collect(),
        _ => Err(invalid()),
    }
}

fn is_operator_document(document: &Document) -> bool {
    document
        .keys()
        .next()
        .is_some_and(|key| key.starts_with('$'))
}

/// Equality with array membership: an array field matches a scalar it contains.
/// A missing field equals `null`.
fn equals(value: Option<&Bson>, expected: &Bson) -> bool {
    let expected = Comparable::from(expected);

    match value {
        None => expected == Comparable::Null,
        Some(value) => {
            Comparable::from(value) == expected
                || value
                    .as_array()
                    .is_some_and(|items| items.iter().any(|item| Comparable::from(item) == expected))
        }
    }
}

fn compare(value: Option<&Bson>, operand: &Bson, accept: fn(Ordering) -> bool) -> bool {
    let operand = Comparable::from(operand);
    let holds = |candidate: &Bson| {
        Comparable::from(candidate)
            .partial_cmp_same(&operand)
            .is_some_and(accept)
    };

    match value {
        None => false,
        Some(Bson::Array(items)) => items.iter().any(holds),
        Some(value) => holds(value),
    }
}

fn apply_operator(value: Option<&Bson>, op: &str, operand: &Bson) -> BackendResult<bool> {
    Ok(match op {
        "$eq" => equals(value, operand),
        "$ne" => !equals(value, operand),
        "$gt" => compare(value, operand, Ordering::is_gt),
        "$gte" => compare(value, operand, Ordering::is_ge),
        "$lt" => compare(value, operand, Ordering::is_lt),
        "$lte" => compare(value, operand, Ordering::is_le),
        "$in" => candidates(op, operand)?
            .iter()
            .any(|candidate| equals(value, candidate)),
        "$nin" => !candidates(op, operand)?
            .iter()
            .any(|candidate| equals(value, candidate)),
        "$exists" => value.is_some() == truthy(operand),
        _ => return Err(BackendError::Rejected(format!("unknown operator: {op}"))),
    })
}

fn candidates<'o>(op: &str, operand: &'o Bson) -> BackendResult<&'o Vec<Bson>> {
    operand
        .as_array()
        .ok_or_else(|| BackendError::Rejected(format!("{op} needs an array")))
}

fn truthy(value: &Bson) -> bool {
    match value {
        Bson::Boolean(flag) => *flag,
        Bson::Int32(n) => *n != 0,
        Bson::Int64(n) => *n != 0,
        Bson::Double(n) => *n != 0.0,
        Bson::Null | Bson::Undefined => false,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;

    use super::*;

    fn matches(document: &Document, filter: Document) -> bool {
        DocumentEvaluator::new(document).matches(&filter).unwrap()
    }

    #[test]
    fn equality_and_array_membership() {
        let document = doc! { "name": "a", "tags": ["x", "y"], "n": 3 };

        assert!(matches(&document, doc! { "name": "a" }));
        assert!(matches(&document, doc! { "tags": "y" }));
        assert!(matches(&document, doc! { "n": 3.0 }));
        assert!(matches(&document, doc! { "missing": null }));
        assert!(!matches(&document, doc! { "name": "b" }));
        assert!(matches(&document, doc! {}));
    }

    #[test]
    fn comparison_operators() {
        let document = doc! { "age": 30, "address": { "city": "Oslo" } };

        assert!(matches(&document, doc! { "age": { "$gt": 21, "$lte": 30 } }));
        assert!(!matches(&document, doc! { "age": { "$lt": 30 } }));
        assert!(!matches(&document, doc! { "age": { "$gt": "20" } }));
        assert!(matches(&document, doc! { "address.city": { "$eq": "Oslo" } }));
        assert!(matches(&document, doc! { "age": { "$ne": 31 } }));
    }

    #[test]
    fn membership_and_existence() {
        let id = ObjectId::new();
        let document = doc! { "_id": id, "status": "open" };

        assert!(matches(&document, doc! { "_id": { "$in": [ObjectId::new(), id] } }));
        assert!(!matches(&document, doc! { "_id": { "$in": [ObjectId::new()] } }));
        assert!(matches(&document, doc! { "status": { "$nin": ["closed"] } }));
        assert!(matches(&document, doc! { "status": { "$exists": true } }));
        assert!(matches(&document, doc! { "owner": { "$exists": false } }));
    }

    #[test]
    fn logical_combinators() {
        let document = doc! { "a": 1, "b": 2 };

        assert!(matches(&document, doc! { "$and": [{ "a": 1 }, { "b": 2 }] }));
        assert!(matches(&document, doc! { "$or": [{ "a": 5 }, { "b": 2 }] }));
        assert!(matches(&document, doc! { "$nor": [{ "a": 5 }, { "b": 5 }] }));
        assert!(!matches(&document, doc! { "$or": [{ "a": 5 }, { "b": 5 }] }));
    }

    #[test]
    fn unsupported_operators_are_rejected() {
        let document = doc! { "a": 1 };

        assert!(DocumentEvaluator::new(&document).matches(&doc! { "a": { "$regex": "x" } }).is_err());
        assert!(DocumentEvaluator::new(&document).matches(&doc! { "$where": "true" }).is_err());
        assert!(DocumentEvaluator::new(&document).matches(&doc! { "$or": [] }).is_err());
    }

    #[test]
    fn total_order_across_types() {
        assert_eq!(total_cmp(&Bson::Null, &Bson::Int32(0)), Ordering::Less);
        assert_eq!(total_cmp(&Bson::Int32(2), &Bson::Double(1.5)), Ordering::Greater);
        assert_eq!(total_cmp(&Bson::String("a".into()), &Bson::Int64(9)), Ordering::Greater);

        let (older, newer) = (ObjectId::new(), ObjectId::new());
        assert_eq!(total_cmp(&Bson::ObjectId(older), &Bson::ObjectId(newer)), Ordering::Less);
    }
}
