//! Conversion of external identifier tokens into store identifiers.
//!
//! Identifiers cross the external boundary as 24 character hexadecimal strings and
//! are used internally as [`ObjectId`]s. Batches are resolved all-or-nothing: the
//! first malformed token fails the whole batch before any filter is built, so a
//! partially resolved batch can never reach the store.

use bson::{Document, doc, oid::ObjectId};

use crate::{
    document::ID_FIELD,
    error::{DocumentStoreError, DocumentStoreResult},
};

/// Resolves a single external identifier token.
///
/// # Errors
///
/// Returns [`DocumentStoreError::InvalidIdentifier`] naming the token when it is not
/// a valid hexadecimal identifier encoding.
pub fn resolve(token: &str) -> DocumentStoreResult<ObjectId> {
    ObjectId::parse_str(token).map_err(|_| DocumentStoreError::InvalidIdentifier(token.to_string()))
}

/// Resolves a batch of external identifier tokens, preserving their order.
///
/// # Errors
///
/// Fails with [`DocumentStoreError::InvalidIdentifier`] naming the first offending
/// token; no identifiers are returned in that case.
pub fn resolve_all<I, S>(tokens: I) -> DocumentStoreResult<Vec<ObjectId>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    tokens
        .into_iter()
        .map(|token| resolve(token.as_ref()))
        .collect()
}

/// Builds the filter matching exactly one identifier.
pub fn id_filter(id: ObjectId) -> Document {
    doc! { ID_FIELD: id }
}

/// Builds the "identifier in set" filter used by batch operations.
pub fn ids_filter(ids: Vec<ObjectId>) -> Document {
    doc! { ID_FIELD: { "$in": ids } }
}
