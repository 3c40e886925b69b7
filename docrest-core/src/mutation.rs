//! Write payloads, lifecycle timestamp injection and mutation results.
//!
//! Whether a payload receives timestamps is decided by its variant, chosen by the
//! caller, never by inspecting its contents at runtime:
//!
//! - [`WritePayload::Document`] (create/replace) gets `create_time` and
//!   `update_time`; [`WritePayload::Verbatim`] is stored exactly as given.
//! - [`UpdatePayload::OperatorUpdate`] gets `update_time` merged into its `$set`
//!   clause (created when absent); [`UpdatePayload::RawDocument`] is forwarded as is.

use bson::{Bson, DateTime, Document};
use serde::{Deserialize, Serialize};

use crate::{
    document::{UPDATE_TIME, stamp_created},
    error::{DocumentStoreError, DocumentStoreResult},
};

/// The update operator that receives the `update_time` injection.
pub const SET_OPERATOR: &str = "$set";

/// Payload of a create or replace operation.
#[derive(Debug, Clone, PartialEq)]
pub enum WritePayload {
    /// A document mapping; both lifecycle timestamps are (re)written.
    Document(Document),
    /// A pre-built document forwarded to the store unmodified.
    Verbatim(Document),
}

impl WritePayload {
    pub(crate) fn into_stamped(self, now: DateTime) -> Document {
        match self {
            WritePayload::Document(mut document) => {
                stamp_created(&mut document, now);
                document
            }
            WritePayload::Verbatim(document) => document,
        }
    }
}

impl From<Document> for WritePayload {
    fn from(document: Document) -> Self {
        WritePayload::Document(document)
    }
}

/// Payload of an update operation.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdatePayload {
    /// A document forwarded to the store's update call without modification.
    RawDocument(Document),
    /// A document of store update operators (`$set`, `$inc`, ...).
    OperatorUpdate(Document),
}

impl UpdatePayload {
    /// Tags `document` as an operator update when every top-level key is an
    /// operator, and as a raw document otherwise.
    pub fn classify(document: Document) -> Self {
        if !document.is_empty() && document.keys().all(|key| key.starts_with('$')) {
            UpdatePayload::OperatorUpdate(document)
        } else {
            UpdatePayload::RawDocument(document)
        }
    }

    /// Produces the update document sent to the store.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidUpdate`] when an operator update carries a
    /// `$set` clause that is not a mapping.
    pub(crate) fn into_stamped(self, now: DateTime) -> DocumentStoreResult<Document> {
        match self {
            UpdatePayload::RawDocument(document) => Ok(document),
            UpdatePayload::OperatorUpdate(mut document) => {
                match document.get_mut(SET_OPERATOR) {
                    Some(Bson::Document(set)) => {
                        set.insert(UPDATE_TIME, now);
                    }
                    Some(other) => {
                        return Err(DocumentStoreError::InvalidUpdate(format!(
                            "{SET_OPERATOR} clause must be a document, found {:?}",
                            other.element_type()
                        )));
                    }
                    None => {
                        let mut set = Document::new();
                        set.insert(UPDATE_TIME, now);
                        document.insert(SET_OPERATOR, set);
                    }
                }
                Ok(document)
            }
        }
    }
}

/// Outcome of an update or replace operation.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateResult {
    /// Number of documents matching the filter.
    pub matched: u64,
    /// Number of documents actually changed.
    pub modified: u64,
}

/// Outcome of a delete operation.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteResult {
    /// Number of documents removed (0 or 1 for single deletes).
    pub deleted: u64,
}

#[cfg(test)]
mod tests {
    use bson::doc;

    use super::*;
    use crate::document::CREATE_TIME;

    fn instant() -> DateTime {
        DateTime::from_millis(1_700_000_000_000)
    }

    #[test]
    fn document_payload_receives_both_timestamps() {
        let stamped = WritePayload::Document(doc! { "name": "a" }).into_stamped(instant());

        assert_eq!(
            stamped,
            doc! { "name": "a", "create_time": instant(), "update_time": instant() }
        );
    }

    #[test]
    fn verbatim_payload_is_untouched() {
        let document = doc! { "name": "a", CREATE_TIME: "kept" };

        assert_eq!(
            WritePayload::Verbatim(document.clone()).into_stamped(instant()),
            document
        );
    }

    #[test]
    fn operator_update_refreshes_existing_set_clause() {
        let update = UpdatePayload::OperatorUpdate(doc! {
            "$set": { "name": "b", "update_time": "stale" },
        });

        assert_eq!(
            update.into_stamped(instant()).unwrap(),
            doc! { "$set": { "name": "b", "update_time": instant() } }
        );
    }

    #[test]
    fn operator_update_without_set_gets_one() {
        let update = UpdatePayload::OperatorUpdate(doc! { "$inc": { "views": 1 } });

        assert_eq!(
            update.into_stamped(instant()).unwrap(),
            doc! { "$inc": { "views": 1 }, "$set": { "update_time": instant() } }
        );
    }

    #[test]
    fn operator_update_with_scalar_set_is_rejected() {
        let update = UpdatePayload::OperatorUpdate(doc! { "$set": 5 });

        assert!(matches!(
            update.into_stamped(instant()),
            Err(DocumentStoreError::InvalidUpdate(_))
        ));
    }

    #[test]
    fn raw_update_is_forwarded_unmodified() {
        let document = doc! { "name": "b" };

        assert_eq!(
            UpdatePayload::RawDocument(document.clone())
                .into_stamped(instant())
                .unwrap(),
            document
        );
    }

    #[test]
    fn classify_by_operator_keys() {
        assert!(matches!(
            UpdatePayload::classify(doc! { "$set": { "a": 1 }, "$inc": { "b": 1 } }),
            UpdatePayload::OperatorUpdate(_)
        ));
        assert!(matches!(
            UpdatePayload::classify(doc! { "$set": { "a": 1 }, "b": 1 }),
            UpdatePayload::RawDocument(_)
        ));
        assert!(matches!(
            UpdatePayload::classify(doc! {}),
            UpdatePayload::RawDocument(_)
        ));
    }
}
