//! Store capability abstraction.
//!
//! This module defines the traits that abstract over document store implementations,
//! allowing the core to run against the production store, an in-memory store, or a
//! test double without per-backend code.
//!
//! # Overview
//!
//! The [`StoreBackend`] trait exposes the per-collection operations the core needs:
//! insert, find, exact and estimated counts, find-one, single and multi updates,
//! replace and delete. Implementations are required to be thread-safe
//! (`Send + Sync`). The trait is object safe, so a backend chosen at runtime can be
//! held as `Arc<dyn StoreBackend>`.
//!
//! # Cancellation
//!
//! Backends do not receive the request [`Context`](crate::context::Context). The core
//! binds each returned future to the context and drops it on timeout or cancellation,
//! so implementations only need to be cancellation-safe in the usual async sense.
//!
//! # Examples
//!
//! ```ignore
//! use docrest::backend::StoreBackend;
//! use bson::doc;
//!
//! let backend = MyBackendImpl::new();
//! let id = backend.insert_one("users", doc! { "name": "Alice" }).await?;
//! let total = backend.count_documents("users", doc! { "name": "Alice" }).await?;
//! ```

use std::{fmt::Debug, sync::Arc};

use async_trait::async_trait;
use bson::{Bson, Document};

use crate::{
    error::{BackendResult, DocumentStoreResult},
    mutation::{DeleteResult, UpdateResult},
    query::FindOptions,
};

/// Abstract interface for document store backends.
///
/// Collections are addressed by name and never need to exist beforehand: a
/// collection that does not exist reads as empty.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Inserts a document into a collection.
    ///
    /// # Returns
    ///
    /// The identifier of the inserted document, generated by the store when the
    /// document has no `_id` field.
    async fn insert_one(&self, collection: &str, document: Document) -> BackendResult<Bson>;

    /// Returns the documents matching `filter`, ordered and bounded by `options`.
    async fn find(
        &self,
        collection: &str,
        filter: Document,
        options: FindOptions,
    ) -> BackendResult<Vec<Document>>;

    /// Counts the documents matching `filter` exactly.
    async fn count_documents(&self, collection: &str, filter: Document) -> BackendResult<u64>;

    /// Returns the store-maintained size of the collection. May be stale.
    async fn estimated_document_count(&self, collection: &str) -> BackendResult<u64>;

    /// Returns the first document matching `filter`, if any.
    async fn find_one(&self, collection: &str, filter: Document)
    -> BackendResult<Option<Document>>;

    /// Applies `update` to the first document matching `filter`.
    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> BackendResult<UpdateResult>;

    /// Applies `update` to every document matching `filter`.
    async fn update_many(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> BackendResult<UpdateResult>;

    /// Replaces the fields of the first document matching `filter` with `replacement`.
    async fn replace_one(
        &self,
        collection: &str,
        filter: Document,
        replacement: Document,
    ) -> BackendResult<UpdateResult>;

    /// Deletes the first document matching `filter`.
    async fn delete_one(&self, collection: &str, filter: Document) -> BackendResult<DeleteResult>;

    /// Cleanly shuts down the backend, releasing connections and other resources.
    ///
    /// The default implementation is a no-op.
    async fn shutdown(&self) -> BackendResult<()> {
        Ok(())
    }
}

#[async_trait]
impl<B> StoreBackend for &B
where
    B: StoreBackend + ?Sized,
{
    async fn insert_one(&self, collection: &str, document: Document) -> BackendResult<Bson> {
        (**self).insert_one(collection, document).await
    }

    async fn find(
        &self,
        collection: &str,
        filter: Document,
        options: FindOptions,
    ) -> BackendResult<Vec<Document>> {
        (**self).find(collection, filter, options).await
    }

    async fn count_documents(&self, collection: &str, filter: Document) -> BackendResult<u64> {
        (**self).count_documents(collection, filter).await
    }

    async fn estimated_document_count(&self, collection: &str) -> BackendResult<u64> {
        (**self).estimated_document_count(collection).await
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
    ) -> BackendResult<Option<Document>> {
        (**self).find_one(collection, filter).await
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> BackendResult<UpdateResult> {
        (**self).update_one(collection, filter, update).await
    }

    async fn update_many(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> BackendResult<UpdateResult> {
        (**self).update_many(collection, filter, update).await
    }

    async fn replace_one(
        &self,
        collection: &str,
        filter: Document,
        replacement: Document,
    ) -> BackendResult<UpdateResult> {
        (**self).replace_one(collection, filter, replacement).await
    }

    async fn delete_one(&self, collection: &str, filter: Document) -> BackendResult<DeleteResult> {
        (**self).delete_one(collection, filter).await
    }

    async fn shutdown(&self) -> BackendResult<()> {
        (**self).shutdown().await
    }
}

#[async_trait]
impl<B> StoreBackend for Arc<B>
where
    B: StoreBackend + ?Sized,
{
    async fn insert_one(&self, collection: &str, document: Document) -> BackendResult<Bson> {
        (**self).insert_one(collection, document).await
    }

    async fn find(
        &self,
        collection: &str,
        filter: Document,
        options: FindOptions,
    ) -> BackendResult<Vec<Document>> {
        (**self).find(collection, filter, options).await
    }

    async fn count_documents(&self, collection: &str, filter: Document) -> BackendResult<u64> {
        (**self).count_documents(collection, filter).await
    }

    async fn estimated_document_count(&self, collection: &str) -> BackendResult<u64> {
        (**self).estimated_document_count(collection).await
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
    ) -> BackendResult<Option<Document>> {
        (**self).find_one(collection, filter).await
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> BackendResult<UpdateResult> {
        (**self).update_one(collection, filter, update).await
    }

    async fn update_many(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> BackendResult<UpdateResult> {
        (**self).update_many(collection, filter, update).await
    }

    async fn replace_one(
        &self,
        collection: &str,
        filter: Document,
        replacement: Document,
    ) -> BackendResult<UpdateResult> {
        (**self).replace_one(collection, filter, replacement).await
    }

    async fn delete_one(&self, collection: &str, filter: Document) -> BackendResult<DeleteResult> {
        (**self).delete_one(collection, filter).await
    }

    async fn shutdown(&self) -> BackendResult<()> {
        (**self).shutdown().await
    }
}

/// Factory for backend instances; the single initialization point of a store.
#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> DocumentStoreResult<Self::Backend>;
}
