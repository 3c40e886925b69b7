//! The adapter that issues assembled operations against the store.
//!
//! Each method issues exactly one store call, bound to the request context, and
//! translates the outcome into the core's error vocabulary. No method retries.

use bson::{Bson, Document};

use crate::{
    backend::StoreBackend,
    context::Context,
    error::{DocumentStoreResult, StoreOperation},
    mutation::{DeleteResult, UpdateResult},
    query::FindOptions,
};

#[derive(Debug)]
pub(crate) struct CollectionGateway<'a, B: StoreBackend> {
    name: &'a str,
    backend: &'a B,
    ctx: &'a Context,
}

impl<'a, B: StoreBackend> CollectionGateway<'a, B> {
    pub(crate) fn new(name: &'a str, backend: &'a B, ctx: &'a Context) -> Self {
        Self { name, backend, ctx }
    }

    pub(crate) async fn insert_one(&self, document: Document) -> DocumentStoreResult<Bson> {
        self.ctx
            .run(StoreOperation::InsertOne, self.backend.insert_one(self.name, document))
            .await
    }

    pub(crate) async fn find(
        &self,
        filter: Document,
        options: FindOptions,
    ) -> DocumentStoreResult<Vec<Document>> {
        self.ctx
            .run(StoreOperation::Find, self.backend.find(self.name, filter, options))
            .await
    }

    pub(crate) async fn count_documents(&self, filter: Document) -> DocumentStoreResult<u64> {
        self.ctx
            .run(
                StoreOperation::CountDocuments,
                self.backend.count_documents(self.name, filter),
            )
            .await
    }

    pub(crate) async fn estimated_document_count(&self) -> DocumentStoreResult<u64> {
        self.ctx
            .run(
                StoreOperation::EstimatedDocumentCount,
                self.backend.estimated_document_count(self.name),
            )
            .await
    }

    pub(crate) async fn find_one(&self, filter: Document) -> DocumentStoreResult<Option<Document>> {
        self.ctx
            .run(StoreOperation::FindOne, self.backend.find_one(self.name, filter))
            .await
    }

    pub(crate) async fn update_one(
        &self,
        filter: Document,
        update: Document,
    ) -> DocumentStoreResult<UpdateResult> {
        self.ctx
            .run(
                StoreOperation::UpdateOne,
                self.backend.update_one(self.name, filter, update),
            )
            .await
    }

    pub(crate) async fn update_many(
        &self,
        filter: Document,
        update: Document,
    ) -> DocumentStoreResult<UpdateResult> {
        self.ctx
            .run(
                StoreOperation::UpdateMany,
                self.backend.update_many(self.name, filter, update),
            )
            .await
    }

    pub(crate) async fn replace_one(
        &self,
        filter: Document,
        replacement: Document,
    ) -> DocumentStoreResult<UpdateResult> {
        self.ctx
            .run(
                StoreOperation::ReplaceOne,
                self.backend.replace_one(self.name, filter, replacement),
            )
            .await
    }

    pub(crate) async fn delete_one(&self, filter: Document) -> DocumentStoreResult<DeleteResult> {
        self.ctx
            .run(StoreOperation::DeleteOne, self.backend.delete_one(self.name, filter))
            .await
    }
}
