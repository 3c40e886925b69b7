use async_trait::async_trait;
use futures::TryStreamExt;
use bson::{Bson, Document};
use mongodb::{
    Client, Collection as MongoCollection,
    error::{Error as MongoError, ErrorKind as MongoErrorKind},
    options::{ClientOptions, FindOptions as MongoFindOptions},
};
use docrest_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    error::{BackendError, BackendResult, DocumentStoreError, DocumentStoreResult},
    mutation::{DeleteResult, UpdateResult},
    query::FindOptions,
};


#[derive(Debug)]
pub struct MongoDbStore {
    client: Client,
    database: String,
}

impl MongoDbStore {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::new(dsn, database)
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(collection_name)
    }
}

/// Translates find options into the driver's options.
fn find_options(options: FindOptions) -> MongoFindOptions {
    let mut translated = MongoFindOptions::default();

    translated.sort = Some(options.sort);
    if options.allow_disk_use {
        translated.allow_disk_use = Some(true);
    }
    if let Some(skip) = options.skip {
        translated.skip = Some(skip);
    }
    if let Some(limit) = options.limit {
        translated.limit = Some(limit as i64);
    }

    translated
}

/// Write and command errors are the server refusing the request; everything else is
/// a transport or driver failure.
fn backend_error(err: MongoError) -> BackendError {
    match err.kind.as_ref() {
        MongoErrorKind::Write(_) | MongoErrorKind::Command(_) => BackendError::Rejected(err.to_string()),
        _ => BackendError::Backend(err.to_string()),
    }
}

#[async_trait]
impl StoreBackend for MongoDbStore {
    async fn insert_one(&self, collection: &str, document: Document) -> BackendResult<Bson> {
        Ok(self
            .get_collection(collection)
            .insert_one(document)
            .await
            .map_err(backend_error)?
            .inserted_id)
    }

    async fn find(
        &self,
        collection: &str,
        filter: Document,
        options: FindOptions,
    ) -> BackendResult<Vec<Document>> {
        self.get_collection(collection)
            .find(filter)
            .with_options(find_options(options))
            .await
            .map_err(backend_error)?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(backend_error)
    }

    async fn count_documents(&self, collection: &str, filter: Document) -> BackendResult<u64> {
        self.get_collection(collection)
            .count_documents(filter)
            .await
            .map_err(backend_error)
    }

    async fn estimated_document_count(&self, collection: &str) -> BackendResult<u64> {
        self.get_collection(collection)
            .estimated_document_count()
            .await
            .map_err(backend_error)
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
    ) -> BackendResult<Option<Document>> {
        self.get_collection(collection)
            .find_one(filter)
            .await
            .map_err(backend_error)
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> BackendResult<UpdateResult> {
        let result = self
            .get_collection(collection)
            .update_one(filter, update)
            .await
            .map_err(backend_error)?;

        Ok(UpdateResult {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn update_many(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> BackendResult<UpdateResult> {
        let result = self
            .get_collection(collection)
            .update_many(filter, update)
            .await
            .map_err(backend_error)?;

        Ok(UpdateResult {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn replace_one(
        &self,
        collection: &str,
        filter: Document,
        replacement: Document,
    ) -> BackendResult<UpdateResult> {
        let result = self
            .get_collection(collection)
            .replace_one(filter, replacement)
            .await
            .map_err(backend_error)?;

        Ok(UpdateResult {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn delete_one(&self, collection: &str, filter: Document) -> BackendResult<DeleteResult> {
        Ok(DeleteResult {
            deleted: self
                .get_collection(collection)
                .delete_one(filter)
                .await
                .map_err(backend_error)?
                .deleted_count,
        })
    }

    async fn shutdown(&self) -> BackendResult<()> {
        tracing::debug!(database = %self.database, "shutting down mongodb client");
        self.client.clone().shutdown().await;

        Ok(())
    }
}

pub struct MongoDbStoreBuilder {
    dsn: String,
    database: String,
}

impl MongoDbStoreBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: database.to_string(),
        }
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoDbStoreBuilder {
    type Backend = MongoDbStore;

    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        tracing::debug!(database = %self.database, "connecting to mongodb");

        Ok(MongoDbStore::new(
            Client::with_options(
                ClientOptions::parse(&self.dsn)
                    .await
                    .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?,
            )
            .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?,
            self.database,
        ))
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;
    use docrest_core::query::SortSpec;

    use super::*;

    #[test]
    fn default_options_sort_newest_first() {
        let translated = find_options(FindOptions::default());

        assert_eq!(translated.sort, Some(doc! { "_id": -1 }));
        assert_eq!(translated.allow_disk_use, None);
        assert_eq!(translated.skip, None);
        assert_eq!(translated.limit, None);
    }

    #[test]
    fn explicit_sort_and_page_bounds_are_forwarded() {
        let sort = SortSpec::parse(["age,-1", "name,1"]).unwrap();
        let translated = find_options(FindOptions::sorted(&sort).bounded(20, 10));

        assert_eq!(translated.sort, Some(doc! { "age": -1, "name": 1 }));
        assert_eq!(translated.allow_disk_use, Some(true));
        assert_eq!(translated.skip, Some(20));
        assert_eq!(translated.limit, Some(10));
    }
}
