//! Per-collection read and write operations.
//!
//! A [`Collection`] is a lightweight handle obtained from
//! [`DocumentStore::collection`](crate::store::DocumentStore::collection). It
//! normalizes request inputs (identifier tokens, filters, sort specifications,
//! pagination and update payloads) into store operations and issues them through the
//! collection gateway.
//!
//! # Example
//!
//! ```ignore
//! use docrest::prelude::*;
//! use bson::doc;
//!
//! let items = store.collection("items");
//! let ctx = Context::with_timeout(Duration::from_secs(5));
//!
//! let id = items.create(&ctx, doc! { "name": "a" }).await?;
//! let page = items
//!     .find_by_page(&ctx, Pagination::new(1, 20).unwrap(), Filter::all(), &SortSpec::default())
//!     .await?;
//! ```

use bson::{Bson, Document};
use serde::Serialize;
use tracing::debug;

use crate::{
    backend::StoreBackend,
    context::Context,
    document::Clock,
    error::{DocumentStoreError, DocumentStoreResult},
    gateway::CollectionGateway,
    id,
    mutation::{DeleteResult, UpdatePayload, UpdateResult, WritePayload},
    page::{CountStrategy, Page, Pagination},
    query::{Filter, FindOptions, SortSpec},
};

/// Selects the documents an update applies to.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateTarget {
    /// The first document matching the filter.
    One(Filter),
    /// Every document matching the filter.
    Many(Filter),
    /// Every document whose identifier is in the batch.
    Ids(Vec<String>),
}

/// Result of a read that may or may not be paginated.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum FindResult {
    /// Unpaged read: a plain sequence of documents.
    Documents(Vec<Document>),
    /// Paged read: the `{ total, data }` envelope.
    Page(Page<Document>),
}

/// A handle to a named collection.
///
/// The collection does not need to exist; an unknown collection reads as empty.
#[derive(Debug)]
pub struct Collection<'a, B: StoreBackend> {
    name: String,
    backend: &'a B,
    clock: &'a dyn Clock,
}

impl<'a, B: StoreBackend> Collection<'a, B> {
    pub(crate) fn new(name: String, backend: &'a B, clock: &'a dyn Clock) -> Self {
        Self { name, backend, clock }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn gateway<'c>(&'c self, ctx: &'c Context) -> CollectionGateway<'c, B> {
        CollectionGateway::new(&self.name, self.backend, ctx)
    }

    /// Inserts a new document.
    ///
    /// Document payloads get `create_time` and `update_time` set to the same instant,
    /// overwriting any caller supplied values.
    ///
    /// # Returns
    ///
    /// The identifier of the new document.
    pub async fn create(
        &self,
        ctx: &Context,
        payload: impl Into<WritePayload>,
    ) -> DocumentStoreResult<Bson> {
        let document = payload.into().into_stamped(self.clock.now());
        debug!(collection = %self.name, "create");

        self.gateway(ctx).insert_one(document).await
    }

    /// Returns the documents matching `filter`, ordered by `sort`.
    pub async fn find(
        &self,
        ctx: &Context,
        filter: Filter,
        sort: &SortSpec,
    ) -> DocumentStoreResult<Vec<Document>> {
        self.find_with_options(ctx, filter, FindOptions::sorted(sort))
            .await
    }

    /// Returns the documents matching `filter` using explicit store options.
    pub async fn find_with_options(
        &self,
        ctx: &Context,
        filter: Filter,
        options: FindOptions,
    ) -> DocumentStoreResult<Vec<Document>> {
        debug!(
            collection = %self.name,
            allow_disk_use = options.allow_disk_use,
            skip = ?options.skip,
            limit = ?options.limit,
            "find"
        );

        self.gateway(ctx)
            .find(filter.into_document(), options)
            .await
    }

    /// Returns the documents whose identifiers are in `ids`, ordered by `sort`.
    ///
    /// # Errors
    ///
    /// Fails with [`DocumentStoreError::InvalidIdentifier`] before touching the store
    /// if any token is malformed.
    pub async fn find_by_ids<S: AsRef<str>>(
        &self,
        ctx: &Context,
        ids: &[S],
        sort: &SortSpec,
    ) -> DocumentStoreResult<Vec<Document>> {
        let filter = id::ids_filter(id::resolve_all(ids)?);

        self.find(ctx, filter.into(), sort).await
    }

    /// Returns one page of the documents matching `filter` with the matching total.
    ///
    /// A non-empty filter is counted exactly; an empty filter uses the store's
    /// estimated collection size. If the count fails the page is not fetched.
    pub async fn find_by_page(
        &self,
        ctx: &Context,
        page: Pagination,
        filter: Filter,
        sort: &SortSpec,
    ) -> DocumentStoreResult<Page<Document>> {
        let strategy = CountStrategy::for_filter(&filter);
        debug!(
            collection = %self.name,
            index = page.index(),
            size = page.size(),
            ?strategy,
            "find by page"
        );

        let gateway = self.gateway(ctx);
        let total = match strategy {
            CountStrategy::Exact => {
                gateway
                    .count_documents(filter.as_document().clone())
                    .await?
            }
            CountStrategy::Estimated => gateway.estimated_document_count().await?,
        };

        let data = self
            .find_with_options(
                ctx,
                filter,
                FindOptions::sorted(sort).bounded(page.skip(), page.limit()),
            )
            .await?;

        Ok(Page::new(total, data))
    }

    /// Paginates when `page` is present, otherwise returns the plain unpaged read.
    pub async fn find_paginated(
        &self,
        ctx: &Context,
        page: Option<Pagination>,
        filter: Filter,
        sort: &SortSpec,
    ) -> DocumentStoreResult<FindResult> {
        Ok(match page {
            Some(page) => FindResult::Page(self.find_by_page(ctx, page, filter, sort).await?),
            None => FindResult::Documents(self.find(ctx, filter, sort).await?),
        })
    }

    /// Returns the first document matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::NotFound`] when nothing matches.
    pub async fn find_one(&self, ctx: &Context, filter: Filter) -> DocumentStoreResult<Document> {
        debug!(collection = %self.name, "find one");

        self.gateway(ctx)
            .find_one(filter.into_document())
            .await?
            .ok_or_else(|| DocumentStoreError::NotFound { collection: self.name.clone() })
    }

    /// Returns the document with the given identifier.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidIdentifier`] for a malformed token and
    /// [`DocumentStoreError::NotFound`] when no such document exists.
    pub async fn find_one_by_id(&self, ctx: &Context, id: &str) -> DocumentStoreResult<Document> {
        let filter = id::id_filter(id::resolve(id)?);

        self.find_one(ctx, filter.into()).await
    }

    /// Updates the documents selected by `target`.
    ///
    /// Matching nothing is not an error; the result reports zero counts.
    pub async fn update(
        &self,
        ctx: &Context,
        target: UpdateTarget,
        update: UpdatePayload,
    ) -> DocumentStoreResult<UpdateResult> {
        match target {
            UpdateTarget::One(filter) => self.update_one(ctx, filter, update).await,
            UpdateTarget::Many(filter) => self.update_many(ctx, filter, update).await,
            UpdateTarget::Ids(ids) => self.update_by_ids(ctx, ids.as_slice(), update).await,
        }
    }

    /// Updates the first document matching `filter`.
    pub async fn update_one(
        &self,
        ctx: &Context,
        filter: Filter,
        update: UpdatePayload,
    ) -> DocumentStoreResult<UpdateResult> {
        let update = update.into_stamped(self.clock.now())?;
        debug!(collection = %self.name, "update one");

        self.gateway(ctx)
            .update_one(filter.into_document(), update)
            .await
    }

    /// Updates every document matching `filter`.
    pub async fn update_many(
        &self,
        ctx: &Context,
        filter: Filter,
        update: UpdatePayload,
    ) -> DocumentStoreResult<UpdateResult> {
        let update = update.into_stamped(self.clock.now())?;
        debug!(collection = %self.name, "update many");

        self.gateway(ctx)
            .update_many(filter.into_document(), update)
            .await
    }

    /// Updates every document whose identifier is in `ids`.
    ///
    /// # Errors
    ///
    /// Fails with [`DocumentStoreError::InvalidIdentifier`] before touching the store
    /// if any token is malformed.
    pub async fn update_by_ids<S: AsRef<str>>(
        &self,
        ctx: &Context,
        ids: &[S],
        update: UpdatePayload,
    ) -> DocumentStoreResult<UpdateResult> {
        let filter = id::ids_filter(id::resolve_all(ids)?);

        self.update_many(ctx, filter.into(), update).await
    }

    /// Updates the document with the given identifier.
    pub async fn update_one_by_id(
        &self,
        ctx: &Context,
        id: &str,
        update: UpdatePayload,
    ) -> DocumentStoreResult<UpdateResult> {
        let filter = id::id_filter(id::resolve(id)?);

        self.update_one(ctx, filter.into(), update).await
    }

    /// Replaces the document with the given identifier.
    ///
    /// A replace logically recreates the document in place, so document payloads get
    /// both `create_time` and `update_time` rewritten.
    pub async fn replace_one_by_id(
        &self,
        ctx: &Context,
        id: &str,
        payload: impl Into<WritePayload>,
    ) -> DocumentStoreResult<UpdateResult> {
        let filter = id::id_filter(id::resolve(id)?);
        let replacement = payload.into().into_stamped(self.clock.now());
        debug!(collection = %self.name, %id, "replace one by id");

        self.gateway(ctx)
            .replace_one(filter, replacement)
            .await
    }

    /// Deletes the document with the given identifier.
    ///
    /// Deleting an identifier that does not exist reports zero deletions.
    pub async fn delete_one_by_id(&self, ctx: &Context, id: &str) -> DocumentStoreResult<DeleteResult> {
        let filter = id::id_filter(id::resolve(id)?);
        debug!(collection = %self.name, %id, "delete one by id");

        self.gateway(ctx).delete_one(filter).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use bson::{DateTime, doc, oid::ObjectId};

    use super::*;
    use crate::{
        error::{BackendError, BackendResult, ErrorKind, StoreOperation},
        store::DocumentStore,
    };

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Insert(Document),
        Find(Document, FindOptions),
        Count(Document),
        Estimated,
        FindOne(Document),
        UpdateOne(Document, Document),
        UpdateMany(Document, Document),
        Replace(Document, Document),
        Delete(Document),
    }

    #[derive(Debug, Default)]
    struct RecordingBackend {
        calls: Mutex<Vec<Call>>,
        found: Option<Document>,
        fail_count: bool,
        fail_find: bool,
    }

    impl RecordingBackend {
        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl StoreBackend for RecordingBackend {
        async fn insert_one(&self, _: &str, document: Document) -> BackendResult<Bson> {
            self.record(Call::Insert(document));
            Ok(Bson::ObjectId(ObjectId::new()))
        }

        async fn find(
            &self,
            _: &str,
            filter: Document,
            options: FindOptions,
        ) -> BackendResult<Vec<Document>> {
            self.record(Call::Find(filter, options));
            if self.fail_find {
                return Err(BackendError::Backend("find exploded".into()));
            }
            Ok(vec![doc! { "name": "a" }])
        }

        async fn count_documents(&self, _: &str, filter: Document) -> BackendResult<u64> {
            self.record(Call::Count(filter));
            if self.fail_count {
                return Err(BackendError::Backend("count exploded".into()));
            }
            Ok(3)
        }

        async fn estimated_document_count(&self, _: &str) -> BackendResult<u64> {
            self.record(Call::Estimated);
            Ok(42)
        }

        async fn find_one(&self, _: &str, filter: Document) -> BackendResult<Option<Document>> {
            self.record(Call::FindOne(filter));
            Ok(self.found.clone())
        }

        async fn update_one(
            &self,
            _: &str,
            filter: Document,
            update: Document,
        ) -> BackendResult<UpdateResult> {
            self.record(Call::UpdateOne(filter, update));
            Ok(UpdateResult::default())
        }

        async fn update_many(
            &self,
            _: &str,
            filter: Document,
            update: Document,
        ) -> BackendResult<UpdateResult> {
            self.record(Call::UpdateMany(filter, update));
            Ok(UpdateResult::default())
        }

        async fn replace_one(
            &self,
            _: &str,
            filter: Document,
            replacement: Document,
        ) -> BackendResult<UpdateResult> {
            self.record(Call::Replace(filter, replacement));
            Ok(UpdateResult { matched: 1, modified: 1 })
        }

        async fn delete_one(&self, _: &str, filter: Document) -> BackendResult<DeleteResult> {
            self.record(Call::Delete(filter));
            Ok(DeleteResult::default())
        }
    }

    #[derive(Debug)]
    struct FixedClock(DateTime);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime {
            self.0
        }
    }

    fn instant() -> DateTime {
        DateTime::from_millis(1_700_000_000_000)
    }

    fn store(backend: RecordingBackend) -> DocumentStore<RecordingBackend> {
        DocumentStore::new(backend).with_clock(FixedClock(instant()))
    }

    #[tokio::test]
    async fn create_stamps_equal_timestamps() {
        let store = store(RecordingBackend::default());
        let id = store
            .collection("items")
            .create(&Context::background(), doc! { "name": "a", "update_time": 1 })
            .await
            .unwrap();

        assert!(id.as_object_id().is_some());
        assert_eq!(
            store.backend().calls(),
            vec![Call::Insert(doc! {
                "name": "a",
                "update_time": instant(),
                "create_time": instant(),
            })]
        );
    }

    #[tokio::test]
    async fn unfiltered_page_uses_estimated_count() {
        let store = store(RecordingBackend::default());
        let page = store
            .collection("items")
            .find_by_page(
                &Context::background(),
                Pagination::new(2, 10).unwrap(),
                Filter::all(),
                &SortSpec::default(),
            )
            .await
            .unwrap();

        assert_eq!(page.total, 42);
        assert_eq!(page.data, vec![doc! { "name": "a" }]);
        assert_eq!(
            store.backend().calls(),
            vec![
                Call::Estimated,
                Call::Find(doc! {}, FindOptions::default().bounded(10, 10)),
            ]
        );
    }

    #[tokio::test]
    async fn filtered_page_uses_exact_count() {
        let store = store(RecordingBackend::default());
        let sort = SortSpec::parse(["age,1"]).unwrap();
        let page = store
            .collection("items")
            .find_by_page(
                &Context::background(),
                Pagination::new(3, 20).unwrap(),
                doc! { "status": "open" }.into(),
                &sort,
            )
            .await
            .unwrap();

        assert_eq!(page.total, 3);
        assert_eq!(
            store.backend().calls(),
            vec![
                Call::Count(doc! { "status": "open" }),
                Call::Find(
                    doc! { "status": "open" },
                    FindOptions {
                        sort: doc! { "age": 1 },
                        allow_disk_use: true,
                        skip: Some(40),
                        limit: Some(20),
                    }
                ),
            ]
        );
    }

    #[tokio::test]
    async fn failed_count_skips_fetch() {
        let store = store(RecordingBackend { fail_count: true, ..Default::default() });
        let err = store
            .collection("items")
            .find_by_page(
                &Context::background(),
                Pagination::new(1, 10).unwrap(),
                doc! { "status": "open" }.into(),
                &SortSpec::default(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::StoreFailure);
        assert_eq!(err.operation(), Some(StoreOperation::CountDocuments));
        assert_eq!(
            store.backend().calls(),
            vec![Call::Count(doc! { "status": "open" })]
        );
    }

    #[tokio::test]
    async fn failed_fetch_after_count_names_find() {
        let store = store(RecordingBackend { fail_find: true, ..Default::default() });
        let err = store
            .collection("items")
            .find_by_page(
                &Context::background(),
                Pagination::new(2, 10).unwrap(),
                Filter::all(),
                &SortSpec::default(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::StoreFailure);
        assert_eq!(err.operation(), Some(StoreOperation::Find));
        assert_eq!(
            store.backend().calls(),
            vec![
                Call::Estimated,
                Call::Find(doc! {}, FindOptions::default().bounded(10, 10)),
            ]
        );
    }

    #[tokio::test]
    async fn unpaged_read_returns_plain_documents() {
        let store = store(RecordingBackend::default());
        let found = store
            .collection("items")
            .find_paginated(&Context::background(), None, Filter::all(), &SortSpec::default())
            .await
            .unwrap();

        assert_eq!(found, FindResult::Documents(vec![doc! { "name": "a" }]));
        assert_eq!(
            store.backend().calls(),
            vec![Call::Find(doc! {}, FindOptions::default())]
        );
    }

    #[tokio::test]
    async fn invalid_identifiers_never_reach_the_store() {
        let store = store(RecordingBackend::default());
        let items = store.collection("items");
        let ctx = Context::background();
        let valid = ObjectId::new().to_hex();

        let err = items
            .find_by_ids(&ctx, &[valid.as_str(), "bad"], &SortSpec::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidIdentifier);

        let err = items
            .update_by_ids(
                &ctx,
                &["bad"],
                UpdatePayload::OperatorUpdate(doc! { "$set": { "a": 1 } }),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidIdentifier);

        assert_eq!(items.find_one_by_id(&ctx, "bad").await.unwrap_err().kind(), ErrorKind::InvalidIdentifier);
        assert_eq!(items.delete_one_by_id(&ctx, "bad").await.unwrap_err().kind(), ErrorKind::InvalidIdentifier);
        assert_eq!(
            items
                .replace_one_by_id(&ctx, "bad", doc! { "a": 1 })
                .await
                .unwrap_err()
                .kind(),
            ErrorKind::InvalidIdentifier
        );

        assert!(store.backend().calls().is_empty());
    }

    #[tokio::test]
    async fn find_by_ids_builds_in_filter() {
        let store = store(RecordingBackend::default());
        let first = ObjectId::new();
        let second = ObjectId::new();

        store
            .collection("items")
            .find_by_ids(
                &Context::background(),
                &[first.to_hex(), second.to_hex()],
                &SortSpec::default(),
            )
            .await
            .unwrap();

        assert_eq!(
            store.backend().calls(),
            vec![Call::Find(
                doc! { "_id": { "$in": [first, second] } },
                FindOptions::default()
            )]
        );
    }

    #[tokio::test]
    async fn find_one_maps_missing_document_to_not_found() {
        let store = store(RecordingBackend::default());
        let err = store
            .collection("items")
            .find_one(&Context::background(), doc! { "name": "x" }.into())
            .await
            .unwrap_err();

        match err {
            DocumentStoreError::NotFound { collection } => assert_eq!(collection, "items"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn find_one_by_id_returns_document() {
        let id = ObjectId::new();
        let store = store(RecordingBackend {
            found: Some(doc! { "_id": id, "name": "a" }),
            ..Default::default()
        });

        let found = store
            .collection("items")
            .find_one_by_id(&Context::background(), &id.to_hex())
            .await
            .unwrap();

        assert_eq!(found.get_str("name").unwrap(), "a");
        assert_eq!(store.backend().calls(), vec![Call::FindOne(doc! { "_id": id })]);
    }

    #[tokio::test]
    async fn update_targets_dispatch_to_matching_store_call() {
        let store = store(RecordingBackend::default());
        let items = store.collection("items");
        let ctx = Context::background();
        let id = ObjectId::new();
        let update = || UpdatePayload::OperatorUpdate(doc! { "$set": { "name": "b" } });
        let stamped = doc! { "$set": { "name": "b", "update_time": instant() } };

        items
            .update(&ctx, UpdateTarget::One(doc! { "a": 1 }.into()), update())
            .await
            .unwrap();
        items
            .update(&ctx, UpdateTarget::Many(doc! { "a": 1 }.into()), update())
            .await
            .unwrap();
        items
            .update(&ctx, UpdateTarget::Ids(vec![id.to_hex()]), update())
            .await
            .unwrap();
        items.update_one_by_id(&ctx, &id.to_hex(), update()).await.unwrap();

        assert_eq!(
            store.backend().calls(),
            vec![
                Call::UpdateOne(doc! { "a": 1 }, stamped.clone()),
                Call::UpdateMany(doc! { "a": 1 }, stamped.clone()),
                Call::UpdateMany(doc! { "_id": { "$in": [id] } }, stamped.clone()),
                Call::UpdateOne(doc! { "_id": id }, stamped),
            ]
        );
    }

    #[tokio::test]
    async fn raw_update_is_forwarded_unmodified() {
        let store = store(RecordingBackend::default());

        store
            .collection("items")
            .update_one(
                &Context::background(),
                Filter::all(),
                UpdatePayload::RawDocument(doc! { "name": "b" }),
            )
            .await
            .unwrap();

        assert_eq!(
            store.backend().calls(),
            vec![Call::UpdateOne(doc! {}, doc! { "name": "b" })]
        );
    }

    #[tokio::test]
    async fn replace_rewrites_both_timestamps() {
        let store = store(RecordingBackend::default());
        let id = ObjectId::new();

        let result = store
            .collection("items")
            .replace_one_by_id(
                &Context::background(),
                &id.to_hex(),
                doc! { "name": "c", "create_time": "old" },
            )
            .await
            .unwrap();

        assert_eq!(result, UpdateResult { matched: 1, modified: 1 });
        assert_eq!(
            store.backend().calls(),
            vec![Call::Replace(
                doc! { "_id": id },
                doc! { "name": "c", "create_time": instant(), "update_time": instant() }
            )]
        );
    }

    #[tokio::test]
    async fn delete_missing_identifier_is_zero_count() {
        let store = store(RecordingBackend::default());
        let result = store
            .collection("items")
            .delete_one_by_id(&Context::background(), &ObjectId::new().to_hex())
            .await
            .unwrap();

        assert_eq!(result.deleted, 0);
    }

    #[tokio::test]
    async fn expired_context_fails_without_store_call() {
        let store = store(RecordingBackend::default());
        let ctx = Context::with_deadline(tokio::time::Instant::now());

        let err = store
            .collection("items")
            .find(&ctx, Filter::all(), &SortSpec::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert!(store.backend().calls().is_empty());
    }

    #[tokio::test]
    async fn dyn_store_delegates_to_backend() {
        let store = store(RecordingBackend::default()).into_dyn();
        let id = store
            .collection("items")
            .create(&Context::background(), WritePayload::Verbatim(doc! { "raw": true }))
            .await
            .unwrap();

        assert!(id.as_object_id().is_some());
    }
}
