//! In-memory storage implementation of the store capability.
//!
//! Documents are kept per collection in insertion order behind an async-aware
//! read-write lock.

use std::{cmp::Ordering, collections::HashMap, sync::Arc};

use async_trait::async_trait;
use bson::{Bson, Document, oid::ObjectId};
use mea::rwlock::RwLock;

use docrest_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    document::ID_FIELD,
    error::{BackendError, BackendResult, DocumentStoreResult},
    mutation::{DeleteResult, UpdateResult},
    query::FindOptions,
};

use crate::{
    evaluator::{DocumentEvaluator, lookup, total_cmp},
    update::{apply_replacement, apply_update},
};

type StoreMap = HashMap<String, Vec<Document>>;

/// Thread-safe in-memory document storage backend.
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state, allowing
/// it to be safely shared across async tasks. Multiple clones of the same instance
/// share the same underlying data.
///
/// # Performance
///
/// Every query scans the whole collection (no indexing). The estimated document
/// count is always exact.
///
/// # Example
///
/// ```ignore
/// use docrest_memory::InMemoryStore;
/// use docrest::backend::StoreBackend;
/// use bson::doc;
///
/// let store = InMemoryStore::new();
/// let id = store.insert_one("users", doc! { "name": "Alice" }).await?;
/// assert_eq!(store.count_documents("users", doc! {}).await?, 1);
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    /// collection_name -> documents in insertion order
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    /// Creates a builder for constructing an `InMemoryStore`.
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }
}

fn sort_documents(documents: &mut [&Document], sort: &Document) {
    documents.sort_by(|a, b| {
        for (field, direction) in sort {
            let left = lookup(a, field).unwrap_or(&Bson::Null);
            let right = lookup(b, field).unwrap_or(&Bson::Null);

            let ordering = match descending(direction) {
                true => total_cmp(right, left),
                false => total_cmp(left, right),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

fn descending(direction: &Bson) -> bool {
    match direction {
        Bson::Int32(n) => *n < 0,
        Bson::Int64(n) => *n < 0,
        Bson::Double(n) => *n < 0.0,
        _ => false,
    }
}

fn first_match(documents: &[Document], filter: &Document) -> BackendResult<Option<usize>> {
    for (position, document) in documents.iter().enumerate() {
        if DocumentEvaluator::new(document).matches(filter)? {
            return Ok(Some(position));
        }
    }
    Ok(None)
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn insert_one(&self, collection: &str, document: Document) -> BackendResult<Bson> {
        let mut store = self.store.write().await;
        let documents = store.entry(collection.to_string()).or_insert_with(|| {
            tracing::debug!(collection, "creating in-memory collection");
            Vec::new()
        });

        let id = document
            .get(ID_FIELD)
            .cloned()
            .unwrap_or_else(|| Bson::ObjectId(ObjectId::new()));

        if documents.iter().any(|existing| existing.get(ID_FIELD) == Some(&id)) {
            return Err(BackendError::Rejected(format!(
                "duplicate key in collection {collection}: {id}"
            )));
        }

        let mut stored = Document::new();
        stored.insert(ID_FIELD, id.clone());
        stored.extend(document.into_iter().filter(|(key, _)| key != ID_FIELD));
        documents.push(stored);

        Ok(id)
    }

    async fn find(
        &self,
        collection: &str,
        filter: Document,
        options: FindOptions,
    ) -> BackendResult<Vec<Document>> {
        let store = self.store.read().await;
        let Some(documents) = store.get(collection) else {
            return Ok(vec![]);
        };

        let mut matched = DocumentEvaluator::filter_documents(documents, &filter)?;
        sort_documents(&mut matched, &options.sort);

        // A zero limit means no limit, as in the production store.
        let limit = match options.limit {
            Some(0) | None => usize::MAX,
            Some(limit) => limit as usize,
        };

        Ok(matched
            .into_iter()
            .skip(options.skip.unwrap_or(0) as usize)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count_documents(&self, collection: &str, filter: Document) -> BackendResult<u64> {
        let store = self.store.read().await;

        Ok(match store.get(collection) {
            Some(documents) => DocumentEvaluator::filter_documents(documents, &filter)?.len() as u64,
            None => 0,
        })
    }

    async fn estimated_document_count(&self, collection: &str) -> BackendResult<u64> {
        Ok(self
            .store
            .read()
            .await
            .get(collection)
            .map_or(0, |documents| documents.len() as u64))
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: Document,
    ) -> BackendResult<Option<Document>> {
        let store = self.store.read().await;
        let Some(documents) = store.get(collection) else {
            return Ok(None);
        };

        Ok(first_match(documents, &filter)?.map(|position| documents[position].clone()))
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> BackendResult<UpdateResult> {
        let mut store = self.store.write().await;
        let Some(documents) = store.get_mut(collection) else {
            return Ok(UpdateResult::default());
        };
        let Some(position) = first_match(documents, &filter)? else {
            return Ok(UpdateResult::default());
        };

        let mut updated = documents[position].clone();
        apply_update(&mut updated, &update)?;

        let modified = updated != documents[position];
        documents[position] = updated;

        Ok(UpdateResult { matched: 1, modified: modified as u64 })
    }

    async fn update_many(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> BackendResult<UpdateResult> {
        let mut store = self.store.write().await;
        let Some(documents) = store.get_mut(collection) else {
            return Ok(UpdateResult::default());
        };

        // Every update is computed before any is written, so a rejected update leaves
        // the collection untouched.
        let mut changes = Vec::new();
        for (position, document) in documents.iter().enumerate() {
            if DocumentEvaluator::new(document).matches(&filter)? {
                let mut updated = document.clone();
                apply_update(&mut updated, &update)?;
                changes.push((position, updated));
            }
        }

        let mut result = UpdateResult { matched: changes.len() as u64, modified: 0 };
        for (position, updated) in changes {
            if updated != documents[position] {
                result.modified += 1;
                documents[position] = updated;
            }
        }

        Ok(result)
    }

    async fn replace_one(
        &self,
        collection: &str,
        filter: Document,
        replacement: Document,
    ) -> BackendResult<UpdateResult> {
        let mut store = self.store.write().await;
        let Some(documents) = store.get_mut(collection) else {
            return Ok(UpdateResult::default());
        };
        let Some(position) = first_match(documents, &filter)? else {
            return Ok(UpdateResult::default());
        };

        let replaced = apply_replacement(&documents[position], replacement)?;
        let modified = replaced != documents[position];
        documents[position] = replaced;

        Ok(UpdateResult { matched: 1, modified: modified as u64 })
    }

    async fn delete_one(&self, collection: &str, filter: Document) -> BackendResult<DeleteResult> {
        let mut store = self.store.write().await;
        let Some(documents) = store.get_mut(collection) else {
            return Ok(DeleteResult::default());
        };

        Ok(match first_match(documents, &filter)? {
            Some(position) => {
                documents.remove(position);
                DeleteResult { deleted: 1 }
            }
            None => DeleteResult::default(),
        })
    }
}

/// Builder for constructing [`InMemoryStore`] instances.
///
/// # Example
///
/// ```ignore
/// use docrest_memory::InMemoryStore;
/// use docrest::backend::StoreBackendBuilder;
///
/// let store = InMemoryStore::builder().build().await?;
/// ```
#[derive(Default)]
pub struct InMemoryStoreBuilder;

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    /// Builds and returns a new [`InMemoryStore`] instance.
    ///
    /// This always succeeds and returns a freshly initialized store.
    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        Ok(InMemoryStore::new())
    }
}
