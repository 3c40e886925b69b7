//! Main document store interface.
//!
//! [`DocumentStore`] owns the store capability and hands out [`Collection`] handles.
//! There is no global store handle: the host process builds one store, threads it
//! (or a shared reference to it) through every request and shuts it down once.
//!
//! # Example
//!
//! ```ignore
//! use docrest::{prelude::*, memory::InMemoryStore};
//!
//! let store = DocumentStore::new(InMemoryStore::builder().build().await?);
//! let items = store.collection("items");
//! let id = items.create(&Context::background(), doc! { "name": "a" }).await?;
//!
//! store.shutdown().await?;
//! ```

use std::sync::Arc;

use crate::{
    backend::StoreBackend,
    collection::Collection,
    context::Context,
    document::{Clock, SystemClock},
    error::{DocumentStoreResult, StoreOperation},
};

/// A document store bound to a backend implementation.
///
/// # Type Parameters
///
/// * `B` - The backend implementation type
#[derive(Debug)]
pub struct DocumentStore<B: StoreBackend> {
    backend: B,
    clock: Arc<dyn Clock>,
}

/// A document store whose backend is selected at runtime.
pub type DynDocumentStore = DocumentStore<Arc<dyn StoreBackend>>;

impl<B: StoreBackend> DocumentStore<B> {
    /// Creates a new document store with the given backend and the system clock.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the clock used for lifecycle timestamps.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Gets a handle to the collection with the given name.
    pub fn collection<'a>(&'a self, name: &str) -> Collection<'a, B> {
        Collection::new(name.to_string(), &self.backend, self.clock.as_ref())
    }

    /// Returns the underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Converts this store into one with a type-erased backend.
    pub fn into_dyn(self) -> DynDocumentStore
    where
        B: 'static,
    {
        DocumentStore {
            backend: Arc::new(self.backend),
            clock: self.clock,
        }
    }

    /// Shuts down the backend, releasing its resources.
    pub async fn shutdown(&self) -> DocumentStoreResult<()> {
        Context::background()
            .run(StoreOperation::Shutdown, self.backend.shutdown())
            .await
    }
}
