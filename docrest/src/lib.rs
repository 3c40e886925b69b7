//! Main docrest crate providing a generic CRUD layer over a schemaless document store.
//!
//! This crate is the primary entry point for users of docrest. It re-exports the core
//! types and functionality from the sub-crates and provides convenient access to the
//! storage backends.
//!
//! # Features
//!
//! - **Untyped request inputs** - Identifier tokens, sort directives and filters are normalized for you
//! - **Pagination** - `{ total, data }` pages with exact or estimated totals
//! - **Lifecycle timestamps** - `create_time` and `update_time` maintained on every write
//! - **Multiple backends** - In-memory and MongoDB storage behind one object safe trait
//! - **Deadlines and cancellation** - Every store call is bound to a request [`context::Context`]
//!
//! # Quick Start
//!
//! ```ignore
//! use std::time::Duration;
//! use docrest::{prelude::*, memory::InMemoryStore};
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() {
//!     // Create an in-memory store backend
//!     let store = DocumentStore::new(InMemoryStore::builder().build().await.unwrap());
//!     let users = store.collection("users");
//!     let ctx = Context::with_timeout(Duration::from_secs(5));
//!
//!     // Insert a document; the new identifier is returned
//!     let id = users.create(&ctx, doc! { "name": "Alice" }).await.unwrap();
//!
//!     // Read the first page of users named Alice, oldest first
//!     let page = users
//!         .find_by_page(
//!             &ctx,
//!             Pagination::new(1, 20).unwrap(),
//!             doc! { "name": "Alice" }.into(),
//!             &SortSpec::parse(["create_time,1"]).unwrap(),
//!         )
//!         .await
//!         .unwrap();
//!
//!     println!("{} users named Alice", page.total);
//!
//!     // Shutdown the store
//!     store.shutdown().await.unwrap();
//! }
//! ```
//!
//! # Dynamic Dispatch
//!
//! A backend chosen at runtime is supported by converting a typed `DocumentStore` into a
//! dynamically dispatched store using the `into_dyn` method.
//!
//! ```ignore
//! use docrest::{prelude::*, memory::InMemoryStore};
//!
//! let store: DynDocumentStore = DocumentStore::new(InMemoryStore::new()).into_dyn();
//! let items = store.collection("items");
//! ```
//!
//! # Backends
//!
//! - [`memory`] - Fast in-memory storage for development and testing
//! - [`mongodb`] - Persistent MongoDB backend (requires `mongodb` feature)

pub mod prelude;

pub use docrest_core::{backend, collection, context, document, error, id, mutation, page, query, store};

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use docrest_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use docrest_mongodb::{MongoDbStore, MongoDbStoreBuilder};
}
