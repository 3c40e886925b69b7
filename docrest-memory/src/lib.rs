//! In-memory document storage backend for docrest.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreBackend` trait.
//! It uses async-aware read-write locks for concurrent access and is ideal for development,
//! testing, and small-scale deployments.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using async-aware RwLock
//! - **Schemaless storage** - Stores documents as BSON in insertion order
//! - **Query support** - Comparison, set and logical filter operators with sorting and paging
//! - **Update operators** - `$set`, `$unset` and `$inc` on dotted paths
//!
//! # Quick Start
//!
//! ```ignore
//! use docrest::{prelude::*, memory::InMemoryStore};
//! use bson::doc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = InMemoryStore::builder().build().await?;
//!     let store = DocumentStore::new(backend);
//!     let users = store.collection("users");
//!
//!     let ctx = Context::background();
//!     let id = users.create(&ctx, doc! { "name": "Alice" }).await?;
//!
//!     Ok(())
//! }
//! ```

mod evaluator;
pub mod store;
mod update;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
