//! The query-translation and mutation-semantics core of docrest.
//!
//! This crate turns untyped request parameters (identifier tokens, sort directives,
//! filter mappings, pagination and update payloads) into well-formed operations
//! against a schemaless document store, and provides:
//!
//! - **Identifier resolution** ([`id`]) - External hexadecimal tokens to store identifiers
//! - **Sort and filter translation** ([`query`]) - Compact sort directives and filter pass-through
//! - **Pagination** ([`page`]) - Skip/limit arithmetic, count strategy and the paged envelope
//! - **Mutations** ([`mutation`]) - Tagged payloads, lifecycle timestamps and mutation results
//! - **Collections** ([`collection`]) - The read and write operations per collection
//! - **Document store** ([`store`]) - The entry point owning the store capability
//! - **Store capability** ([`backend`]) - Traits implemented by store backends
//! - **Request context** ([`context`]) - Deadlines and cancellation for store calls
//! - **Error handling** ([`error`]) - The error taxonomy and result types
//!
//! # Example
//!
//! ```ignore
//! use docrest::{prelude::*, memory::InMemoryStore};
//! use bson::doc;
//!
//! let store = DocumentStore::new(InMemoryStore::new());
//! let ctx = Context::with_timeout(Duration::from_secs(5));
//! let items = store.collection("items");
//!
//! let id = items.create(&ctx, doc! { "name": "a" }).await?;
//! let item = items.find_one_by_id(&ctx, &id.as_object_id().unwrap().to_hex()).await?;
//! ```

pub mod backend;
pub mod collection;
pub mod context;
pub mod document;
pub mod error;
mod gateway;
pub mod id;
pub mod mutation;
pub mod page;
pub mod query;
pub mod store;
