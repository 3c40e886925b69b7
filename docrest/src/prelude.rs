//! Convenient re-exports of commonly used types from docrest.
//!
//! Import this prelude module to quickly access the most frequently used types
//! and traits without needing to import from multiple sub-modules:
//!
//! ```ignore
//! use docrest::prelude::*;
//! ```
//!
//! This provides access to:
//! - The document store and collection handles
//! - Store backends and builders
//! - Sort, filter and pagination inputs
//! - Mutation payloads and results
//! - Request contexts and error types

pub use docrest_core::{
    collection::{Collection, FindResult, UpdateTarget},
    store::{DocumentStore, DynDocumentStore},
    document::{Clock, SystemClock},
    backend::{StoreBackend, StoreBackendBuilder},
    context::Context,
    query::{Filter, FindOptions, Sort, SortDirection, SortSpec},
    page::{Page, Pagination},
    mutation::{DeleteResult, UpdatePayload, UpdateResult, WritePayload},
    error::{DocumentStoreError, DocumentStoreResult, ErrorKind},
};
