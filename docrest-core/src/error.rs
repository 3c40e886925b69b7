//! Error types and result types for document service operations.
//!
//! Every failure produced by the core is a [`DocumentStoreError`]. Failures that
//! originate in the store are annotated with the [`StoreOperation`] that produced
//! them, so a request that fans out into several store calls (a paginated read
//! counts and then fetches) still reports which call failed.
//!
//! Callers that only need to branch on the category of failure (for example to pick
//! a transport status code) should use [`DocumentStoreError::kind`].

use std::fmt;

use bson::error::Error as BsonError;
use thiserror::Error;

/// A single call issued against the store capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    InsertOne,
    Find,
    CountDocuments,
    EstimatedDocumentCount,
    FindOne,
    UpdateOne,
    UpdateMany,
    ReplaceOne,
    DeleteOne,
    Shutdown,
}

impl fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsertOne => write!(f, "insert_one"),
            Self::Find => write!(f, "find"),
            Self::CountDocuments => write!(f, "count_documents"),
            Self::EstimatedDocumentCount => write!(f, "estimated_document_count"),
            Self::FindOne => write!(f, "find_one"),
            Self::UpdateOne => write!(f, "update_one"),
            Self::UpdateMany => write!(f, "update_many"),
            Self::ReplaceOne => write!(f, "replace_one"),
            Self::DeleteOne => write!(f, "delete_one"),
            Self::Shutdown => write!(f, "shutdown"),
        }
    }
}

/// Errors reported by a store backend implementation.
///
/// Backends never produce [`DocumentStoreError`] directly; the collection gateway
/// wraps these with the operation that was being executed.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Serialization/deserialization error when converting documents.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// The store rejected the request (bad operator, duplicate key, immutable field...).
    #[error("Rejected by store: {0}")]
    Rejected(String),
    /// Any other error raised by the underlying store or driver.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// A specialized `Result` type for store backend calls.
pub type BackendResult<T> = Result<T, BackendError>;

impl From<BsonError> for BackendError {
    fn from(err: BsonError) -> Self {
        BackendError::Serialization(err.to_string())
    }
}

/// Represents all possible errors that can occur when serving a document request.
#[derive(Error, Debug)]
pub enum DocumentStoreError {
    /// An external identifier token is not a valid identifier encoding.
    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),
    /// A sort directive does not match the `field,direction` shape.
    #[error("Invalid sort directive: {0:?}")]
    InvalidSort(String),
    /// An operator update document cannot receive the `update_time` injection.
    #[error("Invalid update document: {0}")]
    InvalidUpdate(String),
    /// A single-document read matched nothing.
    #[error("No matching document in collection {collection}")]
    NotFound { collection: String },
    /// The caller's deadline elapsed while the store call was in flight.
    #[error("Deadline exceeded during {operation}")]
    Timeout { operation: StoreOperation },
    /// The caller canceled the request while the store call was in flight.
    #[error("Canceled during {operation}")]
    Canceled { operation: StoreOperation },
    /// Any other error reported by the store.
    #[error("Store failure during {operation}: {source}")]
    StoreFailure {
        operation: StoreOperation,
        #[source]
        source: BackendError,
    },
    /// Error during store initialization or connection setup.
    #[error("Initialization error: {0}")]
    Initialization(String),
}

/// Flat category of a [`DocumentStoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidIdentifier,
    InvalidSort,
    InvalidUpdate,
    NotFound,
    Timeout,
    Canceled,
    StoreFailure,
    Initialization,
}

impl DocumentStoreError {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidIdentifier(_) => ErrorKind::InvalidIdentifier,
            Self::InvalidSort(_) => ErrorKind::InvalidSort,
            Self::InvalidUpdate(_) => ErrorKind::InvalidUpdate,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Canceled { .. } => ErrorKind::Canceled,
            Self::StoreFailure { .. } => ErrorKind::StoreFailure,
            Self::Initialization(_) => ErrorKind::Initialization,
        }
    }

    /// Returns the store call that produced this error, if it came from the store.
    pub fn operation(&self) -> Option<StoreOperation> {
        match self {
            Self::Timeout { operation }
            | Self::Canceled { operation }
            | Self::StoreFailure { operation, .. } => Some(*operation),
            _ => None,
        }
    }

    pub(crate) fn store(operation: StoreOperation, source: BackendError) -> Self {
        Self::StoreFailure { operation, source }
    }
}

/// A specialized `Result` type for document service operations.
pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;
