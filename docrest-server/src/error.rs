//! Error types and HTTP response conversion

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use docrest::error::{DocumentStoreError, ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of a single request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be bound (query string, headers or body).
    #[error("{0}")]
    Binding(String),

    #[error(transparent)]
    Store(#[from] DocumentStoreError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Binding(rejection.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Binding(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(e) => match e.kind() {
                ErrorKind::InvalidIdentifier | ErrorKind::InvalidSort | ErrorKind::InvalidUpdate => {
                    StatusCode::BAD_REQUEST
                }
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
                ErrorKind::Canceled => StatusCode::REQUEST_TIMEOUT,
                ErrorKind::StoreFailure | ErrorKind::Initialization => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Binding(_) => "BAD_REQUEST",
            ApiError::Store(e) => match e.kind() {
                ErrorKind::InvalidIdentifier => "INVALID_IDENTIFIER",
                ErrorKind::InvalidSort => "INVALID_SORT",
                ErrorKind::InvalidUpdate => "INVALID_UPDATE",
                ErrorKind::NotFound => "NOT_FOUND",
                ErrorKind::Timeout => "TIMEOUT",
                ErrorKind::Canceled => "CANCELED",
                ErrorKind::StoreFailure => "STORE_FAILURE",
                ErrorKind::Initialization => "INITIALIZATION",
            },
        }
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub status: u16,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Store internals stay in the log, not in the response.
        let message = if status.is_server_error() {
            tracing::error!(
                operation = ?self.operation(),
                error = %self,
                "request failed"
            );
            "Store operation failed".to_string()
        } else {
            tracing::debug!(error = %self, "request rejected");
            self.to_string()
        };

        let body = ErrorResponse {
            error: message,
            code: self.code().to_string(),
            status: status.as_u16(),
        };

        (status, Json(body)).into_response()
    }
}

impl ApiError {
    fn operation(&self) -> Option<String> {
        match self {
            ApiError::Store(e) => e.operation().map(|op| op.to_string()),
            ApiError::Binding(_) => None,
        }
    }
}

/// Failure starting or running the host process.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    #[error("invalid store configuration: {0}")]
    InvalidStore(String),

    #[error(transparent)]
    Store(#[from] DocumentStoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ServerError {
    fn from(err: figment::Error) -> Self {
        ServerError::Config(Box::new(err))
    }
}
