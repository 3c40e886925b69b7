//! HTTP host for docrest.
//!
//! Exposes every collection of the configured store under `/{name}` and binds
//! requests to the core's collection operations. Binding and validation live here;
//! the core only receives typed inputs and a per-request [`Context`].

use std::{sync::Arc, time::Duration};

use docrest::{
    backend::StoreBackendBuilder,
    context::Context,
    memory::InMemoryStore,
    mongodb::MongoDbStore,
    store::{DocumentStore, DynDocumentStore},
};
use tokio::{net::TcpListener, signal};
use tracing_subscriber::EnvFilter;

pub mod binding;
pub mod config;
pub mod error;
pub mod render;
pub mod routes;

use config::{BackendKind, Config, LogConfig, StoreConfig};
use error::ServerError;

pub use routes::router;

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub store: Arc<DynDocumentStore>,
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(store: DynDocumentStore, request_timeout: Duration) -> Self {
        Self {
            store: Arc::new(store),
            request_timeout,
        }
    }

    /// A fresh context carrying the request deadline.
    pub fn context(&self) -> Context {
        Context::with_timeout(self.request_timeout)
    }
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(config: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if config.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Builds the configured store backend.
pub async fn connect(config: &StoreConfig) -> Result<DynDocumentStore, ServerError> {
    match config.backend {
        BackendKind::Memory => {
            tracing::info!(backend = "memory", "store selected");

            Ok(DocumentStore::new(InMemoryStore::builder().build().await?).into_dyn())
        }
        BackendKind::MongoDb => {
            let (Some(uri), Some(database)) = (&config.uri, &config.database) else {
                return Err(ServerError::InvalidStore(
                    "store.uri and store.database are required for the mongodb backend".to_string(),
                ));
            };
            tracing::info!(backend = "mongodb", %database, "store selected");

            Ok(DocumentStore::new(MongoDbStore::builder(uri, database).build().await?).into_dyn())
        }
    }
}

/// Serves requests until a shutdown signal arrives, then tears the store down.
pub async fn run(config: Config) -> Result<(), ServerError> {
    let store = connect(&config.store).await?;
    let state = AppState::new(store, config.server.request_timeout());

    let listener = TcpListener::bind(config.server.listen).await?;
    tracing::info!(
        listen = %config.server.listen,
        request_timeout_secs = config.server.request_timeout_secs,
        "server listening"
    );

    axum::serve(listener, router(state.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.store.shutdown().await?;
    tracing::info!("server shutdown complete");

    Ok(())
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        },
    }
}
