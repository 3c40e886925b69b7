//! Per-request cancellation and deadline context.
//!
//! Every store call issued by the core runs bound to a [`Context`]. When the
//! context's deadline elapses, or it is canceled, the in-flight store future is
//! dropped and the call fails with [`DocumentStoreError::Timeout`] or
//! [`DocumentStoreError::Canceled`]. No compensating action is taken: whatever the
//! store committed before that point stays committed.

use std::{future::Future, time::Duration};

use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

use crate::error::{BackendResult, DocumentStoreError, DocumentStoreResult, StoreOperation};

/// Cancellation and deadline scope for one logical request.
///
/// Clones share the same cancellation state.
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    token: CancellationToken,
}

impl Context {
    /// A context that never times out and is only canceled explicitly.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context whose deadline is `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// A context with an absolute deadline.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            token: CancellationToken::new(),
        }
    }

    /// Derives a child context that is canceled with this one but can also be
    /// canceled on its own.
    pub fn child(&self) -> Self {
        Self {
            deadline: self.deadline,
            token: self.token.child_token(),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancels this context and all its children.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_canceled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Runs a store call bound to this context.
    ///
    /// A context that is already canceled or past its deadline never polls `call`.
    pub(crate) async fn run<T, F>(&self, operation: StoreOperation, call: F) -> DocumentStoreResult<T>
    where
        F: Future<Output = BackendResult<T>>,
    {
        if self.token.is_cancelled() {
            return Err(DocumentStoreError::Canceled { operation });
        }
        if self.deadline.is_some_and(|deadline| deadline <= Instant::now()) {
            return Err(DocumentStoreError::Timeout { operation });
        }

        let deadline = self.deadline;
        let expired = async move {
            match deadline {
                Some(deadline) => sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.token.cancelled() => {
                tracing::warn!(%operation, "store call canceled");
                Err(DocumentStoreError::Canceled { operation })
            }
            _ = expired => {
                tracing::warn!(%operation, "store call deadline exceeded");
                Err(DocumentStoreError::Timeout { operation })
            }
            result = call => result.map_err(|source| DocumentStoreError::store(operation, source)),
        }
    }
}
