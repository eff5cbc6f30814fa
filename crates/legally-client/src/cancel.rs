//! Cooperative cancellation
//!
//! Operations take a [`CancellationToken`]. Once the token fires, the
//! operation's result is dropped and [`ClientError::Cancelled`] returned,
//! even if a response was already on its way. Results handed out before
//! cancellation are left alone.

use crate::error::{ClientError, ClientResult};
use std::future::Future;
pub use tokio_util::sync::CancellationToken;

/// Race a fallible future against cancellation
pub async fn cancellable<F, T>(token: &CancellationToken, future: F) -> ClientResult<T>
where
    F: Future<Output = ClientResult<T>>,
{
    if token.is_cancelled() {
        return Err(ClientError::Cancelled);
    }

    tokio::select! {
        biased;
        () = token.cancelled() => Err(ClientError::Cancelled),
        result = future => {
            if token.is_cancelled() {
                tracing::debug!("discarding result of cancelled operation");
                Err(ClientError::Cancelled)
            } else {
                result
            }
        }
    }
}

/// Run `apply` only while the token is live; returns whether it ran
pub fn apply_if_live<F: FnOnce()>(token: &CancellationToken, apply: F) -> bool {
    if token.is_cancelled() {
        return false;
    }
    apply();
    true
}
