//! A single-resolution future: exactly one of resolve/reject ever fires for
//! a given suspension instance, and settling after the other side is gone is
//! a no-op rather than an error.
//!
//! The execution engine uses this for its pause gate, and the timer provider
//! for cancellable waits.

use crate::error::Cancelled;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// The resolving half of a single-resolution future.
///
/// Dropping an unsettled `Deferred` rejects its promise as cancelled, so a
/// waiter can never be left dangling.
#[derive(Debug)]
pub struct Deferred {
    tx: Option<oneshot::Sender<Result<(), Cancelled>>>,
}

/// The awaiting half; resolves to `Ok(())` or `Err(Cancelled)`.
#[derive(Debug)]
pub struct Promise {
    rx: oneshot::Receiver<Result<(), Cancelled>>,
}

impl Deferred {
    /// Creates a linked deferred/promise pair.
    pub fn pair() -> (Deferred, Promise) {
        let (tx, rx) = oneshot::channel();
        (Deferred { tx: Some(tx) }, Promise { rx })
    }

    /// Fulfils the promise. No-op if already settled or the waiter is gone.
    pub fn resolve(&mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(Ok(()));
        }
    }

    /// Rejects the promise as cancelled. Same no-op guarantees as
    /// [`resolve`](Self::resolve).
    pub fn reject(&mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(Err(Cancelled));
        }
    }

    pub fn is_settled(&self) -> bool {
        self.tx.is_none()
    }
}

impl Drop for Deferred {
    fn drop(&mut self) {
        self.reject();
    }
}

impl Future for Promise {
    type Output = Result<(), Cancelled>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            // Sender dropped without settling counts as cancellation.
            Poll::Ready(Err(_)) => Poll::Ready(Err(Cancelled)),
            Poll::Pending => Poll::Pending,
        }
    }
}
