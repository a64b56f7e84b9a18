//! # Signal abstraction.
//!
//! [`Signal`] is the capability `{ signal-when-done, retrieve-terminal-error }`.
//! The crate implements it for [`CancellationToken`] so callers already using
//! tokio-util cancellation can pass their token as is.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::BackoffError;

/// # External cancellation signal.
///
/// [`done`](Signal::done) completes once the signal fires and stays pending
/// forever otherwise. [`err`](Signal::err) is `None` until the signal fires and
/// the terminal error afterwards; once `Some`, it never changes.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use expdelay::{BackoffError, Signal};
///
/// /// Fires immediately, like a context that is already closed.
/// struct Closed;
///
/// #[async_trait]
/// impl Signal for Closed {
///     async fn done(&self) {}
///
///     fn err(&self) -> Option<BackoffError> {
///         Some(BackoffError::Canceled)
///     }
/// }
/// ```
#[async_trait]
pub trait Signal: Send + Sync {
    /// Completes when the signal fires.
    async fn done(&self);

    /// Returns the terminal error, or `None` while the signal has not fired.
    fn err(&self) -> Option<BackoffError>;
}

#[async_trait]
impl Signal for CancellationToken {
    async fn done(&self) {
        self.cancelled().await
    }

    fn err(&self) -> Option<BackoffError> {
        self.is_cancelled().then_some(BackoffError::Canceled)
    }
}

#[async_trait]
impl<S: Signal + ?Sized> Signal for Arc<S> {
    async fn done(&self) {
        (**self).done().await
    }

    fn err(&self) -> Option<BackoffError> {
        (**self).err()
    }
}

/// A signal that never fires.
///
/// Use it when the wait must always run to completion.
#[derive(Clone, Copy, Debug, Default)]
pub struct Uncancellable;

#[async_trait]
impl Signal for Uncancellable {
    async fn done(&self) {
        std::future::pending::<()>().await
    }

    fn err(&self) -> Option<BackoffError> {
        None
    }
}
