//! Error types surfaced by a cancelled backoff wait.
//!
//! [`BackoffError`] is the terminal error of a [`Signal`](crate::Signal).
//! [`Delay::backoff`](crate::Delay::backoff) hands it back verbatim inside
//! [`BackoffOutcome`](crate::BackoffOutcome); the crate never retries or swallows it.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced when a wait is interrupted.
///
/// Misconfiguration is never an error (values are clamped), and calls on an
/// uninitialized [`Delay`](crate::Delay) degrade to no-ops, so the only
/// failure a caller can observe is the cancellation signal firing.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackoffError {
    /// The signal was cancelled explicitly.
    #[error("context canceled")]
    Canceled,

    /// The signal's deadline passed before the wait completed.
    #[error("deadline exceeded after {deadline:?}")]
    DeadlineExceeded {
        /// The span the deadline was configured with.
        deadline: Duration,
    },
}

impl BackoffError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use expdelay::BackoffError;
    ///
    /// assert_eq!(BackoffError::Canceled.as_label(), "backoff_canceled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BackoffError::Canceled => "backoff_canceled",
            BackoffError::DeadlineExceeded { .. } => "backoff_deadline_exceeded",
        }
    }

    /// Returns `true` if the wait ended because a deadline passed.
    pub fn is_deadline(&self) -> bool {
        matches!(self, BackoffError::DeadlineExceeded { .. })
    }
}
