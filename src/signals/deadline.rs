//! # Deadline-bounded signal.
//!
//! [`Deadline`] fires when either its token is cancelled or the tokio clock
//! reaches a fixed instant, whichever comes first. The cause of whichever
//! happened first is latched, so [`Signal::err`] keeps reporting it afterwards.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use expdelay::{Config, Deadline, Delay};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let delay = Delay::new(Config::new(10, 2));
//! delay.set_time_unit(Duration::from_millis(100));
//! delay.increment().increment(); // level 6, 600ms
//!
//! let outcome = delay.backoff(&Deadline::after(Duration::from_millis(50))).await;
//! assert!(outcome.delayed);
//! assert!(outcome.error.unwrap().is_deadline());
//! # }
//! ```

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::BackoffError;
use crate::signals::Signal;

/// Cancellation token bounded by a deadline.
///
/// Clones share the token, the deadline and the latched cause.
#[derive(Clone, Debug)]
pub struct Deadline {
    token: CancellationToken,
    span: Duration,
    /// `None` when `now + span` is not representable; only the token can fire then.
    at: Option<Instant>,
    cause: Arc<OnceLock<BackoffError>>,
}

impl Deadline {
    /// Creates a deadline `span` from now with a fresh token.
    pub fn after(span: Duration) -> Self {
        Self::from_token(CancellationToken::new(), span)
    }

    /// Creates a deadline `span` from now, cancelled together with `parent`.
    ///
    /// Cancelling the deadline itself does not cancel `parent`.
    pub fn with_token(parent: &CancellationToken, span: Duration) -> Self {
        Self::from_token(parent.child_token(), span)
    }

    fn from_token(token: CancellationToken, span: Duration) -> Self {
        Self {
            token,
            span,
            at: Instant::now().checked_add(span),
            cause: Arc::new(OnceLock::new()),
        }
    }

    /// Cancels the deadline. After expiry the cause stays `DeadlineExceeded`.
    pub fn cancel(&self) {
        self.cause.get_or_init(|| {
            if self.expired() {
                self.exceeded()
            } else {
                BackoffError::Canceled
            }
        });
        self.token.cancel();
    }

    /// Returns the token driving explicit cancellation.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Returns the time left until the deadline (`None` if unbounded).
    pub fn remaining(&self) -> Option<Duration> {
        self.at.map(|at| at.saturating_duration_since(Instant::now()))
    }

    fn expired(&self) -> bool {
        self.at.is_some_and(|at| Instant::now() >= at)
    }

    fn exceeded(&self) -> BackoffError {
        BackoffError::DeadlineExceeded {
            deadline: self.span,
        }
    }
}

#[async_trait]
impl Signal for Deadline {
    async fn done(&self) {
        match self.at {
            Some(at) => {
                tokio::select! {
                    _ = self.token.cancelled() => {
                        self.cause.get_or_init(|| BackoffError::Canceled);
                    }
                    _ = time::sleep_until(at) => {
                        self.cause.get_or_init(|| self.exceeded());
                    }
                }
            }
            None => {
                self.token.cancelled().await;
                self.cause.get_or_init(|| BackoffError::Canceled);
            }
        }
    }

    fn err(&self) -> Option<BackoffError> {
        if let Some(cause) = self.cause.get() {
            return Some(cause.clone());
        }
        let cause = if self.expired() {
            self.exceeded()
        } else if self.token.is_cancelled() {
            BackoffError::Canceled
        } else {
            return None;
        };
        Some(self.cause.get_or_init(|| cause).clone())
    }
}
