//! # Result of one backoff wait.

use std::time::Duration;

use crate::error::BackoffError;

/// What happened during [`Delay::backoff`](crate::Delay::backoff).
///
/// ## Field semantics
/// - `delayed`: whether the delay had a positive level when the call started
/// - `error`: the signal's terminal error, if it fired (`None` otherwise)
/// - `elapsed`: time actually spent inside the call, not the scheduled delay
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackoffOutcome {
    /// A wait was scheduled.
    pub delayed: bool,
    /// Error reported by the cancellation signal.
    pub error: Option<BackoffError>,
    /// Time spent in the call.
    pub elapsed: Duration,
}

impl BackoffOutcome {
    /// The outcome of a call that did nothing: `(false, None, 0)`.
    pub const fn none() -> Self {
        Self {
            delayed: false,
            error: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Returns `true` if the signal reported an error, either
    /// [`Canceled`](BackoffError::Canceled) or a deadline.
    #[inline]
    pub fn is_interrupted(&self) -> bool {
        self.error.is_some()
    }

    /// Converts into `Ok(delayed)` or `Err(signal error)`.
    pub fn into_result(self) -> Result<bool, BackoffError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.delayed),
        }
    }
}

impl Default for BackoffOutcome {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_is_default() {
        assert_eq!(BackoffOutcome::default(), BackoffOutcome::none());
        assert!(!BackoffOutcome::none().is_interrupted());
    }

    #[test]
    fn test_into_result() {
        let ok = BackoffOutcome {
            delayed: true,
            error: None,
            elapsed: Duration::from_secs(2),
        };
        assert_eq!(ok.into_result(), Ok(true));

        let canceled = BackoffOutcome {
            delayed: true,
            error: Some(BackoffError::Canceled),
            elapsed: Duration::from_millis(10),
        };
        assert!(canceled.is_interrupted());
        assert_eq!(canceled.into_result(), Err(BackoffError::Canceled));
    }

    #[test]
    fn test_deadline_counts_as_interrupted() {
        let expired = BackoffOutcome {
            delayed: true,
            error: Some(BackoffError::DeadlineExceeded {
                deadline: Duration::from_secs(1),
            }),
            elapsed: Duration::from_secs(1),
        };
        assert!(expired.is_interrupted());
        assert!(expired.into_result().unwrap_err().is_deadline());
    }
}
