//! # Cancellation signals consumed by [`Delay::backoff`](crate::Delay::backoff).
//!
//! A signal is anything that can (a) notify when it is done and (b) report a
//! terminal error afterwards:
//! - [`Signal`] - the trait itself
//! - [`CancellationToken`](tokio_util::sync::CancellationToken) - explicit cancel, reports `Canceled`
//! - [`Deadline`] - token plus absolute deadline, reports `Canceled` or `DeadlineExceeded`
//! - [`Uncancellable`] - never fires
//!
//! ```text
//! Delay::backoff(&signal)
//!   └─► select! {
//!         sleep(level × unit)  ─► timer won
//!         signal.done()        ─► signal won
//!       }
//!   └─► signal.err()           ─► None | Some(BackoffError)
//! ```

mod deadline;
mod signal;

pub use deadline::Deadline;
pub use signal::{Signal, Uncancellable};
