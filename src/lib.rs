//! # expdelay
//!
//! **expdelay** is a small, thread-safe backoff counter for throttling retries
//! against a flaky resource.
//!
//! A [`Delay`] holds one backoff *level*. The caller decides when to grow it
//! (failure), shrink or reset it (success), and when to wait it out with a
//! cancellable [`Delay::backoff`].
//!
//! ## Architecture
//! ```text
//!   Config { max, factor }
//!          │ clamped
//!          ▼
//!   ┌───────────────────────────────────────────┐
//!   │ Delay                                     │
//!   │  level ∈ [0, max]      (AtomicI64)        │
//!   │  increment: level × factor + factor       │──► level(), has_delay(), duration()
//!   │  decrement: level − 1                     │
//!   │  reset:     0                             │
//!   └──────────────────────┬────────────────────┘
//!                          │ backoff(&signal)
//!                          ▼
//!   select! { sleep(level × time_unit), signal.done() }
//!                          │
//!                          ▼
//!   BackoffOutcome { delayed, error: signal.err(), elapsed }
//! ```
//!
//! ## Features
//! | Area              | Description                                             | Key types                               |
//! |-------------------|---------------------------------------------------------|-----------------------------------------|
//! | **State**         | Saturating level arithmetic behind an `RwLock`.         | [`Delay`]                               |
//! | **Waiting**       | Timer raced against an external cancellation signal.    | [`Delay::backoff`], [`BackoffOutcome`]  |
//! | **Signals**       | Token, deadline and never-firing signals.               | [`Signal`], [`Deadline`], [`Uncancellable`] |
//! | **Errors**        | Typed terminal errors of a signal.                      | [`BackoffError`]                        |
//! | **Configuration** | Serde-friendly `max` / `factor` pair, clamped on use.   | [`Config`]                              |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use expdelay::{Config, Delay};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let delay = Arc::new(Delay::new(Config::new(30, 2)));
//!     delay.set_time_unit(Duration::from_millis(5));
//!     let shutdown = CancellationToken::new();
//!
//!     for attempt in 1..=3 {
//!         let outcome = delay.backoff(&shutdown).await;
//!         if outcome.is_interrupted() {
//!             break;
//!         }
//!         if attempt < 3 {
//!             delay.increment(); // pretend the call failed
//!         } else {
//!             delay.reset();
//!         }
//!     }
//!     assert_eq!(delay.level(), 0);
//! }
//! ```
mod config;
mod delay;
mod error;
mod signals;

// ---- Public re-exports ----

pub use config::Config;
pub use delay::{BackoffOutcome, DEFAULT_TIME_UNIT, Delay};
pub use error::BackoffError;
pub use signals::{Deadline, Signal, Uncancellable};
