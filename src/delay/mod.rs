//! # Stateful backoff counter.
//!
//! [`Delay`] tracks one backoff sequence as an integer *level* in `[0, max]`.
//! Callers grow it after a failure, shrink or reset it after a success, and
//! call [`Delay::backoff`] to actually wait `level × time_unit`.
//!
//! ## Growth
//! Each [`increment`](Delay::increment) computes `level × factor + factor`,
//! clamped to `max`. With `factor = 2, max = 100`:
//! ```text
//! 0 ─► 2 ─► 6 ─► 14 ─► 30 ─► 62 ─► 100 ─► 100 ...
//! ```
//! [`decrement`](Delay::decrement) walks back down by one, never below `0`.
//!
//! ## Locking
//! ```text
//! increment / decrement / reset   exclusive lock, read-modify-write
//! set_level / level               no lock (relaxed atomic store/load)
//! set_time_unit                   no lock
//! backoff                         reads the level once, then waits
//! ```
//! `set_level` and `level` bypass the lock on purpose: they are the fast,
//! unchecked override/read pair. A `set_level` racing an `increment` may be
//! lost, and `set_level` does not enforce `[0, max]`.
//!
//! ## Uninitialized instances
//! [`Delay::default`] is the zero value: every mutator except `set_level` is
//! a no-op, [`has_delay`](Delay::has_delay) is `false` and
//! [`backoff`](Delay::backoff) returns [`BackoffOutcome::none`] immediately.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use expdelay::{Config, Delay, Uncancellable};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let delay = Delay::new(Config::new(100, 2));
//! delay.set_time_unit(Duration::from_millis(10));
//!
//! delay.increment().increment();
//! assert_eq!(delay.level(), 6);
//!
//! let outcome = delay.backoff(&Uncancellable).await;
//! assert!(outcome.delayed);
//! assert!(outcome.elapsed >= Duration::from_millis(60));
//!
//! delay.reset();
//! assert!(!delay.has_delay());
//! # }
//! ```

mod outcome;

pub use outcome::BackoffOutcome;

use std::fmt;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockWriteGuard};
use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, trace};

use crate::config::Config;
use crate::signals::Signal;

/// Default time unit applied to the level when waiting.
pub const DEFAULT_TIME_UNIT: Duration = Duration::from_secs(1);

/// Thread-safe backoff level with a cancellable wait.
///
/// Every mutator takes `&self` and returns `&Self`, so one instance can be
/// shared through an `Arc` and still be driven with chained calls.
#[derive(Default)]
pub struct Delay {
    lock: RwLock<()>,
    initialized: bool,
    level: AtomicI64,
    max: i64,
    factor: i64,
    /// Nanoseconds; saturates at `u64::MAX` (about 584 years).
    time_unit: AtomicU64,
}

impl Delay {
    /// Creates an initialized delay at level `0` with a one second time unit.
    ///
    /// `config` is clamped first (see [`Config::clamped`]).
    pub fn new(config: Config) -> Self {
        let config = config.clamped();
        Self {
            lock: RwLock::new(()),
            initialized: true,
            level: AtomicI64::new(0),
            max: config.max,
            factor: config.factor,
            time_unit: AtomicU64::new(to_nanos(DEFAULT_TIME_UNIT)),
        }
    }

    /// Grows the level: `level × factor + factor`, clamped to `max`.
    ///
    /// No-op when already at `max`.
    pub fn increment(&self) -> &Self {
        if !self.initialized {
            return self;
        }
        let _guard = self.write();

        let level = self.level.load(Ordering::Relaxed);
        if level == self.max {
            return self;
        }
        let next = level
            .saturating_mul(self.factor)
            .saturating_add(self.factor)
            .min(self.max);
        self.level.store(next, Ordering::Relaxed);

        trace!(from = level, to = next, max = self.max, "backoff level increased");
        self
    }

    /// Shrinks the level by one, never below `0`.
    pub fn decrement(&self) -> &Self {
        if !self.initialized {
            return self;
        }
        let _guard = self.write();

        let level = self.level.load(Ordering::Relaxed);
        if level == 0 {
            return self;
        }
        let next = level.saturating_sub(1).max(0);
        self.level.store(next, Ordering::Relaxed);

        trace!(from = level, to = next, "backoff level decreased");
        self
    }

    /// Drops the level back to `0`.
    pub fn reset(&self) -> &Self {
        if !self.initialized {
            return self;
        }
        let _guard = self.write();

        if self.level.load(Ordering::Relaxed) != 0 {
            self.level.store(0, Ordering::Relaxed);
            trace!("backoff level reset");
        }
        self
    }

    /// Overwrites the level with `value`.
    ///
    /// Unsynchronized and unchecked: skips the lock, ignores the
    /// initialization flag and does not clamp to `[0, max]`.
    pub fn set_level(&self, value: i64) -> &Self {
        self.level.store(value, Ordering::Relaxed);
        self
    }

    /// Returns the current level (unsynchronized read).
    #[inline]
    pub fn level(&self) -> i64 {
        self.level.load(Ordering::Relaxed)
    }

    /// Replaces the duration one level stands for. Ignored when uninitialized.
    pub fn set_time_unit(&self, unit: Duration) -> &Self {
        if self.initialized {
            self.time_unit.store(to_nanos(unit), Ordering::Relaxed);
        }
        self
    }

    /// Returns the duration one level stands for.
    pub fn time_unit(&self) -> Duration {
        Duration::from_nanos(self.time_unit.load(Ordering::Relaxed))
    }

    /// Returns `true` if the instance was built by [`Delay::new`].
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Returns the clamped level ceiling.
    pub fn max(&self) -> i64 {
        self.max
    }

    /// Returns the clamped growth factor.
    pub fn factor(&self) -> i64 {
        self.factor
    }

    /// Returns `true` if initialized and the level is positive.
    pub fn has_delay(&self) -> bool {
        self.initialized && self.level() > 0
    }

    /// Returns the wait the next [`backoff`](Delay::backoff) would schedule.
    pub fn duration(&self) -> Duration {
        if !self.initialized {
            return Duration::ZERO;
        }
        self.span(self.level())
    }

    /// Waits `level × time_unit` unless `signal` fires first.
    ///
    /// The level is read once at the start; a concurrent `reset` or
    /// `decrement` does not shorten a wait in progress. Nothing is awaited
    /// when the level is not positive.
    ///
    /// The returned [`BackoffOutcome`] carries whether a wait was scheduled,
    /// the signal's error (`None` unless it fired) and the time actually spent.
    pub async fn backoff<S: Signal + ?Sized>(&self, signal: &S) -> BackoffOutcome {
        if !self.initialized {
            return BackoffOutcome::none();
        }

        let started = Instant::now();
        let level = self.level();
        let delayed = level > 0;

        if delayed {
            let wait = self.span(level);
            debug!(level, ?wait, "backoff started");

            tokio::select! {
                _ = time::sleep(wait) => {}
                _ = signal.done() => {}
            }
        }

        let outcome = BackoffOutcome {
            delayed,
            error: signal.err(),
            elapsed: started.elapsed(),
        };
        if delayed {
            debug!(
                elapsed = ?outcome.elapsed,
                error = outcome.error.as_ref().map(|e| e.as_label()),
                "backoff finished"
            );
        }
        outcome
    }

    /// `level × time_unit`, zero for non-positive levels, saturating on overflow.
    fn span(&self, level: i64) -> Duration {
        let Ok(level) = u128::try_from(level) else {
            return Duration::ZERO;
        };
        let nanos = self.time_unit().as_nanos().saturating_mul(level);
        u64::try_from(nanos).map_or(Duration::MAX, Duration::from_nanos)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ()> {
        self.lock.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Delay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delay")
            .field("initialized", &self.initialized)
            .field("level", &self.level())
            .field("max", &self.max)
            .field("factor", &self.factor)
            .field("time_unit", &self.time_unit())
            .finish()
    }
}

fn to_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackoffError;
    use crate::signals::{Deadline, Uncancellable};
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    fn levels(delay: &Delay, steps: usize) -> Vec<i64> {
        (0..steps).map(|_| delay.increment().level()).collect()
    }

    #[test]
    fn test_new_defaults() {
        let delay = Delay::new(Config::new(10, 2));
        assert!(delay.is_initialized());
        assert_eq!(delay.level(), 0);
        assert_eq!(delay.time_unit(), Duration::from_secs(1));
        assert!(!delay.has_delay());
        assert_eq!(delay.duration(), Duration::ZERO);
    }

    #[test]
    fn test_new_clamps_config() {
        let delay = Delay::new(Config::new(-3, 0));
        assert_eq!(delay.max(), 0);
        assert_eq!(delay.factor(), 1);

        delay.increment();
        assert_eq!(delay.level(), 0);
    }

    #[test]
    fn test_growth_recurrence_factor_two() {
        let delay = Delay::new(Config::new(100, 2));
        assert_eq!(levels(&delay, 8), vec![2, 6, 14, 30, 62, 100, 100, 100]);
    }

    #[test]
    fn test_growth_recurrence_factor_three() {
        let delay = Delay::new(Config::new(50, 3));
        assert_eq!(levels(&delay, 5), vec![3, 12, 39, 50, 50]);
    }

    #[test]
    fn test_factor_one_is_linear() {
        let delay = Delay::new(Config::new(4, 1));
        assert_eq!(levels(&delay, 6), vec![1, 2, 3, 4, 4, 4]);
    }

    #[test]
    fn test_increment_saturates_on_overflow() {
        let delay = Delay::new(Config::new(i64::MAX, i64::MAX));
        delay.set_level(i64::MAX - 1);
        delay.increment();
        assert_eq!(delay.level(), i64::MAX);
    }

    #[test]
    fn test_decrement_reaches_zero_in_level_steps() {
        let delay = Delay::new(Config::new(100, 2));
        delay.increment().increment().increment();
        assert_eq!(delay.level(), 14);

        for expected in (0..14).rev() {
            assert_eq!(delay.decrement().level(), expected);
        }
        assert_eq!(delay.decrement().level(), 0);
    }

    #[test]
    fn test_reset() {
        let delay = Delay::new(Config::new(100, 2));
        delay.increment().increment().decrement();
        assert_eq!(delay.level(), 5);
        assert_eq!(delay.reset().level(), 0);
        assert_eq!(delay.reset().level(), 0);
    }

    #[test]
    fn test_chaining_returns_same_instance() {
        let delay = Delay::new(Config::new(100, 2));
        let same = delay.increment().decrement().reset().set_time_unit(Duration::ZERO);
        assert!(std::ptr::eq(same, &delay));
    }

    #[test]
    fn test_bounds_hold_for_mixed_sequence() {
        let delay = Delay::new(Config::new(37, 3));
        for i in 0..500u32 {
            match (i * 7 + i / 5) % 5 {
                0 | 1 => delay.increment(),
                2 | 3 => delay.decrement(),
                _ => delay.reset(),
            };
            let level = delay.level();
            assert!((0..=37).contains(&level), "step {i}: level {level} out of range");
        }
        assert_eq!(delay.reset().level(), 0);
    }

    #[test]
    fn test_set_level_is_unchecked() {
        let delay = Delay::new(Config::new(10, 2));
        delay.set_level(500);
        assert_eq!(delay.level(), 500);

        delay.increment();
        assert_eq!(delay.level(), 10);

        delay.set_level(-4);
        assert!(!delay.has_delay());
        delay.decrement();
        assert_eq!(delay.level(), 0);
    }

    #[test]
    fn test_uninitialized_is_noop() {
        let delay = Delay::default();
        assert!(!delay.is_initialized());

        delay
            .increment()
            .increment()
            .decrement()
            .reset()
            .set_time_unit(Duration::from_secs(5));
        assert_eq!(delay.level(), 0);
        assert!(!delay.has_delay());
        assert_eq!(delay.time_unit(), Duration::ZERO);
        assert_eq!(delay.duration(), Duration::ZERO);

        delay.set_level(3);
        assert_eq!(delay.level(), 3);
        assert!(!delay.has_delay());
    }

    #[test]
    fn test_duration_saturates() {
        let delay = Delay::new(Config::new(i64::MAX, 2));
        delay.set_time_unit(Duration::from_secs(u64::MAX));
        delay.set_level(i64::MAX);
        assert_eq!(delay.duration(), Duration::MAX);

        delay.set_time_unit(Duration::from_millis(250));
        delay.set_level(6);
        assert_eq!(delay.duration(), Duration::from_millis(1500));
    }

    #[test]
    fn test_concurrent_mutation_keeps_bounds() {
        let delay = Arc::new(Delay::new(Config::new(1_000, 2)));

        std::thread::scope(|s| {
            for t in 0..8 {
                let delay = Arc::clone(&delay);
                s.spawn(move || {
                    for i in 0..2_000 {
                        if (i + t) % 3 == 0 {
                            delay.decrement();
                        } else {
                            delay.increment();
                        }
                        let level = delay.level();
                        assert!((0..=1_000).contains(&level));
                    }
                });
            }
        });

        assert_eq!(delay.reset().level(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_uninitialized_returns_immediately() {
        let delay = Delay::default();
        let token = CancellationToken::new();
        token.cancel();

        assert_eq!(delay.backoff(&token).await, BackoffOutcome::none());
        assert_eq!(delay.backoff(&Uncancellable).await, BackoffOutcome::none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_without_level_does_not_wait() {
        let delay = Delay::new(Config::new(10, 2));
        let outcome = delay.backoff(&Uncancellable).await;
        assert_eq!(outcome, BackoffOutcome::none());

        let token = CancellationToken::new();
        token.cancel();
        let outcome = delay.backoff(&token).await;
        assert!(!outcome.delayed);
        assert_eq!(outcome.error, Some(BackoffError::Canceled));
        assert_eq!(outcome.elapsed, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_waits_full_delay() {
        let delay = Delay::new(Config::new(10, 1));
        delay.increment().increment().increment();

        let outcome = delay.backoff(&CancellationToken::new()).await;
        assert!(outcome.delayed);
        assert_eq!(outcome.error, None);
        assert!(outcome.elapsed >= Duration::from_secs(3));
        assert!(outcome.elapsed < Duration::from_millis(3010));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_honors_time_unit() {
        let delay = Delay::new(Config::new(100, 2));
        delay.set_time_unit(Duration::from_millis(100));
        delay.increment().increment();

        let outcome = delay.backoff(&Uncancellable).await;
        assert!(outcome.elapsed >= Duration::from_millis(600));
        assert!(outcome.elapsed < Duration::from_millis(610));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_cancelled_mid_wait() {
        let delay = Delay::new(Config::new(5, 1));
        delay.set_level(5);

        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_secs(2)).await;
            canceller.cancel();
        });

        let outcome = delay.backoff(&token).await;
        assert!(outcome.delayed);
        assert_eq!(outcome.error, Some(BackoffError::Canceled));
        assert!(outcome.elapsed >= Duration::from_secs(2));
        assert!(outcome.elapsed < Duration::from_millis(2010));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_already_cancelled() {
        let delay = Delay::new(Config::new(5, 1));
        delay.increment();

        let token = CancellationToken::new();
        token.cancel();

        let outcome = delay.backoff(&token).await;
        assert!(outcome.delayed);
        assert_eq!(outcome.error, Some(BackoffError::Canceled));
        assert_eq!(outcome.elapsed, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_deadline_exceeded() {
        let delay = Delay::new(Config::new(10, 1));
        delay.set_level(10);

        let outcome = delay.backoff(&Deadline::after(Duration::from_secs(4))).await;
        assert!(outcome.delayed);
        assert_eq!(
            outcome.error,
            Some(BackoffError::DeadlineExceeded {
                deadline: Duration::from_secs(4)
            })
        );
        assert!(outcome.elapsed >= Duration::from_secs(4));
        assert!(outcome.elapsed < Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_deadline_after_delay_is_ok() {
        let delay = Delay::new(Config::new(10, 1));
        delay.set_level(2);

        let outcome = delay.backoff(&Deadline::after(Duration::from_secs(30))).await;
        assert_eq!(outcome.clone().into_result(), Ok(true));
        assert!(outcome.elapsed >= Duration::from_secs(2));
        assert!(outcome.elapsed < Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_during_wait_does_not_shorten_it() {
        let delay = Arc::new(Delay::new(Config::new(5, 1)));
        delay.set_level(5);

        let resetter = Arc::clone(&delay);
        tokio::spawn(async move {
            time::sleep(Duration::from_secs(1)).await;
            resetter.reset();
        });

        let outcome = delay.backoff(&Uncancellable).await;
        assert!(outcome.delayed);
        assert!(outcome.elapsed >= Duration::from_secs(5));
        assert_eq!(delay.level(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shared_delay_across_tasks() {
        let delay = Arc::new(Delay::new(Config::new(64, 2)));

        let tasks = (0..4).map(|_| {
            let delay = Arc::clone(&delay);
            tokio::spawn(async move {
                for _ in 0..10 {
                    delay.increment();
                    tokio::task::yield_now().await;
                }
            })
        });
        for res in futures::future::join_all(tasks).await {
            res.unwrap();
        }

        assert_eq!(delay.level(), 64);
        assert_eq!(delay.duration(), Duration::from_secs(64));
    }
}
