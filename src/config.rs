//! # Backoff configuration.
//!
//! Provides [`Config`], the two knobs consumed by [`Delay::new`](crate::Delay::new).
//!
//! ## Sentinel values
//! - `max < 0` → clamped to `0` (the delay can never grow)
//! - `factor < 1` → clamped to `1` (linear growth: 0, 1, 2, 3, ...)
//!
//! Out-of-range values are normalized, never rejected.
//!
//! ## Example
//! ```rust
//! use expdelay::Config;
//!
//! let cfg: Config = serde_json::from_str(r#"{"max": 60, "factor": 2}"#).unwrap();
//! assert_eq!(cfg, Config::new(60, 2));
//!
//! let odd = Config::new(-5, 0).clamped();
//! assert_eq!((odd.max, odd.factor), (0, 1));
//! ```

use serde::{Deserialize, Serialize};

/// Configuration of one backoff sequence.
///
/// ## Field semantics
/// - `max`: ceiling the level may never exceed (`>= 0` after clamping)
/// - `factor`: growth multiplier (`>= 1` after clamping)
///
/// Serialized with the field names `max` and `factor`; missing fields take
/// their [`Default`] values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum backoff level.
    pub max: i64,
    /// Multiplier applied on every increment.
    pub factor: i64,
}

impl Config {
    /// Creates a config from raw values (no clamping yet).
    pub const fn new(max: i64, factor: i64) -> Self {
        Self { max, factor }
    }

    /// Returns a copy with `max` clamped to `>= 0` and `factor` to `>= 1`.
    #[inline]
    pub fn clamped(&self) -> Self {
        Self {
            max: self.max.max(0),
            factor: self.factor.max(1),
        }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `max = 0` (no delay ever)
    /// - `factor = 1`
    fn default() -> Self {
        Self { max: 0, factor: 1 }
    }
}
