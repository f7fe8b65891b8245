//! Jitter policy for retry delays.
//!
//! Adds randomness to backoff delays so that a fleet of stream actors
//! failing together (cell restart, broker outage) does not retry in
//! lockstep.

use rand::Rng;
use std::time::Duration;

/// Policy controlling randomization of retry delays.
///
/// ## Trade-offs
/// - **None**: predictable, but risks thundering herd
/// - **Full**: maximum randomness, aggressive load spreading
/// - **Equal**: balanced (recommended default)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JitterPolicy {
    /// No jitter: use the exact backoff delay.
    None,

    /// Full jitter: random delay in `[0, delay]`.
    Full,

    /// Equal jitter: `delay/2 + random[0, delay/2]`.
    ///
    /// Preserves ~75% of the original backoff on average.
    #[default]
    Equal,
}

impl JitterPolicy {
    /// Applies jitter to the given delay.
    pub fn apply(&self, delay: Duration) -> Duration {
        match self {
            JitterPolicy::None => delay,
            JitterPolicy::Full => self.full_jitter(delay),
            JitterPolicy::Equal => self.equal_jitter(delay),
        }
    }

    /// Full jitter: random[0, delay]
    fn full_jitter(&self, delay: Duration) -> Duration {
        let ms = delay.as_millis() as u64;
        if ms == 0 {
            return Duration::ZERO;
        }
        let mut rng = rand::rng();
        Duration::from_millis(rng.random_range(0..=ms))
    }

    /// Equal jitter: delay/2 + random[0, delay/2]
    fn equal_jitter(&self, delay: Duration) -> Duration {
        let ms = delay.as_millis() as u64;
        if ms == 0 {
            return Duration::ZERO;
        }
        let half = ms / 2;
        let jitter = if half == 0 {
            0
        } else {
            let mut rng = rand::rng();
            rng.random_range(0..=half)
        };
        Duration::from_millis(half + jitter)
    }
}
