//! Backoff policy for reviving failed streams.
//!
//! [`BackoffPolicy`] controls how retry delays grow after repeated
//! failures. The delay for attempt `n` (0-indexed) is
//! `first × factor^n`, clamped to `max`, then jitter is applied. The base
//! delay is derived purely from the attempt number, so jitter output never
//! feeds back into subsequent calculations.

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Retry backoff policy.
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    /// Initial delay before the first retry.
    pub first: Duration,
    /// Maximum delay cap for retries.
    pub max: Duration,
    /// Multiplicative growth factor (`>= 1.0` recommended).
    pub factor: f64,
    /// Jitter policy to prevent thundering herd.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// Returns the stream-revival default:
    /// `first = 5s`, `factor = 2.0`, `max = 60s`, `jitter = Equal`.
    fn default() -> Self {
        Self {
            first: Duration::from_secs(5),
            max: Duration::from_secs(60),
            factor: 2.0,
            jitter: JitterPolicy::Equal,
        }
    }
}

impl BackoffPolicy {
    /// Computes the delay for the given attempt number (0-indexed).
    ///
    /// The base delay is `first × factor^attempt`, clamped to
    /// [`BackoffPolicy::max`]; jitter is applied to the clamped base.
    ///
    /// # Notes
    /// - `factor == 1.0` keeps the delay constant at `first` (up to `max`).
    /// - Non-finite or overflowing intermediate values clamp to `max`.
    pub fn next(&self, attempt: u32) -> Duration {
        let max_secs = self.max.as_secs_f64();
        let clamped_exp = attempt.min(i32::MAX as u32) as i32;
        let unclamped_secs = self.first.as_secs_f64() * self.factor.powi(clamped_exp);

        let base =
            if !unclamped_secs.is_finite() || unclamped_secs < 0.0 || unclamped_secs > max_secs {
                self.max
            } else {
                Duration::from_secs_f64(unclamped_secs)
            };

        self.jitter.apply(base)
    }
}
