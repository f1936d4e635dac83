//! Retry policy for flaky steps.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How often, and how patiently, a retryable step is re-attempted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryPolicy {
    /// Total attempts, including the first. `1` disables retrying.
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds.
    pub delay_ms: u64,
    /// Multiplier applied to the delay after each retry; `1.0` is a fixed delay.
    pub backoff_factor: f64,
    /// Upper bound for any single delay, in milliseconds.
    pub max_delay_ms: u64,
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            delay_ms: 0,
            backoff_factor: 1.0,
            max_delay_ms: 0,
        }
    }

    /// Fixed delay between attempts.
    #[must_use]
    pub const fn fixed(max_attempts: u32, delay_ms: u64) -> Self {
        Self {
            max_attempts,
            delay_ms,
            backoff_factor: 1.0,
            max_delay_ms: delay_ms,
        }
    }

    /// Exponential backoff starting at `delay_ms`.
    #[must_use]
    pub const fn exponential(max_attempts: u32, delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_attempts,
            delay_ms,
            backoff_factor: 2.0,
            max_delay_ms,
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss,
        clippy::cast_possible_wrap
    )]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32) as i32;
        let scaled = self.delay_ms as f64 * self.backoff_factor.max(1.0).powi(exponent);
        let capped = scaled.min(self.max_delay_ms.max(self.delay_ms) as f64);
        Duration::from_millis(capped as u64)
    }

    /// Returns true if another attempt may follow attempt number `attempt`.
    #[must_use]
    pub const fn allows_another(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

impl Default for RetryPolicy {
    /// Three attempts, one second apart.
    fn default() -> Self {
        Self::fixed(3, 1000)
    }
}
