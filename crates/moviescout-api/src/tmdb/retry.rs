//! Retry policy for transient TMDB failures.

use std::time::Duration;

use super::error::ErrorKind;

/// Default number of retries after the first attempt.
const DEFAULT_MAX_RETRIES: u32 = 2;

/// Default backoff unit; the n-th retry waits `2^n` units.
const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Upper bound on the backoff exponent.
const MAX_BACKOFF_EXPONENT: u32 = 16;

/// Bounded exponential backoff.
///
/// Retry `n` (starting at 1) waits `base_delay * 2^n`. Only kinds accepted
/// by `retryable` are retried; everything else is returned immediately.
#[derive(Debug, Clone, Copy)]
#[allow(clippy::module_name_repetitions)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
    retryable: fn(ErrorKind) -> bool,
}

impl RetryPolicy {
    /// Creates a policy retrying retryable kinds up to `max_retries` times.
    #[must_use]
    pub const fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            retryable: ErrorKind::is_retryable,
        }
    }

    /// Policy with no backoff delay, for tests and interactive tools.
    #[must_use]
    pub const fn immediate(max_retries: u32) -> Self {
        Self::new(max_retries, Duration::ZERO)
    }

    /// Policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Replaces the retryable-kind predicate.
    #[must_use]
    pub const fn retry_when(mut self, retryable: fn(ErrorKind) -> bool) -> Self {
        self.retryable = retryable;
        self
    }

    /// Maximum number of retries after the first attempt.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Total number of attempts, first one included.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retry number `attempt` (1-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1_u32 << attempt.min(MAX_BACKOFF_EXPONENT);
        self.base_delay.saturating_mul(factor)
    }

    /// Whether a failure of `kind` after `retries_done` retries gets another try.
    #[must_use]
    pub fn should_retry(&self, kind: ErrorKind, retries_done: u32) -> bool {
        retries_done < self.max_retries && (self.retryable)(kind)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, DEFAULT_BASE_DELAY)
    }
}
