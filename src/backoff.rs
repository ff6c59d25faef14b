use std::time::Duration;

use rand::Rng;

use crate::{Result, TransportError};

/// Exponential backoff parameters.
///
/// Validated once at construction and read-only afterwards, so one value can
/// be shared by any number of concurrent calls.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackoffConfig {
    initial_delay: Duration,
    max_delay: Duration,
    exponent_factor: f64,
    max_jitter: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            exponent_factor: 2.0,
            max_jitter: Duration::ZERO,
        }
    }
}

impl BackoffConfig {
    /// Creates a validated backoff configuration.
    ///
    /// Fails when `max_delay < initial_delay` or when `exponent_factor` is not
    /// a finite number `>= 1.0`. A factor of exactly `1.0` gives a constant
    /// delay.
    pub fn new(
        initial_delay: Duration,
        max_delay: Duration,
        exponent_factor: f64,
        max_jitter: Duration,
    ) -> Result<Self> {
        if max_delay < initial_delay {
            return Err(TransportError::Config(format!(
                "max delay {max_delay:?} is shorter than initial delay {initial_delay:?}"
            )));
        }
        if !exponent_factor.is_finite() || exponent_factor < 1.0 {
            return Err(TransportError::Config(format!(
                "exponent factor must be a finite number >= 1.0, got {exponent_factor}"
            )));
        }
        Ok(Self {
            initial_delay,
            max_delay,
            exponent_factor,
            max_jitter,
        })
    }

    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    pub fn exponent_factor(&self) -> f64 {
        self.exponent_factor
    }

    pub fn max_jitter(&self) -> Duration {
        self.max_jitter
    }

    /// Deterministic part of the delay after the `attempt`-th failure
    /// (0-based): `min(max_delay, initial_delay * exponent_factor^attempt)`.
    pub fn base_delay(&self, attempt: usize) -> Duration {
        if self.initial_delay.is_zero() {
            return Duration::ZERO;
        }
        let max_nanos = self.max_delay.as_nanos();
        let exp = i32::try_from(attempt).unwrap_or(i32::MAX);
        let nanos = self.initial_delay.as_nanos() as f64 * self.exponent_factor.powi(exp);

        // Cap in f64 before converting back so large attempts cannot overflow.
        if !nanos.is_finite() || nanos >= max_nanos as f64 {
            return self.max_delay;
        }
        Duration::from_nanos(nanos as u64).min(self.max_delay)
    }

    /// Delay to wait before retrying after the `attempt`-th failure.
    ///
    /// Adds jitter drawn uniformly from `[0, max_jitter]` using the calling
    /// thread's generator. With zero jitter the result is exactly
    /// [`BackoffConfig::base_delay`].
    pub fn delay(&self, attempt: usize) -> Duration {
        let base = self.base_delay(attempt);
        if self.max_jitter.is_zero() {
            return base;
        }
        let max_jitter_nanos = u64::try_from(self.max_jitter.as_nanos()).unwrap_or(u64::MAX);
        let jitter = rand::thread_rng().gen_range(0..=max_jitter_nanos);
        base.saturating_add(Duration::from_nanos(jitter))
    }
}
