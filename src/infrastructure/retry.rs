use std::time::Duration;

use crate::domain::errors::{HarvestError, HarvestResult, SourceError};
use crate::domain::models::RetryConfig;

/// Retry policy with exponential backoff for snapshot source calls
///
/// Backoff doubles with each consecutive failure:
/// 250ms → 500ms → 1s → 2s → 4s → 5s (max)
///
/// # Retry Decision
/// - Retry on: timeouts, rejected commands, protocol and I/O errors
/// - Do NOT retry: a source that is gone for good, or once `max_retries`
///   consecutive failures have already been retried
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum consecutive retries before giving up
    max_retries: u32,
    /// Initial backoff duration in milliseconds
    initial_backoff_ms: u64,
    /// Maximum backoff duration in milliseconds
    max_backoff_ms: u64,
}

/// Failure bookkeeping for one logical source call.
#[derive(Debug, Clone, Default)]
pub struct RetryState {
    /// Failed attempts so far
    pub failures: u32,
    /// Most recent failure
    pub last_error: Option<SourceError>,
}

impl RetryPolicy {
    /// Create a new retry policy with custom settings
    pub const fn new(max_retries: u32, initial_backoff_ms: u64, max_backoff_ms: u64) -> Self {
        Self {
            max_retries,
            initial_backoff_ms,
            max_backoff_ms,
        }
    }

    pub const fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_retries,
            config.initial_backoff_ms,
            config.max_backoff_ms,
        )
    }

    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Record a failed attempt and decide what happens next.
    ///
    /// # Returns
    /// * `Ok(Duration)` - wait this long, then retry
    /// * `Err(HarvestError::TransportFatal)` - give up
    pub fn on_failure(
        &self,
        state: &mut RetryState,
        operation: &'static str,
        error: SourceError,
    ) -> HarvestResult<Duration> {
        state.failures += 1;

        if !error.is_transient() || state.failures > self.max_retries {
            return Err(HarvestError::TransportFatal {
                operation,
                attempts: state.failures,
                source: error,
            });
        }

        let backoff = self.calculate_backoff(state.failures - 1);
        state.last_error = Some(error);
        Ok(backoff)
    }

    /// Calculate exponential backoff duration for a given retry
    ///
    /// Formula: min(initial_backoff * 2^retry, max_backoff)
    pub fn calculate_backoff(&self, retry: u32) -> Duration {
        let backoff_ms = self
            .initial_backoff_ms
            .saturating_mul(2_u64.saturating_pow(retry))
            .min(self.max_backoff_ms);

        Duration::from_millis(backoff_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}
