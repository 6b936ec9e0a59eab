//! Domain errors for the harvest pipeline.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors raised by a snapshot source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("Source call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Source unavailable: {0}")]
    Unavailable(String),

    #[error("Source rejected command: {0}")]
    Rejected(String),

    #[error("Source protocol error: {0}")]
    Protocol(String),

    #[error("Source I/O error: {0}")]
    Io(String),
}

impl SourceError {
    /// Whether retrying the same call can plausibly succeed.
    ///
    /// A source that has gone away for good is the only permanent case.
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::Unavailable(_))
    }
}

impl From<std::io::Error> for SourceError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Errors that end a harvest run.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Source {operation} failed after {attempts} attempt(s): {source}")]
    TransportFatal {
        operation: &'static str,
        attempts: u32,
        #[source]
        source: SourceError,
    },

    #[error("Failed to persist transcript to {}: {message}", path.display())]
    Persistence { path: PathBuf, message: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type HarvestResult<T> = Result<T, HarvestError>;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid max_stale_streak: {0}. Must be at least 1")]
    InvalidStaleStreak(u32),

    #[error("Invalid {field}: 0. Must be positive")]
    ZeroValue { field: &'static str },

    #[error("Invalid step_floor: {floor}. Must not exceed baseline_step ({baseline})")]
    FloorAboveBaseline { floor: u32, baseline: u32 },

    #[error(
        "Invalid repetitions: baseline_repetitions ({0}) must not exceed max_repetitions ({1})"
    )]
    RepetitionsAboveCap(u32, u32),

    #[error("Invalid max_calls_per_second: {0}. Must be positive")]
    InvalidRate(f64),

    #[error("Invalid max_retries: {0}. Cannot be 0")]
    InvalidMaxRetries(u32),

    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must not exceed max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    #[error("Output path cannot be empty")]
    EmptyOutputPath,
}
