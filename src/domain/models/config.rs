use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::errors::ConfigError;

/// Main configuration structure for a harvest run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Advance (scroll) intensity tuning
    #[serde(default)]
    pub advance: AdvanceConfig,

    /// Convergence detection and pacing
    #[serde(default)]
    pub convergence: ConvergenceConfig,

    /// Transport retry policy
    #[serde(default)]
    pub retry: RetryConfig,

    /// Output locations
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Check the settings a run depends on: escalation bounds, pacing, retry
    /// backoff, output path and logging options.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let advance = &self.advance;
        if advance.baseline_step == 0 {
            return Err(ConfigError::ZeroValue {
                field: "baseline_step",
            });
        }
        if advance.step_floor == 0 {
            return Err(ConfigError::ZeroValue { field: "step_floor" });
        }
        if advance.step_floor > advance.baseline_step {
            return Err(ConfigError::FloorAboveBaseline {
                floor: advance.step_floor,
                baseline: advance.baseline_step,
            });
        }
        if advance.baseline_repetitions == 0 {
            return Err(ConfigError::ZeroValue {
                field: "baseline_repetitions",
            });
        }
        if advance.baseline_repetitions > advance.max_repetitions {
            return Err(ConfigError::RepetitionsAboveCap(
                advance.baseline_repetitions,
                advance.max_repetitions,
            ));
        }

        let convergence = &self.convergence;
        if convergence.max_stale_streak == 0 {
            return Err(ConfigError::InvalidStaleStreak(convergence.max_stale_streak));
        }
        if convergence.max_wall_clock_secs == 0 {
            return Err(ConfigError::ZeroValue {
                field: "max_wall_clock_secs",
            });
        }
        if convergence.call_timeout_ms == 0 {
            return Err(ConfigError::ZeroValue {
                field: "call_timeout_ms",
            });
        }
        if !convergence.max_calls_per_second.is_finite() || convergence.max_calls_per_second <= 0.0
        {
            return Err(ConfigError::InvalidRate(convergence.max_calls_per_second));
        }

        if self.retry.max_retries == 0 {
            return Err(ConfigError::InvalidMaxRetries(self.retry.max_retries));
        }
        if self.retry.initial_backoff_ms > self.retry.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                self.retry.initial_backoff_ms,
                self.retry.max_backoff_ms,
            ));
        }

        if self.output.path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyOutputPath);
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(self.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(self.logging.rotation.clone()));
        }

        Ok(())
    }
}

/// Advance intensity configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AdvanceConfig {
    /// Step size issued while the source keeps producing data
    #[serde(default = "default_baseline_step")]
    pub baseline_step: u32,

    /// Smallest step size escalation may reach
    #[serde(default = "default_step_floor")]
    pub step_floor: u32,

    /// Repetitions per advance at baseline intensity
    #[serde(default = "default_baseline_repetitions")]
    pub baseline_repetitions: u32,

    /// Upper bound for repetitions after escalation
    #[serde(default = "default_max_repetitions")]
    pub max_repetitions: u32,

    /// Stale cycles before intensity escalates
    #[serde(default = "default_escalate_after")]
    pub escalate_after: u32,
}

const fn default_baseline_step() -> u32 {
    100
}

const fn default_step_floor() -> u32 {
    25
}

const fn default_baseline_repetitions() -> u32 {
    3
}

const fn default_max_repetitions() -> u32 {
    24
}

const fn default_escalate_after() -> u32 {
    2
}

impl Default for AdvanceConfig {
    fn default() -> Self {
        Self {
            baseline_step: default_baseline_step(),
            step_floor: default_step_floor(),
            baseline_repetitions: default_baseline_repetitions(),
            max_repetitions: default_max_repetitions(),
            escalate_after: default_escalate_after(),
        }
    }
}

/// Convergence and pacing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ConvergenceConfig {
    /// Consecutive stale cycles that declare convergence
    #[serde(default = "default_max_stale_streak")]
    pub max_stale_streak: u32,

    /// Wall-clock budget for the whole run (seconds)
    #[serde(default = "default_max_wall_clock_secs")]
    pub max_wall_clock_secs: u64,

    /// Timeout for a single sample or advance call (milliseconds)
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,

    /// Pause before the first sample (milliseconds)
    #[serde(default)]
    pub initial_delay_ms: u64,

    /// Pause after each advance before sampling again (milliseconds)
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Upper bound on source calls per second
    #[serde(default = "default_max_calls_per_second")]
    pub max_calls_per_second: f64,
}

const fn default_max_stale_streak() -> u32 {
    5
}

const fn default_max_wall_clock_secs() -> u64 {
    1800
}

const fn default_call_timeout_ms() -> u64 {
    10_000
}

const fn default_settle_delay_ms() -> u64 {
    200
}

const fn default_max_calls_per_second() -> f64 {
    20.0
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            max_stale_streak: default_max_stale_streak(),
            max_wall_clock_secs: default_max_wall_clock_secs(),
            call_timeout_ms: default_call_timeout_ms(),
            initial_delay_ms: 0,
            settle_delay_ms: default_settle_delay_ms(),
            max_calls_per_second: default_max_calls_per_second(),
        }
    }
}

impl ConvergenceConfig {
    pub const fn wall_clock_budget(&self) -> Duration {
        Duration::from_secs(self.max_wall_clock_secs)
    }

    pub const fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }

    pub const fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    /// Maximum consecutive transport-error retries
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Maximum backoff in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_initial_backoff_ms() -> u64 {
    250
}

const fn default_max_backoff_ms() -> u64 {
    5_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OutputConfig {
    /// JSON transcript path, rewritten atomically on every change
    #[serde(default = "default_output_path")]
    pub path: PathBuf,

    /// Also export a CSV projection when the run finishes
    #[serde(default)]
    pub csv: bool,

    /// CSV path; derived from `path` when unset
    #[serde(default)]
    pub csv_path: Option<PathBuf>,
}

fn default_output_path() -> PathBuf {
    PathBuf::from("transcript.json")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            csv: false,
            csv_path: None,
        }
    }
}

impl OutputConfig {
    /// CSV destination: explicit `csv_path`, or `path` with a `.csv` extension.
    pub fn resolved_csv_path(&self) -> PathBuf {
        self.csv_path
            .clone()
            .unwrap_or_else(|| self.path.with_extension("csv"))
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files (stderr only when unset)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Rotation for file logs: daily, hourly, never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}
