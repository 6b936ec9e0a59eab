//! Run outcome and statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::record::Record;

/// Terminal state of a harvest run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Sustained stale streak; no more data obtainable
    Converged,
    /// Wall-clock budget ran out before convergence
    TimedOut,
    /// Transport or persistence failure, or nothing was collected
    Failed,
}

impl RunOutcome {
    /// Lowercase name used in logs and JSON output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Converged => "converged",
            Self::TimedOut => "timed_out",
            Self::Failed => "failed",
        }
    }

    /// Everything but `Failed`; a timed-out run still returns its best effort.
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed)
    }
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters collected while the controller runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStats {
    pub run_id: Uuid,
    pub cycles: u32,
    /// Stale streak length when the run finished
    pub stale_streak: u32,
    pub samples: u32,
    pub advances: u32,
    pub transient_failures: u32,
    pub writes: u32,
    pub dropped_records: usize,
    /// New plus updated records picked up by the post-convergence pass
    pub final_pass_changes: usize,
    pub elapsed_ms: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunStats {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            cycles: 0,
            stale_streak: 0,
            samples: 0,
            advances: 0,
            transient_failures: 0,
            writes: 0,
            dropped_records: 0,
            final_pass_changes: 0,
            elapsed_ms: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }
}

/// Everything a run hands back: the best transcript obtained, the outcome
/// tag, and how it got there.
///
/// `Converged` does not imply completeness when the source itself was
/// unreliable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub records: Vec<Record>,
    pub outcome: RunOutcome,
    /// Why the run failed, or why a converged run's final pass did not
    /// reach the sink
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    pub stats: RunStats,
}
