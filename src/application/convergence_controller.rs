//! ConvergenceController - the sampling/advancing loop
//!
//! Drives a snapshot source through an explicit state machine:
//!
//! ```text
//! Sampling -> Reconciling -> Deciding -> Advancing -> Sampling ...
//!                                     \-> Converged (final pass, stop)
//! ```
//!
//! - Every source call is rate limited, bounded by a per-call timeout and
//!   retried with backoff; exceeding the retry bound fails the run
//! - A cycle counts as stale only when nothing was inserted or improved AND
//!   the fingerprint of observed identities did not move
//! - The wall-clock budget is checked before each cycle
//! - Whatever happens, the report carries the best transcript obtained, and
//!   the sink already holds the last persisted copy

use std::time::Instant;

use chrono::Utc;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::Serialize;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, info_span, trace, warn, Instrument};
use uuid::Uuid;

use super::fingerprint::{fingerprint, Fingerprint};
use super::intensity::{AdvanceIntensity, IntensityController};
use super::reconciler::Reconciler;
use crate::domain::errors::{HarvestError, HarvestResult, SourceError};
use crate::domain::models::{
    Config, ConvergenceConfig, MergeReport, RawRecord, RunOutcome, RunReport, RunStats,
};
use crate::domain::ports::{SnapshotSource, TranscriptSink};
use crate::infrastructure::retry::{RetryPolicy, RetryState};

/// What the controller concluded from one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// New or longer records were accepted
    Progress,
    /// Nothing accepted, but the observed identities moved
    Churn,
    /// Nothing changed; the stale streak grew
    Stale,
    /// The stale streak reached its bound
    Converged,
}

/// Per-cycle progress, handed to an optional observer.
#[derive(Debug, Clone, Serialize)]
pub struct CycleSummary {
    pub cycle: u32,
    pub decision: Decision,
    pub new: usize,
    pub updated: usize,
    pub total: usize,
    pub stale_streak: u32,
    pub intensity: AdvanceIntensity,
}

type CycleObserver = Box<dyn FnMut(&CycleSummary) + Send>;

#[derive(Debug, Clone, Copy)]
enum SourceCommand {
    Sample,
    Advance(AdvanceIntensity),
}

impl SourceCommand {
    const fn name(self) -> &'static str {
        match self {
            Self::Sample => "sample",
            Self::Advance(_) => "advance",
        }
    }
}

struct Observation {
    report: MergeReport,
    fingerprint_changed: bool,
}

enum Step {
    Sampling,
    Reconciling(Vec<RawRecord>),
    Deciding(Observation),
    Advancing,
    Converged,
}

/// Owns the source, the reconciler and all loop state for one run.
pub struct ConvergenceController<Src: SnapshotSource, S: TranscriptSink> {
    source: Src,
    reconciler: Reconciler<S>,
    convergence: ConvergenceConfig,
    retry: RetryPolicy,
    intensity: IntensityController,
    limiter: DefaultDirectRateLimiter,
    last_fingerprint: Option<Fingerprint>,
    stale_streak: u32,
    stats: RunStats,
    observer: Option<CycleObserver>,
}

impl<Src: SnapshotSource, S: TranscriptSink> ConvergenceController<Src, S> {
    /// Create a controller; the result set starts empty.
    pub fn new(source: Src, sink: S, config: &Config) -> HarvestResult<Self> {
        config
            .validate()
            .map_err(|e| HarvestError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            source,
            reconciler: Reconciler::new(sink),
            convergence: config.convergence.clone(),
            retry: RetryPolicy::from_config(&config.retry),
            intensity: IntensityController::new(config.advance.clone()),
            limiter: rate_limiter(config.convergence.max_calls_per_second)?,
            last_fingerprint: None,
            stale_streak: 0,
            stats: RunStats::new(Uuid::new_v4()),
            observer: None,
        })
    }

    /// Register a callback invoked after every decided cycle.
    #[must_use]
    pub fn with_observer<F>(mut self, observer: F) -> Self
    where
        F: FnMut(&CycleSummary) + Send + 'static,
    {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Run until convergence, budget exhaustion or transport failure.
    pub async fn run(self) -> RunReport {
        let span = info_span!(
            "harvest_run",
            run_id = %self.stats.run_id,
            source = %self.source.name()
        );
        self.drive().instrument(span).await
    }

    async fn drive(mut self) -> RunReport {
        let started = Instant::now();
        let budget = self.convergence.wall_clock_budget();
        info!(
            max_stale_streak = self.convergence.max_stale_streak,
            budget_secs = budget.as_secs(),
            "starting harvest"
        );

        let initial_delay = self.convergence.initial_delay();
        if !initial_delay.is_zero() {
            sleep(initial_delay).await;
        }

        let mut step = Step::Sampling;
        let (mut outcome, mut failure) = loop {
            step = match step {
                Step::Sampling => {
                    if started.elapsed() >= budget {
                        warn!(
                            elapsed_secs = started.elapsed().as_secs(),
                            "wall-clock budget exhausted before convergence"
                        );
                        break (RunOutcome::TimedOut, None);
                    }
                    self.stats.cycles += 1;
                    match self.sample().await {
                        Ok(batch) => Step::Reconciling(batch),
                        Err(err) => break (RunOutcome::Failed, Some(err.to_string())),
                    }
                }
                Step::Reconciling(batch) => match self.reconcile(batch) {
                    Ok(observation) => Step::Deciding(observation),
                    Err(err) => break (RunOutcome::Failed, Some(err.to_string())),
                },
                Step::Deciding(observation) => self.decide(&observation),
                Step::Advancing => match self.advance().await {
                    Ok(()) => Step::Sampling,
                    Err(err) => break (RunOutcome::Failed, Some(err.to_string())),
                },
                Step::Converged => {
                    // the outcome stands; the report says what the pass lost
                    let lost = self.final_pass().await.err();
                    break (
                        RunOutcome::Converged,
                        lost.map(|err| format!("final pass failed: {err}")),
                    );
                }
            };
        };

        if outcome != RunOutcome::Failed && self.reconciler.result().is_empty() {
            outcome = RunOutcome::Failed;
            failure = Some("no records collected".to_string());
        }

        self.stats.stale_streak = self.stale_streak;
        self.stats.writes = self.reconciler.writes();
        self.stats.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.stats.finished_at = Some(Utc::now());

        match &failure {
            Some(reason) if outcome.is_success() => warn!(
                outcome = %outcome,
                records = self.reconciler.result().len(),
                reason = %reason,
                "harvest finished with a failed final pass"
            ),
            Some(reason) => error!(
                outcome = %outcome,
                records = self.reconciler.result().len(),
                reason = %reason,
                "harvest finished"
            ),
            None => info!(
                outcome = %outcome,
                records = self.reconciler.result().len(),
                cycles = self.stats.cycles,
                writes = self.stats.writes,
                elapsed_ms = self.stats.elapsed_ms,
                "harvest finished"
            ),
        }

        let (result, _sink) = self.reconciler.into_parts();
        RunReport {
            records: result.into_records(),
            outcome,
            failure,
            stats: self.stats,
        }
    }

    async fn sample(&mut self) -> HarvestResult<Vec<RawRecord>> {
        let batch = self.call(SourceCommand::Sample).await?;
        self.stats.samples += 1;
        trace!(batch_len = batch.len(), "sampled");
        Ok(batch)
    }

    fn reconcile(&mut self, batch: Vec<RawRecord>) -> HarvestResult<Observation> {
        let report = self.reconciler.merge(batch)?;
        self.stats.dropped_records += report.dropped;

        let current = fingerprint(&report.observed);
        let fingerprint_changed = self.last_fingerprint.as_ref() != Some(&current);
        trace!(fingerprint = %current, fingerprint_changed, "fingerprinted sample");
        self.last_fingerprint = Some(current);

        Ok(Observation {
            report,
            fingerprint_changed,
        })
    }

    fn decide(&mut self, observation: &Observation) -> Step {
        let report = &observation.report;

        let decision = if report.changed() || observation.fingerprint_changed {
            self.stale_streak = 0;
            self.intensity.reset();
            if report.changed() {
                Decision::Progress
            } else {
                Decision::Churn
            }
        } else {
            self.stale_streak += 1;
            if self.stale_streak >= self.convergence.max_stale_streak {
                Decision::Converged
            } else {
                if self.intensity.on_stale(self.stale_streak) {
                    let intensity = self.intensity.current();
                    debug!(
                        step = intensity.step,
                        repetitions = intensity.repetitions,
                        "escalated advance intensity"
                    );
                }
                Decision::Stale
            }
        };

        let summary = CycleSummary {
            cycle: self.stats.cycles,
            decision,
            new: report.new,
            updated: report.updated,
            total: self.reconciler.result().len(),
            stale_streak: self.stale_streak,
            intensity: self.intensity.current(),
        };
        info!(
            cycle = summary.cycle,
            new = summary.new,
            updated = summary.updated,
            total = summary.total,
            stale_streak = summary.stale_streak,
            decision = ?summary.decision,
            "cycle decided"
        );
        if let Some(observer) = self.observer.as_mut() {
            observer(&summary);
        }

        if decision == Decision::Converged {
            Step::Converged
        } else {
            Step::Advancing
        }
    }

    async fn advance(&mut self) -> HarvestResult<()> {
        let intensity = self.intensity.current();
        self.call(SourceCommand::Advance(intensity)).await?;
        self.stats.advances += 1;

        let settle = self.convergence.settle_delay();
        if !settle.is_zero() {
            sleep(settle).await;
        }
        Ok(())
    }

    /// One more sample after convergence, for content that finished
    /// rendering during the stale streak.
    async fn final_pass(&mut self) -> HarvestResult<()> {
        let batch = self.sample().await?;
        let observation = self.reconcile(batch)?;
        let changes = observation.report.new + observation.report.updated;
        self.stats.final_pass_changes = changes;
        if changes > 0 {
            info!(
                new = observation.report.new,
                updated = observation.report.updated,
                "final pass picked up late content"
            );
        }
        Ok(())
    }

    /// Issue one source command under rate limit, timeout and retry policy.
    /// An advance yields an empty batch.
    async fn call(&mut self, command: SourceCommand) -> HarvestResult<Vec<RawRecord>> {
        let call_timeout = self.convergence.call_timeout();
        let mut state = RetryState::default();

        loop {
            self.limiter.until_ready().await;

            let attempt = match command {
                SourceCommand::Sample => timeout(call_timeout, self.source.sample()).await,
                SourceCommand::Advance(intensity) => timeout(
                    call_timeout,
                    self.source.advance(intensity.step, intensity.repetitions),
                )
                .await
                .map(|result| result.map(|()| Vec::new())),
            };

            let failure = match attempt {
                Ok(Ok(batch)) => {
                    if state.failures > 0 {
                        debug!(
                            operation = command.name(),
                            failures = state.failures,
                            "source call recovered"
                        );
                    }
                    return Ok(batch);
                }
                Ok(Err(err)) => err,
                Err(_elapsed) => SourceError::Timeout(call_timeout),
            };

            self.stats.transient_failures += 1;
            let backoff = self.retry.on_failure(&mut state, command.name(), failure)?;
            warn!(
                operation = command.name(),
                attempt = state.failures,
                max_retries = self.retry.max_retries(),
                error = ?state.last_error,
                backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
                "source call failed, retrying"
            );
            sleep(backoff).await;
        }
    }
}

fn rate_limiter(per_second: f64) -> HarvestResult<DefaultDirectRateLimiter> {
    if !per_second.is_finite() || per_second <= 0.0 {
        return Err(HarvestError::InvalidConfig(format!(
            "max_calls_per_second must be positive, got {per_second}"
        )));
    }
    let quota = Quota::with_period(std::time::Duration::from_secs_f64(1.0 / per_second))
        .ok_or_else(|| {
            HarvestError::InvalidConfig(format!(
                "max_calls_per_second too large: {per_second}"
            ))
        })?;
    Ok(RateLimiter::direct(quota))
}

/// Harvest a transcript from `source` into `sink`.
///
/// Fails only on invalid configuration; every other ending is expressed in
/// the report's outcome.
pub async fn run<Src, S>(source: Src, sink: S, config: &Config) -> HarvestResult<RunReport>
where
    Src: SnapshotSource,
    S: TranscriptSink,
{
    Ok(ConvergenceController::new(source, sink, config)?.run().await)
}
