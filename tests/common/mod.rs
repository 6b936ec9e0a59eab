//! Common test utilities for integration tests
//!
//! Scripted snapshot sources, a recording sink and a fast configuration
//! shared across integration test files.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use transcript_harvest::{
    Config, HarvestError, HarvestResult, RawRecord, Record, SnapshotSource, SourceError,
    TranscriptSink,
};

/// Create a temporary directory for test isolation
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Setup test logging
///
/// Call this at the beginning of tests that need logging.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Defaults with every delay shrunk so loops finish in milliseconds.
pub fn fast_config() -> Config {
    let mut config = Config::default();
    config.convergence.settle_delay_ms = 0;
    config.convergence.call_timeout_ms = 50;
    config.convergence.max_calls_per_second = 1000.0;
    config.retry.initial_backoff_ms = 1;
    config.retry.max_backoff_ms = 4;
    config
}

pub fn three_records() -> Vec<RawRecord> {
    vec![
        RawRecord::new("A", "00:01", "one"),
        RawRecord::new("B", "00:02", "two"),
        RawRecord::new("C", "00:03", "three"),
    ]
}

/// One scripted reply to `sample`.
#[derive(Debug, Clone)]
pub enum Step {
    Batch(Vec<RawRecord>),
    Fail(SourceError),
    /// Sleep past any sensible call timeout
    Hang(Duration),
}

/// One scripted reply to `advance`.
#[derive(Debug, Clone)]
pub enum AdvanceStep {
    Ok,
    Fail(SourceError),
    Hang(Duration),
}

/// What a scripted source was asked to do.
#[derive(Debug, Default)]
pub struct SourceLog {
    pub samples: u32,
    pub advances: Vec<(u32, u32)>,
}

/// Replays scripted steps; the last step of each script repeats forever.
/// Advances succeed unless scripted otherwise.
pub struct ScriptedSource {
    steps: VecDeque<Step>,
    advance_steps: VecDeque<AdvanceStep>,
    log: Arc<Mutex<SourceLog>>,
}

impl ScriptedSource {
    pub fn new(steps: Vec<Step>) -> (Self, Arc<Mutex<SourceLog>>) {
        assert!(!steps.is_empty(), "script needs at least one step");
        let log = Arc::new(Mutex::new(SourceLog::default()));
        (
            Self {
                steps: steps.into(),
                advance_steps: VecDeque::from([AdvanceStep::Ok]),
                log: Arc::clone(&log),
            },
            log,
        )
    }

    pub fn repeating(batch: Vec<RawRecord>) -> (Self, Arc<Mutex<SourceLog>>) {
        Self::new(vec![Step::Batch(batch)])
    }

    pub fn with_advance_script(mut self, steps: Vec<AdvanceStep>) -> Self {
        assert!(!steps.is_empty(), "script needs at least one step");
        self.advance_steps = steps.into();
        self
    }
}

fn next_in<T: Clone>(script: &mut VecDeque<T>) -> T {
    if script.len() > 1 {
        script.pop_front().expect("non-empty script")
    } else {
        script.front().cloned().expect("non-empty script")
    }
}

#[async_trait]
impl SnapshotSource for ScriptedSource {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn sample(&mut self) -> Result<Vec<RawRecord>, SourceError> {
        self.log.lock().unwrap().samples += 1;
        match next_in(&mut self.steps) {
            Step::Batch(batch) => Ok(batch),
            Step::Fail(err) => Err(err),
            Step::Hang(duration) => {
                tokio::time::sleep(duration).await;
                Ok(Vec::new())
            }
        }
    }

    async fn advance(&mut self, step: u32, repetitions: u32) -> Result<(), SourceError> {
        self.log.lock().unwrap().advances.push((step, repetitions));
        match next_in(&mut self.advance_steps) {
            AdvanceStep::Ok => Ok(()),
            AdvanceStep::Fail(err) => Err(err),
            AdvanceStep::Hang(duration) => {
                tokio::time::sleep(duration).await;
                Ok(())
            }
        }
    }
}

/// Shows one brand-new record on every sample; never converges.
#[derive(Default)]
pub struct EndlessSource {
    next: u32,
}

#[async_trait]
impl SnapshotSource for EndlessSource {
    fn name(&self) -> &str {
        "endless"
    }

    async fn sample(&mut self) -> Result<Vec<RawRecord>, SourceError> {
        self.next += 1;
        Ok(vec![RawRecord::new(
            "Speaker",
            format!("{:06}", self.next),
            format!("utterance {}", self.next),
        )])
    }

    async fn advance(&mut self, _step: u32, _repetitions: u32) -> Result<(), SourceError> {
        Ok(())
    }
}

/// Keeps every snapshot it is handed.
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub snapshots: Arc<Mutex<Vec<Vec<Record>>>>,
}

impl RecordingSink {
    pub fn writes(&self) -> usize {
        self.snapshots.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<Vec<Record>> {
        self.snapshots.lock().unwrap().last().cloned()
    }
}

impl TranscriptSink for RecordingSink {
    fn write(&mut self, records: &[Record]) -> HarvestResult<()> {
        self.snapshots.lock().unwrap().push(records.to_vec());
        Ok(())
    }
}

/// Fails every write.
pub struct FullDiskSink;

impl TranscriptSink for FullDiskSink {
    fn write(&mut self, _records: &[Record]) -> HarvestResult<()> {
        Err(HarvestError::Persistence {
            path: "/full/transcript.json".into(),
            message: "No space left on device".to_string(),
        })
    }
}

/// Accepts `allowed` writes, then fails like a full disk.
pub struct FillingDiskSink {
    pub allowed: usize,
    pub inner: RecordingSink,
}

impl TranscriptSink for FillingDiskSink {
    fn write(&mut self, records: &[Record]) -> HarvestResult<()> {
        if self.inner.writes() >= self.allowed {
            return FullDiskSink.write(records);
        }
        self.inner.write(records)
    }
}
