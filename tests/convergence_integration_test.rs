//! End-to-end tests of the convergence loop against scripted sources.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::{
    fast_config, setup_test_logging, temp_dir, three_records, AdvanceStep, EndlessSource,
    FillingDiskSink, FullDiskSink, RecordingSink, ScriptedSource, Step,
};
use transcript_harvest::infrastructure::persistence::{load_transcript, JsonFileSink};
use transcript_harvest::infrastructure::sources::VirtualListSource;
use transcript_harvest::{
    run, ConvergenceController, Decision, HarvestError, RawRecord, Record, RunOutcome,
    SourceError,
};

#[tokio::test]
async fn test_static_source_converges_after_exactly_max_stale_streak() {
    setup_test_logging();
    let dir = temp_dir();
    let path = dir.path().join("transcript.json");
    let (source, log) = ScriptedSource::repeating(three_records());

    let config = fast_config();
    let report = run(source, JsonFileSink::new(&path), &config).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Converged);
    assert!(report.failure.is_none());
    assert_eq!(report.records.len(), 3);
    assert_eq!(report.stats.stale_streak, config.convergence.max_stale_streak);
    // one productive sample, five stale ones, then the final pass
    assert_eq!(log.lock().unwrap().samples, 7);
    assert_eq!(report.stats.samples, 7);
    assert_eq!(report.stats.writes, 1);
    assert_eq!(load_transcript(&path).unwrap(), report.records);
}

#[tokio::test]
async fn test_recovers_from_three_timeouts() {
    let hang = Step::Hang(Duration::from_millis(500));
    let (source, log) = ScriptedSource::new(vec![
        hang.clone(),
        hang.clone(),
        hang,
        Step::Batch(three_records()),
    ]);

    let report = run(source, RecordingSink::default(), &fast_config())
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::Converged);
    assert_eq!(report.stats.transient_failures, 3);
    assert_eq!(report.records.len(), 3);
    // timed-out attempts still reached the source
    assert_eq!(log.lock().unwrap().samples, 3 + 7);
}

#[tokio::test]
async fn test_exhausted_retries_fail_but_keep_persisted_transcript() {
    let dir = temp_dir();
    let path = dir.path().join("transcript.json");
    let (source, _) = ScriptedSource::new(vec![
        Step::Batch(three_records()),
        Step::Fail(SourceError::Rejected("list container missing".into())),
    ]);

    let report = run(source, JsonFileSink::new(&path), &fast_config())
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::Failed);
    let failure = report.failure.expect("failure reason");
    assert!(failure.contains("sample"), "{failure}");
    assert!(failure.contains("4 attempt"), "{failure}");
    assert_eq!(report.stats.transient_failures, 4);
    // best result so far is still returned and still on disk
    assert_eq!(report.records.len(), 3);
    assert_eq!(load_transcript(&path).unwrap().len(), 3);
}

#[tokio::test]
async fn test_recovers_from_advance_failures_below_bound() {
    let (source, log) = ScriptedSource::repeating(three_records());
    let source = source.with_advance_script(vec![
        AdvanceStep::Hang(Duration::from_millis(500)),
        AdvanceStep::Fail(SourceError::Rejected("scroll target detached".into())),
        AdvanceStep::Fail(SourceError::Io("resource busy".into())),
        AdvanceStep::Ok,
    ]);

    let report = run(source, RecordingSink::default(), &fast_config())
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::Converged);
    assert_eq!(report.stats.transient_failures, 3);
    assert_eq!(report.stats.advances, 5);
    // three failed attempts plus five acknowledged advances
    assert_eq!(log.lock().unwrap().advances.len(), 8);
}

#[tokio::test]
async fn test_exhausted_advance_retries_fail_but_keep_persisted_transcript() {
    let dir = temp_dir();
    let path = dir.path().join("transcript.json");
    let (source, log) = ScriptedSource::repeating(three_records());
    let source = source.with_advance_script(vec![AdvanceStep::Fail(SourceError::Rejected(
        "scroll target detached".into(),
    ))]);

    let report = run(source, JsonFileSink::new(&path), &fast_config())
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::Failed);
    let failure = report.failure.expect("failure reason");
    assert!(failure.contains("advance"), "{failure}");
    assert!(failure.contains("4 attempt"), "{failure}");
    assert_eq!(report.stats.transient_failures, 4);
    assert_eq!(report.stats.advances, 0);
    assert_eq!(log.lock().unwrap().samples, 1);
    assert_eq!(report.records.len(), 3);
    assert_eq!(load_transcript(&path).unwrap().len(), 3);
}

#[tokio::test]
async fn test_unavailable_source_is_not_retried() {
    let (source, log) = ScriptedSource::new(vec![Step::Fail(SourceError::Unavailable(
        "helper exited".into(),
    ))]);

    let report = run(source, RecordingSink::default(), &fast_config())
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::Failed);
    assert_eq!(log.lock().unwrap().samples, 1);
    assert!(report.records.is_empty());
}

#[tokio::test]
async fn test_budget_exhaustion_times_out_with_best_effort() {
    let sink = RecordingSink::default();
    let mut config = fast_config();
    config.convergence.max_wall_clock_secs = 1;
    config.convergence.settle_delay_ms = 20;

    let report = run(EndlessSource::default(), sink.clone(), &config)
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::TimedOut);
    assert!(report.failure.is_none());
    assert!(report.records.len() > 5);
    assert_eq!(sink.last().unwrap(), report.records);
    assert!(report.stats.elapsed_ms >= 1000);
}

#[tokio::test]
async fn test_empty_source_fails_without_writing() {
    let sink = RecordingSink::default();
    let (source, _) = ScriptedSource::repeating(Vec::new());

    let report = run(source, sink.clone(), &fast_config()).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Failed);
    assert_eq!(report.failure.as_deref(), Some("no records collected"));
    assert_eq!(sink.writes(), 0);
}

#[tokio::test]
async fn test_malformed_only_source_fails_and_counts_drops() {
    let (source, _) = ScriptedSource::repeating(vec![
        RawRecord::new("A", "00:01", "  "),
        RawRecord {
            speaker: Some("B".into()),
            timestamp: None,
            content: Some("no time".into()),
        },
    ]);

    let report = run(source, RecordingSink::default(), &fast_config())
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::Failed);
    // 6 cycles plus the final pass, two drops each
    assert_eq!(report.stats.dropped_records, 14);
}

#[tokio::test]
async fn test_persistence_failure_aborts_run() {
    let (source, log) = ScriptedSource::repeating(three_records());

    let report = run(source, FullDiskSink, &fast_config()).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Failed);
    assert!(report.failure.unwrap().contains("No space left"));
    assert_eq!(log.lock().unwrap().samples, 1);
}

#[tokio::test]
async fn test_final_pass_picks_up_late_content() {
    let partial = vec![RawRecord::new("A", "00:01", "hel")];
    let mut steps = vec![Step::Batch(partial); 6];
    steps.push(Step::Batch(vec![RawRecord::new("A", "00:01", "hello")]));
    let (source, _) = ScriptedSource::new(steps);

    let report = run(source, RecordingSink::default(), &fast_config())
        .await
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::Converged);
    assert_eq!(report.stats.final_pass_changes, 1);
    assert_eq!(report.records, vec![Record::new("A", "00:01", "hello")]);
}

#[tokio::test]
async fn test_final_pass_write_failure_is_reported() {
    let partial = vec![RawRecord::new("A", "00:01", "hel")];
    let mut steps = vec![Step::Batch(partial); 6];
    steps.push(Step::Batch(vec![RawRecord::new("A", "00:01", "hello")]));
    let (source, _) = ScriptedSource::new(steps);
    let sink = FillingDiskSink {
        allowed: 1,
        inner: RecordingSink::default(),
    };
    let written = sink.inner.clone();

    let report = run(source, sink, &fast_config()).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Converged);
    let failure = report.failure.expect("final pass failure");
    assert!(failure.starts_with("final pass failed"), "{failure}");
    assert!(failure.contains("No space left"), "{failure}");
    assert_eq!(written.last().unwrap(), vec![Record::new("A", "00:01", "hel")]);
}

#[tokio::test]
async fn test_floor_above_baseline_is_rejected_before_running() {
    let (source, log) = ScriptedSource::repeating(three_records());
    let mut config = fast_config();
    config.advance.step_floor = 400;

    let result = run(source, RecordingSink::default(), &config).await;

    assert!(matches!(result, Err(HarvestError::InvalidConfig(_))));
    assert_eq!(log.lock().unwrap().samples, 0);
}

#[tokio::test]
async fn test_churn_resets_stale_streak() {
    let ab = vec![RawRecord::new("A", "1", "x"), RawRecord::new("B", "2", "y")];
    let bc = vec![RawRecord::new("B", "2", "y"), RawRecord::new("C", "3", "z")];
    let (source, _) = ScriptedSource::new(vec![
        Step::Batch(ab.clone()),
        Step::Batch(bc),
        Step::Batch(ab),
    ]);

    let decisions = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&decisions);
    let report = ConvergenceController::new(source, RecordingSink::default(), &fast_config())
        .unwrap()
        .with_observer(move |summary| seen.lock().unwrap().push(summary.decision))
        .run()
        .await;

    assert_eq!(report.outcome, RunOutcome::Converged);
    assert_eq!(
        *decisions.lock().unwrap(),
        vec![
            Decision::Progress,
            Decision::Progress,
            Decision::Churn,
            Decision::Stale,
            Decision::Stale,
            Decision::Stale,
            Decision::Stale,
            Decision::Converged,
        ]
    );
}

#[tokio::test]
async fn test_stale_cycles_escalate_advance_intensity() {
    let (source, log) = ScriptedSource::repeating(three_records());

    run(source, RecordingSink::default(), &fast_config())
        .await
        .unwrap();

    assert_eq!(
        log.lock().unwrap().advances,
        vec![(100, 3), (100, 3), (50, 6), (25, 12), (25, 24)]
    );
}

#[tokio::test]
async fn test_virtual_list_is_harvested_completely() {
    let transcript: Vec<Record> = (0..60)
        .map(|i| {
            Record::new(
                ["Ana", "Bo", "Cy"][i % 3],
                format!("00:{:02}:{:02}", i / 60, i % 60),
                format!("utterance number {i} with some trailing words"),
            )
        })
        .collect();
    let source = VirtualListSource::new(transcript.clone(), 12, 40);
    let sink = RecordingSink::default();

    let report = run(source, sink.clone(), &fast_config()).await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Converged);
    assert_eq!(report.records, transcript);
    assert!(report.stats.writes > 1);
    assert_eq!(sink.last().unwrap(), transcript);
}
