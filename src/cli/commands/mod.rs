pub mod export;
pub mod run;
pub mod simulate;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use serde::Serialize;

use super::display::{cycle_message, harvest_spinner, key_value_table, stats_rows};
use super::output::CommandOutput;
use crate::application::ConvergenceController;
use crate::domain::models::{Config, RunOutcome, RunReport, RunStats};
use crate::domain::ports::{SnapshotSource, TranscriptSink};
use crate::infrastructure::persistence::{write_csv, JsonFileSink};

/// Summary printed after a harvest finishes.
#[derive(Debug, Serialize)]
pub struct HarvestOutput {
    pub outcome: RunOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    pub records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv_path: Option<PathBuf>,
    /// Rows in the simulated list, when simulating
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<usize>,
    pub stats: RunStats,
}

impl HarvestOutput {
    pub fn from_report(report: &RunReport) -> Self {
        Self {
            outcome: report.outcome,
            failure: report.failure.clone(),
            records: report.records.len(),
            output_path: None,
            csv_path: None,
            expected: None,
            stats: report.stats.clone(),
        }
    }
}

impl CommandOutput for HarvestOutput {
    fn to_human(&self) -> String {
        let mut rows = vec![("outcome", self.outcome.to_string())];
        if let Some(ref failure) = self.failure {
            rows.push(("failure", failure.clone()));
        }
        match self.expected {
            Some(expected) => rows.push(("records", format!("{} of {expected}", self.records))),
            None => rows.push(("records", self.records.to_string())),
        }
        if let Some(ref path) = self.output_path {
            rows.push(("json", path.display().to_string()));
        }
        if let Some(ref path) = self.csv_path {
            rows.push(("csv", path.display().to_string()));
        }
        rows.extend(stats_rows(&self.stats));

        key_value_table(&rows).to_string()
    }
}

/// Non-zero exit when the run failed.
pub fn exit_code(outcome: RunOutcome) -> ExitCode {
    if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Run the controller, showing a spinner unless output is JSON.
pub async fn run_with_progress<Src, S>(
    source: Src,
    sink: S,
    config: &Config,
    json_mode: bool,
) -> Result<RunReport>
where
    Src: SnapshotSource,
    S: TranscriptSink,
{
    let controller = ConvergenceController::new(source, sink, config)?;
    if json_mode {
        return Ok(controller.run().await);
    }

    let spinner = harvest_spinner();
    let ticker = spinner.clone();
    let max_stale_streak = config.convergence.max_stale_streak;
    let report = controller
        .with_observer(move |summary| ticker.set_message(cycle_message(summary, max_stale_streak)))
        .run()
        .await;
    spinner.finish_and_clear();
    Ok(report)
}

/// Harvest into the configured JSON file, then export CSV if enabled.
pub async fn harvest_to_file<Src: SnapshotSource>(
    source: Src,
    config: &Config,
    json_mode: bool,
) -> Result<HarvestOutput> {
    let sink = JsonFileSink::new(&config.output.path);
    let report = run_with_progress(source, sink, config, json_mode).await?;

    let mut summary = HarvestOutput::from_report(&report);
    if report.stats.writes > 0 {
        summary.output_path = Some(config.output.path.clone());
    }

    if config.output.csv && !report.records.is_empty() {
        let csv_path = config.output.resolved_csv_path();
        write_csv(&csv_path, &report.records)
            .with_context(|| format!("Failed to export CSV to {}", csv_path.display()))?;
        summary.csv_path = Some(csv_path);
    }

    Ok(summary)
}
