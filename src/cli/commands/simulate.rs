//! Implementation of the `harvest simulate` command.
//!
//! Replays a saved transcript through a virtual list so tuning parameters can
//! be tried without a live view.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use super::{harvest_to_file, run_with_progress, HarvestOutput};
use crate::cli::output::output;
use crate::domain::errors::HarvestResult;
use crate::domain::models::{Config, Record};
use crate::domain::ports::TranscriptSink;
use crate::infrastructure::persistence::load_transcript;
use crate::infrastructure::sources::VirtualListSource;

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Saved JSON transcript to replay
    pub transcript: PathBuf,

    /// Rows rendered at once
    #[arg(long, default_value_t = 12)]
    pub window: usize,

    /// Row height in pixels
    #[arg(long, default_value_t = 48)]
    pub row_height: u32,

    /// Rows at the bottom edge that are still rendering
    #[arg(long, default_value_t = 1)]
    pub partial_rows: usize,

    /// Write the harvested transcript here; nothing is written otherwise
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Accepts every snapshot and keeps none.
struct DiscardSink;

impl TranscriptSink for DiscardSink {
    fn write(&mut self, _records: &[Record]) -> HarvestResult<()> {
        Ok(())
    }
}

pub async fn execute(args: SimulateArgs, mut config: Config, json_mode: bool) -> Result<HarvestOutput> {
    let rows = load_transcript(&args.transcript)
        .with_context(|| format!("Failed to read {}", args.transcript.display()))?;
    let expected = rows.len();
    let source = VirtualListSource::new(rows, args.window, args.row_height)
        .with_partial_rows(args.partial_rows);

    let mut summary = if let Some(path) = args.output {
        config.output.path = path;
        harvest_to_file(source, &config, json_mode).await?
    } else {
        let report = run_with_progress(source, DiscardSink, &config, json_mode).await?;
        HarvestOutput::from_report(&report)
    };
    summary.expected = Some(expected);

    output(&summary, json_mode);
    Ok(summary)
}
