//! Implementation of the `harvest run` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use super::{harvest_to_file, HarvestOutput};
use crate::cli::output::output;
use crate::domain::models::Config;
use crate::infrastructure::sources::ProcessSource;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Transcript JSON path (overrides output.path)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also export CSV when the run finishes
    #[arg(long)]
    pub csv: bool,

    /// Helper command and its arguments, given after `--`
    #[arg(last = true, required = true, value_name = "HELPER")]
    pub helper: Vec<String>,
}

pub async fn execute(args: RunArgs, mut config: Config, json_mode: bool) -> Result<HarvestOutput> {
    if let Some(path) = args.output {
        config.output.path = path;
    }
    if args.csv {
        config.output.csv = true;
    }

    let (program, helper_args) = args
        .helper
        .split_first()
        .context("No helper command given")?;
    let source = ProcessSource::spawn(program, helper_args)
        .with_context(|| format!("Failed to start helper {program}"))?;

    let summary = harvest_to_file(source, &config, json_mode).await?;
    output(&summary, json_mode);
    Ok(summary)
}
