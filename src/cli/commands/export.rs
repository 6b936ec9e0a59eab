//! Implementation of the `harvest export` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput};
use crate::infrastructure::persistence::export_json_to_csv;

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// JSON transcript to convert
    pub input: PathBuf,

    /// CSV destination (defaults to the input path with a .csv extension)
    pub output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct ExportOutput {
    pub input: PathBuf,
    pub output: PathBuf,
    pub rows: usize,
}

impl CommandOutput for ExportOutput {
    fn to_human(&self) -> String {
        format!(
            "Exported {} row(s) from {} to {}",
            self.rows,
            self.input.display(),
            self.output.display()
        )
    }
}

pub fn execute(args: ExportArgs, json_mode: bool) -> Result<ExportOutput> {
    let destination = args
        .output
        .unwrap_or_else(|| args.input.with_extension("csv"));
    let rows = export_json_to_csv(&args.input, &destination)
        .with_context(|| format!("Failed to export {}", args.input.display()))?;

    let summary = ExportOutput {
        input: args.input,
        output: destination,
        rows,
    };
    output(&summary, json_mode);
    Ok(summary)
}
