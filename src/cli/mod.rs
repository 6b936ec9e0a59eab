//! Command-line interface for the `harvest` binary.

pub mod commands;
pub mod display;
pub mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::json;

use commands::{export::ExportArgs, run::RunArgs, simulate::SimulateArgs};

#[derive(Parser, Debug)]
#[command(name = "harvest")]
#[command(about = "Harvest complete transcripts from lazily rendered list views", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to .harvest/config.yaml + .harvest/local.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Harvest from a helper process speaking the line-delimited JSON protocol
    Run(RunArgs),

    /// Harvest from a simulated virtual list built from a saved transcript
    Simulate(SimulateArgs),

    /// Convert a saved JSON transcript to CSV
    Export(ExportArgs),
}

/// Report a command error and pick the exit code.
pub fn handle_error(err: &anyhow::Error, json_mode: bool) -> ExitCode {
    if json_mode {
        let chain: Vec<String> = err.chain().skip(1).map(ToString::to_string).collect();
        let body = json!({
            "error": err.to_string(),
            "causes": chain,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&body).unwrap_or_default()
        );
    } else {
        eprintln!("Error: {err:#}");
    }
    ExitCode::FAILURE
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_with_helper_command() {
        let cli = Cli::try_parse_from([
            "harvest", "--json", "run", "--csv", "--", "node", "helper.js", "--headless",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Run(args) => {
                assert!(args.csv);
                assert_eq!(args.helper, vec!["node", "helper.js", "--headless"]);
            }
            other => panic!("Expected run, got {other:?}"),
        }
    }

    #[test]
    fn test_run_requires_helper_command() {
        assert!(Cli::try_parse_from(["harvest", "run"]).is_err());
    }

    #[test]
    fn test_parse_simulate_defaults() {
        let cli = Cli::try_parse_from(["harvest", "simulate", "meeting.json"]).unwrap();
        match cli.command {
            Commands::Simulate(args) => {
                assert_eq!(args.transcript, PathBuf::from("meeting.json"));
                assert_eq!(args.window, 12);
                assert_eq!(args.row_height, 48);
                assert!(args.output.is_none());
            }
            other => panic!("Expected simulate, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_export_with_global_config_after_subcommand() {
        let cli = Cli::try_parse_from([
            "harvest", "export", "in.json", "out.csv", "--config", "custom.yaml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("custom.yaml")));
        match cli.command {
            Commands::Export(args) => {
                assert_eq!(args.input, PathBuf::from("in.json"));
                assert_eq!(args.output, Some(PathBuf::from("out.csv")));
            }
            other => panic!("Expected export, got {other:?}"),
        }
    }
}
