//! Harvest CLI entry point.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use transcript_harvest::cli::commands::{exit_code, export, run, simulate};
use transcript_harvest::cli::{handle_error, Cli, Commands};
use transcript_harvest::infrastructure::config::ConfigLoader;
use transcript_harvest::infrastructure::logging::LoggerImpl;
use transcript_harvest::Config;

fn load_config(cli: &Cli) -> Result<Config> {
    match cli.config {
        Some(ref path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let json_mode = cli.json;

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) => return handle_error(&err, json_mode),
    };

    // Guard must outlive the command so file logs are flushed
    let _logger = match LoggerImpl::init(&config.logging) {
        Ok(logger) => logger,
        Err(err) => return handle_error(&err, json_mode),
    };

    let result = match cli.command {
        Commands::Run(args) => run::execute(args, config, json_mode)
            .await
            .map(|summary| exit_code(summary.outcome)),
        Commands::Simulate(args) => simulate::execute(args, config, json_mode)
            .await
            .map(|summary| exit_code(summary.outcome)),
        Commands::Export(args) => export::execute(args, json_mode).map(|_| ExitCode::SUCCESS),
    };

    result.unwrap_or_else(|err| handle_error(&err, json_mode))
}
