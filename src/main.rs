//! Executor client - simulated workflow executor
//!
//! Loads config.json, runs a fixed sequence of timed steps, reports
//! progress to the backend after each one and finishes with a single
//! result report.

mod cli;
mod config;
mod error;
mod executor;
mod logging;
mod protocol;
mod reporter;
mod task;
#[cfg(test)]
mod testing;

use clap::{CommandFactory, Parser};
use tracing::{error, info};

use crate::cli::{Cli, Commands, ConfigSubcommand};
use crate::config::ExecutorConfig;
use crate::error::{Error, Result};

fn main() {
    // Parse CLI arguments first (before logging, so we know verbosity)
    let cli = Cli::parse();

    if let Err(e) = dispatch(cli) {
        if !e.is_fatal() {
            error!(error = %e.format_for_log(), "Run aborted");
        }
        eprint!("{}", e.format_for_terminal());
        std::process::exit(e.exit_code());
    }
}

fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        None | Some(Commands::Run) => run_task(cli.config.as_deref(), cli.verbose, cli.quiet),
        Some(Commands::Version) => {
            print!("{}", Cli::command().render_long_version());
            Ok(())
        }
        Some(Commands::Config { subcommand }) => {
            logging::init_simple(tracing::Level::WARN)?;
            handle_config_command(subcommand, cli.config.as_deref())
        }
    }
}

/// Load configuration, then execute one task against the backend
fn run_task(config_path: Option<&str>, verbose: u8, quiet: bool) -> Result<()> {
    // Nothing touches the network until the config is known to be valid
    let config = ExecutorConfig::load(config_path)?;

    // The guards must be kept alive for the lifetime of the program
    let _log_guards = logging::init_logging(&config.logging, verbose, quiet)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        commit = env!("EXECUTOR_GIT_HASH"),
        profile = env!("EXECUTOR_PROFILE"),
        "Starting executor client"
    );
    info!(
        backend_url = %config.base_url(),
        max_retries = config.http.max_retries,
        request_timeout_secs = config.http.request_timeout_secs,
        "Configuration loaded"
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::Internal(format!("Failed to create async runtime: {}", e)))?;

    let summary = runtime.block_on(executor::execute(&config))?;

    info!(
        task_id = %summary.task_id,
        status_updates = summary.status_updates,
        success = summary.success,
        elapsed_secs = summary.duration.as_secs_f64(),
        "Run finished"
    );

    Ok(())
}

/// Handle config subcommands
fn handle_config_command(subcommand: ConfigSubcommand, config_path: Option<&str>) -> Result<()> {
    match subcommand {
        ConfigSubcommand::Show => {
            let config = ExecutorConfig::load(config_path)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigSubcommand::Validate => {
            ExecutorConfig::load(config_path)?;
            println!("Configuration is valid.");
        }
        ConfigSubcommand::Init { path, force } => {
            let target = path.as_deref().or(config_path);
            let written = config::init_config(target, force)?;
            println!("Configuration file created: {}", written.display());
        }
    }
    Ok(())
}
