//! CLI argument parsing using clap v4
//!
//! With no subcommand the binary runs one simulated task.

use clap::{Parser, Subcommand};

/// Build details shown by `--version` and `version`, embedded by build.rs
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\ncommit:  ",
    env!("EXECUTOR_GIT_HASH"),
    " (branch ",
    env!("EXECUTOR_GIT_BRANCH"),
    ", dirty: ",
    env!("EXECUTOR_GIT_DIRTY"),
    ")\nbuilt:   ",
    env!("EXECUTOR_BUILD_TIMESTAMP"),
    ", ",
    env!("EXECUTOR_PROFILE"),
    " profile\ntarget:  ",
    env!("EXECUTOR_TARGET"),
    " (host ",
    env!("EXECUTOR_HOST"),
    ")\ncompiler: ",
    env!("EXECUTOR_RUSTC_VERSION"),
);

/// Executor client - simulated workflow executor
///
/// Runs one simulated task, posting progress to {backend_url}/executor/status
/// and the final outcome to {backend_url}/executor/result.
#[derive(Parser, Debug)]
#[command(name = "executor-client")]
#[command(author, version, long_version = LONG_VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the JSON configuration file (default: config.json next to the binary)
    #[arg(short, long, env = "EXECUTOR_CONFIG", global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one simulated task and report it to the backend (default)
    Run,

    /// Display version and build details
    Version,

    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigSubcommand {
    /// Display the effective configuration
    Show,

    /// Validate the configuration file
    Validate,

    /// Write a starter configuration file
    Init {
        /// Where to write the file (defaults to --config or config.json next to the binary)
        #[arg(short, long)]
        path: Option<String>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}
