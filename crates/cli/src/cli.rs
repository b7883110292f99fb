//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// msgdispatch - in-process message dispatcher demo
#[derive(Parser, Debug)]
#[command(
    name = "msgdispatch",
    author,
    version,
    about = "In-process concurrent message dispatcher",
    long_about = "Runs a periodic producer that feeds an in-memory queue, a pool of workers \n\
                  that route messages to registered handlers, and a periodic reporter \n\
                  that prints per-message success counts."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "MSGDISPATCH_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "MSGDISPATCH_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run producer, dispatcher and stats reporter
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration and handler wiring
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON); defaults apply when missing
    #[arg(
        short,
        long,
        default_value = "msgdispatch.toml",
        env = "MSGDISPATCH_CONFIG"
    )]
    pub config: PathBuf,

    /// Override the number of workers
    #[arg(long, env = "MSGDISPATCH_WORKERS")]
    pub workers: Option<usize>,

    /// Override the maximum number of messages handled at once
    #[arg(long, env = "MSGDISPATCH_MAX_PARALLELISM")]
    pub max_parallelism: Option<usize>,

    /// Override the injected failure rate (one in N, 0 = never)
    #[arg(long, env = "MSGDISPATCH_FAILURE_ONE_IN")]
    pub failure_one_in: Option<u32>,

    /// Stop after this many seconds (0 = run until Ctrl+C)
    #[arg(long, default_value = "0", env = "MSGDISPATCH_DURATION")]
    pub duration: u64,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "MSGDISPATCH_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "msgdispatch.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file; defaults apply when missing
    #[arg(short, long, default_value = "msgdispatch.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
