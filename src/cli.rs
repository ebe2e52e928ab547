// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Command-line arguments for `msgsched`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "msgsched",
    version,
    about = "Release DAG ledger messages once they are due and their parents are booked.",
    long_about = None
)]
pub struct CliArgs {
    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `MSGSCHED_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the scheduler, reading commands line by line from stdin.
    ///
    /// Accepted lines:
    ///   submit <id> [parents=a,b] [delay=5s|-1s] [weight=N]
    ///   booked <id>
    ///   shutdown
    Run(RunArgs),
    /// Draw a mana-weighted sample without replacement.
    Pick(PickArgs),
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Msgsched.toml` in the current working directory, or built-in
    /// defaults if that file does not exist.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Override `[scheduler].workers`.
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Report every dispatched message as booked once a worker has
    /// processed it, so dependents can proceed without an external oracle.
    #[arg(long)]
    pub auto_book: bool,

    /// Parse + validate, print the effective config, but don't start.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Args)]
pub struct PickArgs {
    /// How many items to draw.
    #[arg(short, long, default_value_t = 1)]
    pub n: usize,

    /// Seed for a reproducible draw.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Candidates as `ITEM=WEIGHT`.
    #[arg(value_name = "ITEM=WEIGHT", required = true, value_parser = parse_choice)]
    pub choices: Vec<(String, u64)>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

fn parse_choice(s: &str) -> Result<(String, u64), String> {
    let (item, weight) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("expected ITEM=WEIGHT, got '{s}'"))?;
    if item.is_empty() {
        return Err(format!("empty item name in '{s}'"));
    }
    let weight = weight
        .trim()
        .parse()
        .map_err(|e| format!("invalid weight in '{s}': {e}"))?;
    Ok((item.to_string(), weight))
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
