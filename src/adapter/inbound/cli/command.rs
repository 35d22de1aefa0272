//! Command-line interface definitions.
//!
//! Every engine operation has a subcommand, plus `run` for the long-lived
//! monitor loop and `validate` for checking configuration offline.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Portfolio price-threshold monitor
#[derive(Parser, Debug)]
#[command(name = "tickwatch")]
#[command(version)]
pub struct Cli {
    /// Path to the configuration file [default: ./config.toml or ~/.tickwatch/config.toml]
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the monitor loop in the foreground until Ctrl-C
    Run(RunArgs),

    /// Start tracking a ticker
    Add(TickerArg),

    /// Stop tracking a ticker
    Remove(TickerArg),

    /// List tracked tickers
    List,

    /// Show fired alerts, or one ticker's alert state
    Check(CheckArgs),

    /// Run one monitoring cycle now
    Cycle,

    /// Show the trading outlook for a ticker
    Outlook(OutlookArgs),

    /// Validate configuration, secrets and threshold rules
    Validate,
}

/// Arguments for `tickwatch run`.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Override log level (debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Use JSON log format instead of pretty-printed logs.
    #[arg(long)]
    pub json_logs: bool,
}

/// A single ticker symbol.
#[derive(Args, Debug)]
pub struct TickerArg {
    /// Ticker symbol, case-insensitive (e.g. aapl).
    pub ticker: String,
}

/// Arguments for `tickwatch check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Only report this ticker.
    pub ticker: Option<String>,
}

/// Arguments for `tickwatch outlook`.
#[derive(Args, Debug)]
pub struct OutlookArgs {
    /// Ticker symbol.
    pub ticker: String,

    /// Also send the outlook through the notification transport.
    #[arg(long)]
    pub send: bool,
}
