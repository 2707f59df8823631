//! CLI argument definitions for valuewatch.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `validate` | Validate symbols and report validator statistics |
//! | `filter` | Filter symbols under a mode, optionally exporting metrics |
//! | `trends` | Filter symbols, then report per-type error trends |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--snapshot` | none | JSON market-data snapshot to validate against |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--log-level` | `warn` | Log level when `RUST_LOG` is unset |
//!
//! Component settings come from `VALUEWATCH_*` environment variables.
//!
//! # Examples
//!
//! ```bash
//! valuewatch --snapshot market.json validate 7203 6758
//! valuewatch --snapshot market.json filter --mode strict --symbols-file universe.txt --metrics
//! valuewatch --snapshot market.json trends --hours 6 --bucket-minutes 30 7203 1423
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use valuewatch_core::FilteringMode;

#[derive(Debug, Parser)]
#[command(
    name = "valuewatch",
    author,
    version,
    about = "Symbol validation, filtering, and error metrics for value screening"
)]
pub struct Cli {
    /// JSON snapshot of market data keyed by symbol. Without it every symbol
    /// is unknown to the data source.
    #[arg(long, global = true)]
    pub snapshot: Option<PathBuf>,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Log level used when RUST_LOG is not set. Logs go to stderr.
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validate symbols against the data source.
    Validate(ValidateArgs),
    /// Filter symbols under a filtering mode.
    Filter(FilterArgs),
    /// Filter symbols, then report error trends.
    Trends(TrendsArgs),
}

impl Command {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Validate(_) => "validate",
            Self::Filter(_) => "filter",
            Self::Trends(_) => "trends",
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct SymbolInput {
    /// Ticker symbols; bare codes get the Tokyo suffix (7203 -> 7203.T).
    pub symbols: Vec<String>,

    /// File with one symbol per line; blank lines and `#` comments are skipped.
    #[arg(long)]
    pub symbols_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Strict,
    Tolerant,
    Permissive,
}

impl From<ModeArg> for FilteringMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Strict => Self::Strict,
            ModeArg::Tolerant => Self::Tolerant,
            ModeArg::Permissive => Self::Permissive,
        }
    }
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub input: SymbolInput,
}

#[derive(Debug, Args)]
pub struct FilterArgs {
    #[command(flatten)]
    pub input: SymbolInput,

    /// Filtering mode; defaults to VALUEWATCH_FILTERING_MODE or tolerant.
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Operation name used for logs and metrics.
    #[arg(long, default_value = "cli")]
    pub operation: String,

    /// Include the metrics export in the output.
    #[arg(long, default_value_t = false)]
    pub metrics: bool,

    /// Include raw metric records in the export (implies --metrics).
    #[arg(long, default_value_t = false)]
    pub include_records: bool,
}

#[derive(Debug, Args)]
pub struct TrendsArgs {
    #[command(flatten)]
    pub input: SymbolInput,

    /// Trailing window in hours.
    #[arg(long, default_value_t = 24)]
    pub hours: u32,

    /// Bucket size in minutes.
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..))]
    pub bucket_minutes: u32,
}
