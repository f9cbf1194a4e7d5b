//! CLI argument definitions for tailfit.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `fit` | Fit every configured model to one ticker |
//! | `compare` | Fit several tickers in parallel and compare MAPE |
//! | `tickers` | List the bundled ETF catalog |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `json` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--strict` | `false` | Treat warnings and errors as failures |
//! | `--data-dir` | `data` | Directory holding `<SYMBOL>.csv` price files |
//! | `--config` | none | YAML analysis config |
//! | `--log-level` | `warn` | Log filter when `RUST_LOG` is unset |
//!
//! # Examples
//!
//! ```bash
//! tailfit fit SPY --start 2015-01-01 --bins 60 --pretty
//! tailfit compare SPY IBIT TLT --format table
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Compare Normal and Student-t fits of daily returns.
#[derive(Debug, Parser)]
#[command(
    name = "tailfit",
    author,
    version,
    about = "Compare Normal and Student-t fits of daily ETF returns"
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Treat warnings and errors as failures (exit code 5).
    #[arg(long, global = true, default_value_t = false)]
    pub strict: bool,

    /// Directory containing one `<SYMBOL>.csv` file per ticker.
    #[arg(long, global = true, default_value = "data")]
    pub data_dir: PathBuf,

    /// YAML file with analysis settings. Command-line flags take precedence.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter used when `RUST_LOG` is not set.
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit every configured model to one ticker.
    Fit(FitArgs),
    /// Fit several tickers in parallel and compare their MAPE.
    Compare(CompareArgs),
    /// List the bundled ETF catalog.
    Tickers,
}

#[derive(Debug, Args)]
pub struct FitArgs {
    /// Ticker symbol, e.g. SPY.
    pub symbol: String,

    /// Include the histogram with every fitted density.
    #[arg(long, default_value_t = false)]
    pub histogram: bool,

    #[command(flatten)]
    pub tuning: TuningArgs,
}

#[derive(Debug, Args)]
pub struct CompareArgs {
    /// Ticker symbols. Defaults to SPY and IBIT.
    pub symbols: Vec<String>,

    #[command(flatten)]
    pub tuning: TuningArgs,
}

/// Overrides applied on top of the loaded or default config.
#[derive(Debug, Default, Args)]
pub struct TuningArgs {
    /// First trading date, inclusive (YYYY-MM-DD).
    #[arg(long)]
    pub start: Option<String>,

    /// Last trading date, exclusive (YYYY-MM-DD).
    #[arg(long)]
    pub end: Option<String>,

    /// Number of histogram bins.
    #[arg(long)]
    pub bins: Option<usize>,

    /// `log` or `simple`.
    #[arg(long)]
    pub return_kind: Option<String>,

    /// Drop returns further than this many standard deviations from the mean.
    #[arg(long)]
    pub outlier_sigma: Option<f64>,

    /// Student-t solver iteration cap.
    #[arg(long)]
    pub max_iterations: Option<usize>,

    /// Student-t solver convergence tolerance.
    #[arg(long)]
    pub tolerance: Option<f64>,
}
