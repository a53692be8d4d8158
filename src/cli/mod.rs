//! Command-line parsing for the Indicium election dashboard.
//!
//! The goal of this module is to keep **argument parsing** separate from
//! data access and rendering; `app` turns these structs into a provider
//! configuration and a filter selection.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{ElectionYear, Filters, Round};
use crate::io::ReportFormat;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "indicium",
    version,
    about = "French presidential election dashboard (participation, abstention, results)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the national KPIs for the selection.
    Stats(StatsArgs),
    /// Print the participation trend, optionally as an ASCII chart.
    History(HistoryArgs),
    /// Print the regional breakdown.
    Regions(CommonArgs),
    /// Write the dashboard report (Markdown by default) to a directory.
    Report(ReportArgs),
    /// Launch the interactive TUI.
    ///
    /// This is the default when no subcommand is given.
    Tui(CommonArgs),
}

/// Selection and data-source options shared by every subcommand.
#[derive(Debug, Args, Clone)]
pub struct CommonArgs {
    /// Election year.
    #[arg(short = 'y', long, value_enum, default_value_t = ElectionYear::Y2022)]
    pub year: ElectionYear,

    /// Election round (1 or 2).
    #[arg(short = 'r', long, value_enum, default_value_t = Round::Second)]
    pub round: Round,

    /// Endpoint URL, in priority order (repeatable). Replaces INDICIUM_SOURCES.
    #[arg(long = "source", value_name = "URL")]
    pub sources: Vec<String>,

    /// Skip every endpoint and use simulated data.
    #[arg(long, conflicts_with = "sources")]
    pub offline: bool,

    /// Per-endpoint timeout in milliseconds. Replaces INDICIUM_TIMEOUT_MS.
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Attempt all endpoints concurrently (the earliest listed success still wins).
    #[arg(long)]
    pub parallel: bool,

    /// Seed for simulated data, for reproducible output.
    #[arg(long)]
    pub seed: Option<u64>,
}

impl CommonArgs {
    pub fn filters(&self) -> Filters {
        Filters {
            year: self.year,
            round: self.round,
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct StatsArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Emit the raw stats record as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args, Clone)]
pub struct HistoryArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Render an ASCII chart below the table.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 60)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 12)]
    pub height: usize,
}

#[derive(Debug, Args, Clone)]
pub struct ReportArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Directory the report is written to.
    #[arg(long, value_name = "DIR", default_value = ".")]
    pub out: PathBuf,

    /// Report file format.
    #[arg(long, value_enum, default_value_t = ReportFormat::Markdown)]
    pub format: ReportFormat,

    /// Print the whole dashboard to stdout instead of writing a file.
    #[arg(long)]
    pub stdout: bool,
}
