//! Command-line parsing for the COVID-19 dashboard.
//!
//! Argument parsing and command dispatch stay separate from the aggregation
//! engine.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::domain::{DisplayUnit, SummaryMode};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "covid", version, about = "COVID-19 data dashboard")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command. Flags override `.env`/environment.
#[derive(Debug, Args, Clone)]
pub struct GlobalArgs {
    /// Dataset CSV path or http(s) URL [env: COVID_DATA].
    #[arg(long, global = true, value_name = "PATH|URL")]
    pub data: Option<String>,

    /// Layout store file [env: COVID_DASH_STORE].
    #[arg(long, global = true, value_name = "FILE")]
    pub store: Option<PathBuf>,

    /// Log filter when RUST_LOG is unset (e.g. info, debug, covid_dash=trace).
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    /// Write logs to this file (the TUI only logs when this is set).
    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Launch the interactive dashboard (default).
    Tui(ViewArgs),
    /// Print the summary card and every chart as text.
    Report(ReportArgs),
    /// Show the detail card for one country.
    Country(CountryArgs),
    /// Write chart series to JSON, or one panel to CSV.
    Export(ExportArgs),
    /// Inspect or reset the saved dashboard layout.
    Layout {
        #[command(subcommand)]
        action: LayoutAction,
    },
}

/// Initial filter and summary settings.
#[derive(Debug, Args, Clone, Default)]
pub struct ViewArgs {
    /// Continent, or "all".
    #[arg(long, default_value = "all")]
    pub continent: String,

    /// Location (country or aggregate), or "all".
    #[arg(long, default_value = "all")]
    pub location: String,

    /// First day (YYYY-MM-DD). Defaults to 60 days after the earliest date.
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Last day (YYYY-MM-DD). Defaults to the latest date.
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Summary mode.
    #[arg(long, value_enum, default_value_t = SummaryMode::Latest)]
    pub mode: SummaryMode,

    /// Display unit for the summary figures.
    #[arg(long, value_enum, default_value_t = DisplayUnit::Total)]
    pub unit: DisplayUnit,

    /// Country for the detail card and country timeline.
    #[arg(long)]
    pub country: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct ReportArgs {
    #[command(flatten)]
    pub view: ViewArgs,

    /// Skip the ASCII charts.
    #[arg(long)]
    pub no_plot: bool,

    /// Also print each chart's values as a table.
    #[arg(long)]
    pub series: bool,

    /// Chart width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Chart height (rows).
    #[arg(long, default_value_t = 12)]
    pub height: usize,
}

#[derive(Debug, Args, Clone)]
pub struct CountryArgs {
    /// Country name; omit to list the selectable countries.
    pub name: Option<String>,

    #[command(flatten)]
    pub view: ViewArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Csv,
}

#[derive(Debug, Args, Clone)]
pub struct ExportArgs {
    /// Output file.
    #[arg(long, value_name = "FILE")]
    pub out: PathBuf,

    #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
    pub format: ExportFormat,

    /// Panel id to export (required for CSV), e.g. `cases-timeline`.
    #[arg(long)]
    pub panel: Option<String>,

    #[command(flatten)]
    pub view: ViewArgs,
}

#[derive(Debug, Subcommand, Clone, Copy)]
pub enum LayoutAction {
    /// Print the stored layout as JSON.
    Show,
    /// Remove the stored layout.
    Reset,
}
