//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and layers them over `.env`/environment
//! - sets up logging
//! - loads the dataset and builds the dashboard state
//! - prints reports/charts, writes exports, or launches the TUI

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{
    Cli, Command, CountryArgs, ExportArgs, ExportFormat, GlobalArgs, LayoutAction, ReportArgs, ViewArgs,
};
use crate::domain::{
    ChartKind, Choice, DEFAULT_DATA_PATH, DEFAULT_STORE_PATH, DashboardConfig, DataSource, FilterSpec, PanelId,
};
use crate::error::AppError;
use crate::io::export::{ExportBundle, write_bundle_json, write_series_csv_file};
use crate::io::ingest::load_dataset;
use crate::io::layout::{KeyValueStore, LAYOUT_KEY, reset_layout};
use crate::present::{AsciiSurface, Presenter};
use crate::report::{
    format_country_card, format_country_list, format_ingest, format_loading, format_series_table, format_summary,
};

pub mod pipeline;

pub use pipeline::{Dashboard, DashboardOutputs};

const ENV_DATA: &str = "COVID_DATA";
const ENV_STORE: &str = "COVID_DASH_STORE";

/// Entry point for the `covid` binary.
pub fn run() -> Result<(), AppError> {
    // `covid` and `covid --data x.csv` behave like `covid tui ...`. Clap wants a
    // subcommand name, so argv is rewritten before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = Cli::parse_from(argv);

    let config = resolve_config(&cli.global);
    let is_tui = matches!(cli.command, Command::Tui(_));
    init_logging(&config, !is_tui)?;

    match cli.command {
        Command::Tui(args) => crate::tui::run(&config, &args),
        Command::Report(args) => handle_report(&config, &args),
        Command::Country(args) => handle_country(&config, &args),
        Command::Export(args) => handle_export(&config, &args),
        Command::Layout { action } => handle_layout(&config, action),
    }
}

/// Flags win over environment variables, which win over defaults.
pub fn resolve_config(global: &GlobalArgs) -> DashboardConfig {
    dotenvy::dotenv().ok();
    let data = global
        .data
        .clone()
        .or_else(|| std::env::var(ENV_DATA).ok())
        .unwrap_or_else(|| DEFAULT_DATA_PATH.to_string());
    let store_path = global
        .store
        .clone()
        .or_else(|| std::env::var(ENV_STORE).ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_PATH));

    DashboardConfig {
        data: DataSource::parse(&data),
        store_path,
        log_level: global.log_level.clone(),
        log_file: global.log_file.clone(),
    }
}

/// `RUST_LOG` wins over `--log-level`. Without a log file, logs go to stderr
/// only when `to_stderr` is set (the TUI owns the terminal otherwise).
fn init_logging(config: &DashboardConfig, to_stderr: bool) -> Result<(), AppError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if let Some(path) = &config.log_file {
        let file = File::create(path)
            .map_err(|e| AppError::new(2, format!("Failed to create log file '{}': {e}", path.display())))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .try_init()
            .ok();
    } else if to_stderr {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init()
            .ok();
    }
    Ok(())
}

/// Load the dataset and apply the initial view settings.
pub fn load_dashboard(config: &DashboardConfig, view: &ViewArgs) -> Result<Dashboard, AppError> {
    // Visible even when logging is off (the TUI without `--log-file`).
    eprintln!("{}", format_loading(&config.data));
    let ingest = load_dataset(&config.data)?;
    eprint!("{}", format_ingest(&ingest));

    let mut dashboard = Dashboard::new(ingest.dataset)?;
    apply_view_args(&mut dashboard, view);
    Ok(dashboard)
}

pub fn apply_view_args(dashboard: &mut Dashboard, view: &ViewArgs) {
    let defaults = dashboard.filter().clone();
    let filter = FilterSpec {
        continent: Choice::parse(&view.continent),
        location: Choice::parse(&view.location),
        start: view.start.unwrap_or(defaults.start),
        end: view.end.unwrap_or(defaults.end),
    };
    if filter != defaults {
        dashboard.apply_filters(filter);
    }
    if view.mode != dashboard.mode() {
        dashboard.set_summary_mode(view.mode);
    }
    if view.unit != dashboard.unit() {
        dashboard.set_display_unit(view.unit);
    }
    if view.country.is_some() {
        dashboard.select_country(view.country.clone());
    }
}

fn handle_report(config: &DashboardConfig, args: &ReportArgs) -> Result<(), AppError> {
    let dashboard = load_dashboard(config, &args.view)?;
    let outputs = dashboard.outputs();

    println!("{}", format_summary(&outputs.summary));
    if let Some(card) = &outputs.country {
        println!("{}", format_country_card(card));
    }

    if !args.no_plot {
        let mut surface = AsciiSurface::all(args.width, args.height);
        Presenter::new().present(&mut surface, &outputs.series, &outputs.map);
        println!("{}", surface.to_text());
    }

    if args.series {
        for series in outputs.series.iter().filter(|s| s.kind != ChartKind::Scatter) {
            println!("{}", format_series_table(series));
        }
    }
    Ok(())
}

fn handle_country(config: &DashboardConfig, args: &CountryArgs) -> Result<(), AppError> {
    let mut dashboard = load_dashboard(config, &args.view)?;

    let Some(name) = &args.name else {
        print!("{}", format_country_list(&dashboard.outputs().countries));
        return Ok(());
    };

    dashboard.select_country(Some(name.clone()));
    let outputs = dashboard.outputs();
    let card = outputs.country.as_ref().ok_or_else(|| {
        AppError::new(
            2,
            format!("No observations for '{name}' in the selected range. Run `covid country` to list countries."),
        )
    })?;
    println!("{}", format_country_card(card));

    let mut surface = AsciiSurface::new([PanelId::CountryTimeline], 80, 12);
    Presenter::new().present(&mut surface, &outputs.series, &outputs.map);
    println!("{}", surface.to_text());
    Ok(())
}

fn handle_export(config: &DashboardConfig, args: &ExportArgs) -> Result<(), AppError> {
    let dashboard = load_dashboard(config, &args.view)?;
    let outputs = dashboard.outputs();

    match args.format {
        ExportFormat::Json => {
            let series: Vec<_> = match &args.panel {
                Some(id) => vec![find_series(outputs, id)?.clone()],
                None => outputs.series.clone(),
            };
            let bundle = ExportBundle {
                summary: &outputs.summary,
                series: &series,
                map: &outputs.map,
                country: outputs.country.as_ref(),
            };
            write_bundle_json(&args.out, &bundle)?;
        }
        ExportFormat::Csv => {
            let id = args
                .panel
                .as_deref()
                .ok_or_else(|| AppError::new(2, "CSV export needs `--panel <id>`."))?;
            write_series_csv_file(&args.out, find_series(outputs, id)?)?;
        }
    }
    info!(path = %args.out.display(), "export written");
    Ok(())
}

fn find_series<'a>(outputs: &'a DashboardOutputs, id: &str) -> Result<&'a crate::domain::ChartSeries, AppError> {
    let panel = PanelId::from_id(id).ok_or_else(|| {
        let known: Vec<&str> = PanelId::ALL.iter().map(|p| p.id()).collect();
        AppError::new(2, format!("Unknown panel '{id}'. Expected one of: {}.", known.join(", ")))
    })?;
    outputs
        .series_for(panel)
        .ok_or_else(|| AppError::new(2, format!("Panel '{id}' has no chart series for this selection.")))
}

fn handle_layout(config: &DashboardConfig, action: LayoutAction) -> Result<(), AppError> {
    let mut store = KeyValueStore::open(&config.store_path)?;
    match action {
        LayoutAction::Show => match store.get(LAYOUT_KEY) {
            Some(value) => {
                let text = serde_json::to_string_pretty(value)
                    .map_err(|e| AppError::new(4, format!("Failed to encode layout: {e}")))?;
                println!("{text}");
            }
            None => println!("No saved layout in {}.", store.path().display()),
        },
        LayoutAction::Reset => {
            reset_layout(&mut store)?;
            println!("Layout reset.");
        }
    }
    Ok(())
}

/// Rewrite argv so `covid` defaults to `covid tui`.
///
/// Rules:
/// - `covid`                       -> `covid tui`
/// - `covid --data x.csv ...`      -> `covid tui --data x.csv ...`
/// - `covid --help/--version/-h`   -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    const SUBCOMMANDS: [&str; 6] = ["tui", "report", "country", "export", "layout", "help"];

    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    if matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version") {
        return argv;
    }

    if first_positional(&argv[1..]).is_some_and(|a| SUBCOMMANDS.contains(&a)) {
        return argv;
    }
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
    }
    argv
}

/// First argument that is neither a flag nor the value of a global flag.
fn first_positional(args: &[String]) -> Option<&str> {
    const VALUE_FLAGS: [&str; 4] = ["--data", "--store", "--log-level", "--log-file"];

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if VALUE_FLAGS.contains(&arg.as_str()) {
            iter.next();
        } else if !arg.starts_with('-') {
            return Some(arg);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_defaults_to_tui() {
        assert_eq!(rewrite_args(args(&["covid"])), args(&["covid", "tui"]));
        assert_eq!(
            rewrite_args(args(&["covid", "--data", "x.csv"])),
            args(&["covid", "tui", "--data", "x.csv"])
        );
    }

    #[test]
    fn flag_values_named_like_commands_still_default_to_tui() {
        assert_eq!(
            rewrite_args(args(&["covid", "--data", "report", "--log-level", "debug"])),
            args(&["covid", "tui", "--data", "report", "--log-level", "debug"])
        );
        let argv = args(&["covid", "--data", "report", "export", "--out", "x.json"]);
        assert_eq!(rewrite_args(argv.clone()), argv);
        let argv = args(&["covid", "--data=layout", "layout", "show"]);
        assert_eq!(rewrite_args(argv.clone()), argv);
    }

    #[test]
    fn explicit_commands_are_untouched() {
        let argv = args(&["covid", "--data", "x.csv", "report"]);
        assert_eq!(rewrite_args(argv.clone()), argv);
        assert_eq!(rewrite_args(args(&["covid", "--help"])), args(&["covid", "--help"]));
    }

    #[test]
    fn flags_override_defaults() {
        let global = GlobalArgs {
            data: Some("https://example.org/owid.csv".into()),
            store: Some(PathBuf::from("/tmp/s.json")),
            log_level: "debug".into(),
            log_file: None,
        };
        let config = resolve_config(&global);
        assert_eq!(config.data, DataSource::Url("https://example.org/owid.csv".into()));
        assert_eq!(config.store_path, PathBuf::from("/tmp/s.json"));
    }

    #[test]
    fn cli_parses_report_flags() {
        let cli = Cli::parse_from(args(&[
            "covid", "report", "--continent", "Europe", "--start", "2021-01-01", "--mode", "peak", "--unit", "per-million",
        ]));
        let Command::Report(r) = cli.command else {
            panic!("expected report");
        };
        assert_eq!(r.view.continent, "Europe");
        assert_eq!(r.view.start, chrono::NaiveDate::from_ymd_opt(2021, 1, 1));
        assert_eq!(r.view.mode, crate::domain::SummaryMode::Peak);
        assert_eq!(r.view.unit, crate::domain::DisplayUnit::PerMillion);
    }
}
