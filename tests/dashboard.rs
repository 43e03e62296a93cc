//! End-to-end: CSV file -> dashboard outputs -> presenter / layout store / export.

use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use covid_dash::app::Dashboard;
use covid_dash::domain::{
    ChangeDirection, Choice, DataSource, FilterSpec, PanelId, Sentiment, SummaryMode,
};
use covid_dash::io::export::write_series_csv;
use covid_dash::io::ingest::load_dataset;
use covid_dash::io::layout::{KeyValueStore, default_layout, load_layout, save_layout};
use covid_dash::present::{AsciiSurface, Presenter};

const CSV: &str = "\
iso_code,continent,location,date,total_cases,new_cases,total_deaths,new_deaths,population
FRA,Europe,France,2020-12-01,100,10,1,0,1000000
FRA,Europe,France,2021-02-01,1000,50,10,1,1000000
FRA,Europe,France,2021-02-08,1400,60,14,1,1000000
JPN,Asia,Japan,2021-02-08,600,20,6,0,2000000
OWID_EUR,,Europe,2021-02-08,1400,60,14,1,1000000
";

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn write_csv(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("owid.csv");
    fs::write(&path, CSV).unwrap();
    path
}

fn dashboard() -> Dashboard {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(&dir);
    let ingested = load_dataset(&DataSource::Path(path)).unwrap();
    assert_eq!(ingested.rows_used, 5);
    assert!(ingested.row_errors.is_empty());
    Dashboard::new(ingested.dataset).unwrap()
}

#[test]
fn default_filter_starts_sixty_days_after_first_row() {
    let d = dashboard();
    let f = d.filter();
    assert_eq!(f.start, date("2021-01-30"));
    assert_eq!(f.end, date("2021-02-08"));
    assert!(f.continent.is_all());
    // The December row is outside the default window.
    assert_eq!(d.outputs().view_rows, 4);
}

#[test]
fn continent_summary_reports_latest_totals_and_weekly_change() {
    let mut d = dashboard();
    let spec = FilterSpec {
        continent: Choice::Only("Europe".into()),
        ..d.filter().clone()
    };
    d.apply_filters(spec);

    let s = &d.outputs().summary;
    assert_eq!(s.selection, "Europe (All Countries)");
    assert_eq!(s.totals.cases, 1400.0);
    assert_eq!(s.totals.deaths, 14.0);
    assert_eq!(s.cases_change.percent, Some(40.0));
    assert_eq!(s.cases_change.direction, ChangeDirection::Up);
    assert_eq!(s.cases_change.sentiment, Sentiment::Bad);
    assert_eq!(s.last_updated, Some(date("2021-02-08")));
    assert_eq!(s.cfr_text, "1.00%");

    d.set_summary_mode(SummaryMode::Peak);
    assert_eq!(d.outputs().summary.totals.cases, 60.0);
    assert_eq!(d.outputs().summary.cases_change.text, "Peak");
}

#[test]
fn inverted_filter_yields_empty_outputs_without_error() {
    let mut d = dashboard();
    let spec = FilterSpec {
        start: date("2021-02-08"),
        end: date("2021-02-01"),
        ..d.filter().clone()
    };
    d.apply_filters(spec);
    assert_eq!(d.outputs().view_rows, 0);
    assert_eq!(d.outputs().summary.totals.cases, 0.0);
    assert!(d.outputs().map.is_empty());
}

#[test]
fn selecting_a_country_adds_its_card_and_timeline() {
    let mut d = dashboard();
    assert!(d.outputs().series_for(PanelId::CountryTimeline).is_none());

    d.select_country(Some("Japan".into()));
    let card = d.outputs().country.as_ref().unwrap();
    assert_eq!(card.location, "Japan");
    assert_eq!(card.total_cases, Some(600.0));
    assert!(d.outputs().series_for(PanelId::CountryTimeline).is_some());

    d.select_country(None);
    assert!(d.outputs().country.is_none());
}

#[test]
fn presenter_renders_every_panel_to_text() {
    let d = dashboard();
    let mut surface = AsciiSurface::all(60, 8);
    let mut presenter = Presenter::new();
    presenter.present(&mut surface, &d.outputs().series, &d.outputs().map);

    let text = surface.panel_text(PanelId::CasesByContinent).unwrap();
    assert!(text.contains("Cases by Continent") || text.contains("no data"));
    assert!(presenter.handle(PanelId::CasesTimeline).is_some());
    assert!(surface.to_text().contains("=="));
}

#[test]
fn layout_survives_a_store_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("storage.json");

    let ids: Vec<&str> = PanelId::ALL.iter().map(|p| p.id()).collect();
    let mut layout = default_layout(ids.iter().copied());
    layout.get_mut("map-chart").unwrap().span = 12;

    let mut store = KeyValueStore::open(&path).unwrap();
    save_layout(&mut store, &layout).unwrap();

    let reopened = KeyValueStore::open(&path).unwrap();
    let loaded = load_layout(&reopened).unwrap();
    assert_eq!(loaded["map-chart"].span, 12);
    assert_eq!(loaded.len(), PanelId::ALL.len());
}

#[test]
fn timeline_exports_as_csv() {
    let d = dashboard();
    let series = d.outputs().series_for(PanelId::CasesTimeline).unwrap();
    let mut out = Vec::new();
    write_series_csv(&mut out, series).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("label,"));
    assert!(text.lines().count() >= 2);
}
