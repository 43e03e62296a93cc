//! Chart-ready series extracted from a filtered view.
//!
//! Each builder is independent: it takes the view (plus whatever lookup it
//! needs) and returns a complete `ChartSeries`. Rows missing the metric a chart
//! is about never become points; they are skipped rather than plotted as 0.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{
    ChartKind, ChartSeries, CountryDetail, FilteredView, Metric, Observation, PanelId, Rgb,
    ScatterPoint, SeriesDataset, SeriesStyle, SeriesValues,
};
use crate::report::number::round_to;

use super::index::DatasetIndex;
use super::latest::latest_by_location_where;
use super::period::{TIMELINE_TARGET_POINTS, day_key, downsample, month_key, month_label};
use super::stats::case_fatality_rate;

/// Length of the ranking charts.
pub const TOP_N: usize = 10;
/// Minimum cumulative cases before a country's CFR is considered meaningful.
pub const CFR_MIN_CASES: f64 = 10_000.0;
/// Continents plotted by the monthly waves chart, in legend order.
pub const WAVE_CONTINENTS: [&str; 4] = ["Europe", "North America", "Asia", "South America"];

/// Which figure the by-continent snapshot shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinentMetric {
    /// Total cases, in millions.
    TotalCases,
    /// People fully vaccinated per hundred.
    FullyVaccinated,
}

/// Latest value per continent aggregate row, alphabetical by continent.
///
/// Continent aggregates are the rows whose location is itself a continent name
/// (and which carry no continent of their own). A continent filter excludes
/// those rows, so when the view has none the latest country values are summed
/// per continent instead.
pub fn continent_snapshot(view: &FilteredView<'_>, index: &DatasetIndex, metric: ContinentMetric) -> ChartSeries {
    let (panel, column, name, axis, color, scale) = match metric {
        ContinentMetric::TotalCases => (
            PanelId::CasesByContinent,
            Metric::TotalCases,
            "Total Cases (millions)",
            "Total Cases (millions)",
            Rgb::BLUE,
            1e-6,
        ),
        ContinentMetric::FullyVaccinated => (
            PanelId::VaccinationProgress,
            Metric::PeopleFullyVaccinatedPerHundred,
            "Fully Vaccinated (%)",
            "Population Percentage (%)",
            Rgb::GREEN,
            1.0,
        ),
    };

    let latest = latest_by_location_where(view, |row| {
        row.continent.is_none() && index.is_continent_name(&row.location) && row.metric(column).is_some()
    });

    let mut by_continent: BTreeMap<&str, f64> = latest
        .iter()
        .map(|(continent, row)| (*continent, row.metric_or_zero(column)))
        .collect();
    if by_continent.is_empty() {
        let countries = latest_by_location_where(view, |row| row.is_country() && row.metric(column).is_some());
        for &row in countries.values() {
            if let Some(continent) = row.continent.as_deref() {
                *by_continent.entry(continent).or_default() += row.metric_or_zero(column);
            }
        }
    }

    let labels = by_continent.keys().map(|c| c.to_string()).collect();
    let values = by_continent.values().map(|v| v * scale).collect();

    ChartSeries {
        panel,
        title: panel.title().to_string(),
        kind: ChartKind::Bar,
        axis_label: axis.to_string(),
        labels,
        datasets: vec![SeriesDataset::values(name, color, false, values)],
    }
}

/// Daily new cases/deaths summed across locations, thinned to ~20 points.
///
/// Only rows reporting `new_cases` contribute. Points are labelled `YYYY-MM`.
pub fn daily_timeline(view: &FilteredView<'_>) -> ChartSeries {
    let mut days: BTreeMap<String, (f64, f64)> = BTreeMap::new();
    // Days without reported cases are left out, deaths included.
    for row in view.iter().filter(|r| r.metric(Metric::NewCases).is_some_and(|v| v != 0.0)) {
        let day = days.entry(day_key(row.date)).or_default();
        day.0 += row.metric_or_zero(Metric::NewCases);
        day.1 += row.metric_or_zero(Metric::NewDeaths);
    }

    let ordered: Vec<(String, f64, f64)> = days.into_iter().map(|(k, (c, d))| (k, c, d)).collect();
    let sampled = downsample(&ordered, TIMELINE_TARGET_POINTS);

    let labels = sampled.iter().map(|(k, _, _)| k[..7].to_string()).collect();
    let cases = sampled.iter().map(|(_, c, _)| *c).collect();
    let deaths = sampled.iter().map(|(_, _, d)| *d).collect();

    ChartSeries {
        panel: PanelId::CasesTimeline,
        title: PanelId::CasesTimeline.title().to_string(),
        kind: ChartKind::Line,
        axis_label: "New Cases".to_string(),
        labels,
        datasets: vec![
            SeriesDataset::values("New Cases", Rgb::BLUE, true, cases),
            SeriesDataset::values("New Deaths", Rgb::RED, false, deaths),
        ],
    }
}

/// Ten countries with the most cumulative cases.
///
/// Aggregates (no continent) and rows without positive `total_cases` are out.
pub fn top_cases(view: &FilteredView<'_>) -> ChartSeries {
    let latest = latest_by_location_where(view, |row| row.metric(Metric::TotalCases).is_some());
    let mut ranked: Vec<(&str, f64)> = latest
        .iter()
        .filter(|(_, row)| row.is_country())
        .map(|(loc, row)| (*loc, row.metric_or_zero(Metric::TotalCases)))
        .filter(|(_, cases)| *cases > 0.0)
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(TOP_N);

    ChartSeries {
        panel: PanelId::CountryComparison,
        title: PanelId::CountryComparison.title().to_string(),
        kind: ChartKind::HorizontalBar,
        axis_label: "Total Cases".to_string(),
        labels: ranked.iter().map(|(loc, _)| loc.to_string()).collect(),
        datasets: vec![SeriesDataset::values(
            "Total Cases",
            Rgb::BLUE,
            false,
            ranked.iter().map(|(_, v)| *v).collect(),
        )],
    }
}

/// Monthly new cases for the four wave continents on a shared month axis.
///
/// Months observed for any of the four appear for all of them (0-filled).
pub fn continental_waves(view: &FilteredView<'_>) -> ChartSeries {
    let mut per_continent: BTreeMap<&str, BTreeMap<String, f64>> = BTreeMap::new();
    let mut months: BTreeSet<String> = BTreeSet::new();

    for row in view.iter() {
        let Some(continent) = row.continent.as_deref() else {
            continue;
        };
        if !WAVE_CONTINENTS.contains(&continent) {
            continue;
        }
        let Some(cases) = row.metric(Metric::NewCases) else {
            continue;
        };
        let key = month_key(row.date);
        months.insert(key.clone());
        *per_continent.entry(continent).or_default().entry(key).or_insert(0.0) += cases;
    }

    let colors = [Rgb::BLUE, Rgb::GREEN, Rgb::RED, Rgb::YELLOW];
    let datasets = WAVE_CONTINENTS
        .iter()
        .zip(colors)
        .map(|(continent, color)| {
            let sums = per_continent.get(continent);
            let values = months
                .iter()
                .map(|m| sums.and_then(|s| s.get(m)).copied().unwrap_or(0.0))
                .collect();
            SeriesDataset::values(continent, color, true, values)
        })
        .collect();

    ChartSeries {
        panel: PanelId::ContinentalWaves,
        title: PanelId::ContinentalWaves.title().to_string(),
        kind: ChartKind::Line,
        axis_label: "New Cases".to_string(),
        labels: months.iter().map(|m| month_label(m)).collect(),
        datasets,
    }
}

/// Month-over-month growth of new cases, in percent (2 decimals).
///
/// A month that follows a month with no cases is skipped: no point, no null.
pub fn monthly_growth(view: &FilteredView<'_>) -> ChartSeries {
    let mut months: BTreeMap<String, f64> = BTreeMap::new();
    for row in view.iter() {
        if let Some(cases) = row.metric(Metric::NewCases) {
            *months.entry(month_key(row.date)).or_insert(0.0) += cases;
        }
    }

    let ordered: Vec<(&String, &f64)> = months.iter().collect();
    let mut labels = Vec::new();
    let mut values = Vec::new();
    for pair in ordered.windows(2) {
        let (_, &previous) = pair[0];
        let (month, &current) = pair[1];
        if previous <= 0.0 {
            continue;
        }
        values.push(round_to((current - previous) / previous * 100.0, 2));
        labels.push(month_label(month));
    }

    ChartSeries {
        panel: PanelId::TemporalEvolution,
        title: PanelId::TemporalEvolution.title().to_string(),
        kind: ChartKind::Line,
        axis_label: "Growth (%)".to_string(),
        labels,
        datasets: vec![SeriesDataset::values("Monthly Case Growth Rate (%)", Rgb::BLUE, true, values)],
    }
}

fn has_meaningful_cfr(row: &Observation) -> bool {
    row.is_country()
        && row.metric_or_zero(Metric::TotalCases) > CFR_MIN_CASES
        && row.metric_or_zero(Metric::TotalDeaths) > 0.0
}

/// Ten countries with the highest case-fatality rate (2 decimals).
pub fn top_cfr(view: &FilteredView<'_>) -> ChartSeries {
    let latest = latest_by_location_where(view, |row| {
        row.metric(Metric::TotalCases).is_some() && row.metric(Metric::TotalDeaths).is_some()
    });
    let mut ranked: Vec<(&str, f64)> = latest
        .iter()
        .filter(|(_, row)| has_meaningful_cfr(row))
        .map(|(loc, row)| {
            let cfr = case_fatality_rate(
                row.metric_or_zero(Metric::TotalDeaths),
                row.metric_or_zero(Metric::TotalCases),
            );
            (*loc, round_to(cfr, 2))
        })
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(TOP_N);

    ChartSeries {
        panel: PanelId::GeographicalComparison,
        title: PanelId::GeographicalComparison.title().to_string(),
        kind: ChartKind::Bar,
        axis_label: "CFR (%)".to_string(),
        labels: ranked.iter().map(|(loc, _)| loc.to_string()).collect(),
        datasets: vec![SeriesDataset::values(
            "Case Fatality Rate (%)",
            Rgb::RED,
            false,
            ranked.iter().map(|(_, v)| *v).collect(),
        )],
    }
}

/// Labels for the five vaccination-coverage bins.
pub const VACCINATION_BIN_LABELS: [&str; 5] = ["Under 20%", "20-40%", "40-60%", "60-80%", "Over 80%"];

/// Aggregated figures for one vaccination-coverage bin.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VaccinationBin {
    pub deaths: f64,
    pub cases: f64,
    pub countries: usize,
}

impl VaccinationBin {
    /// Pooled CFR (2 decimals); 0 for an empty bin.
    pub fn cfr(&self) -> f64 {
        if self.cases > 0.0 {
            round_to(self.deaths / self.cases * 100.0, 2)
        } else {
            0.0
        }
    }
}

fn bin_for(rate: f64) -> usize {
    match rate {
        r if r < 20.0 => 0,
        r if r < 40.0 => 1,
        r if r < 60.0 => 2,
        r if r < 80.0 => 3,
        _ => 4,
    }
}

/// Partition countries by `people_vaccinated_per_hundred` into 20-point bins.
pub fn vaccination_bins(view: &FilteredView<'_>) -> [VaccinationBin; 5] {
    let latest = latest_by_location_where(view, |row| row.metric(Metric::PeopleVaccinatedPerHundred).is_some());
    let mut bins = [VaccinationBin::default(); 5];
    for row in latest.values().filter(|row| has_meaningful_cfr(row)) {
        let Some(rate) = row.metric(Metric::PeopleVaccinatedPerHundred) else {
            continue;
        };
        let bin = &mut bins[bin_for(rate)];
        bin.deaths += row.metric_or_zero(Metric::TotalDeaths);
        bin.cases += row.metric_or_zero(Metric::TotalCases);
        bin.countries += 1;
    }
    bins
}

/// Pooled CFR per vaccination-coverage bin.
pub fn vaccination_cfr(view: &FilteredView<'_>) -> ChartSeries {
    let bins = vaccination_bins(view);
    ChartSeries {
        panel: PanelId::PolicyImpact,
        title: PanelId::PolicyImpact.title().to_string(),
        kind: ChartKind::Line,
        axis_label: "CFR (%)".to_string(),
        labels: VACCINATION_BIN_LABELS.iter().map(|s| s.to_string()).collect(),
        datasets: vec![SeriesDataset::values(
            "Case Fatality Rate by Vaccination Coverage (%)",
            Rgb::GREEN,
            true,
            bins.iter().map(VaccinationBin::cfr).collect(),
        )],
    }
}

/// Tests per thousand vs. cases per million, one point per country.
pub fn tests_vs_cases(view: &FilteredView<'_>) -> ChartSeries {
    let latest = latest_by_location_where(view, |row| {
        row.metric(Metric::TotalTestsPerThousand).is_some() && row.metric(Metric::TotalCasesPerMillion).is_some()
    });
    let points: Vec<ScatterPoint> = latest
        .iter()
        .filter(|(_, row)| row.is_country())
        .filter_map(|(loc, row)| {
            let x = row.metric_or_zero(Metric::TotalTestsPerThousand);
            let y = row.metric_or_zero(Metric::TotalCasesPerMillion);
            (x > 0.0 && y > 0.0).then(|| ScatterPoint {
                x,
                y,
                label: loc.to_string(),
            })
        })
        .collect();

    ChartSeries {
        panel: PanelId::ContextualFactors,
        title: PanelId::ContextualFactors.title().to_string(),
        kind: ChartKind::Scatter,
        axis_label: "Cases per million".to_string(),
        labels: Vec::new(),
        datasets: vec![SeriesDataset {
            name: "Tests vs. Cases by Country".to_string(),
            style: SeriesStyle {
                color: Rgb::PURPLE,
                fill: false,
            },
            values: SeriesValues::Points(points),
        }],
    }
}

/// All rows of one location, date-ascending, thinned like the daily timeline.
pub fn country_timeline(view: &FilteredView<'_>, location: &str) -> ChartSeries {
    let mut rows: Vec<&Observation> = view.iter().filter(|r| r.location == location).collect();
    rows.sort_by_key(|r| r.date);
    let sampled = downsample(&rows, TIMELINE_TARGET_POINTS);

    ChartSeries {
        panel: PanelId::CountryTimeline,
        title: format!("{} - {location}", PanelId::CountryTimeline.title()),
        kind: ChartKind::Line,
        axis_label: "Count".to_string(),
        labels: sampled.iter().map(|r| r.date.format("%Y-%m").to_string()).collect(),
        datasets: vec![
            SeriesDataset::values(
                "New Cases",
                Rgb::BLUE,
                true,
                sampled.iter().map(|r| r.metric_or_zero(Metric::NewCases)).collect(),
            ),
            SeriesDataset::values(
                "New Deaths",
                Rgb::RED,
                true,
                sampled.iter().map(|r| r.metric_or_zero(Metric::NewDeaths)).collect(),
            ),
        ],
    }
}

/// Latest figures for one location, or `None` if the view has no rows for it.
pub fn country_detail(view: &FilteredView<'_>, location: &str) -> Option<CountryDetail> {
    let row = view
        .iter()
        .filter(|r| r.location == location)
        .fold(None::<&Observation>, |best, r| match best {
            Some(b) if r.date < b.date => Some(b),
            _ => Some(r),
        })?;

    let cases = row.metric(Metric::TotalCases);
    let deaths = row.metric(Metric::TotalDeaths);
    let cfr = match (cases, deaths) {
        (Some(c), Some(d)) if c > 0.0 => Some(round_to(d / c * 100.0, 2)),
        _ => None,
    };

    Some(CountryDetail {
        location: row.location.clone(),
        iso_code: row.iso_code.clone(),
        date: row.date,
        total_cases: cases,
        total_deaths: deaths,
        people_fully_vaccinated: row.metric(Metric::PeopleFullyVaccinated),
        cfr,
        fully_vaccinated_rate: row.metric(Metric::PeopleFullyVaccinatedPerHundred),
    })
}

/// Every view-level chart, in panel order. The country timeline is only
/// included when a country is selected.
pub fn build_all(view: &FilteredView<'_>, index: &DatasetIndex, selected_country: Option<&str>) -> Vec<ChartSeries> {
    let mut out = vec![
        continent_snapshot(view, index, ContinentMetric::TotalCases),
        daily_timeline(view),
        continent_snapshot(view, index, ContinentMetric::FullyVaccinated),
        top_cases(view),
        continental_waves(view),
        monthly_growth(view),
        top_cfr(view),
        vaccination_cfr(view),
        tests_vs_cases(view),
    ];
    if let Some(location) = selected_country {
        out.push(country_timeline(view, location));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Choice, Dataset, FilterSpec};
    use crate::engine::filter::apply;
    use crate::engine::fixtures::{date, obs};

    #[test]
    fn continent_snapshot_uses_aggregate_rows_sorted() {
        let ds = Dataset::new(vec![
            obs("Europe", None, "2021-01-01").metric(Metric::TotalCases, 1_000_000.0).build(),
            obs("Europe", None, "2021-01-02").metric(Metric::TotalCases, 2_000_000.0).build(),
            obs("Asia", None, "2021-01-02").metric(Metric::TotalCases, 3_000_000.0).build(),
            obs("France", Some("Europe"), "2021-01-02").metric(Metric::TotalCases, 500.0).build(),
            obs("Japan", Some("Asia"), "2021-01-02").metric(Metric::TotalCases, 500.0).build(),
        ]);
        let index = DatasetIndex::build(&ds);
        let view = ds.view();
        let s = continent_snapshot(&view, &index, ContinentMetric::TotalCases);
        assert_eq!(s.labels, vec!["Asia", "Europe"]);
        assert_eq!(s.primary_values(), &[3.0, 2.0]);
    }

    #[test]
    fn continent_snapshot_sums_countries_under_a_continent_filter() {
        let ds = Dataset::new(vec![
            obs("Europe", None, "2021-01-02").metric(Metric::TotalCases, 9_000_000.0).build(),
            obs("France", Some("Europe"), "2021-01-01").metric(Metric::TotalCases, 1_000_000.0).build(),
            obs("France", Some("Europe"), "2021-01-02").metric(Metric::TotalCases, 1_500_000.0).build(),
            obs("Spain", Some("Europe"), "2021-01-02").metric(Metric::TotalCases, 500_000.0).build(),
            obs("Japan", Some("Asia"), "2021-01-02").metric(Metric::TotalCases, 700_000.0).build(),
        ]);
        let index = DatasetIndex::build(&ds);
        let spec = FilterSpec {
            continent: Choice::Only("Europe".into()),
            location: Choice::All,
            start: date("2021-01-01"),
            end: date("2021-01-02"),
        };
        let view = apply(&ds, &spec);
        let s = continent_snapshot(&view, &index, ContinentMetric::TotalCases);
        assert_eq!(s.labels, vec!["Europe"]);
        assert_eq!(s.primary_values(), &[2.0]);
    }

    #[test]
    fn daily_timeline_strides_and_labels_by_month() {
        let mut rows = Vec::new();
        let start = chrono::NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        for i in 0..45u64 {
            let d = start + chrono::Days::new(i);
            rows.push(
                obs("A", Some("Asia"), &d.to_string())
                    .metric(Metric::NewCases, i as f64)
                    .metric(Metric::NewDeaths, 1.0)
                    .build(),
            );
            rows.push(obs("B", Some("Asia"), &d.to_string()).metric(Metric::NewCases, 1.0).build());
        }
        let ds = Dataset::new(rows);
        let view = ds.view();
        let s = daily_timeline(&view);
        // 45 days, stride 2 -> 23 points.
        assert_eq!(s.labels.len(), 23);
        assert_eq!(s.labels[0], "2021-01");
        assert_eq!(s.labels[22], "2021-02");
        assert_eq!(s.datasets[0].as_values()[0], 1.0);
        assert_eq!(s.datasets[0].as_values()[1], 3.0);
        // A reported 0 new cases on day one, so its deaths are not counted.
        assert_eq!(s.datasets[1].as_values()[0], 0.0);
        assert_eq!(s.datasets[1].as_values()[1], 1.0);
    }

    #[test]
    fn daily_timeline_skips_zero_case_days() {
        let ds = Dataset::new(vec![
            obs("A", Some("Asia"), "2021-01-01").metric(Metric::NewCases, 0.0).metric(Metric::NewDeaths, 4.0).build(),
            obs("A", Some("Asia"), "2021-01-02").metric(Metric::NewCases, 5.0).metric(Metric::NewDeaths, 1.0).build(),
        ]);
        let view = ds.view();
        let s = daily_timeline(&view);
        assert_eq!(s.labels, vec!["2021-01"]);
        assert_eq!(s.datasets[0].as_values(), &[5.0]);
        assert_eq!(s.datasets[1].as_values(), &[1.0]);
    }

    #[test]
    fn top_cases_excludes_aggregates_and_truncates() {
        let mut rows = vec![obs("World", None, "2021-01-01").metric(Metric::TotalCases, 1e9).build()];
        for i in 0..12 {
            rows.push(
                obs(&format!("C{i:02}"), Some("Asia"), "2021-01-01")
                    .metric(Metric::TotalCases, (i + 1) as f64 * 100.0)
                    .build(),
            );
        }
        rows.push(obs("Zero", Some("Asia"), "2021-01-01").metric(Metric::TotalCases, 0.0).build());
        let ds = Dataset::new(rows);
        let view = ds.view();
        let s = top_cases(&view);
        assert_eq!(s.labels.len(), TOP_N);
        assert_eq!(s.labels[0], "C11");
        assert!(!s.labels.contains(&"World".to_string()));
        assert!(!s.labels.contains(&"Zero".to_string()));
        let v = s.primary_values();
        assert!(v.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn continental_waves_fill_missing_months() {
        let ds = Dataset::new(vec![
            obs("France", Some("Europe"), "2021-01-05").metric(Metric::NewCases, 10.0).build(),
            obs("France", Some("Europe"), "2021-01-06").metric(Metric::NewCases, 5.0).build(),
            obs("Japan", Some("Asia"), "2021-02-01").metric(Metric::NewCases, 7.0).build(),
            obs("Kenya", Some("Africa"), "2021-03-01").metric(Metric::NewCases, 99.0).build(),
        ]);
        let view = ds.view();
        let s = continental_waves(&view);
        assert_eq!(s.labels, vec!["Jan 2021", "Feb 2021"]);
        assert_eq!(s.datasets.len(), 4);
        assert_eq!(s.datasets[0].name, "Europe");
        assert_eq!(s.datasets[0].as_values(), &[15.0, 0.0]);
        assert_eq!(s.datasets[2].as_values(), &[0.0, 7.0]);
        assert_eq!(s.datasets[1].as_values(), &[0.0, 0.0]);
    }

    #[test]
    fn monthly_growth_skips_month_after_zero() {
        let ds = Dataset::new(vec![
            obs("A", Some("Asia"), "2021-01-10").metric(Metric::NewCases, 100.0).build(),
            obs("A", Some("Asia"), "2021-02-10").metric(Metric::NewCases, 150.0).build(),
            obs("A", Some("Asia"), "2021-03-10").metric(Metric::NewCases, 0.0).build(),
            obs("A", Some("Asia"), "2021-04-10").metric(Metric::NewCases, 30.0).build(),
            obs("A", Some("Asia"), "2021-05-10").metric(Metric::NewCases, 10.0).build(),
        ]);
        let view = ds.view();
        let s = monthly_growth(&view);
        assert_eq!(s.labels, vec!["Feb 2021", "Mar 2021", "May 2021"]);
        assert_eq!(s.primary_values(), &[50.0, -100.0, -66.67]);
        assert!(s.primary_values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn top_cfr_excludes_small_samples() {
        let ds = Dataset::new(vec![
            // Highest CFR but below the case threshold.
            obs("Tiny", Some("Asia"), "2021-01-01")
                .metric(Metric::TotalCases, 5_000.0)
                .metric(Metric::TotalDeaths, 2_500.0)
                .build(),
            obs("Big", Some("Asia"), "2021-01-01")
                .metric(Metric::TotalCases, 20_000.0)
                .metric(Metric::TotalDeaths, 400.0)
                .build(),
            obs("NoDeaths", Some("Asia"), "2021-01-01")
                .metric(Metric::TotalCases, 20_000.0)
                .metric(Metric::TotalDeaths, 0.0)
                .build(),
        ]);
        let view = ds.view();
        let s = top_cfr(&view);
        assert_eq!(s.labels, vec!["Big"]);
        assert_eq!(s.primary_values(), &[2.0]);
    }

    #[test]
    fn vaccination_bins_handle_empty_bins() {
        let row = |name: &str, rate: f64, cases: f64, deaths: f64| {
            obs(name, Some("Europe"), "2021-06-01")
                .metric(Metric::PeopleVaccinatedPerHundred, rate)
                .metric(Metric::TotalCases, cases)
                .metric(Metric::TotalDeaths, deaths)
                .build()
        };
        let ds = Dataset::new(vec![
            row("A", 10.0, 20_000.0, 200.0),
            row("B", 15.0, 30_000.0, 300.0),
            row("C", 45.0, 50_000.0, 1_000.0),
            row("D", 100.0, 40_000.0, 100.0),
            row("E", 70.0, 9_000.0, 900.0), // below threshold, 60-80 stays empty
        ]);
        let view = ds.view();
        let bins = vaccination_bins(&view);
        assert_eq!(bins[0].countries, 2);
        assert_eq!(bins[0].cfr(), 1.0);
        assert_eq!(bins[2].cfr(), 2.0);
        assert_eq!(bins[3].countries, 0);
        assert_eq!(bins[3].cfr(), 0.0);
        assert_eq!(bins[4].cfr(), 0.25);

        let s = vaccination_cfr(&view);
        assert_eq!(s.labels.len(), 5);
        assert!(s.primary_values().iter().all(|v| !v.is_nan()));
    }

    #[test]
    fn scatter_requires_positive_axes() {
        let ds = Dataset::new(vec![
            obs("A", Some("Asia"), "2021-01-01")
                .metric(Metric::TotalTestsPerThousand, 100.0)
                .metric(Metric::TotalCasesPerMillion, 5_000.0)
                .build(),
            obs("B", Some("Asia"), "2021-01-01")
                .metric(Metric::TotalTestsPerThousand, 0.0)
                .metric(Metric::TotalCasesPerMillion, 5_000.0)
                .build(),
            obs("C", Some("Asia"), "2021-01-01").metric(Metric::TotalTestsPerThousand, 3.0).build(),
        ]);
        let view = ds.view();
        let s = tests_vs_cases(&view);
        let SeriesValues::Points(points) = &s.datasets[0].values else {
            panic!("expected scatter points");
        };
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].label, "A");
        assert_eq!((points[0].x, points[0].y), (100.0, 5_000.0));
    }

    #[test]
    fn country_timeline_sorts_and_fills_missing() {
        let ds = Dataset::new(vec![
            obs("A", Some("Asia"), "2021-02-01").metric(Metric::NewCases, 2.0).build(),
            obs("A", Some("Asia"), "2021-01-01").metric(Metric::NewCases, 1.0).build(),
            obs("B", Some("Asia"), "2021-01-01").metric(Metric::NewCases, 9.0).build(),
        ]);
        let view = ds.view();
        let s = country_timeline(&view, "A");
        assert_eq!(s.labels, vec!["2021-01", "2021-02"]);
        assert_eq!(s.datasets[0].as_values(), &[1.0, 2.0]);
        assert_eq!(s.datasets[1].as_values(), &[0.0, 0.0]);
    }

    #[test]
    fn country_detail_reports_latest_row() {
        let ds = Dataset::new(vec![
            obs("A", Some("Asia"), "2021-01-01").metric(Metric::TotalCases, 100.0).build(),
            obs("A", Some("Asia"), "2021-02-01")
                .metric(Metric::TotalCases, 200.0)
                .metric(Metric::TotalDeaths, 4.0)
                .build(),
        ]);
        let view = ds.view();
        let d = country_detail(&view, "A").unwrap();
        assert_eq!(d.total_cases, Some(200.0));
        assert_eq!(d.cfr, Some(2.0));
        assert_eq!(d.fully_vaccinated_rate, None);
        assert!(country_detail(&view, "Nowhere").is_none());
    }

    #[test]
    fn empty_view_yields_empty_series() {
        let ds = Dataset::default();
        let view = ds.view();
        let index = DatasetIndex::build(&ds);
        for s in build_all(&view, &index, Some("A")) {
            if s.panel == PanelId::PolicyImpact {
                assert_eq!(s.primary_values(), &[0.0; 5]);
                continue;
            }
            if s.panel == PanelId::ContinentalWaves {
                assert!(s.labels.is_empty());
                continue;
            }
            assert!(s.is_empty(), "{} should be empty", s.panel);
        }
    }
}
