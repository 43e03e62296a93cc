//! Summary statistics: latest / peak / weekly-average figures, display units,
//! derived rates and period-over-period change indicators.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};

use crate::domain::{
    ChangeDirection, ChangeIndicator, DisplayUnit, DisplayValue, FilterSpec, FilteredView, Metric,
    Observation, Sentiment, SummaryMode, SummaryResult, Totals,
};
use crate::report::number::{format_number, format_percent, round_to};

use super::latest::{LatestByLocation, latest_by_location, population_of};
use super::period::day_key;

/// How far back the change indicators look.
pub const CHANGE_LOOKBACK_DAYS: u64 = 7;
/// Allowed distance (days) between the lookback target and the prior row used.
pub const CHANGE_TOLERANCE_DAYS: i64 = 2;

/// Compute the summary card for a view.
pub fn summarize(
    view: &FilteredView<'_>,
    filter: &FilterSpec,
    mode: SummaryMode,
    unit: DisplayUnit,
) -> SummaryResult {
    let latest = latest_by_location(view);
    let population = population_of(&latest);

    let (totals, changes, last_updated) = match mode {
        SummaryMode::Latest => {
            let totals = latest_totals(&latest);
            let deltas = period_deltas(view, &latest);
            let changes = [
                change_indicator(deltas.cases, totals.cases, Trend::RisingIsBad),
                change_indicator(deltas.deaths, totals.deaths, Trend::RisingIsBad),
                change_indicator(deltas.vaccinations, totals.vaccinations, Trend::RisingIsGood),
            ];
            let last = latest.values().map(|row| row.date).max();
            (totals, changes, last)
        }
        SummaryMode::Peak => {
            let peaks = [
                peak(view, Metric::NewCases),
                peak(view, Metric::NewDeaths),
                peak(view, Metric::NewVaccinations),
                peak(view, Metric::NewTests),
            ];
            let totals = Totals {
                cases: peaks[0].value,
                deaths: peaks[1].value,
                vaccinations: peaks[2].value,
                tests: peaks[3].value,
            };
            // The tests peak does not move the "last updated" date.
            let last = peaks[..3].iter().filter_map(|p| p.date).max();
            let label = ChangeIndicator::label("Peak");
            (totals, [label.clone(), label.clone(), label], last)
        }
        SummaryMode::Average => {
            let totals = weekly_average(view);
            let last = view.iter().map(|row| row.date).max();
            let label = ChangeIndicator::label("Avg");
            (totals, [label.clone(), label.clone(), label], last)
        }
    };

    let [cases_change, deaths_change, vaccinations_change] = changes;

    let cfr = case_fatality_rate(totals.deaths, totals.cases);
    let positivity = positivity_rate(totals.cases, totals.tests);
    // A selection with no testing data at all reads N/A, not "0.00%".
    let (tests, positivity_text) = if totals.tests > 0.0 {
        (
            scale(totals.tests, population, unit, 2),
            format_percent(positivity, 2),
        )
    } else {
        (DisplayValue::unavailable(), "N/A".to_string())
    };

    SummaryResult {
        mode,
        unit,
        totals,
        population,
        cases: scale(totals.cases, population, unit, 4),
        deaths: scale(totals.deaths, population, unit, 4),
        vaccinations: scale(totals.vaccinations, population, unit, 2),
        tests,
        cfr,
        cfr_text: format_percent(cfr, 2),
        positivity,
        positivity_text,
        cases_change,
        deaths_change,
        vaccinations_change,
        last_updated,
        selection: filter.selection_label(),
    }
}

/// Sum the cumulative metrics over each location's latest row.
pub fn latest_totals(latest: &LatestByLocation<'_>) -> Totals {
    let sum = |metric: Metric| -> f64 { latest.values().map(|row| row.metric_or_zero(metric)).sum() };
    Totals {
        cases: sum(Metric::TotalCases),
        deaths: sum(Metric::TotalDeaths),
        vaccinations: sum(Metric::TotalVaccinations),
        tests: sum(Metric::TotalTests),
    }
}

/// Accumulated 7-day differences across locations.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PeriodDeltas {
    pub cases: f64,
    pub deaths: f64,
    pub vaccinations: f64,
}

/// For each location, diff its latest row against the row nearest to
/// `latest.date - 7 days` (within ±2 days). Locations without such a row
/// contribute nothing.
pub fn period_deltas(view: &FilteredView<'_>, latest: &LatestByLocation<'_>) -> PeriodDeltas {
    let mut by_location: BTreeMap<&str, Vec<&Observation>> = BTreeMap::new();
    for row in view.iter() {
        by_location.entry(row.location.as_str()).or_default().push(row);
    }

    let mut deltas = PeriodDeltas::default();
    for (location, current) in latest {
        let Some(rows) = by_location.get(location) else {
            continue;
        };
        let Some(target) = current.date.checked_sub_days(Days::new(CHANGE_LOOKBACK_DAYS)) else {
            continue;
        };
        let Some(prior) = nearest_within(rows, target, CHANGE_TOLERANCE_DAYS) else {
            continue;
        };
        let diff = |metric: Metric| current.metric_or_zero(metric) - prior.metric_or_zero(metric);
        deltas.cases += diff(Metric::TotalCases);
        deltas.deaths += diff(Metric::TotalDeaths);
        deltas.vaccinations += diff(Metric::TotalVaccinations);
    }
    deltas
}

/// Closest row to `target` no more than `tolerance` days away; the earliest
/// such row in view order wins ties.
fn nearest_within<'a>(rows: &[&'a Observation], target: NaiveDate, tolerance: i64) -> Option<&'a Observation> {
    let mut best: Option<(i64, &'a Observation)> = None;
    for &row in rows {
        let distance = (row.date - target).num_days().abs();
        if distance > tolerance {
            continue;
        }
        match best {
            Some((d, _)) if d <= distance => {}
            _ => best = Some((distance, row)),
        }
    }
    best.map(|(_, row)| row)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trend {
    RisingIsGood,
    RisingIsBad,
}

fn change_indicator(delta: f64, total: f64, trend: Trend) -> ChangeIndicator {
    if total <= 0.0 {
        return ChangeIndicator {
            text: "0%".to_string(),
            delta: Some(delta),
            percent: Some(0.0),
            direction: ChangeDirection::Flat,
            sentiment: Sentiment::Neutral,
        };
    }

    // Reconstruct the start-of-period total as the denominator.
    let base = total - delta;
    if base <= 0.0 {
        return ChangeIndicator {
            text: "N/A".to_string(),
            delta: Some(delta),
            percent: None,
            direction: ChangeDirection::Flat,
            sentiment: Sentiment::Neutral,
        };
    }

    let percent = round_to(delta / base * 100.0, 1);
    let direction = if percent > 0.0 {
        ChangeDirection::Up
    } else if percent < 0.0 {
        ChangeDirection::Down
    } else {
        ChangeDirection::Flat
    };
    let sentiment = match (direction, trend) {
        (ChangeDirection::Flat, _) => Sentiment::Neutral,
        (ChangeDirection::Up, Trend::RisingIsGood) | (ChangeDirection::Down, Trend::RisingIsBad) => {
            Sentiment::Good
        }
        _ => Sentiment::Bad,
    };

    ChangeIndicator {
        text: format_percent(percent, 1),
        delta: Some(delta),
        percent: Some(percent),
        direction,
        sentiment,
    }
}

/// Largest single-day sum of a metric and the day it happened.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub value: f64,
    pub date: Option<NaiveDate>,
}

/// Group by day, sum `metric` per day (absent = 0), keep the maximum.
///
/// Ties keep the earliest day. A view whose daily sums never exceed 0 yields
/// `{ value: 0, date: None }`.
pub fn peak(view: &FilteredView<'_>, metric: Metric) -> Peak {
    let mut best = Peak {
        value: 0.0,
        date: None,
    };
    for (value, date) in daily_sums(view, metric).into_values() {
        if value > best.value {
            best = Peak {
                value,
                date: Some(date),
            };
        }
    }
    best
}

/// Day key -> (sum of `metric` across rows that day, the day itself).
pub fn daily_sums(view: &FilteredView<'_>, metric: Metric) -> BTreeMap<String, (f64, NaiveDate)> {
    let mut sums: BTreeMap<String, (f64, NaiveDate)> = BTreeMap::new();
    for row in view.iter() {
        let slot = sums.entry(day_key(row.date)).or_insert((0.0, row.date));
        slot.0 += row.metric_or_zero(metric);
    }
    sums
}

/// Mean daily `new_*` sums over every distinct day in the view, times 7.
pub fn weekly_average(view: &FilteredView<'_>) -> Totals {
    let mut days: BTreeMap<String, Totals> = BTreeMap::new();
    for row in view.iter() {
        let day = days.entry(day_key(row.date)).or_default();
        day.cases += row.metric_or_zero(Metric::NewCases);
        day.deaths += row.metric_or_zero(Metric::NewDeaths);
        day.vaccinations += row.metric_or_zero(Metric::NewVaccinations);
        day.tests += row.metric_or_zero(Metric::NewTests);
    }

    if days.is_empty() {
        return Totals::default();
    }

    let n = days.len() as f64;
    let mut sum = Totals::default();
    for day in days.values() {
        sum.cases += day.cases;
        sum.deaths += day.deaths;
        sum.vaccinations += day.vaccinations;
        sum.tests += day.tests;
    }
    Totals {
        cases: sum.cases / n * 7.0,
        deaths: sum.deaths / n * 7.0,
        vaccinations: sum.vaccinations / n * 7.0,
        tests: sum.tests / n * 7.0,
    }
}

/// Apply a display unit to one figure.
///
/// `per_capita_decimals` only matters for `PerCapita`. Population-relative
/// units are unavailable (not divided by zero) when population is 0.
pub fn scale(value: f64, population: f64, unit: DisplayUnit, per_capita_decimals: usize) -> DisplayValue {
    match unit {
        DisplayUnit::Total => DisplayValue {
            value: Some(value),
            text: format_number(value),
        },
        DisplayUnit::PerMillion => {
            if population <= 0.0 {
                return DisplayValue::unavailable();
            }
            let scaled = value * (1_000_000.0 / population);
            DisplayValue {
                value: Some(scaled),
                text: format_number(scaled),
            }
        }
        DisplayUnit::PerCapita => {
            if population <= 0.0 {
                return DisplayValue::unavailable();
            }
            let scaled = value / population * 100.0;
            DisplayValue {
                value: Some(scaled),
                text: format_percent(scaled, per_capita_decimals),
            }
        }
    }
}

/// Deaths as a percentage of cases; 0 when there are no cases.
pub fn case_fatality_rate(deaths: f64, cases: f64) -> f64 {
    if cases > 0.0 { deaths / cases * 100.0 } else { 0.0 }
}

/// Cases as a percentage of tests; 0 when there are no tests.
pub fn positivity_rate(cases: f64, tests: f64) -> f64 {
    if tests > 0.0 { cases / tests * 100.0 } else { 0.0 }
}
