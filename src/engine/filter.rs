//! Filter evaluation: dataset + `FilterSpec` -> `FilteredView`.

use chrono::{Days, NaiveDate};

use crate::domain::{Choice, Dataset, FilterSpec, FilteredView, Observation};

use super::index::DatasetIndex;

/// Lead-in skipped at the start of the default date range.
pub const DEFAULT_LEAD_IN_DAYS: u64 = 60;

/// Default filter for a freshly loaded dataset.
///
/// All continents and locations; dates from `min + 60 days` (clamped so the
/// range is never inverted) to `max`. `None` when the dataset is empty.
pub fn default_filter(index: &DatasetIndex) -> Option<FilterSpec> {
    let (min, max) = index.date_range?;
    let start = min
        .checked_add_days(Days::new(DEFAULT_LEAD_IN_DAYS))
        .unwrap_or(max)
        .min(max);
    Some(FilterSpec {
        continent: Choice::All,
        location: Choice::All,
        start,
        end: max,
    })
}

/// True when `row` satisfies every part of `spec`. Date bounds are inclusive.
pub fn matches(spec: &FilterSpec, row: &Observation) -> bool {
    spec.continent.matches(row.continent.as_deref())
        && spec.location.matches(Some(row.location.as_str()))
        && in_range(row.date, spec.start, spec.end)
}

fn in_range(date: NaiveDate, start: NaiveDate, end: NaiveDate) -> bool {
    start <= date && date <= end
}

/// Build the filtered view. An empty result is valid.
pub fn apply<'a>(dataset: &'a Dataset, spec: &FilterSpec) -> FilteredView<'a> {
    FilteredView::new(dataset.rows().iter().filter(|row| matches(spec, row)).collect())
}
