//! "Latest per group" selection.

use std::collections::BTreeMap;

use crate::domain::{FilteredView, Observation};

/// Location name -> that location's observation with the maximum date.
///
/// Ties on date go to the row seen last in view order (input order). The map
/// iterates alphabetically by location, which keeps downstream sums and charts
/// deterministic.
pub type LatestByLocation<'a> = BTreeMap<&'a str, &'a Observation>;

pub fn latest_by_location<'a>(view: &FilteredView<'a>) -> LatestByLocation<'a> {
    latest_by_location_where(view, |_| true)
}

/// Like [`latest_by_location`], but only rows passing `eligible` take part.
///
/// Charts use this to pick "the latest row that actually has the metric".
pub fn latest_by_location_where<'a, F>(view: &FilteredView<'a>, eligible: F) -> LatestByLocation<'a>
where
    F: Fn(&Observation) -> bool,
{
    latest_by_key(view, |row| eligible(row).then_some(row.location.as_str()))
}

/// Generic latest-wins grouping. Rows for which `key` returns `None` are skipped.
pub fn latest_by_key<'a, F>(view: &FilteredView<'a>, key: F) -> BTreeMap<&'a str, &'a Observation>
where
    F: Fn(&'a Observation) -> Option<&'a str>,
{
    let mut latest: BTreeMap<&'a str, &'a Observation> = BTreeMap::new();
    for row in view.iter() {
        let Some(k) = key(row) else {
            continue;
        };
        match latest.get(k) {
            Some(current) if row.date < current.date => {}
            _ => {
                latest.insert(k, row);
            }
        }
    }
    latest
}

/// Sum of population across the given entries (absent counts as 0).
pub fn population_of(latest: &LatestByLocation<'_>) -> f64 {
    latest.values().map(|row| row.population.unwrap_or(0.0)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Dataset, Metric};
    use crate::engine::fixtures::obs;

    #[test]
    fn picks_max_date_per_location() {
        let ds = Dataset::new(vec![
            obs("France", Some("Europe"), "2021-01-02").metric(Metric::TotalCases, 20.0).build(),
            obs("France", Some("Europe"), "2021-01-03").metric(Metric::TotalCases, 30.0).build(),
            obs("France", Some("Europe"), "2021-01-01").metric(Metric::TotalCases, 10.0).build(),
            obs("Spain", Some("Europe"), "2021-01-01").metric(Metric::TotalCases, 5.0).build(),
        ]);
        let view = ds.view();
        let latest = latest_by_location(&view);
        assert_eq!(latest.len(), 2);
        assert_eq!(latest["France"].metric(Metric::TotalCases), Some(30.0));
        assert_eq!(latest["Spain"].metric(Metric::TotalCases), Some(5.0));
    }

    #[test]
    fn duplicate_dates_resolve_to_last_in_input_order() {
        let ds = Dataset::new(vec![
            obs("France", Some("Europe"), "2021-01-03").metric(Metric::TotalCases, 1.0).build(),
            obs("France", Some("Europe"), "2021-01-03").metric(Metric::TotalCases, 2.0).build(),
        ]);
        let view = ds.view();
        let latest = latest_by_location(&view);
        assert_eq!(latest["France"].metric(Metric::TotalCases), Some(2.0));
    }

    #[test]
    fn eligibility_skips_rows_without_metric() {
        let ds = Dataset::new(vec![
            obs("France", Some("Europe"), "2021-01-01").metric(Metric::TotalTests, 7.0).build(),
            obs("France", Some("Europe"), "2021-01-05").build(),
        ]);
        let view = ds.view();
        let latest = latest_by_location_where(&view, |r| r.metric(Metric::TotalTests).is_some());
        assert_eq!(latest["France"].metric(Metric::TotalTests), Some(7.0));
    }
}
