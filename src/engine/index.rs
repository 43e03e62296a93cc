//! Dataset index: valid filter values and the overall date range.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::domain::{CountryOption, Dataset, FilteredView};

/// Lookup structures built once per loaded dataset.
#[derive(Debug, Clone, Default)]
pub struct DatasetIndex {
    pub continents: BTreeSet<String>,
    pub locations: BTreeSet<String>,
    /// `None` for an empty dataset.
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    countries_by_continent: BTreeMap<String, BTreeSet<String>>,
}

impl DatasetIndex {
    /// Single O(n) pass over the dataset.
    pub fn build(dataset: &Dataset) -> Self {
        let mut index = DatasetIndex::default();
        for row in dataset.rows() {
            if let Some(continent) = &row.continent {
                if !index.continents.contains(continent) {
                    index.continents.insert(continent.clone());
                }
                index
                    .countries_by_continent
                    .entry(continent.clone())
                    .or_default()
                    .insert(row.location.clone());
            }
            if !index.locations.contains(&row.location) {
                index.locations.insert(row.location.clone());
            }
            index.date_range = Some(match index.date_range {
                None => (row.date, row.date),
                Some((lo, hi)) => (lo.min(row.date), hi.max(row.date)),
            });
        }
        index
    }

    /// Locations observed with the given continent, alphabetical.
    pub fn countries_in(&self, continent: &str) -> Vec<String> {
        self.countries_by_continent
            .get(continent)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Whether `name` is a continent aggregate row's location (e.g. "Europe").
    pub fn is_continent_name(&self, name: &str) -> bool {
        self.continents.contains(name)
    }
}

/// Countries (rows with a continent and an ISO code) present in a view.
///
/// The first occurrence per location supplies the ISO code; sorted by name.
pub fn selectable_countries(view: &FilteredView<'_>) -> Vec<CountryOption> {
    let mut seen: BTreeMap<&str, &str> = BTreeMap::new();
    for row in view.iter() {
        let (Some(iso), true) = (row.iso_code.as_deref(), row.is_country()) else {
            continue;
        };
        seen.entry(row.location.as_str()).or_insert(iso);
    }
    seen.into_iter()
        .map(|(name, iso)| CountryOption {
            name: name.to_string(),
            iso_code: iso.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fixtures::{date, obs};

    fn sample() -> Dataset {
        Dataset::new(vec![
            obs("France", Some("Europe"), "2021-02-01").iso("FRA").build(),
            obs("Spain", Some("Europe"), "2021-01-15").iso("ESP").build(),
            obs("Japan", Some("Asia"), "2021-03-01").iso("JPN").build(),
            obs("World", None, "2020-12-31").iso("OWID_WRL").build(),
            obs("Europe", None, "2021-01-01").build(),
        ])
    }

    #[test]
    fn builds_sets_and_range() {
        let index = DatasetIndex::build(&sample());
        assert_eq!(
            index.continents.iter().cloned().collect::<Vec<_>>(),
            vec!["Asia".to_string(), "Europe".to_string()]
        );
        assert_eq!(index.locations.len(), 5);
        assert_eq!(index.date_range, Some((date("2020-12-31"), date("2021-03-01"))));
        assert_eq!(index.countries_in("Europe"), vec!["France".to_string(), "Spain".to_string()]);
        assert!(index.countries_in("Oceania").is_empty());
        assert!(index.is_continent_name("Europe"));
        assert!(!index.is_continent_name("World"));
    }

    #[test]
    fn empty_dataset_has_no_range() {
        let index = DatasetIndex::build(&Dataset::default());
        assert!(index.continents.is_empty());
        assert!(index.locations.is_empty());
        assert_eq!(index.date_range, None);
    }

    #[test]
    fn selectable_countries_skip_aggregates() {
        let ds = sample();
        let view = ds.view();
        let names: Vec<String> = selectable_countries(&view).into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["France", "Japan", "Spain"]);
    }
}
