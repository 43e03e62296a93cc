//! Per-country figures for the world map panel.

use crate::domain::{FilteredView, MapPoint, Metric};

use super::latest::latest_by_key;
use super::stats::case_fatality_rate;

/// Latest row per ISO code among rows reporting positive `total_cases`.
///
/// Sorted by ISO code. Aggregate codes (`OWID_*`) are kept; a surface that
/// cannot place them simply has no centroid for them.
pub fn map_points(view: &FilteredView<'_>) -> Vec<MapPoint> {
    let latest = latest_by_key(view, |row| {
        let cases = row.metric(Metric::TotalCases).unwrap_or(0.0);
        if cases > 0.0 { row.iso_code.as_deref() } else { None }
    });

    latest
        .into_iter()
        .map(|(iso, row)| {
            let cases = row.metric_or_zero(Metric::TotalCases);
            let deaths = row.metric(Metric::TotalDeaths);
            MapPoint {
                location: row.location.clone(),
                iso_code: iso.to_string(),
                total_cases: cases,
                total_deaths: deaths,
                total_vaccinations: row.metric(Metric::TotalVaccinations),
                cfr: deaths.map(|d| case_fatality_rate(d, cases)),
            }
        })
        .collect()
}

/// Approximate (latitude, longitude) per ISO 3166 alpha-3 code.
const CENTROIDS: &[(&str, f64, f64)] = &[
    ("ARG", -34.0, -64.0),
    ("AUS", -25.0, 134.0),
    ("BEL", 50.8, 4.5),
    ("BGD", 24.0, 90.0),
    ("BRA", -10.0, -55.0),
    ("CAN", 60.0, -96.0),
    ("CHE", 46.8, 8.2),
    ("CHL", -30.0, -71.0),
    ("CHN", 35.0, 103.0),
    ("COL", 4.0, -73.0),
    ("CZE", 49.8, 15.5),
    ("DEU", 51.0, 10.0),
    ("DZA", 28.0, 3.0),
    ("EGY", 27.0, 30.0),
    ("ESP", 40.0, -4.0),
    ("ETH", 9.0, 39.5),
    ("FRA", 46.0, 2.0),
    ("GBR", 54.0, -2.0),
    ("GRC", 39.0, 22.0),
    ("IDN", -2.0, 118.0),
    ("IND", 21.0, 78.0),
    ("IRN", 32.0, 53.0),
    ("IRQ", 33.0, 44.0),
    ("ITA", 42.8, 12.8),
    ("JPN", 36.0, 138.0),
    ("KEN", 0.5, 38.0),
    ("KOR", 36.5, 127.8),
    ("MAR", 32.0, -6.0),
    ("MEX", 23.0, -102.0),
    ("NGA", 9.0, 8.0),
    ("NLD", 52.2, 5.5),
    ("NOR", 62.0, 10.0),
    ("NZL", -41.0, 174.0),
    ("PAK", 30.0, 70.0),
    ("PER", -10.0, -76.0),
    ("PHL", 13.0, 122.0),
    ("POL", 52.0, 19.0),
    ("PRT", 39.5, -8.0),
    ("ROU", 46.0, 25.0),
    ("RUS", 60.0, 90.0),
    ("SAU", 24.0, 45.0),
    ("SWE", 62.0, 15.0),
    ("THA", 15.0, 101.0),
    ("TUR", 39.0, 35.0),
    ("UKR", 49.0, 32.0),
    ("USA", 39.8, -98.6),
    ("VNM", 16.0, 106.0),
    ("ZAF", -29.0, 24.0),
];

/// Centroid for an ISO code, case-insensitive. `None` for unknown codes.
pub fn centroid(iso: &str) -> Option<(f64, f64)> {
    CENTROIDS
        .iter()
        .find(|(code, _, _)| code.eq_ignore_ascii_case(iso))
        .map(|(_, lat, lon)| (*lat, *lon))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Dataset;
    use crate::engine::fixtures::obs;

    #[test]
    fn latest_per_iso_with_cases() {
        let ds = Dataset::new(vec![
            obs("France", Some("Europe"), "2021-01-01").iso("FRA").metric(Metric::TotalCases, 10.0).build(),
            obs("France", Some("Europe"), "2021-01-02")
                .iso("FRA")
                .metric(Metric::TotalCases, 20.0)
                .metric(Metric::TotalDeaths, 1.0)
                .build(),
            // Newer but without cases: not eligible.
            obs("France", Some("Europe"), "2021-01-03").iso("FRA").build(),
            obs("Nowhere", Some("Europe"), "2021-01-03").metric(Metric::TotalCases, 5.0).build(),
        ]);
        let view = ds.view();
        let points = map_points(&view);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].iso_code, "FRA");
        assert_eq!(points[0].total_cases, 20.0);
        assert_eq!(points[0].cfr, Some(5.0));
        assert_eq!(points[0].total_vaccinations, None);
    }

    #[test]
    fn centroid_lookup() {
        assert_eq!(centroid("fra"), Some((46.0, 2.0)));
        assert_eq!(centroid("OWID_WRL"), None);
    }
}
