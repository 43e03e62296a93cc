//! Aggregation engine: dataset index, filtering, statistics and chart series.
//!
//! Everything here is a pure function of the loaded dataset and the current
//! filter. Nothing in this module touches the terminal or the filesystem.

pub mod filter;
pub mod index;
pub mod latest;
pub mod map;
pub mod period;
pub mod series;
pub mod stats;

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::NaiveDate;

    use crate::domain::{Metric, Observation};

    pub fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("fixture date")
    }

    pub struct ObsBuilder {
        row: Observation,
    }

    /// Start an observation for `location` on `day` (`YYYY-MM-DD`).
    pub fn obs(location: &str, continent: Option<&str>, day: &str) -> ObsBuilder {
        let mut row = Observation::new(location, date(day));
        row.continent = continent.map(str::to_string);
        ObsBuilder { row }
    }

    impl ObsBuilder {
        pub fn metric(mut self, metric: Metric, value: f64) -> Self {
            self.row.metrics.set(metric, Some(value));
            self
        }

        pub fn population(mut self, value: f64) -> Self {
            self.row.population = Some(value);
            self
        }

        pub fn iso(mut self, code: &str) -> Self {
            self.row.iso_code = Some(code.to_string());
            self
        }

        pub fn build(self) -> Observation {
            self.row
        }
    }
}
