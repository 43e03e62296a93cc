//! Shared domain types: observations, the dataset, filters and run configuration.
//!
//! Numeric fields are `Option<f64>` throughout. Absence is kept distinct from
//! zero so that each aggregation can decide whether a missing value sums as 0
//! or disqualifies the row.

use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Numeric columns carried by an observation (besides population).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    TotalCases,
    NewCases,
    TotalDeaths,
    NewDeaths,
    TotalTests,
    NewTests,
    TotalVaccinations,
    NewVaccinations,
    PeopleVaccinated,
    PeopleFullyVaccinated,
    TotalCasesPerMillion,
    NewCasesPerMillion,
    TotalDeathsPerMillion,
    NewDeathsPerMillion,
    TotalTestsPerThousand,
    NewTestsPerThousand,
    TotalVaccinationsPerHundred,
    PeopleVaccinatedPerHundred,
    PeopleFullyVaccinatedPerHundred,
}

impl Metric {
    pub const COUNT: usize = 19;

    pub const ALL: [Metric; Metric::COUNT] = [
        Metric::TotalCases,
        Metric::NewCases,
        Metric::TotalDeaths,
        Metric::NewDeaths,
        Metric::TotalTests,
        Metric::NewTests,
        Metric::TotalVaccinations,
        Metric::NewVaccinations,
        Metric::PeopleVaccinated,
        Metric::PeopleFullyVaccinated,
        Metric::TotalCasesPerMillion,
        Metric::NewCasesPerMillion,
        Metric::TotalDeathsPerMillion,
        Metric::NewDeathsPerMillion,
        Metric::TotalTestsPerThousand,
        Metric::NewTestsPerThousand,
        Metric::TotalVaccinationsPerHundred,
        Metric::PeopleVaccinatedPerHundred,
        Metric::PeopleFullyVaccinatedPerHundred,
    ];

    /// CSV column name (lowercase, as published in the OWID dataset).
    pub fn column(self) -> &'static str {
        match self {
            Metric::TotalCases => "total_cases",
            Metric::NewCases => "new_cases",
            Metric::TotalDeaths => "total_deaths",
            Metric::NewDeaths => "new_deaths",
            Metric::TotalTests => "total_tests",
            Metric::NewTests => "new_tests",
            Metric::TotalVaccinations => "total_vaccinations",
            Metric::NewVaccinations => "new_vaccinations",
            Metric::PeopleVaccinated => "people_vaccinated",
            Metric::PeopleFullyVaccinated => "people_fully_vaccinated",
            Metric::TotalCasesPerMillion => "total_cases_per_million",
            Metric::NewCasesPerMillion => "new_cases_per_million",
            Metric::TotalDeathsPerMillion => "total_deaths_per_million",
            Metric::NewDeathsPerMillion => "new_deaths_per_million",
            Metric::TotalTestsPerThousand => "total_tests_per_thousand",
            Metric::NewTestsPerThousand => "new_tests_per_thousand",
            Metric::TotalVaccinationsPerHundred => "total_vaccinations_per_hundred",
            Metric::PeopleVaccinatedPerHundred => "people_vaccinated_per_hundred",
            Metric::PeopleFullyVaccinatedPerHundred => "people_fully_vaccinated_per_hundred",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// Fixed-size table of optional metric values, indexed by `Metric`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Metrics {
    values: [Option<f64>; Metric::COUNT],
}

impl Metrics {
    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.values[metric.slot()]
    }

    pub fn set(&mut self, metric: Metric, value: Option<f64>) {
        self.values[metric.slot()] = value;
    }
}

/// One row of the source dataset, keyed by `(location, date)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub location: String,
    pub iso_code: Option<String>,
    /// `None` for aggregate pseudo-locations such as "World" or "Europe".
    pub continent: Option<String>,
    pub date: NaiveDate,
    pub population: Option<f64>,
    pub metrics: Metrics,
}

impl Observation {
    pub fn new(location: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            location: location.into(),
            iso_code: None,
            continent: None,
            date,
            population: None,
            metrics: Metrics::default(),
        }
    }

    pub fn metric(&self, metric: Metric) -> Option<f64> {
        self.metrics.get(metric)
    }

    /// Metric value with absence summed as zero.
    pub fn metric_or_zero(&self, metric: Metric) -> f64 {
        self.metrics.get(metric).unwrap_or(0.0)
    }

    /// Real countries carry a continent; aggregates ("World", "Asia", ...) do not.
    pub fn is_country(&self) -> bool {
        self.continent.is_some()
    }
}

/// The loaded dataset. Immutable after construction.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    rows: Vec<Observation>,
}

impl Dataset {
    pub fn new(rows: Vec<Observation>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// A view over every row, in input order.
    pub fn view(&self) -> FilteredView<'_> {
        FilteredView::new(self.rows.iter().collect())
    }
}

/// Read-only subsequence of a `Dataset`, in input order.
///
/// Views are rebuilt wholesale on every filter change and never mutated.
#[derive(Debug, Clone, Default)]
pub struct FilteredView<'a> {
    rows: Vec<&'a Observation>,
}

impl<'a> FilteredView<'a> {
    pub fn new(rows: Vec<&'a Observation>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[&'a Observation] {
        &self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Observation> + '_ {
        self.rows.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A filter value that is either the "all" sentinel or one concrete name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Choice {
    #[default]
    All,
    Only(String),
}

impl Choice {
    /// Parse a user-facing value; `"all"` (any case) and blanks mean `All`.
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            Choice::All
        } else {
            Choice::Only(trimmed.to_string())
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Choice::All)
    }

    pub fn as_only(&self) -> Option<&str> {
        match self {
            Choice::All => None,
            Choice::Only(v) => Some(v.as_str()),
        }
    }

    /// `All` matches everything (including absent values); `Only` needs equality.
    pub fn matches(&self, value: Option<&str>) -> bool {
        match self {
            Choice::All => true,
            Choice::Only(expected) => value == Some(expected.as_str()),
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::All => write!(f, "all"),
            Choice::Only(v) => write!(f, "{v}"),
        }
    }
}

/// Active filter: continent, location and an inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSpec {
    pub continent: Choice,
    pub location: Choice,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FilterSpec {
    /// Human-readable description of what the filter selects.
    pub fn selection_label(&self) -> String {
        match (&self.location, &self.continent) {
            (Choice::Only(location), _) => location.clone(),
            (Choice::All, Choice::Only(continent)) => format!("{continent} (All Countries)"),
            (Choice::All, Choice::All) => "Global".to_string(),
        }
    }
}

/// Which figures the summary card aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SummaryMode {
    /// Cumulative totals from each location's latest observation.
    #[default]
    Latest,
    /// Highest single-day sum of each `new_*` metric.
    Peak,
    /// Mean daily `new_*` sum, expressed per week.
    Average,
}

impl SummaryMode {
    pub const ALL: [SummaryMode; 3] = [SummaryMode::Latest, SummaryMode::Peak, SummaryMode::Average];

    pub fn display_name(self) -> &'static str {
        match self {
            SummaryMode::Latest => "Latest",
            SummaryMode::Peak => "Peak",
            SummaryMode::Average => "Weekly average",
        }
    }

    pub fn next(self) -> Self {
        match self {
            SummaryMode::Latest => SummaryMode::Peak,
            SummaryMode::Peak => SummaryMode::Average,
            SummaryMode::Average => SummaryMode::Latest,
        }
    }
}

/// How summary figures are scaled for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayUnit {
    #[default]
    Total,
    PerMillion,
    PerCapita,
}

impl DisplayUnit {
    pub fn display_name(self) -> &'static str {
        match self {
            DisplayUnit::Total => "Total",
            DisplayUnit::PerMillion => "Per million",
            DisplayUnit::PerCapita => "Per capita (%)",
        }
    }

    pub fn next(self) -> Self {
        match self {
            DisplayUnit::Total => DisplayUnit::PerMillion,
            DisplayUnit::PerMillion => DisplayUnit::PerCapita,
            DisplayUnit::PerCapita => DisplayUnit::Total,
        }
    }
}

/// Where the dataset comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Path(PathBuf),
    Url(String),
}

impl DataSource {
    /// `http://` and `https://` values are URLs; anything else is a file path.
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            DataSource::Url(trimmed.to_string())
        } else {
            DataSource::Path(PathBuf::from(trimmed))
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Path(p) => write!(f, "{}", p.display()),
            DataSource::Url(u) => write!(f, "{u}"),
        }
    }
}

pub const DEFAULT_DATA_PATH: &str = "data/owid-covid-data.csv";
pub const DEFAULT_STORE_PATH: &str = ".covid-dash/storage.json";

/// Resolved run configuration (CLI flags layered over `.env`/environment).
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub data: DataSource,
    pub store_path: PathBuf,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}
