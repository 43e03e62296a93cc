//! Output types produced by the aggregation engine and handed to presenters.
//!
//! All of these are owned values: they outlive the `FilteredView` they were
//! computed from, and serialize cleanly for exports.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::types::{DisplayUnit, SummaryMode};

/// A formatted figure plus the number behind it (if one is defined).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayValue {
    pub value: Option<f64>,
    pub text: String,
}

impl DisplayValue {
    pub fn unavailable() -> Self {
        Self {
            value: None,
            text: "N/A".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeDirection {
    Up,
    Down,
    Flat,
}

/// Whether a change is good news, bad news, or neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Good,
    Bad,
    Neutral,
}

/// Period-over-period indicator shown under a summary figure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeIndicator {
    /// `"54.5%"`, `"0%"`, `"N/A"`, `"Peak"` or `"Avg"`.
    pub text: String,
    /// Accumulated absolute difference over the period (latest mode only).
    pub delta: Option<f64>,
    pub percent: Option<f64>,
    pub direction: ChangeDirection,
    pub sentiment: Sentiment,
}

impl ChangeIndicator {
    /// A neutral label that carries no percentage ("Peak", "Avg").
    pub fn label(text: &str) -> Self {
        Self {
            text: text.to_string(),
            delta: None,
            percent: None,
            direction: ChangeDirection::Flat,
            sentiment: Sentiment::Neutral,
        }
    }
}

/// Raw (unscaled) figures the summary is built from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    pub cases: f64,
    pub deaths: f64,
    pub vaccinations: f64,
    pub tests: f64,
}

/// Output of the statistics calculator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryResult {
    pub mode: SummaryMode,
    pub unit: DisplayUnit,
    pub totals: Totals,
    pub population: f64,
    pub cases: DisplayValue,
    pub deaths: DisplayValue,
    pub vaccinations: DisplayValue,
    pub tests: DisplayValue,
    pub cfr: f64,
    pub cfr_text: String,
    pub positivity: f64,
    pub positivity_text: String,
    pub cases_change: ChangeIndicator,
    pub deaths_change: ChangeIndicator,
    pub vaccinations_change: ChangeIndicator,
    pub last_updated: Option<NaiveDate>,
    pub selection: String,
}

/// Chart panels the dashboard knows how to fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PanelId {
    CasesByContinent,
    CasesTimeline,
    VaccinationProgress,
    CountryComparison,
    MapChart,
    ContinentalWaves,
    TemporalEvolution,
    GeographicalComparison,
    PolicyImpact,
    ContextualFactors,
    CountryTimeline,
}

impl PanelId {
    pub const ALL: [PanelId; 11] = [
        PanelId::CasesByContinent,
        PanelId::CasesTimeline,
        PanelId::VaccinationProgress,
        PanelId::CountryComparison,
        PanelId::MapChart,
        PanelId::ContinentalWaves,
        PanelId::TemporalEvolution,
        PanelId::GeographicalComparison,
        PanelId::PolicyImpact,
        PanelId::ContextualFactors,
        PanelId::CountryTimeline,
    ];

    /// Stable identifier, also used as the layout key.
    pub fn id(self) -> &'static str {
        match self {
            PanelId::CasesByContinent => "cases-by-continent",
            PanelId::CasesTimeline => "cases-timeline",
            PanelId::VaccinationProgress => "vaccination-progress",
            PanelId::CountryComparison => "country-comparison",
            PanelId::MapChart => "map-chart",
            PanelId::ContinentalWaves => "continental-waves",
            PanelId::TemporalEvolution => "temporal-evolution",
            PanelId::GeographicalComparison => "geographical-comparison",
            PanelId::PolicyImpact => "policy-impact",
            PanelId::ContextualFactors => "contextual-factors",
            PanelId::CountryTimeline => "country-timeline",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        PanelId::ALL.into_iter().find(|p| p.id() == id)
    }

    pub fn title(self) -> &'static str {
        match self {
            PanelId::CasesByContinent => "Cases by Continent",
            PanelId::CasesTimeline => "Cases Timeline",
            PanelId::VaccinationProgress => "Vaccination Progress",
            PanelId::CountryComparison => "Top 10 Countries by Cases",
            PanelId::MapChart => "Global Map",
            PanelId::ContinentalWaves => "Continental Waves",
            PanelId::TemporalEvolution => "Case Growth Rate Over Time",
            PanelId::GeographicalComparison => "Top 10 Countries by Case Fatality Rate",
            PanelId::PolicyImpact => "Vaccination Impact on Death Rate",
            PanelId::ContextualFactors => "Tests vs. Cases Correlation",
            PanelId::CountryTimeline => "Monthly Trends",
        }
    }
}

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartKind {
    Bar,
    HorizontalBar,
    Line,
    Scatter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLUE: Rgb = Rgb(52, 152, 219);
    pub const GREEN: Rgb = Rgb(46, 204, 113);
    pub const RED: Rgb = Rgb(231, 76, 60);
    pub const YELLOW: Rgb = Rgb(241, 196, 15);
    pub const PURPLE: Rgb = Rgb(155, 89, 182);
}

/// Styling hints; the rendering side decides what to honour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesStyle {
    pub color: Rgb,
    pub fill: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SeriesValues {
    /// One value per chart label.
    Values(Vec<f64>),
    Points(Vec<ScatterPoint>),
}

impl SeriesValues {
    pub fn len(&self) -> usize {
        match self {
            SeriesValues::Values(v) => v.len(),
            SeriesValues::Points(p) => p.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesDataset {
    pub name: String,
    pub style: SeriesStyle,
    pub values: SeriesValues,
}

impl SeriesDataset {
    pub fn values(name: &str, color: Rgb, fill: bool, values: Vec<f64>) -> Self {
        Self {
            name: name.to_string(),
            style: SeriesStyle { color, fill },
            values: SeriesValues::Values(values),
        }
    }

    /// Value slice (empty for scatter datasets).
    pub fn as_values(&self) -> &[f64] {
        match &self.values {
            SeriesValues::Values(v) => v,
            SeriesValues::Points(_) => &[],
        }
    }
}

/// `{labels, datasets}` chart payload, ready for a rendering surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub panel: PanelId,
    pub title: String,
    pub kind: ChartKind,
    pub axis_label: String,
    pub labels: Vec<String>,
    pub datasets: Vec<SeriesDataset>,
}

impl ChartSeries {
    pub fn is_empty(&self) -> bool {
        self.datasets.iter().all(|d| d.values.is_empty())
    }

    /// First dataset's values; most charts only carry one.
    pub fn primary_values(&self) -> &[f64] {
        self.datasets.first().map(|d| d.as_values()).unwrap_or(&[])
    }
}

/// One location's figures for the map collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPoint {
    pub location: String,
    pub iso_code: String,
    pub total_cases: f64,
    pub total_deaths: Option<f64>,
    pub total_vaccinations: Option<f64>,
    pub cfr: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryOption {
    pub name: String,
    pub iso_code: String,
}

/// Latest figures for a single selected country.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryDetail {
    pub location: String,
    pub iso_code: Option<String>,
    pub date: NaiveDate,
    pub total_cases: Option<f64>,
    pub total_deaths: Option<f64>,
    pub people_fully_vaccinated: Option<f64>,
    pub cfr: Option<f64>,
    pub fully_vaccinated_rate: Option<f64>,
}

/// Persisted placement of one dashboard card.
///
/// `span` is in 12-column grid units, `height` in terminal rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardStyle {
    pub order: usize,
    pub span: u16,
    pub height: u16,
}

impl CardStyle {
    pub const GRID_COLUMNS: u16 = 12;
    pub const MIN_SPAN: u16 = 3;
    pub const MIN_HEIGHT: u16 = 6;
    pub const MAX_HEIGHT: u16 = 60;

    /// Clamp to the grid and to the minimum card size.
    pub fn clamped(self) -> Self {
        Self {
            order: self.order,
            span: self.span.clamp(Self::MIN_SPAN, Self::GRID_COLUMNS),
            height: self.height.clamp(Self::MIN_HEIGHT, Self::MAX_HEIGHT),
        }
    }
}

/// Card id -> style, as stored under the layout key.
pub type DashboardLayout = BTreeMap<String, CardStyle>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_ids_round_trip() {
        for panel in PanelId::ALL {
            assert_eq!(PanelId::from_id(panel.id()), Some(panel));
        }
        assert_eq!(PanelId::from_id("nope"), None);
    }

    #[test]
    fn card_style_enforces_minimum_size() {
        let s = CardStyle { order: 0, span: 1, height: 2 }.clamped();
        assert_eq!(s.span, CardStyle::MIN_SPAN);
        assert_eq!(s.height, CardStyle::MIN_HEIGHT);
        let s = CardStyle { order: 0, span: 40, height: 10 }.clamped();
        assert_eq!(s.span, CardStyle::GRID_COLUMNS);
        assert_eq!(s.height, 10);
    }
}
