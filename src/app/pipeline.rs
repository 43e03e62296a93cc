//! Shared dashboard state used by both the line commands and the TUI.
//!
//! Every state change runs the same workflow:
//! filter -> view -> summary + series + map + country card
//!
//! The CLI and the TUI then only differ in presentation (printing vs widgets).

use tracing::{debug, info};

use crate::domain::{
    ChartSeries, CountryDetail, CountryOption, Dataset, DisplayUnit, FilterSpec, MapPoint, PanelId, SummaryMode,
    SummaryResult,
};
use crate::engine::filter::{apply, default_filter};
use crate::engine::index::{DatasetIndex, selectable_countries};
use crate::engine::map::map_points;
use crate::engine::series::{build_all, country_detail};
use crate::engine::stats::summarize;
use crate::error::AppError;

/// Everything one recompute produces.
#[derive(Debug, Clone)]
pub struct DashboardOutputs {
    pub view_rows: usize,
    pub summary: SummaryResult,
    pub series: Vec<ChartSeries>,
    pub map: Vec<MapPoint>,
    pub countries: Vec<CountryOption>,
    pub country: Option<CountryDetail>,
}

impl DashboardOutputs {
    pub fn series_for(&self, panel: PanelId) -> Option<&ChartSeries> {
        self.series.iter().find(|s| s.panel == panel)
    }
}

/// Loaded dataset plus the current selection and its outputs.
#[derive(Debug)]
pub struct Dashboard {
    dataset: Dataset,
    index: DatasetIndex,
    filter: FilterSpec,
    mode: SummaryMode,
    unit: DisplayUnit,
    selected_country: Option<String>,
    outputs: DashboardOutputs,
}

impl Dashboard {
    /// Index the dataset and compute outputs for the default filter.
    pub fn new(dataset: Dataset) -> Result<Self, AppError> {
        let index = DatasetIndex::build(&dataset);
        let filter = default_filter(&index).ok_or_else(|| AppError::new(3, "No data rows found in CSV"))?;
        info!(
            continents = index.continents.len(),
            locations = index.locations.len(),
            start = %filter.start,
            end = %filter.end,
            "dataset indexed"
        );
        let outputs = compute(&dataset, &index, &filter, SummaryMode::default(), DisplayUnit::default(), None);
        Ok(Self {
            dataset,
            index,
            filter,
            mode: SummaryMode::default(),
            unit: DisplayUnit::default(),
            selected_country: None,
            outputs,
        })
    }

    pub fn index(&self) -> &DatasetIndex {
        &self.index
    }

    pub fn filter(&self) -> &FilterSpec {
        &self.filter
    }

    pub fn mode(&self) -> SummaryMode {
        self.mode
    }

    pub fn unit(&self) -> DisplayUnit {
        self.unit
    }

    pub fn selected_country(&self) -> Option<&str> {
        self.selected_country.as_deref()
    }

    pub fn outputs(&self) -> &DashboardOutputs {
        &self.outputs
    }

    /// Replace the filter. An inverted or non-matching filter is valid and
    /// simply yields an empty view.
    pub fn apply_filters(&mut self, filter: FilterSpec) {
        debug!(
            continent = %filter.continent,
            location = %filter.location,
            start = %filter.start,
            end = %filter.end,
            "applying filters"
        );
        self.filter = filter;
        self.recompute();
    }

    pub fn reset_filters(&mut self) {
        if let Some(filter) = default_filter(&self.index) {
            self.filter = filter;
        }
        self.recompute();
    }

    pub fn select_country(&mut self, country: Option<String>) {
        self.selected_country = country.filter(|c| !c.trim().is_empty());
        self.recompute();
    }

    pub fn set_summary_mode(&mut self, mode: SummaryMode) {
        self.mode = mode;
        self.recompute();
    }

    pub fn set_display_unit(&mut self, unit: DisplayUnit) {
        self.unit = unit;
        self.recompute();
    }

    fn recompute(&mut self) {
        self.outputs = compute(
            &self.dataset,
            &self.index,
            &self.filter,
            self.mode,
            self.unit,
            self.selected_country.as_deref(),
        );
    }
}

fn compute(
    dataset: &Dataset,
    index: &DatasetIndex,
    filter: &FilterSpec,
    mode: SummaryMode,
    unit: DisplayUnit,
    country: Option<&str>,
) -> DashboardOutputs {
    let view = apply(dataset, filter);
    let outputs = DashboardOutputs {
        view_rows: view.len(),
        summary: summarize(&view, filter, mode, unit),
        series: build_all(&view, index, country),
        map: map_points(&view),
        countries: selectable_countries(&view),
        country: country.and_then(|c| country_detail(&view, c)),
    };
    debug!(rows = outputs.view_rows, series = outputs.series.len(), "recomputed outputs");
    outputs
}
