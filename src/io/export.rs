//! Export chart series to JSON or CSV.
//!
//! Meant for spreadsheets or downstream scripts.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::WriterBuilder;
use serde::Serialize;

use crate::domain::{ChartSeries, CountryDetail, MapPoint, SeriesValues, SummaryResult};
use crate::error::AppError;

/// Everything one recompute produced, as written by `covid export`.
#[derive(Debug, Serialize)]
pub struct ExportBundle<'a> {
    pub summary: &'a SummaryResult,
    pub series: &'a [ChartSeries],
    pub map: &'a [MapPoint],
    pub country: Option<&'a CountryDetail>,
}

pub fn write_bundle_json(path: &Path, bundle: &ExportBundle<'_>) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(4, format!("Failed to create export '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, bundle)
        .map_err(|e| AppError::new(4, format!("Failed to write export JSON: {e}")))
}

/// Write one series to CSV.
///
/// Value series: one row per label, one column per dataset. Scatter series:
/// `dataset,label,x,y` rows.
pub fn write_series_csv<W: Write>(out: W, series: &ChartSeries) -> Result<(), AppError> {
    let err = |e: csv::Error| AppError::new(4, format!("Failed to write export CSV: {e}"));
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(out);

    let scatter = series
        .datasets
        .iter()
        .any(|d| matches!(d.values, SeriesValues::Points(_)));
    if scatter {
        wtr.write_record(["dataset", "label", "x", "y"]).map_err(err)?;
        for d in &series.datasets {
            if let SeriesValues::Points(points) = &d.values {
                for p in points {
                    wtr.write_record([d.name.clone(), p.label.clone(), p.x.to_string(), p.y.to_string()])
                        .map_err(err)?;
                }
            }
        }
    } else {
        let header = std::iter::once("label").chain(series.datasets.iter().map(|d| d.name.as_str()));
        wtr.write_record(header).map_err(err)?;
        for (i, label) in series.labels.iter().enumerate() {
            let mut record = vec![label.clone()];
            for d in &series.datasets {
                record.push(d.as_values().get(i).map(|v| v.to_string()).unwrap_or_default());
            }
            wtr.write_record(&record).map_err(err)?;
        }
    }

    wtr.flush()
        .map_err(|e| AppError::new(4, format!("Failed to write export CSV: {e}")))
}

pub fn write_series_csv_file(path: &Path, series: &ChartSeries) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(4, format!("Failed to create export '{}': {e}", path.display())))?;
    write_series_csv(file, series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChartKind, PanelId, Rgb, SeriesDataset};

    #[test]
    fn value_series_csv_has_one_column_per_dataset() {
        let series = ChartSeries {
            panel: PanelId::ContinentalWaves,
            title: "Waves".into(),
            kind: ChartKind::Line,
            axis_label: "New Cases".into(),
            labels: vec!["Jan 2021".into(), "Feb 2021".into()],
            datasets: vec![
                SeriesDataset::values("Europe", Rgb::BLUE, true, vec![1.0, 2.0]),
                SeriesDataset::values("North America", Rgb::GREEN, true, vec![3.0, 4.5]),
            ],
        };
        let mut buf = Vec::new();
        write_series_csv(&mut buf, &series).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "label,Europe,North America\nJan 2021,1,3\nFeb 2021,2,4.5\n");
    }

    #[test]
    fn scatter_labels_with_separators_are_quoted() {
        let series = ChartSeries {
            panel: PanelId::ContextualFactors,
            title: "Tests vs Cases".into(),
            kind: ChartKind::Scatter,
            axis_label: "Cases per Million".into(),
            labels: Vec::new(),
            datasets: vec![SeriesDataset {
                name: "Countries".into(),
                style: crate::domain::SeriesStyle {
                    color: Rgb::PURPLE,
                    fill: false,
                },
                values: SeriesValues::Points(vec![crate::domain::ScatterPoint {
                    x: 1.5,
                    y: 2.0,
                    label: "Korea, \"South\"\r\nRep".into(),
                }]),
            }],
        };
        let mut buf = Vec::new();
        write_series_csv(&mut buf, &series).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "dataset,label,x,y\nCountries,\"Korea, \"\"South\"\"\r\nRep\",1.5,2\n");

        // Reading it back yields the original label.
        let mut rdr = csv::Reader::from_reader(text.as_bytes());
        let row = rdr.records().next().unwrap().unwrap();
        assert_eq!(&row[1], "Korea, \"South\"\r\nRep");
    }
}
