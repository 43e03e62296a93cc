//! CSV ingest and normalization.
//!
//! Turns the OWID-style COVID-19 CSV into a `Dataset` of typed observations.
//!
//! Design goals:
//! - **Strict schema** for the key columns (`location`, `date`; exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Absence preserved**: an empty cell is an absent metric, never 0

use std::collections::{HashMap, HashSet};
use std::io::Read;

use chrono::NaiveDate;
use csv::StringRecord;
use tracing::{debug, info, warn};

use crate::domain::{DataSource, Dataset, Metric, Observation};
use crate::error::AppError;
use crate::io::fetch::open_source;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub location: Option<String>,
    pub message: String,
}

/// Ingest output: the dataset plus what happened along the way.
#[derive(Debug, Clone)]
pub struct IngestedData {
    pub dataset: Dataset,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
    /// Rows whose `(location, date)` pair was already seen.
    pub duplicates: usize,
}

/// Load the dataset from a file path or URL.
pub fn load_dataset(source: &DataSource) -> Result<IngestedData, AppError> {
    info!(source = %source, "loading dataset");
    let reader = open_source(source)?;
    let ingested = load_from_reader(reader)?;
    info!(
        rows_read = ingested.rows_read,
        rows_used = ingested.rows_used,
        row_errors = ingested.row_errors.len(),
        "dataset loaded"
    );
    Ok(ingested)
}

/// Parse CSV from any reader. Used directly by tests.
pub fn load_from_reader<R: Read>(input: R) -> Result<IngestedData, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();

    let columns = Columns::resolve(&build_header_map(&headers))?;

    let mut rows = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;
    let mut seen: HashSet<(String, NaiveDate)> = HashSet::new();
    let mut duplicates = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                rows_read += 1;
                row_errors.push(RowError {
                    line,
                    location: None,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };
        if record.iter().all(str::is_empty) {
            continue;
        }
        rows_read += 1;

        match parse_row(&record, &columns) {
            Ok(row) => {
                if !seen.insert((row.location.clone(), row.date)) {
                    duplicates += 1;
                }
                rows.push(row);
            }
            Err(message) => {
                debug!(line, %message, "skipping row");
                row_errors.push(RowError {
                    line,
                    location: get_cell(&record, Some(columns.location)).map(str::to_string),
                    message,
                });
            }
        }
    }

    if !row_errors.is_empty() {
        warn!(count = row_errors.len(), "skipped malformed rows");
    }
    if duplicates > 0 {
        warn!(duplicates, "duplicate (location, date) rows; the last one wins");
    }

    let rows_used = rows.len();
    if rows_used == 0 {
        return Err(AppError::new(3, "No data rows found in CSV"));
    }

    Ok(IngestedData {
        dataset: Dataset::new(rows),
        row_errors,
        rows_read,
        rows_used,
        duplicates,
    })
}

/// Column positions resolved once from the header.
struct Columns {
    location: usize,
    date: usize,
    iso_code: Option<usize>,
    continent: Option<usize>,
    population: Option<usize>,
    metrics: Vec<(Metric, usize)>,
}

impl Columns {
    fn resolve(header_map: &HashMap<String, usize>) -> Result<Self, AppError> {
        let required = |name: &str| {
            header_map
                .get(name)
                .copied()
                .ok_or_else(|| AppError::new(2, format!("Missing required column: `{name}`")))
        };
        Ok(Self {
            location: required("location")?,
            date: required("date")?,
            iso_code: header_map.get("iso_code").copied(),
            continent: header_map.get("continent").copied(),
            population: header_map.get("population").copied(),
            metrics: Metric::ALL
                .iter()
                .filter_map(|m| header_map.get(m.column()).map(|&idx| (*m, idx)))
                .collect(),
        })
    }
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports may prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn parse_row(record: &StringRecord, columns: &Columns) -> Result<Observation, String> {
    let location = get_cell(record, Some(columns.location)).ok_or("Missing required value: `location`")?;
    let date = parse_date(get_cell(record, Some(columns.date)).ok_or("Missing required value: `date`")?)?;

    let mut row = Observation::new(location, date);
    row.iso_code = get_cell(record, columns.iso_code).map(str::to_string);
    row.continent = get_cell(record, columns.continent).map(str::to_string);
    row.population = parse_opt_f64(record, columns.population, "population")?;
    for &(metric, idx) in &columns.metrics {
        row.metrics.set(metric, parse_opt_f64(record, Some(idx), metric.column())?);
    }
    Ok(row)
}

fn get_cell(record: &StringRecord, idx: Option<usize>) -> Option<&str> {
    record.get(idx?).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| format!("Invalid date '{s}'. Expected YYYY-MM-DD."))
}

fn parse_opt_f64(record: &StringRecord, idx: Option<usize>, name: &str) -> Result<Option<f64>, String> {
    let Some(s) = get_cell(record, idx) else {
        return Ok(None);
    };
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(format!("Invalid number '{s}' in `{name}`.")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(csv: &str) -> Result<IngestedData, AppError> {
        load_from_reader(csv.as_bytes())
    }

    #[test]
    fn parses_rows_and_keeps_absent_metrics() {
        let csv = "\u{feff}ISO_CODE,Continent,Location,Date,Total_Cases,New_Cases,Population\n\
                   FRA,Europe,France,2021-01-01,100,,67000000\n\
                   OWID_WRL,,World,2021-01-01,1000,10,\n";
        let data = load(csv).unwrap();
        assert_eq!(data.rows_used, 2);
        let rows = data.dataset.rows();
        assert_eq!(rows[0].iso_code.as_deref(), Some("FRA"));
        assert_eq!(rows[0].metric(Metric::TotalCases), Some(100.0));
        assert_eq!(rows[0].metric(Metric::NewCases), None);
        assert_eq!(rows[0].metric(Metric::TotalDeaths), None);
        assert_eq!(rows[1].continent, None);
        assert_eq!(rows[1].population, None);
    }

    #[test]
    fn missing_required_column_is_input_error() {
        let err = load("location,total_cases\nFrance,1\n").unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("date"));
    }

    #[test]
    fn bad_rows_are_skipped_and_reported() {
        let csv = "location,date,total_cases\n\
                   France,2021-01-01,10\n\
                   France,not-a-date,11\n\
                   Spain,2021-01-01,abc\n\
                   ,2021-01-01,3\n";
        let data = load(csv).unwrap();
        assert_eq!(data.rows_read, 4);
        assert_eq!(data.rows_used, 1);
        assert_eq!(data.row_errors.len(), 3);
        assert_eq!(data.row_errors[0].line, 3);
        assert_eq!(data.row_errors[1].location.as_deref(), Some("Spain"));
    }

    #[test]
    fn no_usable_rows_is_exit_code_3() {
        let err = load("location,date\n").unwrap_err();
        assert_eq!(err.exit_code(), 3);
        assert_eq!(err.message(), "No data rows found in CSV");
    }

    #[test]
    fn duplicates_are_kept_and_counted() {
        let csv = "location,date,total_cases\nFrance,2021-01-01,1\nFrance,2021-01-01,2\n";
        let data = load(csv).unwrap();
        assert_eq!(data.rows_used, 2);
        assert_eq!(data.duplicates, 1);
    }
}
