//! Formatted terminal output for the line-oriented commands.
//!
//! Formatting lives here so the engine stays free of presentation concerns
//! and output changes stay localized.

use crate::domain::{
    ChangeIndicator, ChartSeries, CountryDetail, CountryOption, DataSource, DisplayValue, SummaryResult,
};
use crate::io::ingest::IngestedData;
use crate::report::number::{format_number, format_percent};

/// Shown while the dataset is read or downloaded.
pub fn format_loading(source: &DataSource) -> String {
    match source {
        DataSource::Url(url) => format!("Loading {url} (downloading, this can take a while)..."),
        DataSource::Path(path) => format!("Loading {}...", path.display()),
    }
}

/// One-line dataset load summary.
pub fn format_ingest(ingest: &IngestedData) -> String {
    let mut out = format!(
        "Rows: read={} used={} skipped={}",
        ingest.rows_read,
        ingest.rows_used,
        ingest.row_errors.len()
    );
    if ingest.duplicates > 0 {
        out.push_str(&format!(" duplicates={}", ingest.duplicates));
    }
    out.push('\n');
    out
}

/// The summary card: headline figures, change indicators, rates.
pub fn format_summary(summary: &SummaryResult) -> String {
    let mut out = String::new();

    out.push_str("=== covid - COVID-19 Dashboard ===\n");
    out.push_str(&format!("Selection: {}\n", summary.selection));
    out.push_str(&format!(
        "Mode: {} | Unit: {}\n",
        summary.mode.display_name(),
        summary.unit.display_name()
    ));
    out.push_str(&format!(
        "Last updated: {}\n\n",
        summary
            .last_updated
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "N/A".to_string())
    ));

    out.push_str(&format!("{:<14} {:>18} {:>10}\n", "metric", "value", "change"));
    out.push_str(&format!("{:-<14} {:-<18} {:-<10}\n", "", "", ""));
    out.push_str(&summary_row("Cases", &summary.cases, Some(&summary.cases_change)));
    out.push_str(&summary_row("Deaths", &summary.deaths, Some(&summary.deaths_change)));
    out.push_str(&summary_row(
        "Vaccinations",
        &summary.vaccinations,
        Some(&summary.vaccinations_change),
    ));
    out.push_str(&summary_row("Tests", &summary.tests, None));
    out.push('\n');

    out.push_str(&format!("Case fatality rate: {}\n", summary.cfr_text));
    out.push_str(&format!("Test positivity:    {}\n", summary.positivity_text));
    out
}

fn summary_row(name: &str, value: &DisplayValue, change: Option<&ChangeIndicator>) -> String {
    let change = change.map(|c| format!("{} {}", arrow(c), c.text)).unwrap_or_default();
    format!("{name:<14} {:>18} {:>10}", value.text, change).trim_end().to_string() + "\n"
}

fn arrow(change: &ChangeIndicator) -> &'static str {
    use crate::domain::ChangeDirection;
    match change.direction {
        ChangeDirection::Up => "^",
        ChangeDirection::Down => "v",
        ChangeDirection::Flat => "=",
    }
}

/// Country detail card.
pub fn format_country_card(detail: &CountryDetail) -> String {
    let opt_number = |v: Option<f64>| v.map(format_number).unwrap_or_else(|| "N/A".to_string());
    let opt_percent = |v: Option<f64>| v.map(|r| format_percent(r, 2)).unwrap_or_else(|| "N/A".to_string());

    let mut out = format!("=== {} ===\n", detail.location);
    if let Some(iso) = &detail.iso_code {
        out.push_str(&format!("ISO code:                {iso}\n"));
    }
    out.push_str(&format!("As of:                   {}\n", detail.date));
    out.push_str(&format!("Total cases:             {}\n", opt_number(detail.total_cases)));
    out.push_str(&format!("Total deaths:            {}\n", opt_number(detail.total_deaths)));
    out.push_str(&format!(
        "People fully vaccinated: {}\n",
        opt_number(detail.people_fully_vaccinated)
    ));
    out.push_str(&format!("Case fatality rate:      {}\n", opt_percent(detail.cfr)));
    out.push_str(&format!(
        "Fully vaccinated:        {}\n",
        opt_percent(detail.fully_vaccinated_rate)
    ));
    out
}

/// Country list with ISO codes, for `covid country` without a match.
pub fn format_country_list(countries: &[CountryOption]) -> String {
    let mut out = String::new();
    for c in countries {
        out.push_str(&format!("{:<8} {}\n", c.iso_code, c.name));
    }
    out
}

/// Label/value table for one series (first dataset only).
pub fn format_series_table(series: &ChartSeries) -> String {
    let mut out = format!("{}\n", series.title);
    out.push_str(format!("{:<24} {:>16}\n", "label", series.axis_label).trim_end());
    out.push('\n');
    out.push_str(format!("{:-<24} {:-<16}\n", "", "").trim_end());
    out.push('\n');
    for (label, v) in series.labels.iter().zip(series.primary_values()) {
        out.push_str(&format!("{:<24} {:>16}\n", truncate(label, 24), format!("{v:.2}")));
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
