//! ASCII plotting for terminal output.
//!
//! Fixed-size character grids, optimized for:
//! - quick visual checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Line charts draw each dataset with its own glyph (`*`, `+`, `x`, `o`);
//! bar charts are horizontal `#` bars; the map places `.`/`o`/`O`/`@` by
//! relative case count.

use crate::domain::{ChartKind, ChartSeries, MapPoint, SeriesValues};
use crate::engine::map::centroid;
use crate::report::number::{format_compact, format_number};

const LINE_GLYPHS: [char; 4] = ['*', '+', 'x', 'o'];

/// Render any chart series according to its kind.
pub fn render_series(series: &ChartSeries, width: usize, height: usize) -> String {
    let mut out = format!("== {} ==\n", series.title);
    if series.is_empty() {
        out.push_str("(no data for the current filters)\n");
        return out;
    }
    let body = match series.kind {
        ChartKind::Bar | ChartKind::HorizontalBar => render_bars(series, width),
        ChartKind::Line => render_lines(series, width, height),
        ChartKind::Scatter => render_scatter(series, width, height),
    };
    out.push_str(&body);
    out
}

fn render_bars(series: &ChartSeries, width: usize) -> String {
    let values = series.primary_values();
    let label_w = series.labels.iter().map(|l| l.chars().count()).max().unwrap_or(0).min(24);
    let max = values.iter().cloned().fold(0.0_f64, f64::max);
    let bar_w = width.saturating_sub(label_w + 14).max(5);

    let mut out = String::new();
    for (label, &v) in series.labels.iter().zip(values) {
        let len = if max > 0.0 && v > 0.0 {
            ((v / max) * bar_w as f64).round() as usize
        } else {
            0
        };
        let line = format!(
            "{:<label_w$} |{} {}",
            truncate(label, label_w),
            "#".repeat(len),
            format_value(v)
        );
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

fn render_lines(series: &ChartSeries, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);
    let n = series.labels.len();

    let all = series.datasets.iter().flat_map(|d| d.as_values().iter().copied());
    let (y_min, y_max) = value_range(all).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);
    let x_max = (n.max(2) - 1) as f64;

    let mut grid = vec![vec![' '; width]; height];
    for (d, glyph) in series.datasets.iter().zip(LINE_GLYPHS.iter().cycle()) {
        let pts: Vec<(usize, usize)> = d
            .as_values()
            .iter()
            .enumerate()
            .map(|(i, &v)| (map_x(i as f64, 0.0, x_max, width), map_y(v, y_min, y_max, height)))
            .collect();
        draw_polyline(&mut grid, &pts, *glyph);
    }

    let mut out = format!(
        "{}: [{}, {}]\n",
        series.axis_label,
        format_compact(y_min),
        format_compact(y_max)
    );
    push_grid(&mut out, grid);
    if let (Some(first), Some(last)) = (series.labels.first(), series.labels.last()) {
        let gap = width.saturating_sub(first.len() + last.len()).max(1);
        out.push_str(&format!("{first}{}{last}\n", " ".repeat(gap)));
    }
    out.push_str(&legend(series));
    out
}

fn render_scatter(series: &ChartSeries, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);
    let points: Vec<(f64, f64)> = series
        .datasets
        .iter()
        .filter_map(|d| match &d.values {
            SeriesValues::Points(p) => Some(p.iter().map(|p| (p.x, p.y))),
            SeriesValues::Values(_) => None,
        })
        .flatten()
        .collect();

    let (x_min, x_max) = pad_range_opt(value_range(points.iter().map(|p| p.0)));
    let (y_min, y_max) = pad_range_opt(value_range(points.iter().map(|p| p.1)));

    let mut grid = vec![vec![' '; width]; height];
    for &(x, y) in &points {
        grid[map_y(y, y_min, y_max, height)][map_x(x, x_min, x_max, width)] = 'o';
    }

    let mut out = format!(
        "x=[{}, {}] | {}=[{}, {}] | n={}\n",
        format_compact(x_min),
        format_compact(x_max),
        series.axis_label,
        format_compact(y_min),
        format_compact(y_max),
        points.len()
    );
    push_grid(&mut out, grid);
    out
}

/// Equirectangular dot map of total cases. Unknown ISO codes are skipped.
pub fn render_map(points: &[MapPoint], width: usize, height: usize) -> String {
    let width = width.max(20);
    let height = height.max(8);
    let max = points.iter().map(|p| p.total_cases).fold(0.0_f64, f64::max);

    let mut grid = vec![vec![' '; width]; height];
    let mut placed = 0usize;
    for p in points {
        let Some((lat, lon)) = centroid(&p.iso_code) else {
            continue;
        };
        let x = map_x(lon, -180.0, 180.0, width);
        let y = map_y(lat, -60.0, 85.0, height);
        grid[y][x] = magnitude_glyph(p.total_cases, max);
        placed += 1;
    }

    let mut out = format!("== Global Map == ({placed} of {} locations placed)\n", points.len());
    push_grid(&mut out, grid);
    out.push_str(&format!("@ = {} total cases\n", format_number(max)));
    out
}

fn magnitude_glyph(value: f64, max: f64) -> char {
    if max <= 0.0 || value <= 0.0 {
        return '.';
    }
    // Log scale: most countries are orders of magnitude below the maximum.
    let u = (value.ln_1p() / max.ln_1p()).clamp(0.0, 1.0);
    match u {
        u if u > 0.9 => '@',
        u if u > 0.75 => 'O',
        u if u > 0.5 => 'o',
        _ => '.',
    }
}

fn legend(series: &ChartSeries) -> String {
    let parts: Vec<String> = series
        .datasets
        .iter()
        .zip(LINE_GLYPHS.iter().cycle())
        .map(|(d, g)| format!("{g} {}", d.name))
        .collect();
    format!("{}\n", parts.join("  "))
}

fn format_value(v: f64) -> String {
    if v.fract() == 0.0 { format_number(v) } else { format!("{v:.2}") }
}

fn push_grid(out: &mut String, grid: Vec<Vec<char>>) {
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }
}

fn value_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values.filter(|v| v.is_finite()) {
        min = min.min(v);
        max = max.max(v);
    }
    if !(min.is_finite() && max.is_finite()) {
        return None;
    }
    if max > min { Some((min, max)) } else { Some((min - 1.0, max + 1.0)) }
}

fn pad_range_opt(range: Option<(f64, f64)>) -> (f64, f64) {
    let (min, max) = range.unwrap_or((0.0, 1.0));
    pad_range(min, max, 0.05)
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_polyline(grid: &mut [Vec<char>], pts: &[(usize, usize)], ch: char) {
    let mut prev = None;
    for &(x, y) in pts {
        match prev {
            Some((x0, y0)) => draw_line(grid, x0, y0, x, y, ch),
            None => grid[y][x] = ch,
        }
        prev = Some((x, y));
    }
}

/// Integer line drawing (Bresenham-ish). Earlier datasets keep their cells.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PanelId, Rgb, SeriesDataset};

    fn series(kind: ChartKind, labels: &[&str], values: Vec<f64>) -> ChartSeries {
        ChartSeries {
            panel: PanelId::CountryComparison,
            title: "T".into(),
            kind,
            axis_label: "Total Cases".into(),
            labels: labels.iter().map(|s| s.to_string()).collect(),
            datasets: vec![SeriesDataset::values("Total Cases", Rgb::BLUE, false, values)],
        }
    }

    #[test]
    fn bars_golden_snapshot() {
        let s = series(ChartKind::HorizontalBar, &["USA", "India"], vec![100.0, 50.0]);
        let txt = render_series(&s, 29, 5);
        let expected = concat!("== T ==\n", "USA   |0123456789 100\n", "India |##### 50\n");
        let expected = expected.replace("0123456789", &"#".repeat(10));
        assert_eq!(txt, expected);
    }

    #[test]
    fn line_golden_snapshot() {
        let s = series(ChartKind::Line, &["2021-01", "2021-02"], vec![0.0, 20.0]);
        let txt = render_series(&s, 10, 5);
        let expected = concat!(
            "Total Cases: [-1.00, 21]\n",
            "        **\n",
            "      **\n",
            "    **\n",
            "  **\n",
            "**\n",
            "2021-01 2021-02\n",
            "* Total Cases\n",
        );
        assert_eq!(txt, format!("== T ==\n{expected}"));
    }

    #[test]
    fn empty_series_says_so() {
        let s = series(ChartKind::Bar, &[], vec![]);
        assert!(render_series(&s, 40, 10).contains("no data"));
    }

    #[test]
    fn map_skips_unknown_codes() {
        let points = vec![
            MapPoint {
                location: "France".into(),
                iso_code: "FRA".into(),
                total_cases: 10.0,
                total_deaths: None,
                total_vaccinations: None,
                cfr: None,
            },
            MapPoint {
                location: "World".into(),
                iso_code: "OWID_WRL".into(),
                total_cases: 100.0,
                total_deaths: None,
                total_vaccinations: None,
                cfr: None,
            },
        ];
        let txt = render_map(&points, 40, 10);
        assert!(txt.contains("(1 of 2 locations placed)"));
    }
}
