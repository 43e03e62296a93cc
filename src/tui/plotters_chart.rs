//! Plotters-powered line/scatter chart widget for Ratatui.
//!
//! Plotters gives nicer axes and tick labels than Ratatui's built-in `Chart`.
//! Output is drawn into the Ratatui buffer via `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::domain::{ChartSeries, Rgb, SeriesValues};
use crate::report::number::format_compact;

/// One polyline with its colour.
pub struct PlotLine {
    pub points: Vec<(f64, f64)>,
    pub color: Rgb,
}

/// Render-only chart description. Bounds are computed before rendering.
pub struct SeriesPlot<'a> {
    pub lines: Vec<PlotLine>,
    pub points: Vec<(f64, f64)>,
    pub point_color: Rgb,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    /// Category labels for index-based x axes; empty for numeric axes.
    pub x_ticks: &'a [String],
}

impl<'a> SeriesPlot<'a> {
    /// Line chart: one line per dataset, x = label index.
    pub fn lines(series: &'a ChartSeries) -> Self {
        let lines: Vec<PlotLine> = series
            .datasets
            .iter()
            .map(|d| PlotLine {
                points: d.as_values().iter().enumerate().map(|(i, &v)| (i as f64, v)).collect(),
                color: d.style.color,
            })
            .collect();
        let ys = lines.iter().flat_map(|l| l.points.iter().map(|p| p.1));
        let x_max = series.labels.len().saturating_sub(1).max(1) as f64;
        Self {
            y_bounds: padded_bounds(ys),
            lines,
            points: Vec::new(),
            point_color: Rgb::BLUE,
            x_bounds: [0.0, x_max],
            x_ticks: &series.labels,
        }
    }

    /// Scatter chart from every point dataset.
    pub fn scatter(series: &'a ChartSeries) -> Self {
        let points: Vec<(f64, f64)> = series
            .datasets
            .iter()
            .filter_map(|d| match &d.values {
                SeriesValues::Points(p) => Some(p.iter().map(|p| (p.x, p.y))),
                SeriesValues::Values(_) => None,
            })
            .flatten()
            .collect();
        let color = series.datasets.first().map(|d| d.style.color).unwrap_or(Rgb::PURPLE);
        Self {
            x_bounds: padded_bounds(points.iter().map(|p| p.0)),
            y_bounds: padded_bounds(points.iter().map(|p| p.1)),
            lines: Vec::new(),
            points,
            point_color: color,
            x_ticks: &[],
        }
    }
}

fn padded_bounds(values: impl Iterator<Item = f64>) -> [f64; 2] {
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for v in values.filter(|v| v.is_finite()) {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if !lo.is_finite() || !hi.is_finite() {
        return [0.0, 1.0];
    }
    if hi <= lo {
        return [lo - 1.0, hi + 1.0];
    }
    let pad = ((hi - lo) * 0.05).max(1e-12);
    [lo - pad, hi + pad]
}

fn color(rgb: Rgb) -> RGBColor {
    RGBColor(rgb.0, rgb.1, rgb.2)
}

fn category_label(labels: &[String], v: f64) -> String {
    if v < -0.5 {
        return String::new();
    }
    labels.get(v.round() as usize).cloned().unwrap_or_default()
}

impl<'a> Widget for SeriesPlot<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters may fail to lay out a chart in a tiny area; show a hint instead.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Card too small (resize with > or +).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                // Terminal cells are low-res, so keep label areas compact.
                .set_label_area_size(LabelAreaPosition::Left, 7)
                .set_label_area_size(LabelAreaPosition::Bottom, 2)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            let ticks = self.x_ticks;
            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_labels(4)
                .y_labels(4)
                .x_label_formatter(&|v| {
                    if ticks.is_empty() { format_compact(*v) } else { category_label(ticks, *v) }
                })
                .y_label_formatter(&|v| format_compact(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            for line in &self.lines {
                chart.draw_series(LineSeries::new(line.points.iter().copied(), &color(line.color)))?;
            }

            // `Circle` radii are mis-scaled by the ratatui backend; pixels stay crisp.
            let point_color = color(self.point_color);
            chart.draw_series(self.points.iter().map(|&(x, y)| Pixel::new((x, y), point_color)))?;

            Ok(())
        });

        widget.render(area, buf);
    }
}
