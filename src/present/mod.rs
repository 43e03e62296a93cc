//! Presentation adapter between engine outputs and a rendering surface.
//!
//! A surface declares which panels it has. The [`Presenter`] keeps one handle
//! per rendered panel and, on every recompute, replaces existing charts rather
//! than drawing over them. Panels the surface lacks are skipped silently.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::domain::{ChartSeries, MapPoint, PanelId};
use crate::plot::ascii::{render_map, render_series};

/// Something that can display chart panels.
pub trait ChartSurface {
    fn has_panel(&self, panel: PanelId) -> bool;

    fn render_series(&mut self, panel: PanelId, series: &ChartSeries);

    fn render_points(&mut self, points: &[MapPoint]);

    /// Drop whatever is drawn for `panel`. Surfaces that redraw from scratch
    /// can ignore this.
    fn destroy(&mut self, _panel: PanelId) {}
}

/// Live chart instance for one panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartHandle {
    /// Bumped each time the chart is replaced.
    pub generation: u64,
}

/// Drives recompute outputs into a surface, tracking live chart handles.
#[derive(Debug, Default)]
pub struct Presenter {
    handles: BTreeMap<PanelId, ChartHandle>,
}

impl Presenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self, panel: PanelId) -> Option<ChartHandle> {
        self.handles.get(&panel).copied()
    }

    /// Render one recompute's series and map points.
    ///
    /// Panels rendered last time but missing now (e.g. the country timeline
    /// after the selection is cleared) are destroyed.
    pub fn present(&mut self, surface: &mut dyn ChartSurface, series: &[ChartSeries], map: &[MapPoint]) {
        let mut shown = BTreeSet::new();
        for s in series {
            if self.show(surface, s.panel) {
                surface.render_series(s.panel, s);
                shown.insert(s.panel);
            }
        }
        if self.show(surface, PanelId::MapChart) {
            surface.render_points(map);
            shown.insert(PanelId::MapChart);
        }

        let stale: Vec<PanelId> = self.handles.keys().filter(|p| !shown.contains(p)).copied().collect();
        for panel in stale {
            surface.destroy(panel);
            self.handles.remove(&panel);
            debug!(%panel, "destroyed chart");
        }
    }

    fn show(&mut self, surface: &mut dyn ChartSurface, panel: PanelId) -> bool {
        if !surface.has_panel(panel) {
            debug!(%panel, "surface has no such panel; skipping");
            return false;
        }
        match self.handles.get_mut(&panel) {
            Some(handle) => {
                surface.destroy(panel);
                handle.generation += 1;
            }
            None => {
                self.handles.insert(panel, ChartHandle { generation: 0 });
            }
        }
        true
    }
}

/// Renders panels to text for the line-oriented commands.
#[derive(Debug, Clone)]
pub struct AsciiSurface {
    panels: BTreeSet<PanelId>,
    width: usize,
    height: usize,
    rendered: BTreeMap<PanelId, String>,
}

impl AsciiSurface {
    pub fn new(panels: impl IntoIterator<Item = PanelId>, width: usize, height: usize) -> Self {
        Self {
            panels: panels.into_iter().collect(),
            width,
            height,
            rendered: BTreeMap::new(),
        }
    }

    /// Surface with every panel.
    pub fn all(width: usize, height: usize) -> Self {
        Self::new(PanelId::ALL, width, height)
    }

    pub fn panel_text(&self, panel: PanelId) -> Option<&str> {
        self.rendered.get(&panel).map(String::as_str)
    }

    /// All rendered panels in panel order, blank-line separated.
    pub fn to_text(&self) -> String {
        self.rendered.values().cloned().collect::<Vec<_>>().join("\n")
    }
}

impl ChartSurface for AsciiSurface {
    fn has_panel(&self, panel: PanelId) -> bool {
        self.panels.contains(&panel)
    }

    fn render_series(&mut self, panel: PanelId, series: &ChartSeries) {
        self.rendered.insert(panel, render_series(series, self.width, self.height));
    }

    fn render_points(&mut self, points: &[MapPoint]) {
        self.rendered
            .insert(PanelId::MapChart, render_map(points, self.width, self.height));
    }

    fn destroy(&mut self, panel: PanelId) {
        self.rendered.remove(&panel);
    }
}
