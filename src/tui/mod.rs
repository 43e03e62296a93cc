//! Ratatui-based terminal dashboard.
//!
//! Layout: a filter card and a summary card on top, then a scrollable bento
//! grid of chart cards. Card order and size persist in the layout store.

use std::collections::BTreeMap;
use std::io;
use std::time::Duration;

use chrono::NaiveDate;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{
        Bar, BarChart, BarGroup, Block, Borders, List, ListItem, ListState, Paragraph,
        canvas::{Canvas, Map, MapResolution, Points},
    },
};
use tracing::{info, warn};

use crate::app::{Dashboard, load_dashboard};
use crate::cli::ViewArgs;
use crate::domain::{
    ChangeIndicator, ChartKind, ChartSeries, Choice, DashboardConfig, DashboardLayout, FilterSpec, MapPoint, PanelId, Rgb,
    Sentiment,
};
use crate::engine::map::centroid;
use crate::error::AppError;
use crate::io::layout::{KeyValueStore, default_layout, load_layout, reset_layout, save_layout};
use crate::present::{ChartSurface, Presenter};
use crate::report::number::{format_compact, format_number, format_percent};

mod bento;
mod plotters_chart;

use bento::{move_card, ordered_ids, pack, reconcile, resize_card};
use plotters_chart::SeriesPlot;

/// Start the TUI.
pub fn run(config: &DashboardConfig, view: &ViewArgs) -> Result<(), AppError> {
    // Load before taking over the terminal so load errors print normally.
    let dashboard = load_dashboard(config, view)?;
    let store = KeyValueStore::open(&config.store_path)?;
    let mut app = App::new(dashboard, store);

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal =
        Terminal::new(backend).map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// Chart panels currently on screen; the presenter's rendering surface.
#[derive(Debug, Default)]
struct PanelStore {
    panels: Vec<PanelId>,
    series: BTreeMap<PanelId, ChartSeries>,
    map: Vec<MapPoint>,
}

impl ChartSurface for PanelStore {
    fn has_panel(&self, panel: PanelId) -> bool {
        self.panels.contains(&panel)
    }

    fn render_series(&mut self, panel: PanelId, series: &ChartSeries) {
        self.series.insert(panel, series.clone());
    }

    fn render_points(&mut self, points: &[MapPoint]) {
        self.map = points.to_vec();
    }

    fn destroy(&mut self, panel: PanelId) {
        if panel == PanelId::MapChart {
            self.map.clear();
        }
        self.series.remove(&panel);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Filters,
    Summary,
    Card(PanelId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterField {
    Continent,
    Location,
    Start,
    End,
}

impl FilterField {
    const ALL: [FilterField; 4] = [FilterField::Continent, FilterField::Location, FilterField::Start, FilterField::End];

    fn index(self) -> usize {
        Self::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }
}

/// Filter values being edited; applied with `a`.
#[derive(Debug, Clone)]
struct FilterDraft {
    continent: Choice,
    location: Choice,
    start: NaiveDate,
    end: NaiveDate,
}

impl From<&FilterSpec> for FilterDraft {
    fn from(spec: &FilterSpec) -> Self {
        Self {
            continent: spec.continent.clone(),
            location: spec.location.clone(),
            start: spec.start,
            end: spec.end,
        }
    }
}

impl FilterDraft {
    fn to_spec(&self) -> FilterSpec {
        FilterSpec {
            continent: self.continent.clone(),
            location: self.location.clone(),
            start: self.start,
            end: self.end,
        }
    }
}

struct App {
    dashboard: Dashboard,
    store: KeyValueStore,
    layout: DashboardLayout,
    panels: PanelStore,
    presenter: Presenter,
    focus: Focus,
    field: FilterField,
    draft: FilterDraft,
    date_input: Option<String>,
    scroll: u16,
    body_height: u16,
    status: String,
}

impl App {
    fn new(dashboard: Dashboard, store: KeyValueStore) -> Self {
        let ids: Vec<&str> = PanelId::ALL.iter().map(|p| p.id()).collect();
        let fallback = default_layout(ids.iter().copied());
        let layout = reconcile(load_layout(&store), &ids, &fallback);

        let draft = FilterDraft::from(dashboard.filter());
        let mut app = Self {
            dashboard,
            store,
            layout,
            panels: PanelStore::default(),
            presenter: Presenter::new(),
            focus: Focus::Filters,
            field: FilterField::Continent,
            draft,
            date_input: None,
            scroll: 0,
            body_height: 0,
            status: "Ready.".to_string(),
        };
        app.present();
        app
    }

    /// Push the dashboard's latest outputs through the presenter.
    fn present(&mut self) {
        self.panels.panels = ordered_ids(&self.layout)
            .iter()
            .filter_map(|id| PanelId::from_id(id))
            .collect();
        let outputs = self.dashboard.outputs();
        self.presenter.present(&mut self.panels, &outputs.series, &outputs.map);
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns true when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.date_input.is_some() {
            self.handle_date_edit(code);
            return false;
        }

        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Tab => self.cycle_focus(1),
            KeyCode::BackTab => self.cycle_focus(-1),
            KeyCode::Up if self.focus == Focus::Filters => self.step_field(-1),
            KeyCode::Down if self.focus == Focus::Filters => self.step_field(1),
            KeyCode::Left if self.focus == Focus::Filters => self.cycle_value(-1),
            KeyCode::Right if self.focus == Focus::Filters => self.cycle_value(1),
            KeyCode::Enter if self.focus == Focus::Filters => self.begin_date_edit(),
            KeyCode::Char('a') => self.apply_draft(),
            KeyCode::Char('x') => {
                self.dashboard.reset_filters();
                self.draft = FilterDraft::from(self.dashboard.filter());
                self.present();
                self.status = "Filters reset.".to_string();
            }
            KeyCode::Char('m') => {
                let mode = self.dashboard.mode().next();
                self.dashboard.set_summary_mode(mode);
                self.present();
                self.status = format!("Summary mode: {}", mode.display_name());
            }
            KeyCode::Char('u') => {
                let unit = self.dashboard.unit().next();
                self.dashboard.set_display_unit(unit);
                self.present();
                self.status = format!("Display unit: {}", unit.display_name());
            }
            KeyCode::Char('c') => self.cycle_country(1),
            KeyCode::Char('C') => self.cycle_country(-1),
            KeyCode::Char('[') => self.move_focused(-1),
            KeyCode::Char(']') => self.move_focused(1),
            KeyCode::Char('<') => self.resize_focused(-1, 0),
            KeyCode::Char('>') => self.resize_focused(1, 0),
            KeyCode::Char('+') => self.resize_focused(0, 2),
            KeyCode::Char('-') => self.resize_focused(0, -2),
            KeyCode::Char('L') => self.reset_layout(),
            KeyCode::PageDown => self.scroll = self.scroll.saturating_add((self.body_height / 2).max(1)),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub((self.body_height / 2).max(1)),
            _ => {}
        }
        false
    }

    fn focus_order(&self) -> Vec<Focus> {
        let mut order = vec![Focus::Filters, Focus::Summary];
        order.extend(
            ordered_ids(&self.layout)
                .iter()
                .filter_map(|id| PanelId::from_id(id))
                .map(Focus::Card),
        );
        order
    }

    fn cycle_focus(&mut self, delta: isize) {
        let order = self.focus_order();
        let pos = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        let next = (pos as isize + delta).rem_euclid(order.len() as isize) as usize;
        self.focus = order[next];
    }

    fn step_field(&mut self, delta: isize) {
        let n = FilterField::ALL.len() as isize;
        let next = (self.field.index() as isize + delta).rem_euclid(n) as usize;
        self.field = FilterField::ALL[next];
    }

    fn cycle_value(&mut self, delta: isize) {
        let index = self.dashboard.index();
        match self.field {
            FilterField::Continent => {
                let options: Vec<String> = index.continents.iter().cloned().collect();
                self.draft.continent = cycle_choice(&self.draft.continent, &options, delta);
                // The location list depends on the continent.
                self.draft.location = Choice::All;
            }
            FilterField::Location => {
                let options = match self.draft.continent.as_only() {
                    Some(continent) => index.countries_in(continent),
                    None => index.locations.iter().cloned().collect(),
                };
                self.draft.location = cycle_choice(&self.draft.location, &options, delta);
            }
            FilterField::Start => self.draft.start = shift_day(self.draft.start, delta),
            FilterField::End => self.draft.end = shift_day(self.draft.end, delta),
        }
        self.status = "Filter changed; press a to apply.".to_string();
    }

    fn begin_date_edit(&mut self) {
        let current = match self.field {
            FilterField::Start => self.draft.start,
            FilterField::End => self.draft.end,
            _ => return,
        };
        self.date_input = Some(current.format("%Y-%m-%d").to_string());
        self.status = "Editing date (YYYY-MM-DD). Enter to accept, Esc to cancel.".to_string();
    }

    fn handle_date_edit(&mut self, code: KeyCode) {
        let Some(input) = self.date_input.as_mut() else {
            return;
        };
        match code {
            KeyCode::Esc => {
                self.date_input = None;
                self.status = "Date edit canceled.".to_string();
            }
            KeyCode::Enter => {
                let text = input.trim().to_string();
                self.date_input = None;
                match NaiveDate::parse_from_str(&text, "%Y-%m-%d") {
                    Ok(date) => {
                        match self.field {
                            FilterField::Start => self.draft.start = date,
                            _ => self.draft.end = date,
                        }
                        self.status = "Date set; press a to apply.".to_string();
                    }
                    Err(e) => self.status = format!("Invalid date '{text}': {e}"),
                }
            }
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Char(c) if c.is_ascii_digit() || c == '-' => input.push(c),
            _ => {}
        }
    }

    fn apply_draft(&mut self) {
        let spec = self.draft.to_spec();
        let inverted = spec.start > spec.end;
        self.dashboard.apply_filters(spec);
        self.present();
        let rows = self.dashboard.outputs().view_rows;
        info!(rows, "filters applied");
        self.status = if inverted {
            "Start date is after end date; nothing matches.".to_string()
        } else {
            format!("Applied: {} ({rows} rows).", self.dashboard.outputs().summary.selection)
        };
    }

    fn cycle_country(&mut self, delta: isize) {
        let names: Vec<String> = self.dashboard.outputs().countries.iter().map(|c| c.name.clone()).collect();
        if names.is_empty() {
            self.status = "No countries in the current view.".to_string();
            return;
        }
        let current = self.dashboard.selected_country().map(|c| Choice::Only(c.to_string())).unwrap_or_default();
        let next = cycle_choice(&current, &names, delta);
        self.dashboard.select_country(next.as_only().map(str::to_string));
        self.present();
        self.status = match next.as_only() {
            Some(name) => format!("Country: {name}"),
            None => "Country cleared.".to_string(),
        };
    }

    fn focused_card(&self) -> Option<&'static str> {
        match self.focus {
            Focus::Card(panel) => Some(panel.id()),
            _ => None,
        }
    }

    fn move_focused(&mut self, delta: isize) {
        let Some(id) = self.focused_card() else {
            self.status = "Focus a chart card (Tab) to move it.".to_string();
            return;
        };
        if move_card(&mut self.layout, id, delta) {
            self.persist_layout();
        }
    }

    fn resize_focused(&mut self, d_span: i16, d_height: i16) {
        let Some(id) = self.focused_card() else {
            self.status = "Focus a chart card (Tab) to resize it.".to_string();
            return;
        };
        if resize_card(&mut self.layout, id, d_span, d_height) {
            self.persist_layout();
        } else {
            self.status = "Card is at its size limit.".to_string();
        }
    }

    fn persist_layout(&mut self) {
        match save_layout(&mut self.store, &self.layout) {
            Ok(()) => self.status = "Layout saved.".to_string(),
            Err(e) => {
                warn!(error = %e, "failed to save layout");
                self.status = format!("Layout not saved: {e}");
            }
        }
    }

    fn reset_layout(&mut self) {
        if let Err(e) = reset_layout(&mut self.store) {
            warn!(error = %e, "failed to reset layout");
        }
        self.layout = default_layout(PanelId::ALL.iter().map(|p| p.id()));
        self.present();
        self.scroll = 0;
        self.status = "Layout reset.".to_string();
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(10), Constraint::Min(0), Constraint::Length(3)])
            .split(frame.area());

        let top = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(chunks[0]);

        self.draw_filters(frame, top[0]);
        self.draw_summary(frame, top[1]);
        self.draw_cards(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn card_block(&self, title: String, focus: Focus) -> Block<'static> {
        let style = if self.focus == focus {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        Block::default().title(title).borders(Borders::ALL).border_style(style)
    }

    fn draw_filters(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let pending = self.draft.to_spec() != *self.dashboard.filter();

        let date_value = |field: FilterField, date: NaiveDate| match (&self.date_input, self.field == field) {
            (Some(input), true) => format!("{input}_"),
            _ => date.to_string(),
        };
        let items = vec![
            ListItem::new(format!("Continent: {}", self.draft.continent)),
            ListItem::new(format!("Location:  {}", self.draft.location)),
            ListItem::new(format!("Start:     {}", date_value(FilterField::Start, self.draft.start))),
            ListItem::new(format!("End:       {}", date_value(FilterField::End, self.draft.end))),
        ];

        let title = if pending { "Filters (press a to apply)" } else { "Filters" };
        let list = List::new(items)
            .block(self.card_block(title.to_string(), Focus::Filters))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        if self.focus == Focus::Filters {
            state.select(Some(self.field.index()));
        }
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_summary(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let s = &self.dashboard.outputs().summary;
        let gray = Style::default().fg(Color::Gray);

        let mut lines = vec![Line::from(vec![
            Span::styled(s.selection.clone(), Style::default().fg(Color::Cyan)),
            Span::styled(
                format!(
                    " | {} | {} | updated {}",
                    s.mode.display_name(),
                    s.unit.display_name(),
                    s.last_updated.map(|d| d.to_string()).unwrap_or_else(|| "N/A".to_string())
                ),
                gray,
            ),
        ])];
        for (name, value, change) in [
            ("Cases", &s.cases, &s.cases_change),
            ("Deaths", &s.deaths, &s.deaths_change),
            ("Vaccinations", &s.vaccinations, &s.vaccinations_change),
        ] {
            lines.push(Line::from(vec![
                Span::raw(format!("{name:<13} {:>16}  ", value.text)),
                change_span(change),
            ]));
        }
        lines.push(Line::from(Span::raw(format!("{:<13} {:>16}", "Tests", s.tests.text))));
        lines.push(Line::from(Span::styled(
            format!("CFR {}  |  Positivity {}", s.cfr_text, s.positivity_text),
            gray,
        )));
        if let Some(card) = &self.dashboard.outputs().country {
            lines.push(Line::from(Span::styled(
                format!(
                    "{}: {} cases, CFR {}",
                    card.location,
                    card.total_cases.map(format_number).unwrap_or_else(|| "N/A".to_string()),
                    card.cfr.map(|c| format_percent(c, 2)).unwrap_or_else(|| "N/A".to_string())
                ),
                Style::default().fg(Color::Cyan),
            )));
        }

        let p = Paragraph::new(Text::from(lines)).block(self.card_block("Summary".to_string(), Focus::Summary));
        frame.render_widget(p, area);
    }

    fn draw_cards(&mut self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        self.body_height = area.height;
        let (placements, total) = pack(&self.layout, area.width);

        // Keep the focused card in view.
        if let Some(id) = self.focused_card() {
            if let Some(p) = placements.iter().find(|p| p.id == id) {
                if p.y < self.scroll {
                    self.scroll = p.y;
                } else if p.y + p.height > self.scroll + area.height {
                    self.scroll = (p.y + p.height).saturating_sub(area.height).min(p.y);
                }
            }
        }
        self.scroll = self.scroll.min(total.saturating_sub(1));

        for p in &placements {
            let top = p.y as i32 - self.scroll as i32;
            let bottom = top + p.height as i32;
            if bottom <= 0 || top >= area.height as i32 {
                continue;
            }
            let y0 = top.max(0) as u16;
            let y1 = (bottom as u16).min(area.height);
            let rect = Rect {
                x: area.x + p.x,
                y: area.y + y0,
                width: p.width,
                height: y1 - y0,
            };
            if let Some(panel) = PanelId::from_id(&p.id) {
                self.draw_card(frame, rect, panel);
            }
        }
    }

    fn draw_card(&self, frame: &mut ratatui::Frame<'_>, area: Rect, panel: PanelId) {
        let title = self
            .panels
            .series
            .get(&panel)
            .map(|s| s.title.clone())
            .unwrap_or_else(|| panel.title().to_string());
        let block = self.card_block(title, Focus::Card(panel));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        match panel {
            PanelId::MapChart => draw_map(frame, inner, &self.panels.map),
            PanelId::CountryTimeline => self.draw_country(frame, inner),
            _ => match self.panels.series.get(&panel) {
                Some(series) => draw_series(frame, inner, series),
                None => draw_hint(frame, inner, "No data for the current filters."),
            },
        }
    }

    fn draw_country(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let outputs = self.dashboard.outputs();
        let (Some(card), Some(series)) = (&outputs.country, self.panels.series.get(&PanelId::CountryTimeline))
        else {
            draw_hint(frame, area, "No country selected. Press c / C to choose one.");
            return;
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Min(0)])
            .split(area);
        let opt = |v: Option<f64>| v.map(format_number).unwrap_or_else(|| "N/A".to_string());
        let text = vec![
            Line::from(format!(
                "Cases {}  Deaths {}  Fully vaccinated {}",
                opt(card.total_cases),
                opt(card.total_deaths),
                opt(card.people_fully_vaccinated)
            )),
            Line::from(format!(
                "CFR {}  Vaccination rate {}  as of {}",
                card.cfr.map(|c| format_percent(c, 2)).unwrap_or_else(|| "N/A".to_string()),
                card.fully_vaccinated_rate
                    .map(|r| format_percent(r, 2))
                    .unwrap_or_else(|| "N/A".to_string()),
                card.date
            )),
        ];
        frame.render_widget(Paragraph::new(text).style(Style::default().fg(Color::Gray)), chunks[0]);
        draw_series(frame, chunks[1], series);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "Tab focus  ←/→ change  Enter date  a apply  x reset  m mode  u unit  c/C country  [ ] move  < > + - size  L layout  PgUp/PgDn  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn change_span(change: &ChangeIndicator) -> Span<'static> {
    let color = match change.sentiment {
        Sentiment::Good => Color::Green,
        Sentiment::Bad => Color::Red,
        Sentiment::Neutral => Color::Gray,
    };
    Span::styled(change.text.clone(), Style::default().fg(color))
}

fn draw_hint(frame: &mut ratatui::Frame<'_>, area: Rect, text: &str) {
    frame.render_widget(
        Paragraph::new(text.to_string()).style(Style::default().fg(Color::Yellow)),
        area,
    );
}

fn draw_series(frame: &mut ratatui::Frame<'_>, area: Rect, series: &ChartSeries) {
    if series.is_empty() {
        draw_hint(frame, area, "No data for the current filters.");
        return;
    }
    match series.kind {
        ChartKind::Bar | ChartKind::HorizontalBar => draw_bars(frame, area, series),
        ChartKind::Line => frame.render_widget(SeriesPlot::lines(series), area),
        ChartKind::Scatter => frame.render_widget(SeriesPlot::scatter(series), area),
    }
}

/// Bar values are scaled to integers for the widget; the text shows the real value.
fn draw_bars(frame: &mut ratatui::Frame<'_>, area: Rect, series: &ChartSeries) {
    const SCALE: f64 = 100.0;
    let values = series.primary_values();
    let bars: Vec<Bar> = series
        .labels
        .iter()
        .zip(values)
        .map(|(label, &v)| {
            Bar::default()
                .label(Line::from(label.clone()))
                .value((v.max(0.0) * SCALE).round() as u64)
                .text_value(format_compact(v))
        })
        .collect();

    let rgb = series.datasets.first().map(|d| d.style.color).unwrap_or(Rgb::BLUE);
    let mut chart = BarChart::default()
        .data(BarGroup::default().bars(&bars))
        .bar_style(Style::default().fg(Color::Rgb(rgb.0, rgb.1, rgb.2)))
        .value_style(Style::default().fg(Color::Black).bg(Color::Rgb(rgb.0, rgb.1, rgb.2)))
        .bar_gap(1);

    if series.kind == ChartKind::HorizontalBar {
        chart = chart.direction(Direction::Horizontal).bar_width(1).bar_gap(0);
    } else {
        let n = bars.len().max(1) as u16;
        chart = chart.bar_width((area.width / n).saturating_sub(1).clamp(1, 12));
    }
    frame.render_widget(chart, area);
}

fn draw_map(frame: &mut ratatui::Frame<'_>, area: Rect, points: &[MapPoint]) {
    let max = points.iter().map(|p| p.total_cases).fold(0.0_f64, f64::max);
    let mut tiers: [Vec<(f64, f64)>; 3] = Default::default();
    for p in points {
        let Some((lat, lon)) = centroid(&p.iso_code) else {
            continue;
        };
        let share = if max > 0.0 { p.total_cases.ln_1p() / max.ln_1p() } else { 0.0 };
        let tier = match share {
            s if s > 0.9 => 2,
            s if s > 0.75 => 1,
            _ => 0,
        };
        tiers[tier].push((lon, lat));
    }

    let canvas = Canvas::default()
        .x_bounds([-180.0, 180.0])
        .y_bounds([-60.0, 85.0])
        .paint(|ctx| {
            ctx.draw(&Map {
                resolution: MapResolution::Low,
                color: Color::DarkGray,
            });
            ctx.layer();
            for (coords, color) in tiers.iter().zip([Color::Cyan, Color::Yellow, Color::Red]) {
                ctx.draw(&Points {
                    coords: coords.as_slice(),
                    color,
                });
            }
        });
    frame.render_widget(canvas, area);
}

/// Step through `All` followed by `options`, wrapping at both ends.
fn cycle_choice(current: &Choice, options: &[String], delta: isize) -> Choice {
    let slots = options.len() as isize + 1;
    let pos = match current.as_only() {
        Some(v) => options.iter().position(|o| o == v).map(|i| i as isize + 1).unwrap_or(0),
        None => 0,
    };
    let next = (pos + delta).rem_euclid(slots);
    if next == 0 {
        Choice::All
    } else {
        Choice::Only(options[(next - 1) as usize].clone())
    }
}

fn shift_day(date: NaiveDate, delta: isize) -> NaiveDate {
    let days = chrono::Days::new(delta.unsigned_abs() as u64);
    let shifted = if delta >= 0 { date.checked_add_days(days) } else { date.checked_sub_days(days) };
    shifted.unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn cycle_choice_wraps_through_all() {
        let opts = names(&["Asia", "Europe"]);
        let a = cycle_choice(&Choice::All, &opts, 1);
        assert_eq!(a, Choice::Only("Asia".into()));
        assert_eq!(cycle_choice(&Choice::Only("Europe".into()), &opts, 1), Choice::All);
        assert_eq!(cycle_choice(&Choice::All, &opts, -1), Choice::Only("Europe".into()));
        // Unknown current value restarts from All.
        assert_eq!(cycle_choice(&Choice::Only("Mars".into()), &opts, 1), Choice::Only("Asia".into()));
    }

    #[test]
    fn panel_store_tracks_presented_panels() {
        let mut store = PanelStore {
            panels: vec![PanelId::MapChart],
            ..Default::default()
        };
        assert!(store.has_panel(PanelId::MapChart));
        assert!(!store.has_panel(PanelId::CasesTimeline));
        store.render_points(&[]);
        store.destroy(PanelId::MapChart);
        assert!(store.map.is_empty());
    }

    #[test]
    fn shift_day_moves_both_ways() {
        let d = NaiveDate::from_ymd_opt(2021, 3, 1).unwrap();
        assert_eq!(shift_day(d, -1), NaiveDate::from_ymd_opt(2021, 2, 28).unwrap());
        assert_eq!(shift_day(d, 1), NaiveDate::from_ymd_opt(2021, 3, 2).unwrap());
    }
}
