//! Ratatui-based terminal dashboard.
//!
//! The screen shows a filter panel (year, round), the provenance banner, the
//! KPI cards, the participation chart and the candidate/region tables.
//!
//! The first frame renders placeholder figures without any I/O. Queries run
//! on a single worker thread fed by a channel; each request is tagged with a
//! generation number. The worker skips requests already superseded in its
//! queue, and a result whose generation is no longer current is dropped.

use std::io;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use plotters::style::RGBColor;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Row, Table},
};
use tracing::debug;

use crate::config::ProviderConfig;
use crate::dashboard::{DashboardData, format_fr_integer, overall_source};
use crate::data::ElectionProvider;
use crate::domain::{DataSource, Filters};
use crate::error::AppError;
use crate::filters::FilterContext;

mod plotters_chart;

use plotters_chart::ParticipationChart;

/// Start the TUI.
pub fn run(initial: Filters, config: &ProviderConfig) -> Result<(), AppError> {
    let provider = Arc::new(ElectionProvider::new(config)?);

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(initial, provider);
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

/// A dashboard query for one selection.
struct Request {
    generation: u64,
    filters: Filters,
}

/// A finished dashboard query.
struct Loaded {
    generation: u64,
    data: DashboardData,
}

/// Worker loop: answer the newest queued request, skipping older ones.
/// Returns when the UI drops its request sender.
fn serve_requests(provider: &ElectionProvider, requests: Receiver<Request>, results: Sender<Loaded>) {
    while let Ok(mut request) = requests.recv() {
        while let Ok(newer) = requests.try_recv() {
            debug!(skipped = request.generation, "superseded request skipped");
            request = newer;
        }
        let data = DashboardData::load(provider, request.filters);
        if results
            .send(Loaded {
                generation: request.generation,
                data,
            })
            .is_err()
        {
            return;
        }
    }
}

struct App {
    filters: FilterContext,
    filter_changes: Receiver<Filters>,
    data: DashboardData,
    /// Generation of the most recent query; older results are stale.
    generation: u64,
    loading: bool,
    requests_tx: Sender<Request>,
    results_rx: Receiver<Loaded>,
    selected_field: usize,
    status: String,
}

impl App {
    fn new(initial: Filters, provider: Arc<ElectionProvider>) -> Self {
        let mut filters = FilterContext::new(initial);
        let filter_changes = filters.subscribe();
        let (requests_tx, requests_rx) = mpsc::channel();
        let (results_tx, results_rx) = mpsc::channel();
        thread::spawn(move || serve_requests(&provider, requests_rx, results_tx));

        let mut app = Self {
            filters,
            filter_changes,
            data: DashboardData::placeholder(initial),
            generation: 0,
            loading: false,
            requests_tx,
            results_rx,
            selected_field: 0,
            status: String::new(),
        };
        app.request_fetch(initial);
        app
    }

    fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if self.pump() {
                needs_redraw = true;
            }

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

    /// Process pending filter changes and finished queries. Returns whether
    /// anything visible changed.
    fn pump(&mut self) -> bool {
        let mut changed = false;

        // Only the latest selection matters when several changes queued up.
        if let Some(filters) = self.filter_changes.try_iter().last() {
            self.request_fetch(filters);
            changed = true;
        }

        while let Ok(loaded) = self.results_rx.try_recv() {
            changed |= self.accept(loaded);
        }

        changed
    }

    fn request_fetch(&mut self, filters: Filters) {
        self.generation += 1;
        self.loading = true;
        self.status = format!("Chargement {} / tour {}...", filters.year, filters.round);

        let request = Request {
            generation: self.generation,
            filters,
        };
        if self.requests_tx.send(request).is_err() {
            self.loading = false;
            self.status = "Chargement impossible: le worker s'est arrêté.".to_string();
        }
    }

    fn accept(&mut self, loaded: Loaded) -> bool {
        if loaded.generation != self.generation {
            debug!(
                generation = loaded.generation,
                current = self.generation,
                "dropping stale dashboard result"
            );
            return false;
        }
        self.loading = false;
        self.status = match overall_source(&loaded.data) {
            DataSource::Real => "Données à jour.".to_string(),
            DataSource::Simulated => "Données simulées (sources injoignables ou invalides).".to_string(),
        };
        self.data = loaded.data;
        true
    }

    /// Returns `true` when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up => {
                if self.selected_field > 0 {
                    self.selected_field -= 1;
                }
            }
            KeyCode::Down => {
                if self.selected_field < 1 {
                    self.selected_field += 1;
                }
            }
            KeyCode::Left => self.adjust_field(-1),
            KeyCode::Right => self.adjust_field(1),
            KeyCode::Tab | KeyCode::Char('t') => self.filters.toggle_round(),
            KeyCode::Char('f') => {
                let filters = self.filters.current();
                self.request_fetch(filters);
            }
            KeyCode::Char('e') => self.export(),
            _ => {}
        }
        false
    }

    fn adjust_field(&mut self, delta: i32) {
        match self.selected_field {
            0 => {
                if delta >= 0 {
                    self.filters.next_year();
                } else {
                    self.filters.prev_year();
                }
            }
            1 => self.filters.toggle_round(),
            _ => {}
        }
    }

    fn export(&mut self) {
        let today = chrono::Local::now().date_naive();
        self.status = match crate::io::write_report(
            std::path::Path::new("."),
            &self.data,
            today,
            crate::io::ReportFormat::Markdown,
        ) {
            Ok(path) => format!("Rapport écrit: {}", path.display()),
            Err(err) => format!("Export impossible: {err}"),
        };
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_kpis(frame, chunks[1]);
        self.draw_body(frame, chunks[2]);
        self.draw_footer(frame, chunks[3]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let filters = self.data.filters;
        let source = self.data.stats.data_source;
        let banner_color = match source {
            DataSource::Real => Color::Green,
            DataSource::Simulated => Color::Yellow,
        };

        let lines = vec![
            Line::from(vec![
                Span::styled("Indicium", Style::default().fg(Color::Cyan)),
                Span::raw(format!(
                    " | Présidentielle {} | {}",
                    filters.year,
                    filters.round.display_name()
                )),
            ]),
            Line::from(Span::styled(source.banner(), Style::default().fg(banner_color))),
        ];

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_kpis(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let n = self.data.kpis.len().max(1) as u32;
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints((0..n).map(|_| Constraint::Ratio(1, n)).collect::<Vec<_>>())
            .split(area);

        for (kpi, cell) in self.data.kpis.iter().zip(cells.iter()) {
            let p = Paragraph::new(Span::styled(
                kpi.value.as_str(),
                Style::default().add_modifier(Modifier::BOLD),
            ))
            .block(Block::default().title(kpi.title.as_str()).borders(Borders::ALL));
            frame.render_widget(p, *cell);
        }
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(42), Constraint::Min(0)])
            .split(area);

        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0)])
            .split(columns[0]);
        self.draw_filters(frame, left[0]);
        self.draw_candidates(frame, left[1]);

        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(columns[1]);
        self.draw_chart(frame, right[0]);
        self.draw_regions(frame, right[1]);
    }

    fn draw_filters(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let current = self.filters.current();
        let items = vec![
            ListItem::new(format!("Année: {}", current.year)),
            ListItem::new(format!("Tour: {}", current.round.display_name())),
        ];

        let list = List::new(items)
            .block(Block::default().title("Filtres").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_candidates(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = self.data.candidates.iter().map(|c| {
            Row::new(vec![
                c.name.clone(),
                format_fr_integer(c.votes),
                format!("{:.1} %", c.percent),
            ])
        });
        let table = Table::new(
            rows,
            [Constraint::Min(16), Constraint::Length(12), Constraint::Length(7)],
        )
        .header(Row::new(vec!["Candidat", "Voix", "%"]).style(Style::default().fg(Color::Gray)))
        .block(Block::default().title("Résultats par candidat").borders(Borders::ALL));
        frame.render_widget(table, area);
    }

    fn draw_regions(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = self.data.regions.iter().map(|r| {
            Row::new(vec![
                r.name.clone(),
                format_fr_integer(r.macron),
                format_fr_integer(r.lepen),
                format!("{:.1} %", r.participation),
                r.winner.clone(),
            ])
        });
        let table = Table::new(
            rows,
            [
                Constraint::Min(24),
                Constraint::Length(12),
                Constraint::Length(12),
                Constraint::Length(8),
                Constraint::Length(16),
            ],
        )
        .header(
            Row::new(vec!["Région", "Macron", "Le Pen", "Partic.", "Gagnant"])
                .style(Style::default().fg(Color::Gray)),
        )
        .block(Block::default().title("Résultats par région").borders(Borders::ALL));
        frame.render_widget(table, area);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let title = format!(
            "Évolution de la participation ({})",
            self.data.history.data_source.label()
        );
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let (series, x_bounds, y_bounds) = chart_series(&self.data);
        if series.is_empty() {
            let msg = Paragraph::new("Aucune donnée de participation.")
                .style(Style::default().fg(Color::Yellow));
            frame.render_widget(msg, inner);
            return;
        }

        let widget = ParticipationChart {
            series: &series,
            x_bounds,
            y_bounds,
            line_color: RGBColor(0, 255, 255),
        };
        frame.render_widget(widget, inner);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ filtre  ←/→ changer  tab tour  f actualiser  e exporter  q quitter";
        let status_color = if self.loading { Color::Cyan } else { Color::Yellow };
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(status_color)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Participation points on a numeric year axis, plus padded bounds.
fn chart_series(data: &DashboardData) -> (Vec<(f64, f64)>, [f64; 2], [f64; 2]) {
    let series: Vec<(f64, f64)> = data
        .history
        .points
        .iter()
        .filter_map(|p| p.year.parse::<f64>().ok().map(|x| (x, p.participation)))
        .collect();

    let (mut x_min, mut x_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(x, y) in &series {
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }

    if !x_min.is_finite() || !x_max.is_finite() || x_max <= x_min {
        x_min = 2002.0;
        x_max = 2022.0;
    }
    if !y_min.is_finite() || !y_max.is_finite() || y_max <= y_min {
        y_min = 0.0;
        y_max = 100.0;
    }

    let pad = ((y_max - y_min).abs() * 0.1).max(1e-12);
    (series, [x_min, x_max], [y_min - pad, y_max + pad])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Payload, Transport};
    use crate::domain::{ElectionYear, Round};
    use crate::error::FetchError;

    struct Unreachable;

    impl Transport for Unreachable {
        fn get(&self, _url: &str, timeout: Duration) -> Result<Payload, FetchError> {
            Err(FetchError::Timeout(timeout))
        }
    }

    fn app() -> App {
        let config = ProviderConfig {
            sources: vec!["http://unreachable.invalid".to_string()],
            seed: Some(7),
            ..ProviderConfig::default()
        };
        App::new(
            Filters::default(),
            Arc::new(ElectionProvider::with_transport(&config, Unreachable)),
        )
    }

    fn wait_for_result(app: &mut App) {
        for _ in 0..200 {
            if app.pump() {
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("worker never delivered");
    }

    #[test]
    fn first_frame_is_placeholder_then_worker_result() {
        let mut app = app();
        assert_eq!(app.generation, 1);
        assert!(app.loading);
        assert_eq!(app.data.stats.participation, 67.1);

        wait_for_result(&mut app);
        assert!(!app.loading);
        assert_eq!(app.data.stats.data_source, DataSource::Simulated);
        assert_eq!(app.data.filters, Filters::default());
    }

    #[test]
    fn stale_results_are_dropped() {
        let mut app = app();
        let stale = Loaded {
            generation: app.generation,
            data: DashboardData::placeholder(Filters::default()),
        };

        app.handle_key(KeyCode::Right);
        app.pump();
        assert_eq!(app.generation, 2);

        assert!(!app.accept(stale));

        let fresh_filters = Filters {
            year: ElectionYear::Y2017,
            round: Round::Second,
        };
        let fresh = Loaded {
            generation: 2,
            data: DashboardData::placeholder(fresh_filters),
        };
        assert!(app.accept(fresh));
        assert_eq!(app.data.filters, fresh_filters);
    }

    #[test]
    fn keys_drive_the_filter_context() {
        let mut app = app();
        app.handle_key(KeyCode::Tab);
        assert_eq!(app.filters.current().round, Round::First);

        app.handle_key(KeyCode::Left);
        assert_eq!(app.filters.current().year, ElectionYear::Y2007);

        app.handle_key(KeyCode::Down);
        app.handle_key(KeyCode::Right);
        assert_eq!(app.filters.current().round, Round::Second);

        // Three changes queued, one query for the latest selection.
        app.pump();
        assert_eq!(app.generation, 2);
        assert!(app.handle_key(KeyCode::Char('q')));
    }

    #[test]
    fn worker_answers_only_the_newest_queued_request() {
        let config = ProviderConfig {
            sources: Vec::new(),
            seed: Some(3),
            ..ProviderConfig::default()
        };
        let provider = ElectionProvider::with_transport(&config, Unreachable);
        let (requests_tx, requests_rx) = mpsc::channel();
        let (results_tx, results_rx) = mpsc::channel();

        for (generation, year) in [(1, ElectionYear::Y2017), (2, ElectionYear::Y2012), (3, ElectionYear::Y2007)] {
            let filters = Filters {
                year,
                round: Round::Second,
            };
            requests_tx.send(Request { generation, filters }).unwrap();
        }
        drop(requests_tx);

        // Runs on this thread and returns once the queue is closed.
        serve_requests(&provider, requests_rx, results_tx);

        let delivered: Vec<Loaded> = results_rx.try_iter().collect();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].generation, 3);
        assert_eq!(delivered[0].data.filters.year, ElectionYear::Y2007);
    }

    #[test]
    fn chart_series_uses_numeric_years() {
        let data = DashboardData::placeholder(Filters::default());
        let (series, x, y) = chart_series(&data);
        assert_eq!(series.len(), 5);
        assert_eq!(x, [2002.0, 2022.0]);
        assert!(y[0] < 71.6 && y[1] > 83.8);
    }
}
