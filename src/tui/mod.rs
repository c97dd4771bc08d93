//! Ratatui-based terminal dashboard.
//!
//! The dashboard provides a selector panel for choosing an agent, the two
//! weeks to compare and an optional manager filter, then renders the summary
//! cards, the comparative detail table and the per-manager charts.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, TableState, Tabs},
    Terminal,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::app::view::{
    render_view, Detail, View, ViewModel, ViewState, EMPTY_SELECTION_MESSAGE, LOAD_FAILED_MESSAGE,
    NO_WEEKS_MESSAGE,
};
use crate::domain::{Dataset, SourceKey};
use crate::error::AppError;
use crate::io::DatasetCache;
use crate::report::{money, summary_cards};
use crate::snapshot;

mod plotters_chart;

use plotters_chart::{DonutChart, RankedBarChart};

const FIELD_AGENT: usize = 0;
const FIELD_CURRENT: usize = 1;
const FIELD_BASELINE: usize = 2;
const FIELD_MANAGERS: usize = 3;

/// Cells used by the amount bar in the detail table.
const TABLE_BAR_WIDTH: usize = 10;

/// Start the dashboard.
///
/// `state` seeds the selection; `None` starts from the dataset defaults.
pub fn run(source: SourceKey, cache: &'static DatasetCache, state: Option<ViewState>) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::terminal(format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(source, cache, state);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::terminal(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::terminal(format!("Failed to enter alternate screen: {e}")));
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Detail,
    Charts,
}

impl Tab {
    fn toggle(self) -> Self {
        match self {
            Tab::Detail => Tab::Charts,
            Tab::Charts => Tab::Detail,
        }
    }

    fn index(self) -> usize {
        match self {
            Tab::Detail => 0,
            Tab::Charts => 1,
        }
    }
}

struct App {
    source: SourceKey,
    cache: &'static DatasetCache,
    dataset: Arc<Dataset>,
    state: Option<ViewState>,
    view: View,
    selected_field: usize,
    manager_cursor: usize,
    tab: Tab,
    table_row: usize,
    status: String,
}

impl App {
    fn new(source: SourceKey, cache: &'static DatasetCache, state: Option<ViewState>) -> Self {
        let dataset = cache.get_or_load(&source);
        let state = state.or_else(|| ViewState::initial(&dataset));
        let status = if dataset.is_empty() {
            LOAD_FAILED_MESSAGE.to_string()
        } else {
            format!("Loaded {} rows.", dataset.len())
        };
        let mut app = Self {
            source,
            cache,
            dataset,
            state,
            view: View::LoadFailed,
            selected_field: FIELD_AGENT,
            manager_cursor: 0,
            tab: Tab::Detail,
            table_row: 0,
            status,
        };
        app.recompute();
        app
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::terminal(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::terminal(format!("Event poll error: {e}")))? {
                continue;
            }

            match event::read().map_err(|e| AppError::terminal(format!("Event read error: {e}")))? {
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

    /// Apply one key press. Returns `true` when the app should exit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up => {
                if self.selected_field > FIELD_AGENT {
                    self.selected_field -= 1;
                }
            }
            KeyCode::Down => {
                if self.selected_field < FIELD_MANAGERS {
                    self.selected_field += 1;
                }
            }
            KeyCode::Left => self.adjust_field(-1),
            KeyCode::Right => self.adjust_field(1),
            KeyCode::Char(' ') | KeyCode::Enter if self.selected_field == FIELD_MANAGERS => {
                self.toggle_cursor_manager();
            }
            KeyCode::Char('c') => {
                self.update_state(|s, _| s.clear_managers());
                self.status = "Manager filter cleared.".to_string();
            }
            KeyCode::Tab => self.tab = self.tab.toggle(),
            KeyCode::PageDown | KeyCode::Char('j') => self.scroll(10),
            KeyCode::PageUp | KeyCode::Char('k') => self.scroll(-10),
            KeyCode::Char('R') => self.reload(),
            KeyCode::Char('e') => self.export(),
            _ => {}
        }
        false
    }

    fn adjust_field(&mut self, delta: i32) {
        let Some(state) = &self.state else {
            return;
        };
        match self.selected_field {
            FIELD_AGENT => {
                let agents = snapshot::agents(&self.dataset);
                if let Some(agent) = cycle(&agents, &state.agent, delta).cloned() {
                    self.manager_cursor = 0;
                    self.update_state(|s, ds| s.with_agent(ds, &agent));
                    self.status = format!("agent: {agent}");
                }
            }
            FIELD_CURRENT => {
                let weeks = snapshot::weeks(&self.dataset, &state.agent);
                if let Some(week) = cycle(&weeks, &state.current_week, delta).cloned() {
                    self.update_state(|s, _| s.with_current_week(week.clone()));
                    self.status = format!("current week: {week}");
                }
            }
            FIELD_BASELINE => {
                let weeks = snapshot::weeks(&self.dataset, &state.agent);
                if let Some(week) = cycle(&weeks, &state.baseline_week, delta).cloned() {
                    self.update_state(|s, _| s.with_baseline_week(week.clone()));
                    self.status = format!("compare against: {week}");
                }
            }
            FIELD_MANAGERS => {
                let count = snapshot::managers(&self.dataset, &state.agent).len();
                if count > 0 {
                    let next = self.manager_cursor as i64 + i64::from(delta);
                    self.manager_cursor = next.rem_euclid(count as i64) as usize;
                }
            }
            _ => {}
        }
    }

    fn toggle_cursor_manager(&mut self) {
        let Some(state) = &self.state else {
            return;
        };
        let managers = snapshot::managers(&self.dataset, &state.agent);
        if let Some(manager) = managers.get(self.manager_cursor).cloned() {
            self.update_state(|s, _| s.toggle_manager(&manager));
            self.status = format!("toggled manager: {manager}");
        }
    }

    fn update_state(&mut self, f: impl FnOnce(&ViewState, &Dataset) -> ViewState) {
        if let Some(state) = &self.state {
            let next = f(state, &self.dataset);
            if next != *state {
                self.state = Some(next);
                self.table_row = 0;
                self.recompute();
            }
        }
    }

    fn recompute(&mut self) {
        self.view = match &self.state {
            Some(state) => render_view(state, &self.dataset),
            None => View::LoadFailed,
        };
    }

    fn scroll(&mut self, delta: i64) {
        let rows = match &self.view {
            View::Ready(ViewModel {
                detail: Some(detail), ..
            }) => detail.rows.len(),
            _ => 0,
        };
        if rows == 0 {
            self.table_row = 0;
            return;
        }
        let next = (self.table_row as i64 + delta).clamp(0, rows as i64 - 1);
        self.table_row = next as usize;
    }

    /// Operator refresh: drop the cached workbook and read it again.
    fn reload(&mut self) {
        self.cache.invalidate(&self.source);
        self.dataset = self.cache.get_or_load(&self.source);

        let keep_agent = self
            .state
            .as_ref()
            .map(|s| s.agent.clone())
            .filter(|agent| snapshot::agents(&self.dataset).contains(agent));
        self.state = match keep_agent {
            Some(agent) => Some(ViewState::for_agent(&self.dataset, agent)),
            None => ViewState::initial(&self.dataset),
        };
        self.manager_cursor = 0;
        self.table_row = 0;
        self.recompute();

        self.status = if self.dataset.is_empty() {
            LOAD_FAILED_MESSAGE.to_string()
        } else {
            format!("Reloaded {} rows.", self.dataset.len())
        };
        info!(source = %self.source, rows = self.dataset.len(), "reloaded from dashboard");
    }

    fn export(&mut self) {
        let View::Ready(model) = &self.view else {
            self.status = "Nothing to export.".to_string();
            return;
        };
        let Some(detail) = &model.detail else {
            self.status = EMPTY_SELECTION_MESSAGE.to_string();
            return;
        };

        let dir = PathBuf::from("exports");
        if let Err(e) = std::fs::create_dir_all(&dir) {
            self.status = format!("Export failed: {e}");
            return;
        }
        let path = dir.join(export_file_name(&model.state, Local::now().format("%Y%m%d_%H%M%S")));
        match crate::io::write_detail_csv(&path, &detail.rows) {
            Ok(()) => self.status = format!("Exported: {}", path.display()),
            Err(err) => {
                warn!("dashboard export failed: {err}");
                self.status = format!("Export failed: {err}");
            }
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let lines = vec![
            Line::from(vec![
                Span::styled("RMA Control", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
                Span::raw(" | "),
                Span::raw(subtitle(Local::now().date_naive())),
            ]),
            Line::from(Span::styled(
                format!("source: {} | rows: {}", self.source, self.dataset.len()),
                Style::default().fg(Color::Gray),
            )),
        ];
        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        match &self.view {
            View::LoadFailed => {
                draw_message(frame, area, LOAD_FAILED_MESSAGE, Color::Red, "Error");
            }
            View::NoWeeks { agent } => {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Length(6), Constraint::Min(0)])
                    .split(area);
                self.draw_selectors(frame, chunks[0], None);
                draw_message(frame, chunks[1], &format!("{NO_WEEKS_MESSAGE} ({agent})"), Color::Yellow, "Warning");
            }
            View::Ready(model) => {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Length(6), Constraint::Length(4), Constraint::Min(0)])
                    .split(area);
                self.draw_selectors(frame, chunks[0], Some(model));
                draw_cards(frame, chunks[1], model);
                self.draw_tabs(frame, chunks[2], model);
            }
        }
    }

    fn draw_selectors(&self, frame: &mut ratatui::Frame<'_>, area: Rect, model: Option<&ViewModel>) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(area);

        let (agent, current, baseline, filter) = match &self.state {
            Some(s) => (
                s.agent.clone(),
                s.current_week.clone(),
                s.baseline_week.clone(),
                if s.managers.is_empty() {
                    "all".to_string()
                } else {
                    s.managers.join(", ")
                },
            ),
            None => ("-".to_string(), "-".to_string(), "-".to_string(), "all".to_string()),
        };

        let items = vec![
            ListItem::new(format!("Agent: {agent}")),
            ListItem::new(format!("Current week: {current}")),
            ListItem::new(format!("Compare against: {baseline}")),
            ListItem::new(format!("Managers: {filter}")),
        ];
        let list = List::new(items)
            .block(Block::default().title("Selection").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");
        let mut state = ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, chunks[0], &mut state);

        let managers = model.map(|m| m.managers.clone()).unwrap_or_default();
        let selected = self.state.as_ref().map(|s| s.managers.clone()).unwrap_or_default();
        let items: Vec<ListItem> = managers
            .iter()
            .map(|m| {
                let mark = if selected.contains(m) { "[x]" } else { "[ ]" };
                ListItem::new(format!("{mark} {m}"))
            })
            .collect();
        let title = if selected.is_empty() {
            "Managers (all)"
        } else {
            "Managers (filtered)"
        };
        let list = List::new(items)
            .block(Block::default().title(title).borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White));
        let mut state = ListState::default();
        if self.selected_field == FIELD_MANAGERS && !managers.is_empty() {
            state.select(Some(self.manager_cursor.min(managers.len() - 1)));
        }
        frame.render_stateful_widget(list, chunks[1], &mut state);
    }

    fn draw_tabs(&self, frame: &mut ratatui::Frame<'_>, area: Rect, model: &ViewModel) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(area);

        let tabs = Tabs::new(vec!["Detail", "Charts"])
            .select(self.tab.index())
            .style(Style::default().fg(Color::Gray))
            .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
        frame.render_widget(tabs, chunks[0]);

        let Some(detail) = &model.detail else {
            draw_message(frame, chunks[1], EMPTY_SELECTION_MESSAGE, Color::Blue, "Info");
            return;
        };

        match self.tab {
            Tab::Detail => self.draw_table(frame, chunks[1], detail),
            Tab::Charts => draw_charts(frame, chunks[1], detail),
        }
    }

    fn draw_table(&self, frame: &mut ratatui::Frame<'_>, area: Rect, detail: &Detail) {
        let header = Row::new(vec!["Manager", "Current amount", "Units", "Var. $", "Purchased", "RMA date"])
            .style(Style::default().add_modifier(Modifier::BOLD));

        let rows: Vec<Row> = detail
            .rows
            .iter()
            .map(|r| {
                Row::new(vec![
                    Cell::from(r.manager.clone()),
                    Cell::from(amount_bar(r.amount, detail.bar_max, TABLE_BAR_WIDTH)),
                    Cell::from(r.units.to_string()),
                    Cell::from(money::signed_currency(r.variance))
                        .style(Style::default().fg(delta_color(r.variance))),
                    Cell::from(money::date(r.purchase_date)),
                    Cell::from(money::date(r.return_date)),
                ])
            })
            .collect();

        let widths = [
            Constraint::Min(14),
            Constraint::Length(TABLE_BAR_WIDTH as u16 + 16),
            Constraint::Length(6),
            Constraint::Length(14),
            Constraint::Length(11),
            Constraint::Length(11),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .title(format!("Comparative detail ({} rows)", detail.rows.len()))
                    .borders(Borders::ALL),
            )
            .row_highlight_style(Style::default().bg(Color::DarkGray));

        let mut state = TableState::default();
        state.select(Some(self.table_row.min(detail.rows.len().saturating_sub(1))));
        frame.render_stateful_widget(table, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ field  ←/→ change  space toggle manager  c clear  Tab view  PgUp/PgDn scroll  e export  R reload  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn draw_message(frame: &mut ratatui::Frame<'_>, area: Rect, message: &str, color: Color, title: &str) {
    let block = Block::default().title(title.to_string()).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(Clear, inner);
    let p = Paragraph::new(message.to_string())
        .alignment(Alignment::Center)
        .style(Style::default().fg(color).add_modifier(Modifier::BOLD));
    let rect = Rect {
        x: inner.x,
        y: inner.y + inner.height / 2,
        width: inner.width,
        height: 1.min(inner.height),
    };
    frame.render_widget(p, rect);
}

fn draw_cards(frame: &mut ratatui::Frame<'_>, area: Rect, model: &ViewModel) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    let delta_colors = [
        Some(delta_color(model.summary.amount_delta)),
        Some(delta_color(Decimal::from(model.summary.units_delta))),
        None,
        None,
    ];

    for ((i, (label, value, delta)), color) in summary_cards(&model.summary).into_iter().enumerate().zip(delta_colors) {
        let mut spans = vec![Span::styled(value, Style::default().add_modifier(Modifier::BOLD))];
        if let (Some(delta), Some(color)) = (delta, color) {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(delta, Style::default().fg(color)));
        }
        let p = Paragraph::new(Line::from(spans))
            .block(Block::default().title(label).borders(Borders::ALL));
        frame.render_widget(p, chunks[i]);
    }
}

fn draw_charts(frame: &mut ratatui::Frame<'_>, area: Rect, detail: &Detail) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);

    let series: Vec<(String, f64)> = detail
        .distribution
        .iter()
        .map(|e| (e.manager.clone(), e.amount.to_f64().unwrap_or(0.0)))
        .collect();

    let block = Block::default().title("Amount by manager").borders(Borders::ALL);
    let inner = block.inner(chunks[0]);
    frame.render_widget(block, chunks[0]);
    frame.render_widget(Clear, inner);
    frame.render_widget(
        RankedBarChart {
            bars: &series,
            fmt_value: fmt_axis_money,
        },
        inner,
    );

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Min(0)])
        .split(chunks[1]);

    let block = Block::default().title("Share").borders(Borders::ALL);
    let inner = block.inner(right[0]);
    frame.render_widget(block, right[0]);
    frame.render_widget(Clear, inner);
    frame.render_widget(DonutChart { slices: &series }, inner);

    let total: Decimal = detail.distribution.iter().map(|e| e.amount).sum();
    let items: Vec<ListItem> = detail
        .distribution
        .iter()
        .rev()
        .map(|e| {
            ListItem::new(format!(
                "{:>5.1}% {}",
                crate::plot::share_percent(e.amount, total),
                e.manager
            ))
        })
        .collect();
    let legend = List::new(items).block(Block::default().title("Legend").borders(Borders::ALL));
    frame.render_widget(legend, right[1]);
}

fn subtitle(today: NaiveDate) -> String {
    format!("Weekly comparison • {}", money::date(Some(today)))
}

/// Step through `items` from `current`, wrapping around. An unknown `current`
/// counts as position 0.
fn cycle<'a>(items: &'a [String], current: &str, delta: i32) -> Option<&'a String> {
    if items.is_empty() {
        return None;
    }
    let pos = items.iter().position(|i| i == current).unwrap_or(0) as i64;
    let next = (pos + i64::from(delta)).rem_euclid(items.len() as i64);
    items.get(next as usize)
}

/// Bounded proportional bar followed by the formatted amount.
fn amount_bar(amount: Decimal, max: Decimal, width: usize) -> String {
    let filled = crate::plot::bar_cells(amount, max, width);
    format!(
        "{}{} {}",
        "█".repeat(filled),
        "░".repeat(width - filled),
        money::currency(amount)
    )
}

/// Deltas are colored inversely: a growing pending amount is bad news.
fn delta_color(delta: Decimal) -> Color {
    if delta > Decimal::ZERO {
        Color::Red
    } else if delta < Decimal::ZERO {
        Color::Green
    } else {
        Color::Gray
    }
}

fn fmt_axis_money(v: f64) -> String {
    if v.abs() >= 1000.0 {
        format!("{:.1}k", v / 1000.0)
    } else {
        format!("{v:.0}")
    }
}

fn export_file_name(state: &ViewState, stamp: impl std::fmt::Display) -> String {
    let clean = |s: &str| -> String {
        s.chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect()
    };
    format!(
        "rma_{}_{}_vs_{}_{stamp}.csv",
        clean(&state.agent),
        clean(&state.current_week),
        clean(&state.baseline_week)
    )
}
