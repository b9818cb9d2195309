use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::path::PathBuf;
use std::sync::mpsc;
use tracing::warn;

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};

use ratatui::widgets::{Block, Paragraph, Wrap};

pub mod aggregator;
pub mod catalogue;
pub mod chart_export;
pub mod config;
pub mod error;
pub mod error_display;
pub mod matrix;
pub mod series;
pub mod table;
pub mod widgets;

pub use aggregator::{Aggregator, BASE_YEAR};
pub use catalogue::Grouping;
pub use chart_export::{export_chart, ChartExportFormat, ChartExportOptions};
pub use config::{
    rgb_to_256_color, rgb_to_basic_ansi, AppConfig, ColorParser, ConfigManager, Theme, ViewMode,
};
pub use error::{AggregateError, TableError};
pub use gvadash_cli::{Args, CompressionFormat, OutputFormat};
pub use matrix::{Matrix, MatrixRow};
pub use series::{ChartFigure, ChartSeries};
pub use table::{GvaTable, LoadOptions, Observation};

use widgets::chart::GvaChart;
use widgets::controls::Controls;
use widgets::debug::DebugState;
use widgets::matrix_table::MatrixTable;
use widgets::radio_block::RadioBlock;

/// Application name used for the config directory and other app-specific paths
pub const APP_NAME: &str = "gvadash";

const HEADER_TEXT: &str = "DCMS Statistics";
const TITLE_TEXT: &str = "DCMS Economic Estimates - GVA";
const PREAMBLE_TEXT: &str = "Updated to include 2016 data. \
    This tool shows GVA for DCMS sectors. It is based on National Accounts data.";
const CONTACT_TEXT: &str =
    "Contact Details: For any queries please telephone 020 7211 6000 or email evidence@culture.gov.uk";
const LICENCE_TEXT: &str =
    "All content is available under the Open Government Licence v3.0 except where otherwise stated";

const MEASURE_OPTIONS: [&str; 2] = ["Actual", "Indexed"];

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    Key(KeyEvent),
    SelectGrouping(Grouping),
    SetIndexed(bool),
    Recompute,
    Export(PathBuf),
    Exit,
    Resize(u16, u16), // resized (width, height)
}

/// Which selector receives ←/→.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectorFocus {
    #[default]
    Breakdown,
    Measure,
}

impl SelectorFocus {
    pub fn next(self) -> Self {
        match self {
            Self::Breakdown => Self::Measure,
            Self::Measure => Self::Breakdown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

pub struct App {
    aggregator: Aggregator,
    grouping: Grouping,
    indexed: bool,
    focus: SelectorFocus,
    view: ViewMode,
    matrix: Matrix,
    figure: ChartFigure,
    status: Option<StatusMessage>,
    theme: Theme,
    config: AppConfig,
    pub debug: DebugState,
}

impl App {
    /// Starts on the configured breakdown and measure and computes the first matrix.
    pub fn new(aggregator: Aggregator, theme: Theme, config: AppConfig) -> Self {
        let grouping = config.default_grouping();
        let indexed = config.display.default_indexed;
        let matrix = aggregator.compute(grouping, indexed);
        let figure = ChartFigure::from_matrix(&matrix);
        let debug = DebugState {
            enabled: config.debug.enabled,
            num_computes: 1,
            ..DebugState::default()
        };
        Self {
            aggregator,
            grouping,
            indexed,
            focus: SelectorFocus::default(),
            view: config.default_view(),
            matrix,
            figure,
            status: None,
            theme,
            config,
            debug,
        }
    }

    pub fn grouping(&self) -> Grouping {
        self.grouping
    }

    pub fn indexed(&self) -> bool {
        self.indexed
    }

    pub fn focus(&self) -> SelectorFocus {
        self.focus
    }

    pub fn view(&self) -> ViewMode {
        self.view
    }

    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    pub fn figure(&self) -> &ChartFigure {
        &self.figure
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    /// `<export_dir>/<grouping>-<actual|indexed>.<ext>` for the current selection.
    pub fn export_path(&self, format: ChartExportFormat) -> PathBuf {
        let measure = if self.indexed { "indexed" } else { "actual" };
        self.config.chart.export_dir.join(format!(
            "{}-{}.{}",
            self.grouping.slug(),
            measure,
            format.extension()
        ))
    }

    fn recompute(&mut self) {
        self.matrix = self.aggregator.compute(self.grouping, self.indexed);
        self.figure = ChartFigure::from_matrix(&self.matrix);
        self.debug.num_computes += 1;
    }

    fn export(&mut self, path: &std::path::Path) {
        match export_chart(path, &self.figure, &self.config.export_options()) {
            Ok(()) => {
                self.status = Some(StatusMessage::info(format!(
                    "Exported {}",
                    path.display()
                )));
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "chart export failed");
                self.status = Some(StatusMessage::error(format!("Export failed: {}", e)));
            }
        }
    }

    fn key(&mut self, event: &KeyEvent) -> Option<AppEvent> {
        self.debug.on_key(event);

        if event.modifiers.contains(KeyModifiers::CONTROL) && event.code == KeyCode::Char('c') {
            return Some(AppEvent::Exit);
        }

        match event.code {
            KeyCode::Char('q') | KeyCode::Esc => Some(AppEvent::Exit),
            KeyCode::Tab | KeyCode::BackTab => {
                self.focus = self.focus.next();
                self.debug.last_action = "focus".to_string();
                None
            }
            KeyCode::Left | KeyCode::Char('h') => self.change_focused(false),
            KeyCode::Right | KeyCode::Char('l') => self.change_focused(true),
            KeyCode::Char(c @ '1'..='4') => {
                let idx = c as usize - '1' as usize;
                Grouping::from_index(idx).map(AppEvent::SelectGrouping)
            }
            KeyCode::Char('i') => Some(AppEvent::SetIndexed(!self.indexed)),
            KeyCode::Char('t') => {
                self.view = self.view.toggle();
                self.debug.last_action = "toggle_view".to_string();
                None
            }
            KeyCode::Char('e') => Some(AppEvent::Export(self.export_path(ChartExportFormat::Png))),
            KeyCode::Char('E') => Some(AppEvent::Export(self.export_path(ChartExportFormat::Eps))),
            _ => None,
        }
    }

    fn change_focused(&self, forward: bool) -> Option<AppEvent> {
        match self.focus {
            SelectorFocus::Breakdown => Some(AppEvent::SelectGrouping(if forward {
                self.grouping.next()
            } else {
                self.grouping.prev()
            })),
            // Two options: either direction flips the measure
            SelectorFocus::Measure => Some(AppEvent::SetIndexed(!self.indexed)),
        }
    }

    /// Handle one event; the returned event (if any) is fed back through the channel.
    pub fn event(&mut self, event: &AppEvent) -> Option<AppEvent> {
        self.debug.num_events += 1;
        match event {
            AppEvent::Key(key) => self.key(key),
            AppEvent::SelectGrouping(grouping) => {
                self.debug.last_action = "select_grouping".to_string();
                if *grouping == self.grouping {
                    return None;
                }
                self.grouping = *grouping;
                Some(AppEvent::Recompute)
            }
            AppEvent::SetIndexed(indexed) => {
                self.debug.last_action = "set_indexed".to_string();
                if *indexed == self.indexed {
                    return None;
                }
                self.indexed = *indexed;
                Some(AppEvent::Recompute)
            }
            AppEvent::Recompute => {
                self.recompute();
                self.status = None;
                None
            }
            AppEvent::Export(path) => {
                self.debug.last_action = "export".to_string();
                self.export(path);
                None
            }
            AppEvent::Exit | AppEvent::Resize(..) => None,
        }
    }

    fn render_header(&self, area: Rect, buf: &mut Buffer) {
        let bg = self.theme.get("header_bg");
        let fg = self.theme.get("text_primary");
        let style = Style::default().bg(bg).fg(fg);
        Block::default().style(style).render(area, buf);
        Paragraph::new(Line::from(vec![
            Span::styled(format!(" {} ", HEADER_TEXT), style.add_modifier(Modifier::BOLD)),
            Span::styled(" BETA ", style.fg(self.theme.get("secondary"))),
        ]))
        .render(area, buf);
        Paragraph::new("Give us feedback: evidence@culture.gov.uk ")
            .style(style.fg(self.theme.get("text_secondary")))
            .right_aligned()
            .render(area, buf);
    }

    fn render_selectors(&self, area: Rect, buf: &mut Buffer) {
        let border = self.theme.get("modal_border");
        let active = self.theme.get("modal_border_active");
        let labels = Grouping::ALL.map(Grouping::label);

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Fill(1), Constraint::Length(26)])
            .split(area);
        let columns = if chunks[0].width >= 96 { 4 } else { 2 };

        RadioBlock::new("Breakdown", &labels, self.grouping.index())
            .focused(self.focus == SelectorFocus::Breakdown)
            .columns(columns)
            .colors(border, active)
            .render(chunks[0], buf);
        RadioBlock::new("Measure", &MEASURE_OPTIONS, usize::from(self.indexed))
            .focused(self.focus == SelectorFocus::Measure)
            .colors(border, active)
            .render(chunks[1], buf);
    }

    fn selector_height(&self, width: u16) -> u16 {
        if width.saturating_sub(26) >= 96 {
            3
        } else {
            4
        }
    }
}

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.debug.num_frames += 1;

        let show_preamble = self.config.display.show_preamble;
        let mut constraints = vec![Constraint::Length(1), Constraint::Length(1)];
        if show_preamble {
            constraints.push(Constraint::Length(2));
        }
        constraints.push(Constraint::Length(self.selector_height(area.width)));
        constraints.push(Constraint::Fill(1)); // chart or table
        constraints.push(Constraint::Length(2)); // footer
        constraints.push(Constraint::Length(1)); // controls
        if self.debug.enabled {
            constraints.push(Constraint::Length(1));
        }
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);
        let mut next = 0;
        let mut take = || {
            let r = layout[next];
            next += 1;
            r
        };

        self.render_header(take(), buf);

        Paragraph::new(TITLE_TEXT)
            .style(
                Style::default()
                    .fg(self.theme.get("primary"))
                    .add_modifier(Modifier::BOLD),
            )
            .render(take(), buf);

        if show_preamble {
            Paragraph::new(PREAMBLE_TEXT)
                .style(Style::default().fg(self.theme.get("text_secondary")))
                .wrap(Wrap { trim: true })
                .render(take(), buf);
        }

        self.render_selectors(take(), buf);

        let main_area = take();
        match self.view {
            ViewMode::Chart => GvaChart::new(&self.figure, &self.theme)
                .show_legend(self.config.chart.show_legend)
                .show_markers(self.config.chart.show_markers)
                .render(main_area, buf),
            ViewMode::Table => MatrixTable::new(&self.matrix)
                .with_colors(
                    self.theme.get("table_header"),
                    self.theme.get("header_bg"),
                    self.theme.get("table_border"),
                    self.theme.get("dimmed"),
                )
                .render(main_area, buf),
        }

        let dimmed = Style::default().fg(self.theme.get("dimmed"));
        Paragraph::new(vec![
            Line::from(Span::styled(CONTACT_TEXT, dimmed)),
            Line::from(Span::styled(LICENCE_TEXT, dimmed)),
        ])
        .render(take(), buf);

        let controls = Controls::new()
            .with_status(
                self.status.as_ref().map(|s| s.text.as_str()),
                self.status.as_ref().is_some_and(|s| s.is_error),
            )
            .with_colors(
                self.theme.get("controls_bg"),
                self.theme.get("primary"),
                self.theme.get("text_primary"),
                self.theme.get("error"),
            );
        (&controls).render(take(), buf);

        if self.debug.enabled {
            (&self.debug).render(take(), buf);
        }
    }
}

/// Run the dashboard until the user quits. Owns the terminal for its duration.
pub fn run(aggregator: Aggregator, config: AppConfig) -> Result<()> {
    let theme = Theme::from_config(&config.theme)
        .or_else(|e| Theme::from_config(&AppConfig::default().theme).map_err(|_| e))?;
    let poll_interval = std::time::Duration::from_millis(config.performance.event_poll_interval_ms);

    let mut terminal = ratatui::try_init().map_err(|e| {
        color_eyre::eyre::eyre!(
            "gvadash requires an interactive terminal (TTY). No terminal detected: {}. \
             Use --print or --export-chart for non-interactive output.",
            e
        )
    })?;
    let (tx, rx) = mpsc::channel::<AppEvent>();
    let mut app = App::new(aggregator, theme, config);

    terminal.draw(|frame| frame.render_widget(&mut app, frame.area()))?;

    loop {
        if crossterm::event::poll(poll_interval)? {
            match crossterm::event::read()? {
                crossterm::event::Event::Key(key) => {
                    if key.is_press() {
                        tx.send(AppEvent::Key(key))?
                    }
                }
                crossterm::event::Event::Resize(cols, rows) => {
                    tx.send(AppEvent::Resize(cols, rows))?
                }
                _ => {}
            }
        }

        let updated = match rx.recv_timeout(std::time::Duration::from_millis(0)) {
            Ok(event) => {
                match event {
                    AppEvent::Exit => break,
                    event => {
                        if let Some(next) = app.event(&event) {
                            tx.send(next)?;
                        }
                    }
                }
                true
            }
            Err(mpsc::RecvTimeoutError::Timeout) => false,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        };

        if updated {
            terminal.draw(|frame| frame.render_widget(&mut app, frame.area()))?;
        }
    }

    ratatui::restore();
    Ok(())
}
