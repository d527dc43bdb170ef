use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use polars::prelude::DataFrame;
use std::path::PathBuf;

use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols;
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Axis, Block, Borders, Chart, Dataset, GraphType, List, ListItem, ListState, Paragraph,
    StatefulWidget, Widget,
};

pub mod chart;
pub mod chart_export;
pub mod cli;
pub mod config;
pub mod ingest;
pub mod inspect;
pub mod preview;
pub mod summary;

pub use chart::{ChartArtifact, ChartType};
pub use cli::Args;
pub use config::{AppConfig, ConfigManager};
pub use ingest::{read_table, FileFormat, OpenOptions, TableSource};
pub use inspect::{render_cycle, Artifact, DisplayLimits, Selections, Severity};

/// Application name used for the config directory and other app-specific paths.
pub const APP_NAME: &str = "tablens";

pub enum AppEvent {
    Key(KeyEvent),
    Open(PathBuf, OpenOptions),
    Resize(u16, u16),
    Exit,
    Crash(String),
}

/// Focus area in the selector sidebar.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    #[default]
    Columns,
    XAxis,
    YAxis,
    ChartButtons,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Self::Columns => Self::XAxis,
            Self::XAxis => Self::YAxis,
            Self::YAxis => Self::ChartButtons,
            Self::ChartButtons => Self::Columns,
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::Columns => Self::ChartButtons,
            Self::XAxis => Self::Columns,
            Self::YAxis => Self::XAxis,
            Self::ChartButtons => Self::YAxis,
        }
    }
}

pub struct App {
    config: AppConfig,
    export_dir: Option<PathBuf>,
    source_name: Option<String>,
    table: Option<DataFrame>,
    load_error: Option<String>,
    selections: Selections,
    artifacts: Vec<Artifact>,
    focus: Focus,
    column_cursor: usize,
    x_cursor: usize,
    y_cursor: usize,
    button_cursor: usize,
    scroll: u16,
    content_height: u16,
    status: Option<String>,
}

impl App {
    pub fn new() -> Self {
        let config = ConfigManager::new(APP_NAME)
            .and_then(|manager| manager.load())
            .unwrap_or_default();
        Self::with_config(config)
    }

    pub fn with_config(config: AppConfig) -> Self {
        let mut app = Self {
            config,
            export_dir: None,
            source_name: None,
            table: None,
            load_error: None,
            selections: Selections::default(),
            artifacts: Vec::new(),
            focus: Focus::default(),
            column_cursor: 0,
            x_cursor: 0,
            y_cursor: 0,
            button_cursor: 0,
            scroll: 0,
            content_height: 0,
            status: None,
        };
        // The initial cycle shows the getting-started banner.
        let _ = app.recompute();
        app
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn set_export_dir(&mut self, dir: PathBuf) {
        self.export_dir = Some(dir);
    }

    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    pub fn selections(&self) -> &Selections {
        &self.selections
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    fn column_names(&self) -> Vec<String> {
        self.table
            .as_ref()
            .map(|df| {
                df.get_column_names()
                    .iter()
                    .map(|n| n.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn limits(&self) -> DisplayLimits {
        DisplayLimits {
            table_rows: self.config.display.table_rows,
            preview_rows: self.config.display.preview_rows,
        }
    }

    /// Handle one event; a returned event is re-queued by the host loop.
    pub fn event(&mut self, event: &AppEvent) -> Option<AppEvent> {
        match event {
            AppEvent::Open(path, options) => {
                self.open(path.clone(), options);
                self.recompute()
            }
            AppEvent::Key(key) => self.handle_key(*key),
            AppEvent::Resize(_, _) => None,
            AppEvent::Exit | AppEvent::Crash(_) => None,
        }
    }

    /// Read the file and rebuild the table. Ingestion failures are caught
    /// and become the cycle's error banner rather than a crash.
    fn open(&mut self, path: PathBuf, options: &OpenOptions) {
        self.selections = Selections::default();
        self.column_cursor = 0;
        self.x_cursor = 0;
        self.y_cursor = 0;
        self.scroll = 0;
        match TableSource::from_path(&path).and_then(|source| {
            let df = read_table(&source, options)?;
            Ok((source.name, df))
        }) {
            Ok((name, df)) => {
                self.source_name = Some(name);
                self.table = Some(df);
                self.load_error = None;
            }
            Err(e) => {
                self.source_name = path.file_name().map(|n| n.to_string_lossy().into_owned());
                self.table = None;
                self.load_error = Some(e.to_string());
            }
        }
    }

    /// Rerun the render cycle. Chart preparation errors are the one case the
    /// cycle does not absorb; they surface as a crash event for the host.
    fn recompute(&mut self) -> Option<AppEvent> {
        match render_cycle(
            self.table.as_ref(),
            self.load_error.as_deref(),
            &self.selections,
            self.limits(),
        ) {
            Ok(artifacts) => {
                self.artifacts = artifacts;
                None
            }
            Err(e) => Some(AppEvent::Crash(e.to_string())),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<AppEvent> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Some(AppEvent::Exit);
        }
        match key.code {
            KeyCode::Char('q') => return Some(AppEvent::Exit),
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.prev(),
            KeyCode::Up => self.move_cursor(-1),
            KeyCode::Down => self.move_cursor(1),
            KeyCode::Char(' ') | KeyCode::Enter => {
                self.activate();
                return self.recompute();
            }
            KeyCode::Char('l') => {
                self.toggle_chart(ChartType::Line);
                return self.recompute();
            }
            KeyCode::Char('s') => {
                self.toggle_chart(ChartType::Scatter);
                return self.recompute();
            }
            KeyCode::Char('b') => {
                self.toggle_chart(ChartType::Bar);
                return self.recompute();
            }
            KeyCode::Char('e') => self.export_charts(),
            KeyCode::Char('j') => self.scroll_content(1),
            KeyCode::Char('k') => self.scroll_content(-1),
            KeyCode::PageDown => self.scroll_content(10),
            KeyCode::PageUp => self.scroll_content(-10),
            _ => {}
        }
        None
    }

    fn move_cursor(&mut self, delta: isize) {
        let columns = self.column_names().len();
        let (cursor, len) = match self.focus {
            Focus::Columns => (&mut self.column_cursor, columns),
            Focus::XAxis => (&mut self.x_cursor, columns),
            Focus::YAxis => (&mut self.y_cursor, columns),
            Focus::ChartButtons => (&mut self.button_cursor, ChartType::ALL.len()),
        };
        if len == 0 {
            return;
        }
        let next = cursor.saturating_add_signed(delta);
        *cursor = next.min(len - 1);
    }

    /// Apply the focused selector at its cursor position.
    fn activate(&mut self) {
        let columns = self.column_names();
        match self.focus {
            Focus::Columns => {
                if let Some(name) = columns.get(self.column_cursor) {
                    if let Some(pos) = self.selections.columns.iter().position(|c| c == name) {
                        self.selections.columns.remove(pos);
                    } else {
                        self.selections.columns.push(name.clone());
                    }
                }
            }
            Focus::XAxis => {
                if let Some(name) = columns.get(self.x_cursor) {
                    self.selections.x_axis = Some(name.clone());
                }
            }
            Focus::YAxis => {
                if let Some(name) = columns.get(self.y_cursor) {
                    self.selections.y_axis = Some(name.clone());
                }
            }
            Focus::ChartButtons => {
                let chart_type = ChartType::ALL[self.button_cursor];
                self.toggle_chart(chart_type);
            }
        }
    }

    fn toggle_chart(&mut self, chart_type: ChartType) {
        if let Some(pos) = self
            .selections
            .charts
            .iter()
            .position(|&c| c == chart_type)
        {
            self.selections.charts.remove(pos);
        } else {
            self.selections.charts.push(chart_type);
        }
    }

    fn scroll_content(&mut self, delta: i32) {
        let max = self.content_height.saturating_sub(1);
        let next = (self.scroll as i32 + delta).clamp(0, max as i32);
        self.scroll = next as u16;
    }

    /// Export every active chart as a PNG into the export directory.
    fn export_charts(&mut self) {
        let charts: Vec<ChartArtifact> = self
            .artifacts
            .iter()
            .filter_map(|a| match a {
                Artifact::Chart(c) => Some(c.clone()),
                _ => None,
            })
            .collect();
        if charts.is_empty() {
            self.status = Some("No active charts to export".to_string());
            return;
        }
        let dir = self
            .export_dir
            .clone()
            .or_else(|| self.config.chart.export_dir.clone())
            .unwrap_or_else(|| PathBuf::from("."));
        let size = (self.config.chart.width, self.config.chart.height);
        let mut exported = 0usize;
        for artifact in &charts {
            let path = dir.join(chart_export::export_file_name(artifact));
            match chart_export::write_chart_png(&path, artifact, size) {
                Ok(()) => exported += 1,
                Err(e) => {
                    self.status = Some(format!("Export failed: {}", e));
                    return;
                }
            }
        }
        self.status = Some(format!("Exported {} chart(s) to {}", exported, dir.display()));
    }

    fn artifact_lines(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        for artifact in &self.artifacts {
            match artifact {
                Artifact::Banner { severity, text } => {
                    let color = match severity {
                        Severity::Success => Color::Green,
                        Severity::Info => Color::Cyan,
                        Severity::Error => Color::Red,
                    };
                    lines.push(Line::from(Span::styled(
                        text.clone(),
                        Style::default().fg(color),
                    )));
                }
                Artifact::DataTable {
                    title,
                    columns,
                    rows,
                    total_rows,
                } => {
                    lines.push(section_title(title.clone()));
                    lines.extend(table_lines(columns, rows));
                    if rows.len() < *total_rows {
                        lines.push(Line::from(Span::styled(
                            format!("… showing first {} of {} rows", rows.len(), total_rows),
                            Style::default().fg(Color::DarkGray),
                        )));
                    }
                }
                Artifact::Overview(o) => {
                    lines.push(section_title("Data Overview".to_string()));
                    lines.push(Line::from(format!("Number of rows        {}", o.rows)));
                    lines.push(Line::from(format!("Number of columns     {}", o.columns)));
                    lines.push(Line::from(format!(
                        "Missing values        {}",
                        o.missing_values
                    )));
                    lines.push(Line::from(format!(
                        "Duplicate rows        {}",
                        o.duplicate_rows
                    )));
                }
                Artifact::StructuralSummary(text) => {
                    lines.push(section_title("Structural Summary".to_string()));
                    for line in text.lines() {
                        lines.push(Line::from(line.to_string()));
                    }
                }
                Artifact::CategoricalSummary(summaries) => {
                    lines.push(section_title(
                        "Statistical Summary (Non-Numerical Columns)".to_string(),
                    ));
                    let columns = vec![
                        "Column".to_string(),
                        "Count".to_string(),
                        "Unique".to_string(),
                        "Top".to_string(),
                        "Freq".to_string(),
                    ];
                    let rows: Vec<Vec<String>> = summaries
                        .iter()
                        .map(|s| {
                            vec![
                                s.name.clone(),
                                s.count.to_string(),
                                s.unique.to_string(),
                                s.top.clone().unwrap_or_default(),
                                s.freq.to_string(),
                            ]
                        })
                        .collect();
                    lines.extend(table_lines(&columns, &rows));
                }
                // Charts render in their own pane below the text content.
                Artifact::Chart(c) => {
                    lines.push(Line::from(Span::styled(
                        format!("▸ {}", c.title),
                        Style::default().fg(Color::Yellow),
                    )));
                }
            }
            lines.push(Line::from(""));
        }
        lines
    }

    fn render_sidebar(&self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Fill(2),   // Columns
                Constraint::Fill(1),   // X axis
                Constraint::Fill(1),   // Y axis
                Constraint::Length(5), // Chart buttons
            ])
            .split(area);

        let columns = self.column_names();

        self.render_column_list(chunks[0], buf, &columns);
        self.render_axis_list(
            chunks[1],
            buf,
            &columns,
            " X Axis ",
            self.effective_axis(&self.selections.x_axis, &columns),
            self.x_cursor,
            Focus::XAxis,
        );
        self.render_axis_list(
            chunks[2],
            buf,
            &columns,
            " Y Axis ",
            self.effective_axis(&self.selections.y_axis, &columns),
            self.y_cursor,
            Focus::YAxis,
        );
        self.render_chart_buttons(chunks[3], buf);
    }

    fn effective_axis(&self, selected: &Option<String>, columns: &[String]) -> Option<String> {
        selected
            .clone()
            .or_else(|| columns.first().cloned())
    }

    fn border_style(&self, focus: Focus) -> Style {
        if self.focus == focus {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        }
    }

    fn render_column_list(&self, area: Rect, buf: &mut Buffer, columns: &[String]) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.border_style(Focus::Columns))
            .title(" Columns ");
        let items: Vec<ListItem> = columns
            .iter()
            .map(|name| {
                let marker = if self.selections.columns.iter().any(|c| c == name) {
                    "[x]"
                } else {
                    "[ ]"
                };
                ListItem::new(format!("{} {}", marker, name))
            })
            .collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        let mut state = ListState::default();
        if !columns.is_empty() {
            state.select(Some(self.column_cursor.min(columns.len() - 1)));
        }
        StatefulWidget::render(list, area, buf, &mut state);
    }

    #[allow(clippy::too_many_arguments)]
    fn render_axis_list(
        &self,
        area: Rect,
        buf: &mut Buffer,
        columns: &[String],
        title: &str,
        selected: Option<String>,
        cursor: usize,
        focus: Focus,
    ) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.border_style(focus))
            .title(title.to_string());
        let items: Vec<ListItem> = columns
            .iter()
            .map(|name| {
                let marker = if selected.as_deref() == Some(name.as_str()) {
                    "●"
                } else {
                    "○"
                };
                ListItem::new(format!("{} {}", marker, name))
            })
            .collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        let mut state = ListState::default();
        if !columns.is_empty() {
            state.select(Some(cursor.min(columns.len() - 1)));
        }
        StatefulWidget::render(list, area, buf, &mut state);
    }

    fn render_chart_buttons(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.border_style(Focus::ChartButtons))
            .title(" Charts ");
        let items: Vec<ListItem> = ChartType::ALL
            .iter()
            .map(|&chart_type| {
                let active = self.selections.charts.contains(&chart_type);
                let marker = if active { "●" } else { "○" };
                let style = if active {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default()
                };
                ListItem::new(Line::from(Span::styled(
                    format!("{} {}", marker, chart_type.as_str()),
                    style,
                )))
            })
            .collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        let mut state = ListState::default();
        state.select(Some(self.button_cursor.min(ChartType::ALL.len() - 1)));
        StatefulWidget::render(list, area, buf, &mut state);
    }

    fn render_chart_pane(&self, area: Rect, buf: &mut Buffer, charts: &[&ChartArtifact]) {
        let constraints: Vec<Constraint> = charts.iter().map(|_| Constraint::Fill(1)).collect();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);
        for (artifact, chunk) in charts.iter().zip(chunks.iter()) {
            render_chart_widget(artifact, *chunk, buf);
        }
    }
}

fn section_title(text: String) -> Line<'static> {
    Line::from(Span::styled(
        text,
        Style::default().add_modifier(Modifier::BOLD),
    ))
}

/// Align a stringified table into fixed-width text columns. Widths and
/// truncation are in characters, not bytes.
fn table_lines(columns: &[String], rows: &[Vec<String>]) -> Vec<Line<'static>> {
    const MAX_CELL: usize = 24;
    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            rows.iter()
                .filter_map(|r| r.get(i))
                .map(|c| c.chars().count())
                .chain(std::iter::once(name.chars().count()))
                .max()
                .unwrap_or(0)
                .min(MAX_CELL)
        })
        .collect();
    let render_row = |cells: &[String], style: Style| -> Line<'static> {
        let mut text = String::new();
        for (i, cell) in cells.iter().enumerate() {
            let width = widths.get(i).copied().unwrap_or(0);
            let mut cell = cell.clone();
            if cell.chars().count() > width {
                cell = cell.chars().take(width.saturating_sub(1)).collect();
                cell.push('…');
            }
            text.push_str(&format!("{:<width$}  ", cell));
        }
        Line::from(Span::styled(text.trim_end().to_string(), style))
    };
    let mut lines = vec![render_row(
        columns,
        Style::default().add_modifier(Modifier::UNDERLINED),
    )];
    for row in rows {
        lines.push(render_row(row, Style::default()));
    }
    lines
}

/// Draw one chart artifact as a ratatui chart with titled, labeled axes.
fn render_chart_widget(artifact: &ChartArtifact, area: Rect, buf: &mut Buffer) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", artifact.title));
    let inner = block.inner(area);
    block.render(area, buf);

    if artifact.points.is_empty() {
        Paragraph::new("No valid data points")
            .style(Style::default().fg(Color::DarkGray))
            .centered()
            .render(inner, buf);
        return;
    }

    let graph_type = match artifact.chart_type {
        ChartType::Line => GraphType::Line,
        ChartType::Scatter => GraphType::Scatter,
        ChartType::Bar => GraphType::Bar,
    };
    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(graph_type)
        .style(Style::default().fg(Color::Cyan))
        .data(&artifact.points);

    let (x_min, x_max) = artifact.x_bounds;
    let (y_min, y_max) = artifact.y_bounds;
    let axis_label = |v: f64| Span::raw(chart::format_axis_label(v));
    let x_axis = Axis::default()
        .title(artifact.x_label.clone())
        .bounds([x_min, x_max])
        .labels(vec![
            axis_label(x_min),
            axis_label((x_min + x_max) / 2.0),
            axis_label(x_max),
        ]);
    let y_axis = Axis::default()
        .title(artifact.y_label.clone())
        .bounds([y_min, y_max])
        .labels(vec![
            axis_label(y_min),
            axis_label((y_min + y_max) / 2.0),
            axis_label(y_max),
        ]);

    Chart::new(vec![dataset])
        .x_axis(x_axis)
        .y_axis(y_axis)
        .render(inner, buf);
}

impl Widget for &mut App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Fill(1),
                Constraint::Length(1),
            ])
            .split(area);

        // Header
        let header = match &self.source_name {
            Some(name) => format!(" tablens — {}", name),
            None => " tablens".to_string(),
        };
        Paragraph::new(header)
            .style(
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .render(outer[0], buf);

        let main = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Fill(1), Constraint::Length(30)])
            .split(outer[1]);

        // Mutations first; the chart references below borrow the artifacts.
        let lines = self.artifact_lines();
        self.content_height = lines.len() as u16;
        self.scroll = self.scroll.min(self.content_height.saturating_sub(1));

        let charts: Vec<&ChartArtifact> = self
            .artifacts
            .iter()
            .filter_map(|a| match a {
                Artifact::Chart(c) => Some(c),
                _ => None,
            })
            .collect();

        let content_chunks = if charts.is_empty() {
            Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Fill(1)])
                .split(main[0])
        } else {
            Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Fill(1), Constraint::Percentage(45)])
                .split(main[0])
        };

        Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray))
                    .title(" Inspector "),
            )
            .scroll((self.scroll, 0))
            .render(content_chunks[0], buf);

        if !charts.is_empty() {
            self.render_chart_pane(content_chunks[1], buf, &charts);
        }

        self.render_sidebar(main[1], buf);

        // Status line: transient status or key help
        let status = self.status.clone().unwrap_or_else(|| {
            "Tab focus · ↑↓ move · Space select · l/s/b chart · e export · j/k scroll · q quit"
                .to_string()
        });
        Paragraph::new(status)
            .style(Style::default().fg(Color::DarkGray))
            .render(outer[2], buf);
    }
}

/// Load a table and build the artifact list once, without a terminal.
/// Useful for scripted smoke checks and tests.
pub fn inspect_file(
    path: &std::path::Path,
    options: &OpenOptions,
    selections: &Selections,
    limits: DisplayLimits,
) -> Result<Vec<Artifact>> {
    let source = TableSource::from_path(path)?;
    match read_table(&source, options) {
        Ok(df) => render_cycle(Some(&df), None, selections, limits),
        Err(e) => render_cycle(None, Some(&e.to_string()), selections, limits),
    }
}
