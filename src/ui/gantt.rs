//! Terminal Gantt surface - grid columns on the left, bars on the right

use super::timeline::{ticks, Timeline};
use crate::config::{try_format, Align, ChartConfig, ColumnField, ScaleConfig};
use crate::core::{progress_text, ChartData, ChartNode, TaskId};
use crate::surface::RenderSurface;
use anyhow::Result;
use chrono::NaiveDate;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

const BAR_DONE: char = '█';
const BAR_LEFT: char = '▒';
const MARKER: char = '┆';

/// A loaded chart row with its dates parsed back from the node strings
#[derive(Debug, Clone)]
struct BarRow {
    node: ChartNode,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

/// Render surface backed by a ratatui frame
#[derive(Debug, Default)]
pub struct TerminalSurface {
    config: ChartConfig,
    chart: Option<ChartData>,
    rows: Vec<BarRow>,
    initialized: bool,
}

impl TerminalSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chart(&self) -> Option<&ChartData> {
        self.chart.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Task id shown on row `index`
    pub fn task_at(&self, index: usize) -> Option<TaskId> {
        self.rows.get(index).map(|row| row.node.id)
    }

    fn timeline(&self, today: NaiveDate, width: u16) -> Option<Timeline> {
        let mut dates: Vec<NaiveDate> = self
            .rows
            .iter()
            .flat_map(|row| [row.start, row.end])
            .flatten()
            .collect();
        if dates.is_empty() {
            return None;
        }
        if !self.config.fit_tasks {
            dates.push(today);
        }
        Timeline::spanning(dates, width)
    }
}

impl RenderSurface for TerminalSurface {
    fn init(&mut self, config: &ChartConfig) -> Result<()> {
        self.config = config.clone();
        self.initialized = true;
        Ok(())
    }

    fn clear_all(&mut self) -> Result<()> {
        self.chart = None;
        self.rows.clear();
        Ok(())
    }

    fn load(&mut self, chart: &ChartData) -> Result<()> {
        let format = &self.config.date_format;
        self.rows = chart
            .nodes
            .iter()
            .map(|node| {
                let start = format.parse(&node.start_date);
                let end = format.parse(&node.end_date);
                if start.is_none() || end.is_none() {
                    log::warn!("Task {}: dates do not match {}", node.id, format.as_str());
                }
                BarRow {
                    node: node.clone(),
                    start,
                    end,
                }
            })
            .collect();
        self.chart = Some(chart.clone());
        Ok(())
    }

    fn destroy(&mut self) -> Result<()> {
        self.clear_all()?;
        self.initialized = false;
        Ok(())
    }
}

/// Draw the grid and timeline for `surface` into `area`
pub fn render_gantt(f: &mut Frame, surface: &TerminalSurface, selected: usize, today: NaiveDate, area: Rect) {
    let config = &surface.config;
    let spacing = u16::try_from(config.columns.len().saturating_sub(1)).unwrap_or(u16::MAX);
    let grid_width = config
        .columns
        .iter()
        .map(|c| c.width)
        .fold(0u16, u16::saturating_add)
        .saturating_add(spacing)
        .saturating_add(2);

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(grid_width), Constraint::Min(10)])
        .split(area);

    let header_lines = 1 + config.subscales.len() as u16;
    // Rows visible below the borders and header
    let visible = area.height.saturating_sub(2 + header_lines) as usize;
    let offset = if visible == 0 {
        0
    } else {
        selected.saturating_sub(visible - 1)
    };
    let window: Vec<(usize, &BarRow)> = surface
        .rows
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible)
        .collect();

    render_grid(f, config, &window, selected, header_lines, chunks[0]);
    render_timeline(f, surface, &window, selected, today, header_lines, chunks[1]);
}

fn row_style(index: usize, selected: usize) -> Style {
    if index == selected {
        Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    }
}

fn align(text: String, align: Align) -> Line<'static> {
    let line = Line::from(text);
    match align {
        Align::Left => line.alignment(Alignment::Left),
        Align::Center => line.alignment(Alignment::Center),
        Align::Right => line.alignment(Alignment::Right),
    }
}

fn render_grid(
    f: &mut Frame,
    config: &ChartConfig,
    window: &[(usize, &BarRow)],
    selected: usize,
    header_lines: u16,
    area: Rect,
) {
    let header = Row::new(
        config
            .columns
            .iter()
            .map(|c| Cell::from(align(c.label.clone(), c.align))),
    )
    .height(header_lines)
    .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = window
        .iter()
        .map(|(index, row)| {
            let cells = config.columns.iter().map(|column| {
                let text = match column.field {
                    ColumnField::Text => row.node.text.clone(),
                    ColumnField::StartDate => row.node.start_date.clone(),
                    ColumnField::EndDate => row.node.end_date.clone(),
                    ColumnField::Progress => progress_text(row.node.progress),
                    ColumnField::Add => "+".to_string(),
                };
                Cell::from(align(text, column.align))
            });
            Row::new(cells).style(row_style(*index, selected))
        })
        .collect();

    let widths: Vec<Constraint> = config.columns.iter().map(|c| Constraint::Length(c.width)).collect();
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title("Tasks"));

    f.render_widget(table, area);
}

/// Scale header line: labels placed at each tick without overlapping
fn scale_line(scale: &ScaleConfig, timeline: &Timeline) -> Line<'static> {
    let width = timeline.width as usize;
    let mut cells = vec![' '; width];
    let mut next_free = 0usize;

    for tick in ticks(scale.unit, scale.step, timeline.start, timeline.end) {
        let Some(col) = timeline.clamped_column(tick).map(usize::from) else {
            continue;
        };
        if col < next_free {
            continue;
        }
        let Some(label) = try_format(tick.max(timeline.start), &scale.format) else {
            continue;
        };
        for (i, ch) in label.chars().enumerate() {
            if col + i >= width {
                break;
            }
            cells[col + i] = ch;
        }
        next_free = col + label.chars().count() + 1;
    }

    Line::from(Span::styled(
        cells.into_iter().collect::<String>(),
        Style::default().fg(Color::Cyan),
    ))
}

fn bar_line(row: &BarRow, timeline: &Timeline, today_col: Option<usize>, show_text: bool, style: Style) -> Line<'static> {
    let width = timeline.width as usize;
    let mut cells: Vec<(char, Style)> = vec![(' ', style); width];

    if let Some(col) = today_col.filter(|c| *c < width) {
        cells[col] = (MARKER, style.fg(Color::Yellow));
    }

    match (row.start, row.end) {
        (Some(start), Some(end)) if start <= end => {
            let first = timeline.column(start).map(usize::from).unwrap_or(0);
            let last = timeline
                .column_end(end)
                .map(usize::from)
                .unwrap_or(width.saturating_sub(1));
            let len = last.saturating_sub(first) + 1;
            let done = (len as f64 * row.node.progress.clamp(0.0, 1.0)).round() as usize;

            for (i, cell) in cells.iter_mut().enumerate().skip(first).take(len) {
                let filled = i - first < done;
                let ch = if filled { BAR_DONE } else { BAR_LEFT };
                *cell = (ch, style.fg(Color::Green));
            }

            if show_text {
                let text = progress_text(row.node.progress);
                let text_len = text.chars().count();
                if text_len <= len {
                    let at = first + (len - text_len) / 2;
                    for (i, ch) in text.chars().enumerate() {
                        cells[at + i] = (ch, style.fg(Color::Black).bg(Color::Green).add_modifier(Modifier::BOLD));
                    }
                }
            }
        }
        (Some(start), Some(_)) => {
            // Inverted range: flag it at the start date
            if let Some(col) = timeline.column(start).map(usize::from) {
                cells[col] = ('!', style.fg(Color::Red).add_modifier(Modifier::BOLD));
            }
        }
        _ => {}
    }

    Line::from(
        cells
            .into_iter()
            .map(|(ch, style)| Span::styled(ch.to_string(), style))
            .collect::<Vec<_>>(),
    )
}

fn render_timeline(
    f: &mut Frame,
    surface: &TerminalSurface,
    window: &[(usize, &BarRow)],
    selected: usize,
    today: NaiveDate,
    header_lines: u16,
    area: Rect,
) {
    let config = &surface.config;
    let block = Block::default().borders(Borders::ALL).title("Timeline");
    let inner_width = area.width.saturating_sub(2);

    let Some(timeline) = surface.timeline(today, inner_width) else {
        let empty = Paragraph::new("No tasks").block(block).style(Style::default().fg(Color::DarkGray));
        f.render_widget(empty, area);
        return;
    };

    let today_col = if config.today_marker.enabled {
        timeline.column(today).map(usize::from)
    } else {
        None
    };

    let mut lines: Vec<Line> = Vec::with_capacity(window.len() + header_lines as usize);
    lines.push(scale_line(&config.scale, &timeline));
    for subscale in &config.subscales {
        lines.push(scale_line(subscale, &timeline));
    }
    for (index, row) in window {
        lines.push(bar_line(row, &timeline, today_col, config.progress_text, row_style(*index, selected)));
    }

    f.render_widget(Paragraph::new(lines).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColumnConfig;
    use crate::core::{map_snapshot, Task};
    use ratatui::{backend::TestBackend, Terminal};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn loaded_surface(config: ChartConfig) -> TerminalSurface {
        let tasks = vec![
            Task::new(1, "Design", date(2024, 1, 1), date(2024, 1, 10)).with_progress(0.5),
            Task::new(2, "Build", date(2024, 1, 11), date(2024, 1, 20)).with_dependencies("1"),
        ];
        let chart = map_snapshot(&tasks, &config.date_format).into_chart();
        let mut surface = TerminalSurface::new();
        surface.init(&config).unwrap();
        surface.load(&chart).unwrap();
        surface
    }

    fn draw(surface: &TerminalSurface, today: NaiveDate) -> Vec<String> {
        let backend = TestBackend::new(120, 12);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| render_gantt(f, surface, 0, today, f.area()))
            .unwrap();

        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect())
            .collect()
    }

    #[test]
    fn test_load_parses_dates() {
        let surface = loaded_surface(ChartConfig::default());
        assert_eq!(surface.row_count(), 2);
        assert_eq!(surface.rows[0].start, Some(date(2024, 1, 1)));
        assert_eq!(surface.rows[1].end, Some(date(2024, 1, 20)));
        assert_eq!(surface.task_at(1), Some(TaskId(2)));
    }

    #[test]
    fn test_draws_grid_and_bars() {
        let surface = loaded_surface(ChartConfig::default());
        let screen = draw(&surface, date(2024, 1, 5)).join("\n");

        assert!(screen.contains("Task name"));
        assert!(screen.contains("Design"));
        assert!(screen.contains("01.01.2024"));
        assert!(screen.contains("50%"));
        assert!(screen.contains("January, 2024"));
        assert!(screen.contains(BAR_DONE));
        assert!(screen.contains(BAR_LEFT));
    }

    #[test]
    fn test_today_marker_only_when_enabled() {
        let surface = loaded_surface(ChartConfig::default());
        let screen = draw(&surface, date(2024, 1, 15)).join("\n");
        assert!(screen.contains(MARKER));

        let mut config = ChartConfig::default();
        config.today_marker.enabled = false;
        let surface = loaded_surface(config);
        let screen = draw(&surface, date(2024, 1, 15)).join("\n");
        assert!(!screen.contains(MARKER));
    }

    #[test]
    fn test_clear_shows_empty_timeline() {
        let mut surface = loaded_surface(ChartConfig::default());
        surface.clear_all().unwrap();
        assert!(surface.chart().is_none());

        let screen = draw(&surface, date(2024, 1, 1)).join("\n");
        assert!(screen.contains("No tasks"));
    }

    #[test]
    fn test_fit_tasks_off_widens_to_today() {
        let mut config = ChartConfig::default();
        config.fit_tasks = false;
        let surface = loaded_surface(config);
        let timeline = surface.timeline(date(2024, 3, 1), 60).unwrap();
        assert_eq!(timeline.end, date(2024, 3, 1));

        let fitted = loaded_surface(ChartConfig::default());
        let timeline = fitted.timeline(date(2024, 3, 1), 60).unwrap();
        assert_eq!(timeline.end, date(2024, 1, 20));
    }

    #[test]
    fn test_oversized_columns_do_not_overflow() {
        let mut config = ChartConfig::default();
        config.columns = vec![
            ColumnConfig::new(ColumnField::Text, "Name", 40000, Align::Left),
            ColumnConfig::new(ColumnField::Progress, "Done", 40000, Align::Right),
        ];
        assert!(config.validate().is_ok());

        let surface = loaded_surface(config);
        let screen = draw(&surface, date(2024, 1, 5)).join("\n");
        assert!(screen.contains("Name"));
    }

    #[test]
    fn test_destroy_resets_surface() {
        let mut surface = loaded_surface(ChartConfig::default());
        surface.destroy().unwrap();
        assert!(!surface.is_initialized());
        assert_eq!(surface.row_count(), 0);
    }
}
