//! Full-screen layout: header, Gantt chart, selected task details

use super::gantt::render_gantt;
use crate::app::App;
use crate::core::{progress_text, TaskId};
use chrono::NaiveDate;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Render the whole application screen
pub fn render_screen(f: &mut Frame, app: &App, today: NaiveDate) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(6),    // Gantt
            Constraint::Length(4), // Details + keys
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);
    render_gantt(f, app.view.surface(), app.selected, today, chunks[1]);
    render_footer(f, app, today, chunks[2]);
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let title = match &app.project {
        Some(project) => format!("📊 {} - GanttView", project),
        None => "📊 GanttView".to_string(),
    };

    let (tasks, links) = app
        .view
        .surface()
        .chart()
        .map(|c| (c.nodes.len(), c.edges.len()))
        .unwrap_or((0, 0));

    let text = format!("{} | Tasks: {} | Links: {}", title, tasks, links);
    let header = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL))
        .style(Style::default().fg(Color::Cyan));
    f.render_widget(header, area);
}

fn join_ids(ids: impl Iterator<Item = TaskId>) -> String {
    let ids: Vec<String> = ids.map(|id| id.to_string()).collect();
    if ids.is_empty() {
        "-".to_string()
    } else {
        ids.join(", ")
    }
}

fn render_footer(f: &mut Frame, app: &App, today: NaiveDate, area: Rect) {
    let surface = app.view.surface();
    let config = app.view.config();

    let details = match (surface.chart(), app.selected_task()) {
        (Some(chart), Some(id)) => {
            let name = chart.node(id).map(|n| n.text.as_str()).unwrap_or("?");
            let progress = chart.node(id).map(|n| progress_text(n.progress)).unwrap_or_default();
            Line::from(vec![
                Span::styled(format!("#{} {}", id, name), Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(format!(" {} ", progress)),
                Span::styled(
                    format!("| after: {} | before: {}", join_ids(chart.predecessors(id)), join_ids(chart.successors(id))),
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        }
        _ => Line::from(Span::styled("No tasks", Style::default().fg(Color::DarkGray))),
    };

    let mut keys = vec![Span::raw("q: Quit | ↑↓: Select | +/-: Progress | x: Remove | r: Reload")];
    if config.today_marker.enabled {
        keys.push(Span::styled(
            format!(" | ┆ {}: {}", config.today_marker.text, config.date_format.format(today)),
            Style::default().fg(Color::Yellow),
        ));
    }
    if let Some(status) = &app.status {
        keys.push(Span::styled(format!(" | {}", status), Style::default().fg(Color::Red)));
    }

    let footer = Paragraph::new(vec![details, Line::from(keys)]).block(Block::default().borders(Borders::TOP));
    f.render_widget(footer, area);
}
