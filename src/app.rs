//! Application state and main event loop

use crate::config::ChartConfig;
use crate::core::{TaskFile, TaskId, TaskStore};
use crate::ui::{render_screen, TerminalSurface, TUI};
use crate::view::GanttView;
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use std::path::PathBuf;
use std::time::Duration;

const PROGRESS_STEP: f64 = 0.1;

/// Application state
pub struct App {
    pub store: TaskStore,
    pub view: GanttView<TerminalSurface>,
    pub project: Option<String>,
    pub source_path: Option<PathBuf>,
    pub selected: usize,
    pub should_quit: bool,
    pub status: Option<String>,
}

impl App {
    /// Create a new app over the tasks in `file`
    pub fn new(file: TaskFile, source_path: Option<PathBuf>, config: ChartConfig) -> Result<Self> {
        let store = TaskStore::new(file.tasks);
        let view = GanttView::start(TerminalSurface::new(), config, &store)?;

        Ok(Self {
            store,
            view,
            project: file.project,
            source_path,
            selected: 0,
            should_quit: false,
            status: None,
        })
    }

    /// Apply any pending snapshot to the chart
    pub fn tick(&mut self) -> Result<()> {
        if self.view.pump()? {
            let rows = self.view.surface().row_count();
            if self.selected >= rows {
                self.selected = rows.saturating_sub(1);
            }

            if let Some(report) = self.view.last_report() {
                self.status = match report.skipped.len() {
                    0 => None,
                    n => Some(format!("{} malformed dependency reference(s) skipped", n)),
                };
            }
        }
        Ok(())
    }

    /// Task under the cursor
    pub fn selected_task(&self) -> Option<TaskId> {
        self.view.surface().task_at(self.selected)
    }

    /// Handle keyboard input
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char('r') => {
                self.reload()?;
            }
            KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.selected + 1 < self.view.surface().row_count() {
                    self.selected += 1;
                }
            }
            KeyCode::Char('+') => self.adjust_progress(PROGRESS_STEP)?,
            KeyCode::Char('-') => self.adjust_progress(-PROGRESS_STEP)?,
            KeyCode::Char('x') => {
                if let Some(id) = self.selected_task() {
                    let task = self.store.remove_task(id)?;
                    log::info!("Removed task {} ({})", id, task.name);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn adjust_progress(&mut self, delta: f64) -> Result<()> {
        let Some(id) = self.selected_task() else {
            return Ok(());
        };
        self.store.update_task(id, |task| {
            let stepped = ((task.progress + delta) * 10.0).round() / 10.0;
            task.progress = stepped.clamp(0.0, 1.0);
        })
    }

    /// Re-read the task file into the store
    pub fn reload(&mut self) -> Result<()> {
        let Some(path) = self.source_path.clone() else {
            self.status = Some("No task file to reload".to_string());
            return Ok(());
        };

        let file = TaskFile::from_file(&path).with_context(|| format!("reloading {}", path.display()))?;
        log::info!("Reloaded {} tasks from {}", file.tasks.len(), path.display());
        self.project = file.project;
        self.store.replace_all(file.tasks);
        Ok(())
    }

    /// Run the event loop until the user quits
    pub fn run(&mut self, tui: &mut TUI) -> Result<()> {
        while !self.should_quit {
            self.tick()?;

            let today = Self::today();
            tui.terminal().draw(|f| render_screen(f, self, today))?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        if let Err(e) = self.handle_key(key) {
                            log::warn!("{:#}", e);
                            self.status = Some(format!("{:#}", e));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    pub fn today() -> NaiveDate {
        Local::now().date_naive()
    }
}
