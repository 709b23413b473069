//! Gantt view - binds a task source to a render surface
//!
//! The view owns its surface handle and its subscription. Starting the
//! view initialises the surface and subscribes; stopping it (or dropping
//! it) unsubscribes, clears the surface and destroys it.

use crate::config::ChartConfig;
use crate::core::{map_snapshot, MalformedReference, MapOutcome, Subscription, Task, TaskSource};
use crate::surface::RenderSurface;
use anyhow::Result;

/// What a single render did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderReport {
    pub nodes: usize,
    pub edges: usize,
    /// Snapshot was empty and the surface was only cleared
    pub cleared: bool,
    pub skipped: Vec<MalformedReference>,
}

pub struct GanttView<S: RenderSurface> {
    surface: S,
    config: ChartConfig,
    subscription: Option<Subscription>,
    renders: u64,
    last_report: Option<RenderReport>,
    stopped: bool,
}

impl<S: RenderSurface> GanttView<S> {
    /// Initialise `surface` and subscribe to `source`
    pub fn start(mut surface: S, config: ChartConfig, source: &impl TaskSource) -> Result<Self> {
        surface.init(&config)?;
        log::info!("Gantt view started");

        Ok(Self {
            surface,
            config,
            subscription: Some(source.subscribe()),
            renders: 0,
            last_report: None,
            stopped: false,
        })
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    /// Number of snapshots rendered so far
    pub fn renders(&self) -> u64 {
        self.renders
    }

    pub fn last_report(&self) -> Option<&RenderReport> {
        self.last_report.as_ref()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Clear the surface and load `tasks` into it
    pub fn render(&mut self, tasks: &[Task]) -> Result<RenderReport> {
        self.surface.clear_all()?;

        let report = match map_snapshot(tasks, &self.config.date_format) {
            MapOutcome::Clear => {
                log::debug!("Empty snapshot, surface cleared");
                RenderReport {
                    cleared: true,
                    ..RenderReport::default()
                }
            }
            MapOutcome::Render { chart, skipped } => {
                for reference in &skipped {
                    log::warn!("Skipping dependency: {}", reference);
                }
                self.surface.load(&chart)?;
                log::debug!(
                    "Rendered {} nodes, {} links ({} skipped)",
                    chart.nodes.len(),
                    chart.edges.len(),
                    skipped.len()
                );
                RenderReport {
                    nodes: chart.nodes.len(),
                    edges: chart.edges.len(),
                    cleared: false,
                    skipped,
                }
            }
        };

        self.renders += 1;
        self.last_report = Some(report.clone());
        Ok(report)
    }

    /// Render the latest pending snapshot, if there is one
    ///
    /// Returns `true` when a render happened. Once the source closes the
    /// subscription is released and later calls do nothing.
    pub fn pump(&mut self) -> Result<bool> {
        let Some(subscription) = self.subscription.as_mut() else {
            return Ok(false);
        };

        match subscription.try_next() {
            Ok(Some(tasks)) => {
                self.render(&tasks)?;
                Ok(true)
            }
            Ok(None) => Ok(false),
            Err(closed) => {
                log::info!("Gantt view: {}", closed);
                self.subscription = None;
                Ok(false)
            }
        }
    }

    /// Render every emission until the source closes
    pub async fn run(&mut self) -> Result<()> {
        while let Some(subscription) = self.subscription.as_mut() {
            match subscription.next().await {
                Some(tasks) => {
                    self.render(&tasks)?;
                }
                None => {
                    log::info!("Gantt view: task source closed");
                    self.subscription = None;
                }
            }
        }
        Ok(())
    }

    /// Unsubscribe, clear and destroy the surface
    pub fn stop(mut self) -> Result<()> {
        self.teardown()
    }

    fn teardown(&mut self) -> Result<()> {
        if self.stopped {
            return Ok(());
        }
        self.stopped = true;
        self.subscription = None;

        let cleared = self.surface.clear_all();
        let destroyed = self.surface.destroy();
        log::info!("Gantt view stopped after {} renders", self.renders);
        cleared.and(destroyed)
    }
}

impl<S: RenderSurface> Drop for GanttView<S> {
    fn drop(&mut self) {
        if let Err(e) = self.teardown() {
            log::warn!("Failed to tear down Gantt view: {}", e);
        }
    }
}
