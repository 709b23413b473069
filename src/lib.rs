//! GanttView - reactive Gantt chart view
//!
//! Maps task list snapshots (with comma-separated dependency references)
//! onto chart nodes and finish-to-start links, and keeps a render surface
//! in sync with a task source.

pub mod app;
pub mod config;
pub mod core;
pub mod surface;
pub mod ui;
pub mod view;

// Re-exports
pub use crate::app::App;
pub use crate::config::{ChartConfig, DateFormat};
pub use crate::core::{
    map_snapshot, ChartData, ChartEdge, ChartNode, LinkKind, MalformedReference, MapOutcome, Task, TaskFile, TaskId,
    TaskSource, TaskStore,
};
pub use crate::surface::{MemorySurface, RenderSurface};
pub use crate::view::{GanttView, RenderReport};

/// Result type alias
pub type Result<T> = anyhow::Result<T>;
