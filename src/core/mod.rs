//! Core - task model, task source, chart data mapping

mod mapper;
mod source;
mod task;

pub use mapper::{
    map_snapshot, parse_dependencies, progress_text, ChartData, ChartEdge, ChartNode, EdgeId, LinkKind,
    MalformedReference, MapOutcome,
};
pub use source::{SourceClosed, Subscription, TaskSource, TaskStore};
pub use task::{Task, TaskFile, TaskFileError, TaskId};
