//! Chart data mapper - task snapshot to chart nodes and links
//!
//! Pure and stateless: every call builds its output from scratch, and edge
//! ids come from a counter local to that call.

use super::task::{Task, TaskId};
use crate::config::DateFormat;
use serde::{Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// One task bar on the chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartNode {
    pub id: TaskId,
    pub text: String,
    pub start_date: String,
    pub end_date: String,
    pub progress: f64,
}

/// Link identifier, unique within one snapshot only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct EdgeId(pub u64);

/// Precedence relation drawn by a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    FinishToStart,
}

impl LinkKind {
    /// Numeric link type used by chart widgets
    pub fn code(self) -> u8 {
        match self {
            Self::FinishToStart => 0,
        }
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FinishToStart => write!(f, "finish-to-start"),
        }
    }
}

impl Serialize for LinkKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

/// Dependency connector from predecessor to successor
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartEdge {
    pub id: EdgeId,
    pub source: TaskId,
    pub target: TaskId,
    #[serde(rename = "type")]
    pub kind: LinkKind,
}

/// Payload loaded into a render surface
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartData {
    #[serde(rename = "data")]
    pub nodes: Vec<ChartNode>,
    #[serde(rename = "links")]
    pub edges: Vec<ChartEdge>,
}

impl ChartData {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: TaskId) -> Option<&ChartNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Edges pointing into `id`
    pub fn predecessors(&self, id: TaskId) -> impl Iterator<Item = TaskId> + '_ {
        self.edges.iter().filter(move |e| e.target == id).map(|e| e.source)
    }

    /// Edges leaving `id`
    pub fn successors(&self, id: TaskId) -> impl Iterator<Item = TaskId> + '_ {
        self.edges.iter().filter(move |e| e.source == id).map(|e| e.target)
    }
}

/// A dependency token that does not name a task id
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("task {task_id}: dependency '{token}' is not a valid task id")]
pub struct MalformedReference {
    pub task_id: TaskId,
    pub token: String,
}

/// Result of mapping one snapshot
#[derive(Debug, Clone, PartialEq)]
pub enum MapOutcome {
    /// Empty snapshot: the surface should be cleared, not rendered
    Clear,
    Render {
        chart: ChartData,
        skipped: Vec<MalformedReference>,
    },
}

impl MapOutcome {
    pub fn chart(&self) -> Option<&ChartData> {
        match self {
            Self::Clear => None,
            Self::Render { chart, .. } => Some(chart),
        }
    }

    pub fn skipped(&self) -> &[MalformedReference] {
        match self {
            Self::Clear => &[],
            Self::Render { skipped, .. } => skipped,
        }
    }

    /// Chart payload, empty for a clear outcome
    pub fn into_chart(self) -> ChartData {
        match self {
            Self::Clear => ChartData::default(),
            Self::Render { chart, .. } => chart,
        }
    }
}

/// Split a dependency field into predecessor ids
///
/// Tokens are separated by commas and trimmed. Blank tokens are ignored;
/// anything that is not a positive integer is returned as malformed.
pub fn parse_dependencies(task_id: TaskId, text: &str) -> (Vec<TaskId>, Vec<MalformedReference>) {
    let mut ids = Vec::new();
    let mut malformed = Vec::new();

    for token in text.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        match token.parse::<u64>() {
            Ok(id) if id > 0 => ids.push(TaskId(id)),
            _ => malformed.push(MalformedReference {
                task_id,
                token: token.to_string(),
            }),
        }
    }

    (ids, malformed)
}

/// Completion label drawn on a bar, e.g. `0.456` -> `"46%"`
pub fn progress_text(progress: f64) -> String {
    format!("{}%", (progress * 100.0).round() as i64)
}

/// Map one task snapshot onto chart nodes and links
pub fn map_snapshot(tasks: &[Task], date_format: &DateFormat) -> MapOutcome {
    if tasks.is_empty() {
        return MapOutcome::Clear;
    }

    let nodes = tasks
        .iter()
        .map(|task| ChartNode {
            id: task.id,
            text: task.name.clone(),
            start_date: date_format.format(task.start_date),
            end_date: date_format.format(task.end_date),
            progress: task.progress,
        })
        .collect();

    let mut edges = Vec::new();
    let mut skipped = Vec::new();
    let mut next_edge = 1u64;

    for task in tasks {
        let Some(deps) = task.dependencies.as_deref() else {
            continue;
        };

        let (sources, malformed) = parse_dependencies(task.id, deps);
        skipped.extend(malformed);

        for source in sources {
            edges.push(ChartEdge {
                id: EdgeId(next_edge),
                source,
                target: task.id,
                kind: LinkKind::FinishToStart,
            });
            next_edge += 1;
        }
    }

    MapOutcome::Render {
        chart: ChartData { nodes, edges },
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::HashSet;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> Vec<Task> {
        vec![
            Task::new(1, "A", date(2024, 1, 1), date(2024, 1, 5))
                .with_progress(0.5)
                .with_dependencies(""),
            Task::new(2, "B", date(2024, 1, 6), date(2024, 1, 10)).with_dependencies("1"),
        ]
    }

    fn render(tasks: &[Task]) -> (ChartData, Vec<MalformedReference>) {
        match map_snapshot(tasks, &DateFormat::default()) {
            MapOutcome::Render { chart, skipped } => (chart, skipped),
            MapOutcome::Clear => panic!("expected a render outcome"),
        }
    }

    #[test]
    fn test_worked_example() {
        let (chart, skipped) = render(&sample());
        assert!(skipped.is_empty());

        assert_eq!(chart.nodes.len(), 2);
        assert_eq!(chart.nodes[0].id, TaskId(1));
        assert_eq!(chart.nodes[0].text, "A");
        assert_eq!(chart.nodes[0].start_date, "01.01.2024");
        assert_eq!(chart.nodes[0].end_date, "05.01.2024");
        assert_eq!(chart.nodes[0].progress, 0.5);
        assert_eq!(chart.nodes[1].id, TaskId(2));

        assert_eq!(chart.edges.len(), 1);
        assert_eq!(chart.edges[0].source, TaskId(1));
        assert_eq!(chart.edges[0].target, TaskId(2));
        assert_eq!(chart.edges[0].kind, LinkKind::FinishToStart);
    }

    #[test]
    fn test_empty_snapshot_clears() {
        let outcome = map_snapshot(&[], &DateFormat::default());
        assert_eq!(outcome, MapOutcome::Clear);
        assert!(outcome.chart().is_none());
        assert!(outcome.skipped().is_empty());
        assert!(outcome.into_chart().is_empty());
    }

    #[test]
    fn test_nodes_match_tasks_in_order() {
        let tasks: Vec<Task> = [5u64, 3, 9, 1]
            .iter()
            .map(|&id| Task::new(id, format!("t{id}"), date(2024, 5, 1), date(2024, 5, 2)))
            .collect();

        let (chart, _) = render(&tasks);
        let ids: Vec<TaskId> = chart.nodes.iter().map(|n| n.id).collect();
        let expected: Vec<TaskId> = tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_two_dependencies_with_spaces() {
        let tasks = vec![Task::new(4, "D", date(2024, 2, 1), date(2024, 2, 3)).with_dependencies("2, 3")];
        let (chart, skipped) = render(&tasks);

        assert!(skipped.is_empty());
        assert_eq!(chart.edges.len(), 2);
        assert!(chart.edges.iter().all(|e| e.target == TaskId(4)));
        assert!(chart.edges.iter().all(|e| e.kind == LinkKind::FinishToStart));
        assert_eq!(chart.edges[0].source, TaskId(2));
        assert_eq!(chart.edges[1].source, TaskId(3));
    }

    #[test]
    fn test_no_edges_without_dependencies() {
        let tasks = vec![
            Task::new(1, "A", date(2024, 1, 1), date(2024, 1, 2)),
            Task::new(2, "B", date(2024, 1, 1), date(2024, 1, 2)).with_dependencies("   "),
            Task::new(3, "C", date(2024, 1, 1), date(2024, 1, 2)).with_dependencies("1"),
        ];
        let (chart, _) = render(&tasks);

        assert_eq!(chart.predecessors(TaskId(1)).count(), 0);
        assert_eq!(chart.predecessors(TaskId(2)).count(), 0);
        assert_eq!(chart.predecessors(TaskId(3)).collect::<Vec<_>>(), vec![TaskId(1)]);
        assert_eq!(chart.successors(TaskId(1)).collect::<Vec<_>>(), vec![TaskId(3)]);
    }

    #[test]
    fn test_malformed_tokens_are_skipped_and_reported() {
        let tasks = vec![Task::new(7, "G", date(2024, 1, 1), date(2024, 1, 2)).with_dependencies("1, abc, 0, -2,,3,")];
        let (chart, skipped) = render(&tasks);

        let sources: Vec<TaskId> = chart.edges.iter().map(|e| e.source).collect();
        assert_eq!(sources, vec![TaskId(1), TaskId(3)]);

        let tokens: Vec<&str> = skipped.iter().map(|s| s.token.as_str()).collect();
        assert_eq!(tokens, vec!["abc", "0", "-2"]);
        assert!(skipped.iter().all(|s| s.task_id == TaskId(7)));
    }

    #[test]
    fn test_dangling_reference_passes_through() {
        let tasks = vec![Task::new(1, "A", date(2024, 1, 1), date(2024, 1, 2)).with_dependencies("99")];
        let (chart, skipped) = render(&tasks);
        assert!(skipped.is_empty());
        assert_eq!(chart.edges[0].source, TaskId(99));
        assert!(chart.node(TaskId(99)).is_none());
    }

    #[test]
    fn test_edge_ids_unique_within_snapshot() {
        let tasks = vec![
            Task::new(1, "A", date(2024, 1, 1), date(2024, 1, 2)),
            Task::new(2, "B", date(2024, 1, 1), date(2024, 1, 2)).with_dependencies("1"),
            Task::new(3, "C", date(2024, 1, 1), date(2024, 1, 2)).with_dependencies("1,2"),
            Task::new(4, "D", date(2024, 1, 1), date(2024, 1, 2)).with_dependencies("1,2,3"),
        ];
        let (chart, _) = render(&tasks);
        let ids: HashSet<EdgeId> = chart.edges.iter().map(|e| e.id).collect();
        assert_eq!(chart.edges.len(), 6);
        assert_eq!(ids.len(), 6);
    }

    #[test]
    fn test_idempotent_apart_from_edge_ids() {
        let tasks = sample();
        let (first, _) = render(&tasks);
        let (second, _) = render(&tasks);

        assert_eq!(first.nodes, second.nodes);
        let strip = |chart: &ChartData| -> Vec<(TaskId, TaskId, LinkKind)> {
            chart.edges.iter().map(|e| (e.source, e.target, e.kind)).collect()
        };
        assert_eq!(strip(&first), strip(&second));
    }

    #[test]
    fn test_progress_and_inverted_dates_pass_through() {
        let tasks = vec![Task::new(1, "A", date(2024, 3, 9), date(2024, 3, 1)).with_progress(1.7)];
        let (chart, _) = render(&tasks);
        assert_eq!(chart.nodes[0].progress, 1.7);
        assert_eq!(chart.nodes[0].start_date, "09.03.2024");
        assert_eq!(chart.nodes[0].end_date, "01.03.2024");
    }

    #[test]
    fn test_node_dates_round_trip() {
        let format = DateFormat::default();
        let (chart, _) = render(&sample());
        for (node, task) in chart.nodes.iter().zip(sample()) {
            assert_eq!(format.parse(&node.start_date), Some(task.start_date));
            assert_eq!(format.parse(&node.end_date), Some(task.end_date));
        }
    }

    #[test]
    fn test_payload_json_shape() {
        let (chart, _) = render(&sample());
        let json = serde_json::to_value(&chart).unwrap();
        assert_eq!(json["data"][1]["text"], "B");
        assert_eq!(json["links"][0]["source"], 1);
        assert_eq!(json["links"][0]["target"], 2);
        assert_eq!(json["links"][0]["type"], 0);
    }

    #[test]
    fn test_progress_text() {
        assert_eq!(progress_text(0.0), "0%");
        assert_eq!(progress_text(0.456), "46%");
        assert_eq!(progress_text(1.0), "100%");
    }
}
