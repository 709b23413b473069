//! Task model - the input side of the chart transform

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Positive task identifier, stable across snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl TaskId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TaskId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A project task as produced by the task source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Completion fraction, nominally in `[0, 1]`
    #[serde(default)]
    pub progress: f64,
    /// Comma-separated ids of predecessor tasks, e.g. `"1, 2"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<String>,
}

impl Task {
    pub fn new(id: u64, name: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            id: TaskId(id),
            name: name.into(),
            start_date,
            end_date,
            progress: 0.0,
            dependencies: None,
        }
    }

    pub fn with_progress(mut self, progress: f64) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_dependencies(mut self, dependencies: impl Into<String>) -> Self {
        self.dependencies = Some(dependencies.into());
        self
    }

    /// True when the dependency field holds anything besides whitespace
    pub fn has_dependencies(&self) -> bool {
        self.dependencies
            .as_deref()
            .is_some_and(|deps| !deps.trim().is_empty())
    }
}

/// Errors raised while reading a task file
#[derive(Debug, Error)]
pub enum TaskFileError {
    #[error("failed to read task file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid YAML in {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("duplicate task id {0}")]
    DuplicateId(TaskId),
}

/// On-disk task list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl TaskFile {
    /// Load a task file; `.json` files are read as JSON, anything else as YAML
    pub fn from_file(path: &Path) -> Result<Self, TaskFileError> {
        let content = std::fs::read_to_string(path).map_err(|source| TaskFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let file: TaskFile = if is_json {
            serde_json::from_str(&content).map_err(|source| TaskFileError::Json {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            serde_yaml::from_str(&content).map_err(|source| TaskFileError::Yaml {
                path: path.to_path_buf(),
                source,
            })?
        };

        file.check_unique_ids()?;
        Ok(file)
    }

    fn check_unique_ids(&self) -> Result<(), TaskFileError> {
        let mut seen = std::collections::HashSet::new();
        for task in &self.tasks {
            if !seen.insert(task.id) {
                return Err(TaskFileError::DuplicateId(task.id));
            }
        }
        Ok(())
    }
}
