//! Chart configuration - typed options for the Gantt surface
//!
//! Loaded from YAML. Every field has a default, so an empty file (or no
//! file at all) yields the standard layout: a four-column grid, a monthly
//! scale with a daily subscale, a today marker and progress labels.

use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Canonical day-month-year format handed to the surface
pub const DEFAULT_DATE_FORMAT: &str = "%d.%m.%Y";

const CONFIG_FILE: &str = "ganttview/config.yml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid date format '{0}': must be %d, %m and %Y in that order and round-trip a date")]
    DateFormat(String),
    #[error("invalid scale format '{0}'")]
    ScaleFormat(String),
    #[error("at least one grid column is required")]
    NoColumns,
    #[error("column '{0}' must have a non-zero width")]
    ZeroWidth(String),
    #[error("scale step must be at least 1")]
    ZeroStep,
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Render `date` with `pattern`, or `None` if the pattern cannot be applied
pub fn try_format(date: NaiveDate, pattern: &str) -> Option<String> {
    let items: Vec<Item<'_>> = StrftimeItems::new(pattern).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return None;
    }
    let mut out = String::new();
    write!(out, "{}", date.format_with_items(items.into_iter())).ok()?;
    Some(out)
}

/// A validated day-month-year date pattern that formats and re-parses
/// losslessly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DateFormat(String);

impl DateFormat {
    pub fn new(pattern: impl Into<String>) -> Result<Self, ConfigError> {
        let pattern = pattern.into();
        // Fields must appear in day, month, year order
        let positions: Option<Vec<usize>> = ["%d", "%m", "%Y"].iter().map(|field| pattern.find(field)).collect();
        let day_month_year = positions.is_some_and(|p| p.windows(2).all(|w| w[0] < w[1]));
        // Day and month must be distinguishable, so check with 17 March
        let sample = NaiveDate::from_ymd_opt(2024, 3, 17).ok_or_else(|| ConfigError::DateFormat(pattern.clone()))?;
        let round_trips = try_format(sample, &pattern)
            .and_then(|text| NaiveDate::parse_from_str(&text, &pattern).ok())
            == Some(sample);

        if day_month_year && round_trips {
            Ok(Self(pattern))
        } else {
            Err(ConfigError::DateFormat(pattern))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn format(&self, date: NaiveDate) -> String {
        // Validated in `new`, formatting cannot fail
        date.format(&self.0).to_string()
    }

    pub fn parse(&self, text: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(text.trim(), &self.0).ok()
    }
}

impl Default for DateFormat {
    fn default() -> Self {
        Self(DEFAULT_DATE_FORMAT.to_string())
    }
}

impl TryFrom<String> for DateFormat {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DateFormat> for String {
    fn from(format: DateFormat) -> Self {
        format.0
    }
}

/// Grid column contents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnField {
    Text,
    StartDate,
    EndDate,
    Progress,
    Add,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub field: ColumnField,
    #[serde(default)]
    pub label: String,
    /// Width in terminal cells
    pub width: u16,
    #[serde(default)]
    pub align: Align,
}

impl ColumnConfig {
    pub fn new(field: ColumnField, label: &str, width: u16, align: Align) -> Self {
        Self {
            field,
            label: label.to_string(),
            width,
            align,
        }
    }
}

/// Timeline granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleUnit {
    Day,
    Week,
    Month,
    Year,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleConfig {
    pub unit: ScaleUnit,
    #[serde(default = "default_step")]
    pub step: u32,
    /// strftime pattern used for tick labels
    pub format: String,
}

fn default_step() -> u32 {
    1
}

impl ScaleConfig {
    pub fn new(unit: ScaleUnit, step: u32, format: &str) -> Self {
        Self {
            unit,
            step,
            format: format.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    pub enabled: bool,
    pub text: String,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            text: "Today".to_string(),
        }
    }
}

/// All options recognised by the Gantt surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub date_format: DateFormat,
    /// Fit the timeline to the task range instead of widening it to today
    pub fit_tasks: bool,
    pub columns: Vec<ColumnConfig>,
    pub scale: ScaleConfig,
    pub subscales: Vec<ScaleConfig>,
    pub today_marker: MarkerConfig,
    /// Print the completion percentage on each bar
    pub progress_text: bool,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            date_format: DateFormat::default(),
            fit_tasks: true,
            columns: vec![
                ColumnConfig::new(ColumnField::Text, "Task name", 20, Align::Left),
                ColumnConfig::new(ColumnField::StartDate, "Start", 12, Align::Center),
                ColumnConfig::new(ColumnField::EndDate, "End time", 12, Align::Center),
                ColumnConfig::new(ColumnField::Progress, "Progress", 9, Align::Center),
                ColumnConfig::new(ColumnField::Add, "", 3, Align::Center),
            ],
            scale: ScaleConfig::new(ScaleUnit::Month, 1, "%B, %Y"),
            subscales: vec![ScaleConfig::new(ScaleUnit::Day, 1, "%d")],
            today_marker: MarkerConfig::default(),
            progress_text: true,
        }
    }
}

impl ChartConfig {
    /// Load and validate a YAML config file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content).map_err(|err| match err {
            ConfigError::Yaml { source, .. } => ConfigError::Yaml {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not a map
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: ChartConfig = serde_yaml::from_str(content).map_err(|source| ConfigError::Yaml {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve the active config
    ///
    /// Priority:
    /// 1. explicit path
    /// 2. `<config dir>/ganttview/config.yml`
    /// 3. built-in defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        if let Some(path) = Self::default_path().filter(|p| p.exists()) {
            log::info!("Using config from {}", path.display());
            return Self::from_file(&path);
        }

        Ok(Self::default())
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_FILE))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.columns.is_empty() {
            return Err(ConfigError::NoColumns);
        }
        if let Some(column) = self.columns.iter().find(|c| c.width == 0) {
            let name = if column.label.is_empty() {
                format!("{:?}", column.field)
            } else {
                column.label.clone()
            };
            return Err(ConfigError::ZeroWidth(name));
        }

        let sample = NaiveDate::from_ymd_opt(2024, 3, 17).unwrap_or_default();
        for scale in std::iter::once(&self.scale).chain(self.subscales.iter()) {
            if scale.step == 0 {
                return Err(ConfigError::ZeroStep);
            }
            if try_format(sample, &scale.format).is_none() {
                return Err(ConfigError::ScaleFormat(scale.format.clone()));
            }
        }

        Ok(())
    }
}
