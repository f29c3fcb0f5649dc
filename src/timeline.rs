use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A span `[start_day, end_day)` over which an item progresses at a constant rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start_day: i64,
    pub end_day: i64,
    /// Man-days completed per working day within the span.
    pub velocity: f64,
    pub work_done: f64,
}

impl Segment {
    pub fn len_days(&self) -> i64 {
        self.end_day - self.start_day
    }
}

/// Computed schedule for one item. Day offsets are working days from the plan origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    pub item_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_day: i64,
    pub end_day: i64,
    pub duration_days: i64,
    pub segments: Vec<Segment>,
}

impl Timeline {
    pub fn overlaps(&self, other: &Timeline) -> bool {
        self.start_day < other.end_day && self.end_day > other.start_day
    }

    pub fn total_work(&self) -> f64 {
        self.segments.iter().map(|segment| segment.work_done).sum()
    }
}

/// Items sharing at least one developer whose computed spans overlap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityConflict {
    pub developer_ids: Vec<String>,
    pub item_ids: Vec<String>,
}

/// Non-fatal observations made while computing timelines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    UnknownDeveloper {
        item_id: String,
        developer_id: String,
    },
    ZeroCapacity {
        developer_id: String,
    },
    StalledItem {
        item_id: String,
    },
    InvalidEffort {
        item_id: String,
        man_days: f64,
    },
    NotConverged {
        iterations: usize,
    },
    BeyondHorizon {
        item_id: String,
        horizon_days: i64,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnknownDeveloper {
                item_id,
                developer_id,
            } => write!(
                f,
                "item {item_id} is assigned to unknown developer {developer_id}"
            ),
            Diagnostic::ZeroCapacity { developer_id } => {
                write!(f, "developer {developer_id} has no weekly capacity")
            }
            Diagnostic::StalledItem { item_id } => {
                write!(f, "item {item_id} has no assignee with capacity and cannot progress")
            }
            Diagnostic::InvalidEffort { item_id, man_days } => {
                write!(f, "item {item_id} has invalid effort {man_days}")
            }
            Diagnostic::NotConverged { iterations } => write!(
                f,
                "end dates still moving after {iterations} iterations; showing last estimate"
            ),
            Diagnostic::BeyondHorizon {
                item_id,
                horizon_days,
            } => write!(
                f,
                "item {item_id} would take more than {horizon_days} working days and was left out"
            ),
        }
    }
}

/// Everything a single calculation produces.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TimelineReport {
    pub timelines: Vec<Timeline>,
    pub conflicts: Vec<CapacityConflict>,
    pub converged: bool,
    pub iterations: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<NaiveDate>,
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

impl TimelineReport {
    pub fn timeline(&self, item_id: &str) -> Option<&Timeline> {
        self.timelines.iter().find(|t| t.item_id == item_id)
    }

    pub fn latest_end(&self) -> Option<NaiveDate> {
        self.timelines.iter().map(|t| t.end_date).max()
    }

    pub fn earliest_start(&self) -> Option<NaiveDate> {
        self.timelines.iter().map(|t| t.start_date).min()
    }

    pub fn to_cli_summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("timelines={}", self.timelines.len()));
        parts.push(format!("conflicts={}", self.conflicts.len()));
        parts.push(format!("iterations={}", self.iterations));
        if !self.converged {
            parts.push("converged=false".to_string());
        }
        if let Some(date) = self.latest_end() {
            parts.push(format!("finish={date}"));
        }
        if !self.diagnostics.is_empty() {
            parts.push(format!("warnings={}", self.diagnostics.len()));
        }
        parts.join(", ")
    }
}
