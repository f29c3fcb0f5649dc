//! Date-to-position mapping for Gantt-style rendering.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::timeline::Timeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeScale {
    #[default]
    Day,
    Week,
    Month,
}

impl TimeScale {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeScale::Day => "day",
            TimeScale::Week => "week",
            TimeScale::Month => "month",
        }
    }

    /// Start of the scale unit containing `date`.
    pub fn floor(&self, date: NaiveDate) -> NaiveDate {
        match self {
            TimeScale::Day => date,
            TimeScale::Week => date - Duration::days(date.weekday().num_days_from_monday() as i64),
            TimeScale::Month => date.with_day(1).unwrap_or(date),
        }
    }

    /// Start of the unit following the one containing `date`.
    pub fn next_boundary(&self, date: NaiveDate) -> NaiveDate {
        let floor = self.floor(date);
        match self {
            TimeScale::Day => floor + Duration::days(1),
            TimeScale::Week => floor + Duration::days(7),
            TimeScale::Month => {
                let (year, month) = if floor.month() == 12 {
                    (floor.year() + 1, 1)
                } else {
                    (floor.year(), floor.month() + 1)
                };
                NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(floor + Duration::days(31))
            }
        }
    }

    pub fn label(&self, date: NaiveDate) -> String {
        match self {
            TimeScale::Day => date.format("%b %-d").to_string(),
            TimeScale::Week => {
                let week = date.iso_week();
                format!("W{:02} {}", week.week(), week.year())
            }
            TimeScale::Month => date.format("%b %Y").to_string(),
        }
    }
}

impl fmt::Display for TimeScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeScale {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "day" | "days" => Ok(TimeScale::Day),
            "week" | "weeks" => Ok(TimeScale::Week),
            "month" | "months" => Ok(TimeScale::Month),
            other => Err(format!("unknown time scale '{other}'")),
        }
    }
}

/// Horizontal placement of one bar, in percent of the chart width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarGeometry {
    pub left: f64,
    pub width: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleTick {
    pub date: NaiveDate,
    pub label: String,
    pub position: f64,
}

/// Visible date range `[start, end)` aligned to the scale's unit boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartWindow {
    start: NaiveDate,
    end: NaiveDate,
    scale: TimeScale,
}

impl ChartWindow {
    pub fn new(start: NaiveDate, end: NaiveDate, scale: TimeScale) -> Self {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        let start = scale.floor(start);
        let mut aligned_end = if scale.floor(end) == end {
            end
        } else {
            scale.next_boundary(end)
        };
        if aligned_end <= start {
            aligned_end = scale.next_boundary(start);
        }
        Self {
            start,
            end: aligned_end,
            scale,
        }
    }

    /// Window spanning the earliest start and the latest end of all timelines.
    pub fn from_timelines(timelines: &[Timeline], scale: TimeScale) -> Option<Self> {
        let start = timelines.iter().map(|t| t.start_date).min()?;
        let end = timelines.iter().map(|t| t.end_date).max()?;
        Some(Self::new(start, end, scale))
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn scale(&self) -> TimeScale {
        self.scale
    }

    pub fn total_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Linear position of `date` in percent, clamped to `[0, 100]`.
    pub fn position(&self, date: NaiveDate) -> f64 {
        let total = self.total_days().max(1) as f64;
        let offset = (date - self.start).num_days() as f64;
        (offset / total * 100.0).clamp(0.0, 100.0)
    }

    pub fn bar(&self, timeline: &Timeline) -> BarGeometry {
        let left = self.position(timeline.start_date);
        let right = self.position(timeline.end_date);
        BarGeometry {
            left,
            width: (right - left).max(0.0),
        }
    }

    pub fn ticks(&self) -> Vec<ScaleTick> {
        let mut ticks = Vec::new();
        let mut current = self.start;
        while current < self.end {
            ticks.push(ScaleTick {
                date: current,
                label: self.scale.label(current),
                position: self.position(current),
            });
            current = self.scale.next_boundary(current);
        }
        ticks
    }
}
