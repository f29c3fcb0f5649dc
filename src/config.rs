use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::calendar::{WorkCalendar, WorkCalendarConfig};
use crate::error::ConfigError;

pub const DEFAULT_MAX_ITERATIONS: usize = 32;
pub const DEFAULT_HOURS_PER_DAY: f64 = 8.0;
pub const DEFAULT_DAYS_PER_WEEK: f64 = 5.0;

/// How an item with several assignees turns their capacity into progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiAssigneePolicy {
    /// The first assignee with positive capacity sets the pace; the others
    /// only reserve their time.
    #[default]
    PrimaryDeveloper,
    /// Every assignee contributes its share of capacity.
    CombinedCapacity,
}

impl MultiAssigneePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MultiAssigneePolicy::PrimaryDeveloper => "primary_developer",
            MultiAssigneePolicy::CombinedCapacity => "combined_capacity",
        }
    }
}

impl FromStr for MultiAssigneePolicy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "primary" | "primary_developer" => Ok(MultiAssigneePolicy::PrimaryDeveloper),
            "combined" | "combined_capacity" => Ok(MultiAssigneePolicy::CombinedCapacity),
            other => Err(ConfigError::InvalidValue {
                field: "multi_assignee_policy",
                message: format!("unknown policy '{other}'"),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub max_iterations: usize,
    pub hours_per_day: f64,
    pub days_per_week: f64,
    pub multi_assignee_policy: MultiAssigneePolicy,
    pub calendar: WorkCalendarConfig,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            hours_per_day: DEFAULT_HOURS_PER_DAY,
            days_per_week: DEFAULT_DAYS_PER_WEEK,
            multi_assignee_policy: MultiAssigneePolicy::default(),
            calendar: WorkCalendarConfig::default(),
        }
    }
}

impl SchedulerConfig {
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        let config: SchedulerConfig = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn save_json_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_iterations",
                message: "must be at least 1".into(),
            });
        }
        if !self.hours_per_day.is_finite() || self.hours_per_day <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "hours_per_day",
                message: format!("must be positive (got {})", self.hours_per_day),
            });
        }
        if !self.days_per_week.is_finite() || self.days_per_week <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "days_per_week",
                message: format!("must be positive (got {})", self.days_per_week),
            });
        }
        WorkCalendar::from_config(&self.calendar)?;
        Ok(())
    }

    pub fn work_calendar(&self) -> Result<WorkCalendar, ConfigError> {
        Ok(WorkCalendar::from_config(&self.calendar)?)
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_policy(mut self, policy: MultiAssigneePolicy) -> Self {
        self.multi_assignee_policy = policy;
        self
    }

    pub fn with_calendar(mut self, calendar: &WorkCalendar) -> Self {
        self.calendar = calendar.to_config();
        self
    }
}
