use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::config::SchedulerConfig;
use crate::error::ValidationError;

/// A person whose weekly hours are split across the items assigned to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Developer {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "weeklyCapacityHours", alias = "weekly_hours")]
    pub weekly_capacity_hours: f64,
}

impl Developer {
    pub fn new(id: impl Into<String>, weekly_capacity_hours: f64) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            weekly_capacity_hours,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Man-days of output per working day. Zero for missing or invalid capacity.
    pub fn daily_velocity(&self, config: &SchedulerConfig) -> f64 {
        if !self.weekly_capacity_hours.is_finite() || self.weekly_capacity_hours <= 0.0 {
            return 0.0;
        }
        self.weekly_capacity_hours / config.days_per_week / config.hours_per_day
    }
}

/// A unit of work with an effort estimate, assignees and an optional fixed start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulableItem {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(alias = "manDays")]
    pub man_days: f64,
    #[serde(default, alias = "assignedDeveloperIds")]
    pub assigned_developer_ids: Vec<String>,
    #[serde(
        default,
        alias = "startDate",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_date: Option<NaiveDate>,
}

impl SchedulableItem {
    pub fn new(id: impl Into<String>, man_days: f64) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            man_days,
            assigned_developer_ids: Vec::new(),
            start_date: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn assigned_to<I, S>(mut self, developer_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.assigned_developer_ids = developer_ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn starting(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    /// Items without a start date or without assignees produce no timeline.
    pub fn is_schedulable(&self) -> bool {
        self.start_date.is_some() && !self.assigned_developer_ids.is_empty()
    }
}

/// Full developer roster and item set, read once and handed to the calculator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanningSnapshot {
    #[serde(default)]
    pub developers: Vec<Developer>,
    #[serde(default)]
    pub items: Vec<SchedulableItem>,
}

impl PlanningSnapshot {
    pub fn new(developers: Vec<Developer>, items: Vec<SchedulableItem>) -> Self {
        Self { developers, items }
    }

    pub fn developer(&self, id: &str) -> Option<&Developer> {
        self.developers.iter().find(|dev| dev.id == id)
    }

    pub fn item(&self, id: &str) -> Option<&SchedulableItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Insert or replace a developer by id. Returns true when it was new.
    pub fn upsert_developer(&mut self, developer: Developer) -> bool {
        match self.developers.iter_mut().find(|dev| dev.id == developer.id) {
            Some(existing) => {
                *existing = developer;
                false
            }
            None => {
                self.developers.push(developer);
                true
            }
        }
    }

    /// Insert or replace an item by id. Returns true when it was new.
    pub fn upsert_item(&mut self, item: SchedulableItem) -> bool {
        match self.items.iter_mut().find(|existing| existing.id == item.id) {
            Some(existing) => {
                *existing = item;
                false
            }
            None => {
                self.items.push(item);
                true
            }
        }
    }

    /// Remove a developer and drop it from every item's assignee list.
    pub fn remove_developer(&mut self, id: &str) -> bool {
        let before = self.developers.len();
        self.developers.retain(|dev| dev.id != id);
        if self.developers.len() == before {
            return false;
        }
        for item in &mut self.items {
            item.assigned_developer_ids.retain(|dev_id| dev_id != id);
        }
        true
    }

    pub fn remove_item(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.items.len() != before
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_snapshot(self)
    }
}

/// Shape checks the caller is expected to run before computing timelines.
pub fn validate_snapshot(snapshot: &PlanningSnapshot) -> Result<(), ValidationError> {
    let mut developer_ids = HashSet::with_capacity(snapshot.developers.len());
    for (idx, developer) in snapshot.developers.iter().enumerate() {
        if developer.id.trim().is_empty() {
            return Err(ValidationError::EmptyDeveloperId(idx));
        }
        if !developer_ids.insert(developer.id.as_str()) {
            return Err(ValidationError::DuplicateDeveloper(developer.id.clone()));
        }
    }

    let mut item_ids = HashSet::with_capacity(snapshot.items.len());
    for (idx, item) in snapshot.items.iter().enumerate() {
        if item.id.trim().is_empty() {
            return Err(ValidationError::EmptyItemId(idx));
        }
        if !item_ids.insert(item.id.as_str()) {
            return Err(ValidationError::DuplicateItem(item.id.clone()));
        }
    }
    Ok(())
}
