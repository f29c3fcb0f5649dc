use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};

use super::{SnapshotSource, format_date, parse_date};
use crate::error::SnapshotResult;
use crate::planning::{Developer, PlanningSnapshot, SchedulableItem, validate_snapshot};
use crate::timeline::TimelineReport;

/// A single JSON document holding `{ "developers": [...], "items": [...] }`.
#[derive(Debug, Clone)]
pub struct JsonSnapshotFile {
    path: PathBuf,
}

impl JsonSnapshotFile {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotSource for JsonSnapshotFile {
    fn load_snapshot(&self) -> SnapshotResult<PlanningSnapshot> {
        load_snapshot_from_json(&self.path)
    }
}

pub fn save_snapshot_to_json<P: AsRef<Path>>(
    snapshot: &PlanningSnapshot,
    path: P,
) -> SnapshotResult<()> {
    validate_snapshot(snapshot)?;
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, snapshot)?;
    Ok(())
}

pub fn load_snapshot_from_json<P: AsRef<Path>>(path: P) -> SnapshotResult<PlanningSnapshot> {
    let file = File::open(path)?;
    let snapshot: PlanningSnapshot = serde_json::from_reader(file)?;
    validate_snapshot(&snapshot)?;
    Ok(snapshot)
}

pub fn save_report_to_json<P: AsRef<Path>>(report: &TimelineReport, path: P) -> SnapshotResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, report)?;
    Ok(())
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct DeveloperCsvRecord {
    id: String,
    #[serde(default)]
    name: String,
    weekly_capacity_hours: f64,
}

impl From<&Developer> for DeveloperCsvRecord {
    fn from(developer: &Developer) -> Self {
        Self {
            id: developer.id.clone(),
            name: developer.name.clone(),
            weekly_capacity_hours: developer.weekly_capacity_hours,
        }
    }
}

impl From<DeveloperCsvRecord> for Developer {
    fn from(record: DeveloperCsvRecord) -> Self {
        Developer::new(record.id, record.weekly_capacity_hours).with_name(record.name)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ItemCsvRecord {
    id: String,
    #[serde(default)]
    name: String,
    man_days: f64,
    #[serde(default)]
    assigned_developer_ids: String,
    #[serde(default)]
    start_date: String,
}

impl From<&SchedulableItem> for ItemCsvRecord {
    fn from(item: &SchedulableItem) -> Self {
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            man_days: item.man_days,
            assigned_developer_ids: item.assigned_developer_ids.join(";"),
            start_date: format_date(item.start_date),
        }
    }
}

impl ItemCsvRecord {
    fn into_item(self) -> SnapshotResult<SchedulableItem> {
        let start_date = parse_date(&self.start_date)?;
        let assignees = self
            .assigned_developer_ids
            .split(';')
            .map(str::trim)
            .filter(|id| !id.is_empty());
        let mut item = SchedulableItem::new(self.id, self.man_days)
            .with_name(self.name)
            .assigned_to(assignees);
        item.start_date = start_date;
        Ok(item)
    }
}

/// Two CSV files: developers (`id,name,weekly_capacity_hours`) and items
/// (`id,name,man_days,assigned_developer_ids,start_date`, assignees `;`-separated).
#[derive(Debug, Clone)]
pub struct CsvSnapshotFiles {
    developers: PathBuf,
    items: PathBuf,
}

impl CsvSnapshotFiles {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(developers: P, items: Q) -> Self {
        Self {
            developers: developers.into(),
            items: items.into(),
        }
    }
}

impl SnapshotSource for CsvSnapshotFiles {
    fn load_snapshot(&self) -> SnapshotResult<PlanningSnapshot> {
        let mut reader = csv::Reader::from_reader(File::open(&self.developers)?);
        let mut developers = Vec::new();
        for record in reader.deserialize::<DeveloperCsvRecord>() {
            developers.push(Developer::from(record?));
        }

        let mut reader = csv::Reader::from_reader(File::open(&self.items)?);
        let mut items = Vec::new();
        for record in reader.deserialize::<ItemCsvRecord>() {
            items.push(record?.into_item()?);
        }

        let snapshot = PlanningSnapshot::new(developers, items);
        validate_snapshot(&snapshot)?;
        tracing::debug!(
            developers = snapshot.developers.len(),
            items = snapshot.items.len(),
            "loaded csv snapshot"
        );
        Ok(snapshot)
    }
}

pub fn save_snapshot_to_csv<P: AsRef<Path>, Q: AsRef<Path>>(
    snapshot: &PlanningSnapshot,
    developers_path: P,
    items_path: Q,
) -> SnapshotResult<()> {
    validate_snapshot(snapshot)?;
    let mut writer = csv::Writer::from_writer(File::create(developers_path)?);
    for developer in &snapshot.developers {
        writer.serialize(DeveloperCsvRecord::from(developer))?;
    }
    writer.flush()?;

    let mut writer = csv::Writer::from_writer(File::create(items_path)?);
    for item in &snapshot.items {
        writer.serialize(ItemCsvRecord::from(item))?;
    }
    writer.flush()?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct TimelineCsvRecord<'a> {
    item_id: &'a str,
    start_date: String,
    end_date: String,
    start_day: i64,
    end_day: i64,
    duration_days: i64,
    segments: usize,
    conflict: bool,
}

/// One row per timeline, in report order.
pub fn save_timelines_to_csv<P: AsRef<Path>>(
    report: &TimelineReport,
    path: P,
) -> SnapshotResult<()> {
    let conflicted: HashSet<&str> = report
        .conflicts
        .iter()
        .flat_map(|conflict| conflict.item_ids.iter().map(String::as_str))
        .collect();
    let mut writer = csv::Writer::from_writer(File::create(path)?);
    for timeline in &report.timelines {
        writer.serialize(TimelineCsvRecord {
            item_id: &timeline.item_id,
            start_date: format_date(Some(timeline.start_date)),
            end_date: format_date(Some(timeline.end_date)),
            start_day: timeline.start_day,
            end_day: timeline.end_day,
            duration_days: timeline.duration_days,
            segments: timeline.segments.len(),
            conflict: conflicted.contains(timeline.item_id.as_str()),
        })?;
    }
    writer.flush()?;
    Ok(())
}
