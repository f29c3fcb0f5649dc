use chrono::NaiveDate;

use crate::error::{SnapshotError, SnapshotResult};
use crate::planning::PlanningSnapshot;

/// Anything that can hand the calculator a complete planning snapshot.
pub trait SnapshotSource {
    fn load_snapshot(&self) -> SnapshotResult<PlanningSnapshot>;
}

pub(crate) fn parse_date(input: &str) -> SnapshotResult<Option<NaiveDate>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map(Some)
        .map_err(|e| SnapshotError::InvalidData(format!("invalid date '{input}': {e}")))
}

pub(crate) fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

pub mod file;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use file::{
    CsvSnapshotFiles, JsonSnapshotFile, load_snapshot_from_json, save_report_to_json,
    save_snapshot_to_csv, save_snapshot_to_json, save_timelines_to_csv,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteSnapshotSource;
