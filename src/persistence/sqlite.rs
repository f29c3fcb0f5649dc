use rusqlite::{Connection, OpenFlags};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use super::{SnapshotSource, parse_date};
use crate::error::{SnapshotError, SnapshotResult};
use crate::planning::{Developer, PlanningSnapshot, SchedulableItem, validate_snapshot};

/// Tables read by [`SqliteSnapshotSource`]. Exposed so callers can seed a database.
pub const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS developers (
        id TEXT PRIMARY KEY,
        name TEXT,
        weekly_capacity_hours REAL NOT NULL DEFAULT 0
    );
    CREATE TABLE IF NOT EXISTS use_cases (
        id TEXT PRIMARY KEY,
        name TEXT,
        man_days REAL NOT NULL,
        start_date TEXT
    );
    CREATE TABLE IF NOT EXISTS use_case_developers (
        use_case_id TEXT NOT NULL,
        developer_id TEXT NOT NULL,
        PRIMARY KEY (use_case_id, developer_id)
    );
"#;

/// Read-only view over an application database. Row order follows `rowid`.
pub struct SqliteSnapshotSource {
    connection: Mutex<Connection>,
}

impl SqliteSnapshotSource {
    pub fn open<P: AsRef<Path>>(path: P) -> SnapshotResult<Self> {
        let connection = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self::from_connection(connection))
    }

    pub fn from_connection(connection: Connection) -> Self {
        Self {
            connection: Mutex::new(connection),
        }
    }

    fn read_developers(connection: &Connection) -> SnapshotResult<Vec<Developer>> {
        let mut stmt = connection
            .prepare("SELECT id, name, weekly_capacity_hours FROM developers ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<f64>>(2)?,
            ))
        })?;
        let mut developers = Vec::new();
        for row in rows {
            let (id, name, hours) = row?;
            developers.push(
                Developer::new(id, hours.unwrap_or(0.0)).with_name(name.unwrap_or_default()),
            );
        }
        Ok(developers)
    }

    fn read_items(connection: &Connection) -> SnapshotResult<Vec<SchedulableItem>> {
        let mut assignments: HashMap<String, Vec<String>> = HashMap::new();
        let mut stmt = connection
            .prepare("SELECT use_case_id, developer_id FROM use_case_developers ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (use_case_id, developer_id) = row?;
            assignments.entry(use_case_id).or_default().push(developer_id);
        }

        let mut stmt = connection
            .prepare("SELECT id, name, man_days, start_date FROM use_cases ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        })?;
        let mut items = Vec::new();
        for row in rows {
            let (id, name, man_days, start_date) = row?;
            let assignees = assignments.remove(&id).unwrap_or_default();
            let mut item = SchedulableItem::new(id, man_days)
                .with_name(name.unwrap_or_default())
                .assigned_to(assignees);
            item.start_date = match start_date {
                Some(raw) => parse_date(&raw)?,
                None => None,
            };
            items.push(item);
        }
        for orphan in assignments.keys() {
            tracing::warn!(use_case = %orphan, "assignment references unknown use case");
        }
        Ok(items)
    }
}

impl SnapshotSource for SqliteSnapshotSource {
    fn load_snapshot(&self) -> SnapshotResult<PlanningSnapshot> {
        let connection = self
            .connection
            .lock()
            .map_err(|_| SnapshotError::InvalidData("sqlite connection lock poisoned".into()))?;
        let developers = Self::read_developers(&connection)?;
        let items = Self::read_items(&connection)?;
        let snapshot = PlanningSnapshot::new(developers, items);
        validate_snapshot(&snapshot)?;
        Ok(snapshot)
    }
}
