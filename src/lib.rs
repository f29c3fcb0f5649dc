pub mod calculations;
pub mod calendar;
pub mod config;
pub mod error;
pub mod logging;
pub mod persistence;
pub mod planning;
pub mod report;
pub mod scale;
pub mod timeline;

#[cfg(feature = "http_api")]
pub mod http_api;

pub use calculations::{
    HORIZON_DAYS, ItemSpan, TimelineCalculator, compute_timelines, compute_timelines_default,
    detect_conflicts,
};
pub use calendar::{WorkCalendar, WorkCalendarConfig, WorkingDayAxis};
pub use config::{DEFAULT_MAX_ITERATIONS, MultiAssigneePolicy, SchedulerConfig};
pub use error::{CalendarError, ConfigError, SnapshotError, SnapshotResult, ValidationError};
pub use persistence::{
    CsvSnapshotFiles, JsonSnapshotFile, SnapshotSource, load_snapshot_from_json,
    save_report_to_json, save_snapshot_to_csv, save_snapshot_to_json, save_timelines_to_csv,
};
#[cfg(feature = "sqlite")]
pub use persistence::SqliteSnapshotSource;
pub use planning::{Developer, PlanningSnapshot, SchedulableItem, validate_snapshot};
pub use report::{conflicts_frame, timelines_frame};
pub use scale::{BarGeometry, ChartWindow, ScaleTick, TimeScale};
pub use timeline::{CapacityConflict, Diagnostic, Segment, Timeline, TimelineReport};
