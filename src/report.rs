//! Tabular views of a [`TimelineReport`].

use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::HashSet;

use crate::timeline::TimelineReport;

fn date_to_i32(date: NaiveDate) -> i32 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default();
    (date - epoch).num_days() as i32
}

/// One row per timeline, in report order. `start_date`/`end_date` are `Date` columns.
pub fn timelines_frame(report: &TimelineReport) -> PolarsResult<DataFrame> {
    let conflicted: HashSet<&str> = report
        .conflicts
        .iter()
        .flat_map(|conflict| conflict.item_ids.iter().map(String::as_str))
        .collect();

    let height = report.timelines.len();
    let mut ids = Vec::with_capacity(height);
    let mut starts = Vec::with_capacity(height);
    let mut ends = Vec::with_capacity(height);
    let mut durations = Vec::with_capacity(height);
    let mut segment_counts = Vec::with_capacity(height);
    let mut work = Vec::with_capacity(height);
    let mut in_conflict = Vec::with_capacity(height);
    for timeline in &report.timelines {
        ids.push(timeline.item_id.clone());
        starts.push(date_to_i32(timeline.start_date));
        ends.push(date_to_i32(timeline.end_date));
        durations.push(timeline.duration_days);
        segment_counts.push(timeline.segments.len() as u32);
        work.push(timeline.total_work());
        in_conflict.push(conflicted.contains(timeline.item_id.as_str()));
    }

    let columns = vec![
        Series::new(PlSmallStr::from_static("item_id"), ids).into_column(),
        Series::new(PlSmallStr::from_static("start_date"), starts)
            .cast(&DataType::Date)?
            .into_column(),
        Series::new(PlSmallStr::from_static("end_date"), ends)
            .cast(&DataType::Date)?
            .into_column(),
        Series::new(PlSmallStr::from_static("duration_days"), durations).into_column(),
        Series::new(PlSmallStr::from_static("segments"), segment_counts).into_column(),
        Series::new(PlSmallStr::from_static("man_days"), work).into_column(),
        Series::new(PlSmallStr::from_static("conflict"), in_conflict).into_column(),
    ];
    DataFrame::new(columns)
}

/// One row per conflict with comma-joined developer and item ids.
pub fn conflicts_frame(report: &TimelineReport) -> PolarsResult<DataFrame> {
    let developers: Vec<String> = report
        .conflicts
        .iter()
        .map(|conflict| conflict.developer_ids.join(","))
        .collect();
    let items: Vec<String> = report
        .conflicts
        .iter()
        .map(|conflict| conflict.item_ids.join(","))
        .collect();
    DataFrame::new(vec![
        Series::new(PlSmallStr::from_static("developers"), developers).into_column(),
        Series::new(PlSmallStr::from_static("items"), items).into_column(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::{CapacityConflict, Segment, Timeline};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn sample_report() -> TimelineReport {
        let timeline = |id: &str, end_day: i64, end_date: NaiveDate| Timeline {
            item_id: id.to_string(),
            start_date: d(2025, 1, 6),
            end_date,
            start_day: 0,
            end_day,
            duration_days: end_day,
            segments: vec![Segment {
                start_day: 0,
                end_day,
                velocity: 1.0,
                work_done: end_day as f64,
            }],
        };
        TimelineReport {
            timelines: vec![
                timeline("a", 5, d(2025, 1, 13)),
                timeline("b", 2, d(2025, 1, 8)),
            ],
            conflicts: vec![CapacityConflict {
                developer_ids: vec!["dev".into()],
                item_ids: vec!["a".into(), "b".into()],
            }],
            converged: true,
            iterations: 1,
            origin: Some(d(2025, 1, 6)),
            diagnostics: Vec::new(),
        }
    }

    #[test]
    fn timelines_frame_has_date_columns() {
        let df = timelines_frame(&sample_report()).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.column("end_date").unwrap().dtype(), &DataType::Date);
        let ids = df.column("item_id").unwrap().str().unwrap();
        assert_eq!(ids.get(1), Some("b"));
        let durations = df.column("duration_days").unwrap().i64().unwrap();
        assert_eq!(durations.get(0), Some(5));
        let conflict = df.column("conflict").unwrap().bool().unwrap();
        assert_eq!(conflict.get(0), Some(true));
    }

    #[test]
    fn empty_report_gives_empty_frames() {
        let report = TimelineReport::default();
        assert_eq!(timelines_frame(&report).unwrap().height(), 0);
        assert_eq!(conflicts_frame(&report).unwrap().height(), 0);
    }

    #[test]
    fn conflicts_frame_joins_ids() {
        let df = conflicts_frame(&sample_report()).unwrap();
        let items = df.column("items").unwrap().str().unwrap();
        assert_eq!(items.get(0), Some("a,b"));
    }
}
