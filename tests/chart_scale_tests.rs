use chrono::NaiveDate;
use timeline_scheduler::{
    ChartWindow, Developer, PlanningSnapshot, SchedulableItem, TimeScale,
    compute_timelines_default,
};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn two_item_report() -> timeline_scheduler::TimelineReport {
    let snapshot = PlanningSnapshot::new(
        vec![Developer::new("x", 40.0), Developer::new("y", 40.0)],
        vec![
            SchedulableItem::new("early", 5.0)
                .assigned_to(["x"])
                .starting(d(2025, 1, 6)),
            SchedulableItem::new("late", 5.0)
                .assigned_to(["y"])
                .starting(d(2025, 1, 27)),
        ],
    );
    compute_timelines_default(&snapshot)
}

#[test]
fn no_timelines_means_no_window() {
    assert!(ChartWindow::from_timelines(&[], TimeScale::Week).is_none());
}

#[test]
fn day_scale_spans_exact_dates() {
    let report = two_item_report();
    let window = ChartWindow::from_timelines(&report.timelines, TimeScale::Day).unwrap();
    // early: Jan 6 -> Jan 13, late: Jan 27 -> Feb 3
    assert_eq!(window.start(), d(2025, 1, 6));
    assert_eq!(window.end(), d(2025, 2, 3));
    assert_eq!(window.total_days(), 28);

    let early = window.bar(report.timeline("early").unwrap());
    assert_eq!(early.left, 0.0);
    assert_eq!(early.width, 25.0);
    let late = window.bar(report.timeline("late").unwrap());
    assert_eq!(late.left, 75.0);
    assert_eq!(late.left + late.width, 100.0);
    assert_eq!(window.ticks().len(), 28);
    assert_eq!(window.ticks()[0].label, "Jan 6");
}

#[test]
fn month_scale_widens_to_month_boundaries() {
    let report = two_item_report();
    let window = ChartWindow::from_timelines(&report.timelines, TimeScale::Month).unwrap();
    assert_eq!(window.start(), d(2025, 1, 1));
    assert_eq!(window.end(), d(2025, 3, 1));
    let labels: Vec<String> = window.ticks().into_iter().map(|t| t.label).collect();
    assert_eq!(labels, vec!["Jan 2025", "Feb 2025"]);
    assert_eq!(window.position(d(2025, 2, 1)), 31.0 / 59.0 * 100.0);
}

#[test]
fn positions_outside_the_window_are_clamped() {
    let window = ChartWindow::new(d(2025, 1, 6), d(2025, 1, 20), TimeScale::Week);
    assert_eq!(window.position(d(2024, 12, 1)), 0.0);
    assert_eq!(window.position(d(2025, 6, 1)), 100.0);
}
