use chrono::NaiveDate;
use timeline_scheduler::{
    DEFAULT_MAX_ITERATIONS, Developer, Diagnostic, HORIZON_DAYS, MultiAssigneePolicy,
    PlanningSnapshot, SchedulableItem, SchedulerConfig, WorkCalendar, compute_timelines,
    compute_timelines_default,
};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// 2025-01-06 is a Monday.
fn monday() -> NaiveDate {
    d(2025, 1, 6)
}

fn item(id: &str, man_days: f64, start: NaiveDate, devs: &[&str]) -> SchedulableItem {
    SchedulableItem::new(id, man_days)
        .assigned_to(devs.iter().copied())
        .starting(start)
}

#[test]
fn single_item_takes_ceiling_of_effort() {
    let snapshot = PlanningSnapshot::new(
        vec![Developer::new("dev", 40.0)],
        vec![item("a", 7.5, monday(), &["dev"])],
    );
    let report = compute_timelines_default(&snapshot);

    assert!(report.converged);
    assert_eq!(report.origin, Some(monday()));
    let timeline = report.timeline("a").unwrap();
    assert_eq!(timeline.start_day, 0);
    assert_eq!(timeline.end_day, 8);
    assert_eq!(timeline.duration_days, 8);
    assert_eq!(timeline.start_date, monday());
    assert_eq!(timeline.end_date, d(2025, 1, 16));
    assert_eq!(timeline.segments.len(), 1);
    assert_eq!(timeline.segments[0].velocity, 1.0);
    assert!((timeline.total_work() - 7.5).abs() < 1e-9);
    assert!(report.conflicts.is_empty());
}

#[test]
fn full_overlap_halves_velocity() {
    let snapshot = PlanningSnapshot::new(
        vec![Developer::new("dev", 40.0)],
        vec![
            item("a", 20.0, monday(), &["dev"]),
            item("b", 20.0, monday(), &["dev"]),
        ],
    );
    let report = compute_timelines_default(&snapshot);

    assert!(report.converged);
    for id in ["a", "b"] {
        let timeline = report.timeline(id).unwrap();
        assert_eq!(timeline.end_day, 40, "item {id}");
        assert_eq!(timeline.segments.len(), 1);
        assert_eq!(timeline.segments[0].velocity, 0.5);
        assert_eq!(timeline.segments[0].len_days(), 40);
    }
    assert_eq!(report.conflicts.len(), 1);
    assert_eq!(report.conflicts[0].item_ids, vec!["a", "b"]);
}

#[test]
fn partial_overlap_slows_only_the_shared_span() {
    let snapshot = PlanningSnapshot::new(
        vec![Developer::new("dev", 40.0)],
        vec![
            item("a", 10.0, monday(), &["dev"]),
            item("b", 10.0, d(2025, 1, 13), &["dev"]),
        ],
    );
    let report = compute_timelines_default(&snapshot);

    assert!(report.converged);
    let a = report.timeline("a").unwrap();
    let b = report.timeline("b").unwrap();
    assert_eq!((a.start_day, a.end_day), (0, 15));
    assert_eq!((b.start_day, b.end_day), (5, 20));
    assert_eq!(a.end_date, d(2025, 1, 27));
    assert_eq!(b.end_date, d(2025, 2, 3));

    let velocities: Vec<f64> = a.segments.iter().map(|s| s.velocity).collect();
    assert_eq!(velocities, vec![1.0, 0.5]);
    let velocities: Vec<f64> = b.segments.iter().map(|s| s.velocity).collect();
    assert_eq!(velocities, vec![0.5, 1.0]);

    assert_eq!(report.conflicts.len(), 1);
    assert_eq!(report.conflicts[0].developer_ids, vec!["dev"]);
    assert_eq!(report.conflicts[0].item_ids, vec!["a", "b"]);
}

#[test]
fn independent_developers_do_not_interfere() {
    let snapshot = PlanningSnapshot::new(
        vec![Developer::new("x", 40.0), Developer::new("y", 40.0)],
        vec![
            item("a", 10.0, monday(), &["x"]),
            item("b", 10.0, monday(), &["y"]),
        ],
    );
    let report = compute_timelines_default(&snapshot);

    assert_eq!(report.timeline("a").unwrap().end_day, 10);
    assert_eq!(report.timeline("b").unwrap().end_day, 10);
    assert!(report.conflicts.is_empty());
}

#[test]
fn repeated_runs_are_identical() {
    let snapshot = PlanningSnapshot::new(
        vec![Developer::new("x", 40.0), Developer::new("y", 24.0)],
        vec![
            item("a", 12.0, monday(), &["x"]),
            item("b", 6.5, d(2025, 1, 8), &["x", "y"]),
            item("c", 9.0, d(2025, 1, 15), &["y"]),
        ],
    );
    let first = compute_timelines_default(&snapshot);
    let second = compute_timelines_default(&snapshot);
    assert_eq!(first, second);
}

#[test]
fn items_without_start_or_assignees_are_excluded_silently() {
    let snapshot = PlanningSnapshot::new(
        vec![Developer::new("dev", 40.0)],
        vec![
            SchedulableItem::new("undated", 3.0).assigned_to(["dev"]),
            SchedulableItem::new("unassigned", 3.0).starting(monday()),
            item("kept", 3.0, monday(), &["dev"]),
        ],
    );
    let report = compute_timelines_default(&snapshot);

    assert_eq!(report.timelines.len(), 1);
    assert_eq!(report.timelines[0].item_id, "kept");
    assert!(report.diagnostics.is_empty());
}

#[test]
fn iteration_cap_reports_non_convergence() {
    let snapshot = PlanningSnapshot::new(
        vec![Developer::new("dev", 40.0)],
        vec![
            item("a", 20.0, monday(), &["dev"]),
            item("b", 20.0, monday(), &["dev"]),
        ],
    );
    let config = SchedulerConfig::default().with_max_iterations(2);
    let report = compute_timelines(&snapshot, &config);

    assert!(!report.converged);
    assert_eq!(report.iterations, 2);
    assert_eq!(report.timelines.len(), 2);
    assert!(
        report
            .diagnostics
            .contains(&Diagnostic::NotConverged { iterations: 2 })
    );
}

#[test]
fn staggered_near_equal_items_settle_within_default_cap() {
    let start = |offset: u64| monday().checked_add_days(chrono::Days::new(offset)).unwrap();
    // Day offsets 0, 1, 2 and 9 on the working-day axis.
    let snapshot = PlanningSnapshot::new(
        vec![Developer::new("dev", 40.0)],
        vec![
            item("a", 10.0, start(0), &["dev"]),
            item("b", 10.5, start(1), &["dev"]),
            item("c", 9.5, start(2), &["dev"]),
            item("e", 3.0, start(11), &["dev"]),
        ],
    );
    let report = compute_timelines_default(&snapshot);

    assert!(report.iterations <= DEFAULT_MAX_ITERATIONS);
    assert!(report.converged);
    let ends: Vec<i64> = report.timelines.iter().map(|t| t.end_day).collect();
    assert_eq!(ends, vec![31, 34, 33, 21]);
    for (timeline, expected) in report.timelines.iter().zip([10.0, 10.5, 9.5, 3.0]) {
        assert!(
            (timeline.total_work() - expected).abs() < 1e-6,
            "{} did {} of {expected}",
            timeline.item_id,
            timeline.total_work()
        );
    }
    assert_eq!(compute_timelines_default(&snapshot), report);
}

#[test]
fn tiny_capacity_is_left_out_beyond_horizon() {
    let snapshot = PlanningSnapshot::new(
        vec![Developer::new("trickle", 1e-300), Developer::new("dev", 40.0)],
        vec![
            item("slow", 5.0, monday(), &["trickle"]),
            item("fine", 2.0, monday(), &["dev"]),
        ],
    );
    let report = compute_timelines_default(&snapshot);

    assert!(report.converged);
    assert_eq!(report.timelines.len(), 1);
    assert_eq!(report.timeline("fine").unwrap().end_day, 2);
    assert_eq!(
        report.diagnostics,
        vec![Diagnostic::BeyondHorizon {
            item_id: "slow".into(),
            horizon_days: HORIZON_DAYS,
        }]
    );
}

#[test]
fn huge_effort_is_left_out_beyond_horizon() {
    let snapshot = PlanningSnapshot::new(
        vec![Developer::new("dev", 40.0)],
        vec![
            item("forever", 1e9, monday(), &["dev"]),
            item("small", 5.0, monday(), &["dev"]),
        ],
    );
    let report = compute_timelines_default(&snapshot);

    assert_eq!(report.timelines.len(), 1);
    assert_eq!(report.timeline("small").unwrap().end_day, 5);
    assert!(report.conflicts.is_empty());
    assert!(matches!(
        report.diagnostics.as_slice(),
        [Diagnostic::BeyondHorizon { item_id, .. }] if item_id == "forever"
    ));
}

#[test]
fn sharing_that_stretches_past_horizon_is_reported() {
    let snapshot = PlanningSnapshot::new(
        vec![Developer::new("dev", 40.0)],
        vec![
            item("x", 30_000.0, monday(), &["dev"]),
            item("y", 30_000.0, monday(), &["dev"]),
            item("z", 5.0, monday(), &["dev"]),
        ],
    );
    let report = compute_timelines_default(&snapshot);

    // x and y still load the developer while z runs
    assert_eq!(report.timelines.len(), 1);
    assert_eq!(report.timeline("z").unwrap().end_day, 15);
    let left_out: Vec<&str> = report
        .diagnostics
        .iter()
        .filter_map(|diag| match diag {
            Diagnostic::BeyondHorizon { item_id, .. } => Some(item_id.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(left_out, vec!["x", "y"]);
}

#[test]
fn zero_effort_is_instant_and_holds_no_capacity() {
    let snapshot = PlanningSnapshot::new(
        vec![Developer::new("dev", 40.0)],
        vec![
            item("milestone", 0.0, monday(), &["dev"]),
            item("work", 5.0, monday(), &["dev"]),
        ],
    );
    let report = compute_timelines_default(&snapshot);

    let milestone = report.timeline("milestone").unwrap();
    assert_eq!(milestone.end_day, milestone.start_day);
    assert_eq!(milestone.end_date, monday());
    assert!(milestone.segments.is_empty());
    assert_eq!(report.timeline("work").unwrap().end_day, 5);
    assert!(report.conflicts.is_empty());
}

#[test]
fn negative_effort_is_reported_and_excluded() {
    let snapshot = PlanningSnapshot::new(
        vec![Developer::new("dev", 40.0)],
        vec![item("bad", -2.0, monday(), &["dev"])],
    );
    let report = compute_timelines_default(&snapshot);

    assert!(report.timelines.is_empty());
    assert_eq!(
        report.diagnostics,
        vec![Diagnostic::InvalidEffort {
            item_id: "bad".into(),
            man_days: -2.0,
        }]
    );
}

#[test]
fn unknown_developers_are_skipped_with_a_diagnostic() {
    let snapshot = PlanningSnapshot::new(
        vec![Developer::new("dev", 40.0)],
        vec![
            item("mixed", 4.0, monday(), &["ghost", "dev"]),
            item("orphan", 4.0, monday(), &["ghost"]),
        ],
    );
    let report = compute_timelines_default(&snapshot);

    assert_eq!(report.timelines.len(), 1);
    assert_eq!(report.timeline("mixed").unwrap().end_day, 4);
    assert!(report.timeline("orphan").is_none());
    assert!(report.diagnostics.contains(&Diagnostic::UnknownDeveloper {
        item_id: "mixed".into(),
        developer_id: "ghost".into(),
    }));
    assert!(report.diagnostics.contains(&Diagnostic::UnknownDeveloper {
        item_id: "orphan".into(),
        developer_id: "ghost".into(),
    }));
}

#[test]
fn zero_capacity_developer_stalls_items() {
    let snapshot = PlanningSnapshot::new(
        vec![Developer::new("idle", 0.0), Developer::new("dev", 40.0)],
        vec![
            item("first", 3.0, monday(), &["idle"]),
            item("second", 3.0, monday(), &["idle"]),
            item("helped", 3.0, monday(), &["idle", "dev"]),
        ],
    );
    let report = compute_timelines_default(&snapshot);

    let ids: Vec<&str> = report.timelines.iter().map(|t| t.item_id.as_str()).collect();
    assert_eq!(ids, vec!["helped"]);
    assert_eq!(report.timelines[0].end_day, 3);

    let zero_capacity = report
        .diagnostics
        .iter()
        .filter(|diag| matches!(diag, Diagnostic::ZeroCapacity { .. }))
        .count();
    assert_eq!(zero_capacity, 1);
    assert!(report.diagnostics.contains(&Diagnostic::StalledItem {
        item_id: "first".into()
    }));
    assert!(report.diagnostics.contains(&Diagnostic::StalledItem {
        item_id: "second".into()
    }));
}

#[test]
fn secondary_assignee_reserves_capacity_under_primary_policy() {
    let snapshot = PlanningSnapshot::new(
        vec![Developer::new("a", 40.0), Developer::new("b", 40.0)],
        vec![
            item("x", 10.0, monday(), &["a", "b"]),
            item("y", 10.0, monday(), &["b"]),
        ],
    );
    let report = compute_timelines_default(&snapshot);

    assert!(report.converged);
    assert_eq!(report.timeline("x").unwrap().end_day, 10);
    assert_eq!(report.timeline("y").unwrap().end_day, 15);
    assert_eq!(report.conflicts.len(), 1);
    assert_eq!(report.conflicts[0].developer_ids, vec!["b"]);
    assert_eq!(report.conflicts[0].item_ids, vec!["x", "y"]);
}

#[test]
fn combined_policy_sums_assignee_capacity() {
    let snapshot = PlanningSnapshot::new(
        vec![Developer::new("a", 40.0), Developer::new("b", 40.0)],
        vec![item("x", 10.0, monday(), &["a", "b"])],
    );
    let config = SchedulerConfig::default().with_policy(MultiAssigneePolicy::CombinedCapacity);
    let report = compute_timelines(&snapshot, &config);

    let timeline = report.timeline("x").unwrap();
    assert_eq!(timeline.end_day, 5);
    assert_eq!(timeline.segments[0].velocity, 2.0);
}

#[test]
fn part_time_developer_converts_hours_to_velocity() {
    let snapshot = PlanningSnapshot::new(
        vec![Developer::new("half", 20.0)],
        vec![item("a", 5.0, monday(), &["half"])],
    );
    let report = compute_timelines_default(&snapshot);
    let timeline = report.timeline("a").unwrap();
    assert_eq!(timeline.end_day, 10);
    assert_eq!(timeline.segments[0].velocity, 0.5);
}

#[test]
fn end_dates_skip_weekends() {
    let snapshot = PlanningSnapshot::new(
        vec![Developer::new("dev", 40.0)],
        vec![item("a", 3.0, d(2025, 1, 10), &["dev"])],
    );
    let report = compute_timelines_default(&snapshot);
    assert_eq!(report.timeline("a").unwrap().end_date, d(2025, 1, 15));
}

#[test]
fn weekend_start_is_measured_from_next_working_day() {
    let snapshot = PlanningSnapshot::new(
        vec![Developer::new("dev", 40.0)],
        vec![item("a", 3.0, d(2025, 1, 11), &["dev"])],
    );
    let report = compute_timelines_default(&snapshot);

    assert_eq!(report.origin, Some(d(2025, 1, 13)));
    let timeline = report.timeline("a").unwrap();
    assert_eq!(timeline.start_date, d(2025, 1, 11));
    assert_eq!(timeline.start_day, 0);
    assert_eq!(timeline.end_date, d(2025, 1, 16));
}

#[test]
fn configured_holidays_push_end_dates() {
    let mut calendar = WorkCalendar::weekdays();
    calendar.add_holiday(d(2025, 1, 8));
    let config = SchedulerConfig::default().with_calendar(&calendar);
    let snapshot = PlanningSnapshot::new(
        vec![Developer::new("dev", 40.0)],
        vec![item("a", 5.0, monday(), &["dev"])],
    );
    let report = compute_timelines(&snapshot, &config);

    let timeline = report.timeline("a").unwrap();
    assert_eq!(timeline.end_day, 5);
    assert_eq!(timeline.end_date, d(2025, 1, 14));
}

#[test]
fn output_follows_input_order() {
    let snapshot = PlanningSnapshot::new(
        vec![Developer::new("dev", 40.0)],
        vec![
            item("zeta", 2.0, d(2025, 1, 20), &["dev"]),
            item("alpha", 2.0, monday(), &["dev"]),
        ],
    );
    let report = compute_timelines_default(&snapshot);
    let ids: Vec<&str> = report.timelines.iter().map(|t| t.item_id.as_str()).collect();
    assert_eq!(ids, vec!["zeta", "alpha"]);
    assert_eq!(report.origin, Some(monday()));
}

#[test]
fn empty_snapshot_yields_empty_report() {
    let report = compute_timelines_default(&PlanningSnapshot::default());
    assert!(report.timelines.is_empty());
    assert!(report.conflicts.is_empty());
    assert!(report.converged);
    assert_eq!(report.origin, None);
}

#[test]
fn diagnostics_serialize_with_kind_tag() {
    let value = serde_json::to_value(Diagnostic::StalledItem {
        item_id: "x".into(),
    })
    .unwrap();
    assert_eq!(value["kind"], "stalled_item");
    assert_eq!(value["item_id"], "x");
}
