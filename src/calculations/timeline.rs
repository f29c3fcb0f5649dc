//! Concurrency-aware timeline relaxation.
//!
//! Each developer's daily velocity is split evenly between every item
//! assigned to them that is active at the same time. Because an item's end
//! day depends on how long it shares its developers, and that in turn depends
//! on the other items' end days, end days are found by fixed-point iteration:
//!
//! 1. Estimate every end day as if the item had its developers to itself.
//! 2. Build the sorted set of change points (every start and current end).
//! 3. Walk each item across the spans between change points, consuming
//!    `span length * velocity / concurrency` man-days per span, until its
//!    effort is covered. This yields a new end day per item.
//! 4. Repeat from 2 with the new end days until nothing moves or the
//!    iteration cap is reached.
//!
//! Every pass reads one immutable vector of estimates and produces a complete
//! replacement, so the walks of one pass are independent and run in parallel.

use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

use super::conflicts::{ItemSpan, detect_conflicts};
use crate::calendar::{WorkCalendar, WorkingDayAxis};
use crate::config::{MultiAssigneePolicy, SchedulerConfig};
use crate::planning::PlanningSnapshot;
use crate::timeline::{Diagnostic, Segment, Timeline, TimelineReport};

const EPSILON: f64 = 1e-9;

/// Longest duration, in working days, an item may take. Items that would run
/// longer are reported with [`Diagnostic::BeyondHorizon`] and left out.
pub const HORIZON_DAYS: i64 = 50_000;

/// An item that survived input checks, with its developers resolved to roster indices.
#[derive(Debug, Clone)]
struct PlannedItem<'a> {
    id: &'a str,
    start_date: NaiveDate,
    start_day: i64,
    man_days: f64,
    /// Every valid assignee, in assignment order.
    assignees: Vec<usize>,
    /// Assignees whose capacity moves this item forward.
    pace: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
struct Walk {
    end_day: i64,
    segments: Vec<Segment>,
}

pub struct TimelineCalculator<'a> {
    snapshot: &'a PlanningSnapshot,
    config: &'a SchedulerConfig,
    calendar: &'a WorkCalendar,
}

impl<'a> TimelineCalculator<'a> {
    pub fn new(
        snapshot: &'a PlanningSnapshot,
        config: &'a SchedulerConfig,
        calendar: &'a WorkCalendar,
    ) -> Self {
        Self {
            snapshot,
            config,
            calendar,
        }
    }

    pub fn execute(&self) -> TimelineReport {
        let velocities: Vec<f64> = self
            .snapshot
            .developers
            .iter()
            .map(|dev| dev.daily_velocity(self.config))
            .collect();

        let mut diagnostics = Vec::new();
        let (mut items, origin) = self.plan_items(&velocities, &mut diagnostics);
        let Some(origin) = origin else {
            return TimelineReport {
                converged: true,
                diagnostics,
                ..TimelineReport::default()
            };
        };

        let axis = WorkingDayAxis::new(self.calendar, origin);
        for item in &mut items {
            item.start_day = axis.offset_of(item.start_date);
        }

        let mut members: Vec<Vec<usize>> = vec![Vec::new(); velocities.len()];
        for (idx, item) in items.iter().enumerate() {
            for &dev in &item.assignees {
                members[dev].push(idx);
            }
        }

        let relaxation = Relaxation {
            items: &items,
            members: &members,
            velocities: &velocities,
        };
        let (walks, iterations, converged) = relaxation.run(self.config.max_iterations.max(1));
        if !converged {
            tracing::warn!(iterations, "timeline relaxation hit the iteration cap");
            diagnostics.push(Diagnostic::NotConverged { iterations });
        }

        let mut placed: Vec<&PlannedItem<'_>> = Vec::with_capacity(items.len());
        let mut timelines: Vec<Timeline> = Vec::with_capacity(items.len());
        for (item, walk) in items.iter().zip(walks) {
            let end_date = if walk.end_day - item.start_day > HORIZON_DAYS {
                None
            } else {
                axis.checked_date_at(walk.end_day)
            };
            let Some(end_date) = end_date else {
                tracing::warn!(item = %item.id, "item ends beyond the planning horizon");
                diagnostics.push(Diagnostic::BeyondHorizon {
                    item_id: item.id.to_string(),
                    horizon_days: HORIZON_DAYS,
                });
                continue;
            };
            placed.push(item);
            timelines.push(Timeline {
                item_id: item.id.to_string(),
                start_date: item.start_date,
                end_date,
                start_day: item.start_day,
                end_day: walk.end_day,
                duration_days: walk.end_day - item.start_day,
                segments: walk.segments,
            });
        }

        let spans: Vec<ItemSpan<'_>> = placed
            .iter()
            .zip(&timelines)
            .map(|(item, timeline)| ItemSpan {
                item_id: item.id,
                developer_ids: item
                    .assignees
                    .iter()
                    .map(|&dev| self.snapshot.developers[dev].id.as_str())
                    .collect(),
                start_day: timeline.start_day,
                end_day: timeline.end_day,
            })
            .collect();
        let conflicts = detect_conflicts(&spans);

        tracing::debug!(
            timelines = timelines.len(),
            conflicts = conflicts.len(),
            iterations,
            converged,
            "timelines computed"
        );

        TimelineReport {
            timelines,
            conflicts,
            converged,
            iterations,
            origin: Some(axis.origin()),
            diagnostics,
        }
    }

    /// Resolve assignments, drop unschedulable items and find the plan origin.
    fn plan_items(
        &self,
        velocities: &[f64],
        diagnostics: &mut Vec<Diagnostic>,
    ) -> (Vec<PlannedItem<'a>>, Option<NaiveDate>) {
        let snapshot = self.snapshot;
        let mut roster: HashMap<&str, usize> = HashMap::new();
        for (idx, dev) in snapshot.developers.iter().enumerate() {
            roster.entry(dev.id.as_str()).or_insert(idx);
        }

        let mut reported_idle: HashSet<usize> = HashSet::new();
        let mut items = Vec::new();
        let mut origin: Option<NaiveDate> = None;

        for item in &snapshot.items {
            let Some(start_date) = item.start_date else {
                tracing::trace!(item = %item.id, "no start date, skipping");
                continue;
            };
            if item.assigned_developer_ids.is_empty() {
                tracing::trace!(item = %item.id, "no assignees, skipping");
                continue;
            }

            let mut assignees: Vec<usize> = Vec::new();
            for dev_id in &item.assigned_developer_ids {
                match roster.get(dev_id.as_str()) {
                    Some(&idx) => {
                        if !assignees.contains(&idx) {
                            assignees.push(idx);
                        }
                    }
                    None => {
                        tracing::warn!(item = %item.id, developer = %dev_id, "unknown developer");
                        diagnostics.push(Diagnostic::UnknownDeveloper {
                            item_id: item.id.clone(),
                            developer_id: dev_id.clone(),
                        });
                    }
                }
            }
            if assignees.is_empty() {
                continue;
            }

            if !item.man_days.is_finite() || item.man_days < 0.0 {
                tracing::warn!(item = %item.id, man_days = item.man_days, "invalid effort");
                diagnostics.push(Diagnostic::InvalidEffort {
                    item_id: item.id.clone(),
                    man_days: item.man_days,
                });
                continue;
            }

            for &dev in &assignees {
                if velocities[dev] <= 0.0 && reported_idle.insert(dev) {
                    let developer_id = snapshot.developers[dev].id.clone();
                    tracing::warn!(developer = %developer_id, "developer has no capacity");
                    diagnostics.push(Diagnostic::ZeroCapacity { developer_id });
                }
            }

            let productive = assignees.iter().copied().filter(|&dev| velocities[dev] > 0.0);
            let pace: Vec<usize> = match self.config.multi_assignee_policy {
                MultiAssigneePolicy::PrimaryDeveloper => productive.take(1).collect(),
                MultiAssigneePolicy::CombinedCapacity => productive.collect(),
            };
            if pace.is_empty() {
                tracing::warn!(item = %item.id, "item stalled");
                diagnostics.push(Diagnostic::StalledItem {
                    item_id: item.id.clone(),
                });
                continue;
            }

            let rate: f64 = pace.iter().map(|&dev| velocities[dev]).sum();
            if item.man_days / rate > HORIZON_DAYS as f64 {
                tracing::warn!(
                    item = %item.id,
                    man_days = item.man_days,
                    rate,
                    "item exceeds the planning horizon"
                );
                diagnostics.push(Diagnostic::BeyondHorizon {
                    item_id: item.id.clone(),
                    horizon_days: HORIZON_DAYS,
                });
                continue;
            }

            origin = Some(match origin {
                Some(current) if current <= start_date => current,
                _ => start_date,
            });
            items.push(PlannedItem {
                id: item.id.as_str(),
                start_date,
                start_day: 0,
                man_days: item.man_days,
                assignees,
                pace,
            });
        }

        (items, origin)
    }
}

struct Relaxation<'r, 'a> {
    items: &'r [PlannedItem<'a>],
    members: &'r [Vec<usize>],
    velocities: &'r [f64],
}

impl Relaxation<'_, '_> {
    fn run(&self, max_iterations: usize) -> (Vec<Walk>, usize, bool) {
        let mut estimates: Vec<i64> = (0..self.items.len())
            .map(|idx| self.initial_end(idx))
            .collect();
        let mut walks: Vec<Walk> = Vec::new();
        let mut iterations = 0;
        let mut converged = false;

        while iterations < max_iterations {
            iterations += 1;
            let points = change_points(self.items, &estimates);
            let next_walks: Vec<Walk> = (0..self.items.len())
                .into_par_iter()
                .map(|idx| self.walk(idx, &points, &estimates))
                .collect();

            let moved = next_walks
                .iter()
                .zip(&estimates)
                .filter(|(walk, previous)| walk.end_day != **previous)
                .count();
            tracing::debug!(iteration = iterations, moved, "relaxation pass");

            estimates = next_walks.iter().map(|walk| walk.end_day).collect();
            walks = next_walks;
            if moved == 0 {
                converged = true;
                break;
            }
        }

        (walks, iterations, converged)
    }

    fn initial_end(&self, idx: usize) -> i64 {
        let item = &self.items[idx];
        let rate: f64 = item.pace.iter().map(|&dev| self.velocities[dev]).sum();
        item.start_day
            .saturating_add(days_needed(item.man_days, rate))
            .min(self.limit(idx))
    }

    /// First day past the horizon for `idx`; no estimate goes beyond it.
    fn limit(&self, idx: usize) -> i64 {
        self.items[idx].start_day + HORIZON_DAYS + 1
    }

    fn is_active(&self, idx: usize, from: i64, until: i64, estimates: &[i64]) -> bool {
        let start = self.items[idx].start_day;
        let end = estimates[idx];
        end > start && start < until && end > from
    }

    /// Progress per day for `idx` over `[from, until)` given the current estimates.
    fn rate_in(&self, idx: usize, from: i64, until: i64, estimates: &[i64]) -> f64 {
        self.items[idx]
            .pace
            .iter()
            .map(|&dev| {
                let sharing = self.members[dev]
                    .iter()
                    .filter(|&&other| other != idx && self.is_active(other, from, until, estimates))
                    .count();
                self.velocities[dev] / (sharing + 1) as f64
            })
            .sum()
    }

    fn walk(&self, idx: usize, points: &[i64], estimates: &[i64]) -> Walk {
        let item = &self.items[idx];
        if item.man_days <= 0.0 {
            return Walk {
                end_day: item.start_day,
                segments: Vec::new(),
            };
        }

        let limit = self.limit(idx);
        let mut remaining = item.man_days;
        let mut cursor = item.start_day;
        let mut segments = Vec::new();
        let first = points.partition_point(|&point| point <= cursor);

        for &next in &points[first..] {
            let next = next.min(limit);
            if next <= cursor {
                break;
            }
            let rate = self.rate_in(idx, cursor, next, estimates);
            let capacity = (next - cursor) as f64 * rate;
            if capacity + EPSILON >= remaining {
                let end_day = cursor.saturating_add(days_needed(remaining, rate)).min(next);
                push_segment(&mut segments, cursor, end_day, rate, remaining);
                return Walk { end_day, segments };
            }
            push_segment(&mut segments, cursor, next, rate, capacity);
            remaining -= capacity;
            cursor = next;
        }

        if cursor >= limit {
            return Walk {
                end_day: limit,
                segments,
            };
        }

        // Past the last change point nothing else starts or ends.
        let rate = self.rate_in(idx, cursor, limit, estimates);
        let end_day = cursor.saturating_add(days_needed(remaining, rate)).min(limit);
        push_segment(&mut segments, cursor, end_day, rate, remaining);
        Walk { end_day, segments }
    }
}

/// Sorted distinct starts and current end estimates.
fn change_points(items: &[PlannedItem<'_>], estimates: &[i64]) -> Vec<i64> {
    let mut points: Vec<i64> = items
        .iter()
        .map(|item| item.start_day)
        .chain(estimates.iter().copied())
        .collect();
    points.sort_unstable();
    points.dedup();
    points
}

/// Whole working days needed to finish `work` at `rate`, rounded up.
/// Saturates at `i64::MAX`.
fn days_needed(work: f64, rate: f64) -> i64 {
    if work <= 0.0 || rate <= 0.0 {
        return 0;
    }
    ((work / rate) - EPSILON).ceil().max(0.0) as i64
}

/// Append a span, folding it into the previous one when the rate is unchanged.
fn push_segment(
    segments: &mut Vec<Segment>,
    start_day: i64,
    end_day: i64,
    velocity: f64,
    work: f64,
) {
    if end_day <= start_day {
        return;
    }
    if let Some(last) = segments.last_mut() {
        if last.end_day == start_day && (last.velocity - velocity).abs() < EPSILON {
            last.end_day = end_day;
            last.work_done += work;
            return;
        }
    }
    segments.push(Segment {
        start_day,
        end_day,
        velocity,
        work_done: work,
    });
}

/// Compute timelines and conflicts for a snapshot.
///
/// Never fails: bad references, missing capacity and non-convergence are
/// reported through [`TimelineReport::diagnostics`].
pub fn compute_timelines(snapshot: &PlanningSnapshot, config: &SchedulerConfig) -> TimelineReport {
    let calendar = match config.work_calendar() {
        Ok(calendar) => calendar,
        Err(err) => {
            tracing::warn!(error = %err, "invalid calendar config, using Monday-Friday");
            WorkCalendar::weekdays()
        }
    };
    TimelineCalculator::new(snapshot, config, &calendar).execute()
}

pub fn compute_timelines_default(snapshot: &PlanningSnapshot) -> TimelineReport {
    compute_timelines(snapshot, &SchedulerConfig::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn days_needed_tolerates_exact_quotients() {
        assert_eq!(days_needed(20.0, 0.5), 40);
        assert_eq!(days_needed(8.0, 0.8), 10);
        assert_eq!(days_needed(7.5, 1.0), 8);
        assert_eq!(days_needed(0.0, 1.0), 0);
        assert_eq!(days_needed(5.0, 1e-300), i64::MAX);
    }

    #[test]
    fn push_segment_merges_equal_rates() {
        let mut segments = Vec::new();
        push_segment(&mut segments, 0, 5, 0.5, 2.5);
        push_segment(&mut segments, 5, 8, 0.5, 1.5);
        push_segment(&mut segments, 8, 8, 1.0, 0.0);
        push_segment(&mut segments, 8, 10, 1.0, 2.0);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].end_day, 8);
        assert_eq!(segments[0].work_done, 4.0);
        assert_eq!(segments[1].velocity, 1.0);
    }
}
