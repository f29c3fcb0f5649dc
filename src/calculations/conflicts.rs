use petgraph::unionfind::UnionFind;
use std::collections::{BTreeMap, BTreeSet};

use crate::timeline::CapacityConflict;

/// Final computed span of one item together with the developers it holds.
#[derive(Debug, Clone)]
pub struct ItemSpan<'a> {
    pub item_id: &'a str,
    pub developer_ids: Vec<&'a str>,
    pub start_day: i64,
    pub end_day: i64,
}

impl ItemSpan<'_> {
    fn overlaps(&self, other: &ItemSpan<'_>) -> bool {
        self.start_day < other.end_day && self.end_day > other.start_day
    }
}

/// Group items that overlap in time on a shared developer.
///
/// Overlap is transitive within a developer: if A overlaps B and B overlaps C
/// they form one conflict even when A and C never meet. Groups with the same
/// item set on several developers are reported once with all of them.
/// Zero-length spans hold no capacity and never conflict.
pub fn detect_conflicts(spans: &[ItemSpan<'_>]) -> Vec<CapacityConflict> {
    let mut by_developer: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (idx, span) in spans.iter().enumerate() {
        if span.end_day <= span.start_day {
            continue;
        }
        for &developer_id in &span.developer_ids {
            let members = by_developer.entry(developer_id).or_default();
            if !members.contains(&idx) {
                members.push(idx);
            }
        }
    }

    let mut merged: BTreeMap<Vec<String>, BTreeSet<String>> = BTreeMap::new();
    for (developer_id, members) in by_developer {
        if members.len() < 2 {
            continue;
        }
        let mut groups = UnionFind::<usize>::new(members.len());
        for a in 0..members.len() {
            for b in (a + 1)..members.len() {
                if spans[members[a]].overlaps(&spans[members[b]]) {
                    groups.union(a, b);
                }
            }
        }

        let mut components: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (local, &span_idx) in members.iter().enumerate() {
            components
                .entry(groups.find(local))
                .or_default()
                .push(span_idx);
        }

        for component in components.into_values() {
            if component.len() < 2 {
                continue;
            }
            let mut item_ids: Vec<String> = component
                .iter()
                .map(|&idx| spans[idx].item_id.to_string())
                .collect();
            item_ids.sort();
            item_ids.dedup();
            tracing::debug!(
                developer = developer_id,
                items = ?item_ids,
                "capacity conflict"
            );
            merged
                .entry(item_ids)
                .or_default()
                .insert(developer_id.to_string());
        }
    }

    merged
        .into_iter()
        .map(|(item_ids, developer_ids)| CapacityConflict {
            developer_ids: developer_ids.into_iter().collect(),
            item_ids,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span<'a>(item_id: &'a str, devs: &[&'a str], start_day: i64, end_day: i64) -> ItemSpan<'a> {
        ItemSpan {
            item_id,
            developer_ids: devs.to_vec(),
            start_day,
            end_day,
        }
    }

    #[test]
    fn touching_spans_do_not_conflict() {
        let spans = [span("a", &["d"], 0, 5), span("b", &["d"], 5, 9)];
        assert!(detect_conflicts(&spans).is_empty());
    }

    #[test]
    fn chained_overlaps_form_one_group() {
        let spans = [
            span("a", &["d"], 0, 5),
            span("b", &["d"], 4, 10),
            span("c", &["d"], 9, 12),
            span("z", &["d"], 20, 25),
        ];
        let conflicts = detect_conflicts(&spans);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].item_ids, vec!["a", "b", "c"]);
        assert_eq!(conflicts[0].developer_ids, vec!["d"]);
    }

    #[test]
    fn identical_groups_on_two_developers_merge() {
        let spans = [
            span("a", &["x", "y"], 0, 5),
            span("b", &["x", "y"], 2, 6),
        ];
        let conflicts = detect_conflicts(&spans);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].developer_ids, vec!["x", "y"]);
    }

    #[test]
    fn zero_length_span_inside_another_is_ignored() {
        let spans = [span("a", &["d"], 0, 10), span("b", &["d"], 5, 5)];
        assert!(detect_conflicts(&spans).is_empty());
    }
}
