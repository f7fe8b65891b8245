//! Pure desired-vs-tracked reconciliation.
//!
//! [`reconcile`] computes the actions that bring the tracked set in line
//! with the latest discovery poll. It is a pure function: no side effects,
//! deterministic, testable without mocks. The supervisor applies the
//! resulting [`Plan`]; nothing else mutates the tracked set.

use std::collections::HashSet;

use crate::cell::ControllerId;

/// Actions produced by one reconciliation cycle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Plan {
    /// Controllers in the desired set with no tracked stream.
    pub to_start: Vec<ControllerId>,
    /// Controllers with a tracked stream that left the desired set.
    pub to_stop: Vec<ControllerId>,
}

impl Plan {
    /// True if this cycle changes nothing.
    pub fn is_empty(&self) -> bool {
        self.to_start.is_empty() && self.to_stop.is_empty()
    }
}

/// Diffs the desired set from the latest poll against the tracked set.
///
/// - `to_start` keeps the poll's order (first seen, first started) and
///   skips duplicates the cell may report.
/// - `to_stop` is sorted for deterministic application.
/// - Controllers in both sets are untouched; their running streams keep
///   their task instance.
pub fn reconcile(desired: &[ControllerId], tracked: &HashSet<ControllerId>) -> Plan {
    let mut seen: HashSet<&ControllerId> = HashSet::with_capacity(desired.len());
    let mut to_start = Vec::new();
    for id in desired {
        if seen.insert(id) && !tracked.contains(id) {
            to_start.push(id.clone());
        }
    }

    let mut to_stop: Vec<ControllerId> = tracked
        .iter()
        .filter(|id| !seen.contains(*id))
        .cloned()
        .collect();
    to_stop.sort_unstable();

    Plan { to_start, to_stop }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<ControllerId> {
        names.iter().map(|n| ControllerId::new(n)).collect()
    }

    fn tracked(names: &[&str]) -> HashSet<ControllerId> {
        names.iter().map(|n| ControllerId::new(n)).collect()
    }

    #[test]
    fn test_empty_sets_produce_empty_plan() {
        let plan = reconcile(&[], &HashSet::new());
        assert!(plan.is_empty());
    }

    #[test]
    fn test_all_new_controllers_start() {
        let plan = reconcile(&ids(&["a", "b"]), &HashSet::new());
        assert_eq!(plan.to_start, ids(&["a", "b"]));
        assert!(plan.to_stop.is_empty());
    }

    #[test]
    fn test_vanished_controllers_stop() {
        let plan = reconcile(&[], &tracked(&["a", "b"]));
        assert!(plan.to_start.is_empty());
        assert_eq!(plan.to_stop, ids(&["a", "b"]));
    }

    #[test]
    fn test_overlap_is_untouched() {
        // desired {b, c} against tracked {a, b}: a stops, c starts, b
        // keeps its stream.
        let plan = reconcile(&ids(&["b", "c"]), &tracked(&["a", "b"]));
        assert_eq!(plan.to_start, ids(&["c"]));
        assert_eq!(plan.to_stop, ids(&["a"]));
    }

    #[test]
    fn test_identical_sets_are_stable() {
        let plan = reconcile(&ids(&["a", "b"]), &tracked(&["a", "b"]));
        assert!(plan.is_empty());
    }

    #[test]
    fn test_duplicate_poll_entries_start_once() {
        let plan = reconcile(&ids(&["a", "a", "b"]), &HashSet::new());
        assert_eq!(plan.to_start, ids(&["a", "b"]));
    }

    #[test]
    fn test_full_swap() {
        let plan = reconcile(&ids(&["c", "d"]), &tracked(&["a", "b"]));
        assert_eq!(plan.to_start, ids(&["c", "d"]));
        assert_eq!(plan.to_stop, ids(&["a", "b"]));
    }
}
