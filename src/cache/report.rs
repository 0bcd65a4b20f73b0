//! Clearance reports.
//!
//! Records which namespaces an invalidation cleared and which it left alone.
//! Reports from several invalidations merge into one; a namespace cleared by
//! any of them is cleared in the result.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClearanceReport {
    cleared: BTreeSet<String>,
    retained: BTreeSet<String>,
}

impl ClearanceReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_cleared(&mut self, namespace: impl Into<String>) {
        let namespace = namespace.into();
        self.retained.remove(&namespace);
        self.cleared.insert(namespace);
    }

    /// Record a namespace as untouched unless it is already cleared.
    pub fn mark_retained(&mut self, namespace: impl Into<String>) {
        let namespace = namespace.into();
        if !self.cleared.contains(&namespace) {
            self.retained.insert(namespace);
        }
    }

    pub fn merge(mut self, other: ClearanceReport) -> Self {
        self.absorb(other);
        self
    }

    pub fn absorb(&mut self, other: ClearanceReport) {
        for namespace in other.cleared {
            self.mark_cleared(namespace);
        }
        for namespace in other.retained {
            self.mark_retained(namespace);
        }
    }

    pub fn cleared(&self) -> &BTreeSet<String> {
        &self.cleared
    }

    pub fn retained(&self) -> &BTreeSet<String> {
        &self.retained
    }

    pub fn is_cleared(&self, namespace: &str) -> bool {
        self.cleared.contains(namespace)
    }

    pub fn is_retained(&self, namespace: &str) -> bool {
        self.retained.contains(namespace)
    }

    pub fn is_empty(&self) -> bool {
        self.cleared.is_empty() && self.retained.is_empty()
    }
}

impl fmt::Display for ClearanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cleared: Vec<&str> = self.cleared.iter().map(String::as_str).collect();
        let retained: Vec<&str> = self.retained.iter().map(String::as_str).collect();
        write!(
            f,
            "cleared=[{}] retained=[{}]",
            cleared.join(", "),
            retained.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn report(cleared: &[&str], retained: &[&str]) -> ClearanceReport {
        let mut report = ClearanceReport::new();
        for namespace in cleared {
            report.mark_cleared(*namespace);
        }
        for namespace in retained {
            report.mark_retained(*namespace);
        }
        report
    }

    #[test]
    fn cleared_dominates_retained() {
        let first = report(&["study-A.x"], &["study-B.y"]);
        let second = report(&["study-B.y"], &["study-A.x", "adhoc-C.z"]);

        let merged = first.merge(second);
        assert!(merged.is_cleared("study-A.x"));
        assert!(merged.is_cleared("study-B.y"));
        assert!(merged.is_retained("adhoc-C.z"));
        assert_eq!(merged.retained().len(), 1);
    }

    #[test]
    fn marking_cleared_moves_out_of_retained() {
        let mut report = report(&[], &["study-A.x"]);
        report.mark_cleared("study-A.x");
        assert!(report.is_cleared("study-A.x"));
        assert!(!report.is_retained("study-A.x"));
    }

    #[test]
    fn display_lists_sorted_names() {
        let report = report(&["study-B.y", "study-A.x"], &["adhoc-C.z"]);
        assert_eq!(
            report.to_string(),
            "cleared=[study-A.x, study-B.y] retained=[adhoc-C.z]"
        );
    }

    #[test]
    fn serializes_as_two_sorted_lists() {
        let report = report(&["study-B.y", "study-A.x"], &["adhoc-C.z"]);
        let json = serde_json::to_value(&report).expect("serialize report");
        assert_eq!(
            json,
            serde_json::json!({
                "cleared": ["study-A.x", "study-B.y"],
                "retained": ["adhoc-C.z"],
            })
        );
    }

    fn namespaces() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec("(study|adhoc)-[A-C]\\.[x-z]", 0..6)
    }

    fn arbitrary_report() -> impl Strategy<Value = ClearanceReport> {
        (namespaces(), namespaces()).prop_map(|(cleared, retained)| {
            let mut report = ClearanceReport::new();
            for namespace in cleared {
                report.mark_cleared(namespace);
            }
            for namespace in retained {
                report.mark_retained(namespace);
            }
            report
        })
    }

    proptest! {
        #[test]
        fn merge_is_commutative(a in arbitrary_report(), b in arbitrary_report()) {
            prop_assert_eq!(a.clone().merge(b.clone()), b.merge(a));
        }

        #[test]
        fn merge_is_idempotent(a in arbitrary_report()) {
            prop_assert_eq!(a.clone().merge(a.clone()), a);
        }

        #[test]
        fn merge_is_associative(
            a in arbitrary_report(),
            b in arbitrary_report(),
            c in arbitrary_report(),
        ) {
            let left = a.clone().merge(b.clone()).merge(c.clone());
            let right = a.merge(b.merge(c));
            prop_assert_eq!(left, right);
        }

        #[test]
        fn merged_sets_stay_disjoint(a in arbitrary_report(), b in arbitrary_report()) {
            let merged = a.merge(b);
            prop_assert!(merged.cleared().is_disjoint(merged.retained()));
        }
    }
}
