//! Quorum slices: the per-node trust statement federated voting is built on.

use serde::{Deserialize, Serialize};

/// A node's trust statement: it is satisfied once `threshold` of `members`
/// agree, and it is blocked if more than `members.len() - threshold` of
/// `members` disagree with it (since then `threshold` agreement among the
/// rest is impossible without at least one of the blockers).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct QuorumSlice {
    pub members: Vec<String>,
    pub threshold: usize,
}

impl QuorumSlice {
    pub fn new(members: Vec<String>, threshold: usize) -> Self {
        QuorumSlice { members, threshold }
    }

    /// A slice requiring 2/3+1 of `members`, the common "simple majority
    /// plus one" shape used in test networks.
    pub fn majority_of(members: Vec<String>) -> Self {
        let threshold = members.len() * 2 / 3 + 1;
        QuorumSlice::new(members, threshold)
    }

    fn at_least(&self, nodes: &[String], count: usize) -> bool {
        if count == 0 {
            return true;
        }
        let hit = self
            .members
            .iter()
            .filter(|m| nodes.iter().any(|n| n == *m))
            .count();
        hit >= count
    }

    /// True once `threshold` of this slice's members are present in `nodes`.
    pub fn satisfied_with(&self, nodes: &[String]) -> bool {
        self.at_least(nodes, self.threshold)
    }

    /// True once enough of this slice's members are present in `nodes` that
    /// satisfying the slice without at least one of them becomes impossible.
    pub fn blocked_by(&self, nodes: &[String]) -> bool {
        let blocking_count = self.members.len() + 1 - self.threshold;
        self.at_least(nodes, blocking_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn members(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn satisfied_with_requires_threshold() {
        let qs = QuorumSlice::new(members(&["a", "b", "c"]), 2);
        assert!(!qs.satisfied_with(&members(&["a"])));
        assert!(qs.satisfied_with(&members(&["a", "b"])));
        assert!(qs.satisfied_with(&members(&["a", "b", "c"])));
    }

    #[test]
    fn blocked_by_needs_more_than_non_threshold_remainder() {
        // 3 members, threshold 2: blocking set size = 3 - 2 + 1 = 2.
        let qs = QuorumSlice::new(members(&["a", "b", "c"]), 2);
        assert!(!qs.blocked_by(&members(&["a"])));
        assert!(qs.blocked_by(&members(&["a", "b"])));
    }

    #[test]
    fn majority_of_four_is_three() {
        let qs = QuorumSlice::majority_of(members(&["a", "b", "c", "d"]));
        assert_eq!(qs.threshold, 3);
    }
}
