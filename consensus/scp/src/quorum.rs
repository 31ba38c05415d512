//! Quorum calculus: transitive quorum detection and blocking-set checks.
//!
//! Grounded on `consensus/quorum.go`'s `MeetsQuorum`: starting from the
//! candidate node set, repeatedly drop any node whose own quorum slice is
//! not satisfied by the nodes remaining, until a fixed point is reached.
//! The candidate set is a quorum (from the perspective of `self_id`) iff
//! `self_id` survives the filtering.

use fbc_consensus_scp_types::QuorumSlice;

/// Anything that can answer "what is this node's quorum slice" — a node's
/// own configuration, or a federated-voting state that has learned peers'
/// slices from their messages.
pub trait QuorumFinder {
    fn quorum_slice(&self, node_id: &str) -> Option<QuorumSlice>;
    fn self_id(&self) -> &str;
}

/// True if `nodes` forms a quorum containing `finder.self_id()`.
pub fn meets_quorum<F: QuorumFinder>(finder: &F, nodes: &[String]) -> bool {
    let mut current: Vec<String> = nodes.to_vec();
    loop {
        let before = current.len();
        let snapshot = current.clone();
        current.retain(|id| match finder.quorum_slice(id) {
            Some(slice) => slice.satisfied_with(&snapshot),
            None => false,
        });
        if current.len() == before {
            break;
        }
    }
    current.iter().any(|id| id == finder.self_id())
}

/// True if `nodes` forms a blocking set for `self_id`'s own quorum slice —
/// i.e. enough of `self_id`'s slice members are present in `nodes` that
/// `self_id`'s slice can no longer be satisfied without one of them.
pub fn blocked_by(self_slice: &QuorumSlice, nodes: &[String]) -> bool {
    self_slice.blocked_by(nodes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FakeNetwork {
        slices: HashMap<String, QuorumSlice>,
        me: String,
    }

    impl QuorumFinder for FakeNetwork {
        fn quorum_slice(&self, node_id: &str) -> Option<QuorumSlice> {
            self.slices.get(node_id).cloned()
        }
        fn self_id(&self) -> &str {
            &self.me
        }
    }

    fn four_node_network() -> FakeNetwork {
        let all = vec!["a".to_string(), "b".to_string(), "c".to_string(), "d".to_string()];
        let mut slices = HashMap::new();
        for id in &all {
            slices.insert(id.clone(), QuorumSlice::majority_of(all.clone()));
        }
        FakeNetwork {
            slices,
            me: "a".to_string(),
        }
    }

    #[test]
    fn full_network_is_a_quorum() {
        let net = four_node_network();
        let all = vec!["a".to_string(), "b".to_string(), "c".to_string(), "d".to_string()];
        assert!(meets_quorum(&net, &all));
    }

    #[test]
    fn three_of_four_meets_quorum_with_majority_of_three() {
        let net = four_node_network();
        let three = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert!(meets_quorum(&net, &three));
    }

    #[test]
    fn two_of_four_does_not_meet_quorum() {
        let net = four_node_network();
        let two = vec!["a".to_string(), "b".to_string()];
        assert!(!meets_quorum(&net, &two));
    }

    #[test]
    fn set_without_self_is_never_a_quorum() {
        let net = four_node_network();
        let three = vec!["b".to_string(), "c".to_string(), "d".to_string()];
        assert!(!meets_quorum(&net, &three));
    }

    #[test]
    fn unknown_node_cannot_contribute_to_quorum() {
        let mut net = four_node_network();
        net.slices.remove("d");
        let all = vec!["a".to_string(), "b".to_string(), "c".to_string(), "d".to_string()];
        // d is filtered out for lack of a known slice, but a, b, c still
        // form a 3-of-4 majority quorum among themselves.
        assert!(meets_quorum(&net, &all));
    }

    #[test]
    fn blocked_by_one_of_three_blockers_needed_for_small_slice() {
        let slice = QuorumSlice::new(
            vec!["a".to_string(), "b".to_string(), "c".to_string()],
            2,
        );
        assert!(!blocked_by(&slice, &["a".to_string()]));
        assert!(blocked_by(&slice, &["a".to_string(), "b".to_string()]));
    }
}
