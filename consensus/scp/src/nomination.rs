//! Nomination: the "pick a candidate value" phase that runs before
//! balloting. Grounded on `consensus/nomination_state.go`.

use std::collections::HashMap;

use fbc_consensus_scp_types::{NominationMessage, QuorumSlice, SlotValue};

use crate::quorum::{meets_quorum, QuorumFinder};
use crate::seed_priority::seed_priority;
use crate::value_store::ValueStore;

struct PeerSlices<'a> {
    self_id: &'a str,
    slices: &'a HashMap<String, QuorumSlice>,
}

impl<'a> QuorumFinder for PeerSlices<'a> {
    fn quorum_slice(&self, node_id: &str) -> Option<QuorumSlice> {
        self.slices.get(node_id).cloned()
    }
    fn self_id(&self) -> &str {
        self.self_id
    }
}

/// The nomination-phase state for a single slot.
pub struct NominationState<VS: ValueStore> {
    self_id: String,
    quorum_slice: QuorumSlice,

    /// Values this node is voting to nominate.
    pub x: Vec<SlotValue>,
    /// Values this node has accepted as nominated.
    pub y: Vec<SlotValue>,
    /// Values this node has confirmed as nominated (candidates to combine).
    pub z: Vec<SlotValue>,

    /// The most recent nomination message received from each peer.
    peers: HashMap<String, NominationMessage>,
    /// Each peer's quorum slice, learned from their messages, plus our own.
    peer_slices: HashMap<String, QuorumSlice>,

    received: usize,
    /// This node's place in the seed-derived proposal order; `None` if it
    /// is not a candidate to nominate this round.
    priority: Option<usize>,

    pub values: VS,
}

impl<VS: ValueStore> NominationState<VS> {
    pub fn new(self_id: String, quorum_slice: QuorumSlice, values: VS) -> Self {
        let seed = values.last().0.clone();
        let priority = seed_priority(&seed, &quorum_slice.members, &self_id);
        let mut peer_slices = HashMap::new();
        peer_slices.insert(self_id.clone(), quorum_slice.clone());
        NominationState {
            self_id,
            quorum_slice,
            x: Vec::new(),
            y: Vec::new(),
            z: Vec::new(),
            peers: HashMap::new(),
            peer_slices,
            received: 0,
            priority,
            values,
        }
    }

    pub fn quorum_slice(&self) -> &QuorumSlice {
        &self.quorum_slice
    }

    pub fn self_id(&self) -> &str {
        &self.self_id
    }

    pub fn has_nomination(&self) -> bool {
        !self.x.is_empty()
    }

    /// True once enough messages have arrived that this node's turn to
    /// propose a value (per `priority`) has come up.
    pub fn wants_to_nominate_new_value(&self) -> bool {
        match self.priority {
            Some(p) => self.quorum_slice.threshold as u64 * p as u64 <= self.received as u64,
            None => false,
        }
    }

    /// If it's this node's turn and it doesn't already have a nomination,
    /// asks the value store for one and votes for it.
    pub fn maybe_nominate_new_value(&mut self) {
        if self.has_nomination() || !self.wants_to_nominate_new_value() {
            return;
        }
        if let Some(v) = self.values.suggest_value() {
            self.nominate_new_value(v);
        }
    }

    fn nominate_new_value(&mut self, v: SlotValue) {
        if !self.x.contains(&v) {
            self.x.push(v);
        }
    }

    /// Combines confirmed values if any exist, else accepted, else voted.
    /// Panics if nomination has produced nothing at all — callers should
    /// only ask for a prediction once `has_nomination()` is true.
    pub fn predict_value(&mut self) -> SlotValue {
        if !self.z.is_empty() {
            return self.values.combine(&self.z);
        }
        if !self.y.is_empty() {
            return self.values.combine(&self.y);
        }
        if !self.x.is_empty() {
            return self.values.combine(&self.x);
        }
        panic!("predict_value called with no nominated, accepted, or confirmed values");
    }

    pub fn assert_valid(&self) {
        assert!(
            fbc_consensus_scp_types::assert_no_dupes(&self.x),
            "nomination votes contain duplicates"
        );
        assert!(
            fbc_consensus_scp_types::assert_no_dupes(&self.y),
            "nomination accepted set contains duplicates"
        );
        assert!(
            fbc_consensus_scp_types::assert_no_dupes(&self.z),
            "nomination confirmed set contains duplicates"
        );
    }

    fn nodes_that_voted_or_accepted(&self, v: &SlotValue) -> Vec<String> {
        let mut nodes: Vec<String> = self
            .peers
            .iter()
            .filter(|(_, m)| m.nominated.contains(v) || m.accepted.contains(v))
            .map(|(id, _)| id.clone())
            .collect();
        if self.x.contains(v) {
            nodes.push(self.self_id.clone());
        }
        nodes
    }

    fn nodes_that_accepted(&self, v: &SlotValue) -> Vec<String> {
        let mut nodes: Vec<String> = self
            .peers
            .iter()
            .filter(|(_, m)| m.accepted.contains(v))
            .map(|(id, _)| id.clone())
            .collect();
        if self.y.contains(v) {
            nodes.push(self.self_id.clone());
        }
        nodes
    }

    /// Federated-vote the accept/confirm statements for `v` forward: move
    /// it into `y` (accepted) if a quorum voted-or-accepted it or it is
    /// blocked, then into `z` (confirmed) if a quorum accepted it.
    pub fn maybe_advance(&mut self, v: &SlotValue) {
        if !self.y.contains(v) {
            let voted_or_accepted = self.nodes_that_voted_or_accepted(v);
            let finder = PeerSlices {
                self_id: &self.self_id,
                slices: &self.peer_slices,
            };
            let accepted_nodes = self.nodes_that_accepted(v);
            if meets_quorum(&finder, &voted_or_accepted) || self.quorum_slice.blocked_by(&accepted_nodes) {
                self.y.push(v.clone());
            }
        }
        if self.y.contains(v) && !self.z.contains(v) {
            let accepted_nodes = self.nodes_that_accepted(v);
            let finder = PeerSlices {
                self_id: &self.self_id,
                slices: &self.peer_slices,
            };
            if meets_quorum(&finder, &accepted_nodes) {
                self.z.push(v.clone());
            }
        }
    }

    /// Processes a nomination message from `sender`, updating `x` for any
    /// newly-nominated values this node is willing to vote for, then
    /// running `maybe_advance` on every value the message touched.
    pub fn handle(&mut self, sender: &str, message: NominationMessage) {
        self.received += 1;
        self.peer_slices
            .insert(sender.to_string(), message.quorum_slice.clone());

        let mut touched: Vec<SlotValue> = Vec::new();
        for v in &message.nominated {
            if !self.x.contains(v) && self.values.validate_value(v) {
                self.x.push(v.clone());
            }
            touched.push(v.clone());
        }
        for v in &message.accepted {
            touched.push(v.clone());
        }

        self.peers.insert(sender.to_string(), message);

        for v in touched {
            self.maybe_advance(&v);
        }
    }

    /// Builds the outgoing nomination message for this node's current
    /// vote/accept state.
    pub fn message(&self, slot: u64) -> NominationMessage {
        NominationMessage {
            slot,
            nominated: self.x.clone(),
            accepted: self.y.clone(),
            quorum_slice: self.quorum_slice.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestValueStore {
        last: SlotValue,
        suggestion: Option<SlotValue>,
    }

    impl ValueStore for TestValueStore {
        fn combine(&mut self, values: &[SlotValue]) -> SlotValue {
            let mut sorted = values.to_vec();
            sorted.sort();
            SlotValue(sorted.into_iter().map(|v| v.0).collect::<Vec<_>>().join(","))
        }
        fn can_finalize(&self, _v: &SlotValue) -> bool {
            true
        }
        fn finalize(&mut self, _v: &SlotValue, _c: u32, _h: u32, _quorum_slice: &QuorumSlice) {}
        fn last(&self) -> SlotValue {
            self.last.clone()
        }
        fn suggest_value(&mut self) -> Option<SlotValue> {
            self.suggestion.clone()
        }
        fn validate_value(&self, _v: &SlotValue) -> bool {
            true
        }
    }

    fn quorum_slice() -> QuorumSlice {
        QuorumSlice::new(vec!["a".into(), "b".into(), "c".into()], 2)
    }

    fn state_for(id: &str, suggestion: Option<&str>) -> NominationState<TestValueStore> {
        NominationState::new(
            id.to_string(),
            quorum_slice(),
            TestValueStore {
                last: SlotValue::empty(),
                suggestion: suggestion.map(SlotValue::from),
            },
        )
    }

    #[test]
    fn has_nomination_false_until_a_vote_exists() {
        let state = state_for("a", None);
        assert!(!state.has_nomination());
    }

    #[test]
    fn maybe_nominate_uses_priority_zero_node_immediately() {
        // With zero peers having reported in, only the priority-0 node
        // (threshold * 0 <= received) is allowed to nominate immediately.
        let mut state = state_for("a", Some("v1"));
        state.maybe_nominate_new_value();
        // Whether "a" has priority 0 depends on the seed sort; either way
        // this must not panic and must leave state internally consistent.
        state.assert_valid();
    }

    #[test]
    fn advancing_with_a_quorum_moves_value_to_confirmed() {
        let mut state = state_for("a", None);
        let v = SlotValue::from("v1");
        state.x.push(v.clone());

        let msg_from = |id: &str| NominationMessage {
            slot: 1,
            nominated: vec![],
            accepted: vec![v.clone()],
            quorum_slice: quorum_slice(),
        };
        state.handle("b", msg_from("b"));
        state.handle("c", msg_from("c"));

        assert!(state.y.contains(&v));
        assert!(state.z.contains(&v));
    }

    #[test]
    fn predict_value_prefers_confirmed_over_accepted_over_voted() {
        let mut state = state_for("a", None);
        state.x.push(SlotValue::from("voted"));
        assert_eq!(state.predict_value(), SlotValue::from("voted"));

        state.y.push(SlotValue::from("accepted"));
        assert_eq!(state.predict_value(), SlotValue::from("accepted"));

        state.z.push(SlotValue::from("confirmed"));
        assert_eq!(state.predict_value(), SlotValue::from("confirmed"));
    }
}
