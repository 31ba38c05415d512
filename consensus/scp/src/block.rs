//! Drives nomination and balloting together for a single slot, producing
//! outgoing messages and eventually an externalized value. Grounded on
//! `consensus/block.go`.

use fbc_consensus_scp_types::{
    BallotMessage, ExternalizeMessage, NominationMessage, QuorumSlice, SlotValue,
};

use crate::ballot_state::BallotState;
use crate::nomination::NominationState;
use crate::value_store::ValueStore;

/// Either half of the two-stage protocol, addressed to a specific slot.
#[derive(Clone, Debug)]
pub enum ConsensusMessage {
    Nomination(NominationMessage),
    Ballot(BallotMessage),
}

impl ConsensusMessage {
    pub fn slot(&self) -> u64 {
        match self {
            ConsensusMessage::Nomination(m) => m.slot,
            ConsensusMessage::Ballot(m) => m.slot(),
        }
    }
}

/// The nomination and balloting state machines for one slot, plus the
/// externalized result once consensus is reached.
pub struct Block<VS: ValueStore> {
    self_id: String,
    pub slot: u64,
    pub nomination_state: NominationState<VS>,
    pub ballot_state: BallotState,
    pub external: Option<ExternalizeMessage>,
}

impl<VS: ValueStore> Block<VS> {
    pub fn new(self_id: String, slot: u64, quorum_slice: QuorumSlice, values: VS) -> Self {
        let mut nomination_state = NominationState::new(self_id.clone(), quorum_slice.clone(), values);
        nomination_state.maybe_nominate_new_value();
        let ballot_state = BallotState::new(self_id.clone(), quorum_slice);
        Block {
            self_id,
            slot,
            nomination_state,
            ballot_state,
            external: None,
        }
    }

    pub fn done(&self) -> bool {
        self.external.is_some()
    }

    pub fn assert_valid(&self) {
        self.nomination_state.assert_valid();
        self.ballot_state.assert_valid();
    }

    /// Re-runs nomination in case the underlying value store now has
    /// something new to suggest (e.g. the pending operation pool grew).
    pub fn value_store_updated(&mut self) {
        self.nomination_state.maybe_nominate_new_value();
    }

    fn predicted_value(&mut self) -> SlotValue {
        if self.nomination_state.has_nomination() {
            self.nomination_state.predict_value()
        } else {
            SlotValue::empty()
        }
    }

    /// The messages this node wants to gossip right now: the externalize
    /// message if done, else the nomination message plus a ballot message
    /// (opening the first ballot if none is open yet and a value is ready).
    pub fn outgoing_messages(&mut self) -> Vec<ConsensusMessage> {
        if let Some(ext) = &self.external {
            return vec![ConsensusMessage::Ballot(BallotMessage::Externalize(ext.clone()))];
        }

        let mut messages = vec![ConsensusMessage::Nomination(
            self.nomination_state.message(self.slot),
        )];

        if self.ballot_state.b.is_none() && self.nomination_state.has_nomination() {
            let predicted = self.predicted_value();
            self.ballot_state.go_to_next_ballot(predicted);
        }
        if let Some(ballot_message) = self.ballot_state.message(self.slot) {
            messages.push(ConsensusMessage::Ballot(ballot_message));
        }
        messages
    }

    /// Handles an incoming message from `sender`, ignoring our own echoes.
    pub fn handle(&mut self, sender: &str, message: ConsensusMessage) {
        if sender == self.self_id {
            return;
        }
        match message {
            ConsensusMessage::Nomination(m) => {
                self.nomination_state.handle(sender, m);
            }
            ConsensusMessage::Ballot(m) => {
                let predicted = self.predicted_value();
                self.ballot_state.handle(sender, m, predicted);
                if self.ballot_state.phase == fbc_consensus_scp_types::Phase::Externalize {
                    if let Some(BallotMessage::Externalize(ext)) = self.ballot_state.message(self.slot) {
                        self.external = Some(ext);
                    }
                }
            }
        }
        self.assert_valid();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fbc_consensus_scp_types::QuorumSlice;

    struct TestValueStore {
        last: SlotValue,
        suggestion: Option<SlotValue>,
    }

    impl ValueStore for TestValueStore {
        fn combine(&mut self, values: &[SlotValue]) -> SlotValue {
            values.first().cloned().unwrap_or_else(SlotValue::empty)
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

    #[test]
    fn fresh_block_is_not_done() {
        let block = Block::new(
            "a".to_string(),
            1,
            quorum_slice(),
            TestValueStore {
                last: SlotValue::empty(),
                suggestion: Some(SlotValue::from("v1")),
            },
        );
        assert!(!block.done());
    }

    #[test]
    fn outgoing_messages_include_nomination() {
        let mut block = Block::new(
            "a".to_string(),
            1,
            quorum_slice(),
            TestValueStore {
                last: SlotValue::empty(),
                suggestion: Some(SlotValue::from("v1")),
            },
        );
        let messages = block.outgoing_messages();
        assert!(matches!(messages[0], ConsensusMessage::Nomination(_)));
    }
}
