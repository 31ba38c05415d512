//! Sequences `Block`s by slot on top of a shared `ValueStore`, archiving
//! externalize messages so lagging peers can catch up. Grounded on
//! `original_source/consensus/chain.go`.

use std::collections::HashMap;

use fbc_common::fatal;
use fbc_common::Logger;
use fbc_consensus_scp::{Block, ConsensusMessage, ValueStore};
use fbc_consensus_scp_types::{BallotMessage, ExternalizeMessage, QuorumSlice};

/// The block currently being worked on, plus every slot that has already
/// externalized, so a peer asking about an old slot can be answered
/// directly instead of being left to resend forever.
pub struct Chain<VS: ValueStore + Clone> {
    current: Block<VS>,
    history: HashMap<u64, ExternalizeMessage>,
    quorum_slice: QuorumSlice,
    self_id: String,
    values: VS,
}

impl<VS: ValueStore + Clone> Chain<VS> {
    /// Resumes a chain whose most recent externalized slot is `last_external`.
    pub fn new_chain(self_id: String, quorum_slice: QuorumSlice, values: VS, last_external: ExternalizeMessage) -> Self {
        let slot = last_external.slot + 1;
        let mut history = HashMap::new();
        history.insert(last_external.slot, last_external);
        let current = Block::new(self_id.clone(), slot, quorum_slice.clone(), values.clone());
        Chain {
            current,
            history,
            quorum_slice,
            self_id,
            values,
        }
    }

    /// Starts a brand new chain at slot 1, with no externalized history.
    pub fn new_empty_chain(self_id: String, quorum_slice: QuorumSlice, values: VS) -> Self {
        let current = Block::new(self_id.clone(), 1, quorum_slice.clone(), values.clone());
        Chain {
            current,
            history: HashMap::new(),
            quorum_slice,
            self_id,
            values,
        }
    }

    /// The slot this chain is currently working on.
    pub fn slot(&self) -> u64 {
        self.current.slot
    }

    pub fn assert_valid(&self) {
        self.current.assert_valid();
    }

    /// The most recently externalized message, once this chain has gotten
    /// past slot 1.
    pub fn get_last(&self) -> Option<&ExternalizeMessage> {
        self.slot().checked_sub(1).and_then(|slot| self.history.get(&slot))
    }

    /// Re-runs nomination for the current slot in case the value store now
    /// has a new candidate to suggest.
    pub fn value_store_updated(&mut self) {
        self.current.value_store_updated();
    }

    /// Handles an incoming message from `sender`. Returns a catch-up
    /// response for `sender` if it is behind and this chain has the
    /// archived externalize message it needs; otherwise `None`.
    pub fn handle(&mut self, sender: &str, message: ConsensusMessage) -> Option<ConsensusMessage> {
        if sender == self.self_id {
            // one of our own messages echoed back; ignore it.
            return None;
        }

        let slot = message.slot();
        if slot == 0 {
            fatal!(Logger, "slot should not be zero in a message from {}", sender);
        }

        if slot == self.current.slot {
            self.current.handle(sender, message);
            if self.current.done() {
                let ext = self.current.external.clone().expect("done() implies external is set");
                if self.values.can_finalize(&ext.x) {
                    self.values.finalize(&ext.x, ext.cn, ext.hn, &ext.quorum_slice);
                    self.history.insert(slot, ext);
                    self.current = Block::new(self.self_id.clone(), slot + 1, self.quorum_slice.clone(), self.values.clone());
                }
            }
            return None;
        }

        if let ConsensusMessage::Ballot(BallotMessage::Externalize(_)) = message {
            // the sender has already moved past this slot too.
            return None;
        }

        // the sender is behind; send them what we archived for their slot,
        // if anything. An unknown old slot is simply ignored.
        self.history
            .get(&slot)
            .map(|old| ConsensusMessage::Ballot(BallotMessage::Externalize(old.clone())))
    }

    /// The messages this node wants to gossip: whatever the current
    /// block has to say, plus the externalize message for the slot just
    /// finished, so a peer one slot behind can catch up without asking.
    pub fn outgoing_messages(&mut self) -> Vec<ConsensusMessage> {
        let mut messages = self.current.outgoing_messages();
        if let Some(prev) = self.current.slot.checked_sub(1).and_then(|slot| self.history.get(&slot)) {
            messages.push(ConsensusMessage::Ballot(BallotMessage::Externalize(prev.clone())));
        }
        messages
    }
}
