//! A consensus node: a `Chain` and the `OperationQueue` feeding it, wired
//! together with the message routing a peer connection needs. Grounded on
//! `network/node.go`.

use std::cell::RefCell;
use std::rc::Rc;

use fbc_chain::Chain;
use fbc_common::{log_info, log_warn, Logger};
use fbc_consensus_scp::{ConsensusMessage, SharedValueStore};
use fbc_consensus_scp_types::{BallotMessage, QuorumSlice};
use fbc_crypto::PublicKey;
use fbc_ledger::account::TOTAL_MONEY;
use fbc_ledger::{Account, Cache, Store};
use fbc_operation_queue::OperationQueue;

use crate::data_message::DataMessage;
use crate::message::Message;
use crate::query::QueryMessage;

/// The well-known secret phrase minting the genesis supply, matching
/// `data/airdrop.go`.
pub const MINT_PHRASE: &str = "mint";

/// A node's view of the network: the chain it is running consensus on,
/// the pending operations feeding it, and the slot it believes is current.
pub struct Node {
    public_key: PublicKey,
    quorum_slice: QuorumSlice,
    chain: Chain<SharedValueStore<OperationQueue>>,
    queue: SharedValueStore<OperationQueue>,
    slot: u64,
}

impl Node {
    /// Starts a brand new chain at slot 1, with the genesis mint account
    /// airdropped into an otherwise empty ledger.
    pub fn genesis(public_key: PublicKey, quorum_slice: QuorumSlice) -> Self {
        let cache = Rc::new(RefCell::new(Cache::new()));
        let mint = fbc_crypto::KeyPair::from_secret_phrase(MINT_PHRASE).public_key().to_string();
        cache.borrow_mut().upsert_account(Account::new(mint, TOTAL_MONEY));
        let queue = SharedValueStore::new(OperationQueue::new(cache, None, 1));
        let chain = Chain::new_empty_chain(public_key.to_string(), quorum_slice.clone(), queue.clone());
        Node { public_key, quorum_slice, chain, queue, slot: 1 }
    }

    /// Resumes from a store's persisted state if it has one, otherwise
    /// airdrops a fresh genesis ledger into the store.
    pub fn with_store(public_key: PublicKey, quorum_slice: QuorumSlice, store: Rc<RefCell<dyn Store>>) -> Self {
        let last_block = store.borrow().last_block();
        match last_block {
            Some(last_block) => {
                let cache = Rc::new(RefCell::new(Cache::with_store(
                    store,
                    last_block.chunk.next_document_id,
                    last_block.chunk.next_provider_id,
                )));
                let slot = last_block.slot + 1;
                let queue = SharedValueStore::new(OperationQueue::new(cache, Some(last_block.chunk.clone()), slot));
                let chain = Chain::new_chain(
                    public_key.to_string(),
                    quorum_slice.clone(),
                    queue.clone(),
                    last_block.externalize_message(),
                );
                Node { public_key, quorum_slice, chain, queue, slot }
            }
            None => {
                let mint = fbc_crypto::KeyPair::from_secret_phrase(MINT_PHRASE).public_key().to_string();
                let cache = Rc::new(RefCell::new(Cache::with_store(store, 1, 1)));
                cache.borrow_mut().upsert_account(Account::new(mint, TOTAL_MONEY));
                let queue = SharedValueStore::new(OperationQueue::new(cache, None, 1));
                let chain = Chain::new_empty_chain(public_key.to_string(), quorum_slice.clone(), queue.clone());
                Node { public_key, quorum_slice, chain, queue, slot: 1 }
            }
        }
    }

    pub fn public_key(&self) -> PublicKey {
        self.public_key
    }

    pub fn quorum_slice(&self) -> &QuorumSlice {
        &self.quorum_slice
    }

    pub fn slot(&self) -> u64 {
        self.slot
    }

    /// Dispatches one incoming message, returning a response if one is
    /// warranted.
    pub fn handle(&mut self, sender: &str, message: Message) -> Option<Message> {
        match message {
            Message::Data(data) => self.handle_data_message(sender, data),
            Message::Operation(op_message) => {
                let (error, updated) = self.queue.borrow_mut().handle_operation_message(&op_message);
                if updated {
                    self.chain.value_store_updated();
                }
                error.map(Message::Error)
            }
            Message::Nomination(_) | Message::Prepare(_) | Message::Confirm(_) | Message::Externalize(_) => {
                self.handle_chain_message(sender, message)
            }
            Message::Error(error) => {
                log_warn!(Logger, "{} reported an error: {}", sender, error.error);
                None
            }
            Message::Query(query) => Some(Message::Data(self.answer_query(&query))),
        }
    }

    /// A peer caught up us on a slot by sending the whole finalized block:
    /// feed it through as an operation message (to learn the chunk) and
    /// then as the externalize message (to advance past it).
    fn handle_data_message(&mut self, sender: &str, data: DataMessage) -> Option<Message> {
        let Some(Some(block)) = data.blocks.get(&self.slot) else {
            return None;
        };
        let op_message = fbc_operation_queue::OperationMessage::with_chunk(block.chunk.clone());
        self.handle(sender, Message::Operation(op_message));
        self.handle(sender, Message::Externalize(block.externalize_message()))
    }

    fn handle_chain_message(&mut self, sender: &str, message: Message) -> Option<Message> {
        let slot = message.slot();
        if slot < self.slot {
            return self.queue.borrow().old_block_message(slot).map(DataMessage::for_old_block).map(Message::Data);
        }

        let consensus_message: ConsensusMessage = message.try_into().ok()?;
        let response = self.chain.handle(sender, consensus_message);
        if self.chain.slot() > self.slot {
            log_info!(Logger, "{} advanced to slot {}", self.public_key, self.chain.slot());
            self.slot = self.chain.slot();
        }

        match response {
            Some(ConsensusMessage::Ballot(BallotMessage::Externalize(ext))) => {
                // send the sender the whole block, not the bare externalize
                // message, so it can rebuild its own ledger state from it.
                match self.queue.borrow().old_block_message(ext.slot) {
                    Some(block) => Some(Message::Data(DataMessage::for_old_block(block))),
                    None => Some(Message::Externalize(ext)),
                }
            }
            Some(other) => Some(other.into()),
            None => None,
        }
    }

    fn answer_query(&self, query: &QueryMessage) -> DataMessage {
        if let Some(owner) = &query.account {
            let account = self.queue.borrow().cache().borrow_mut().get_account(owner);
            let mut accounts = std::collections::BTreeMap::new();
            accounts.insert(owner.clone(), account);
            return DataMessage { i: self.chain.slot().saturating_sub(1), accounts, ..Default::default() };
        }
        if let Some(slot) = query.block {
            let block = self.queue.borrow().old_block_message(slot);
            let mut blocks = std::collections::BTreeMap::new();
            blocks.insert(slot, block);
            return DataMessage { i: self.chain.slot().saturating_sub(1), blocks, ..Default::default() };
        }
        if let Some(signature) = &query.signature {
            let mut operations = std::collections::BTreeMap::new();
            if let Some(block) = self.queue.borrow().old_block_message(self.slot.saturating_sub(1)) {
                if let Some(op) = block.get_operation(signature) {
                    operations.insert(signature.clone(), op.clone());
                }
            }
            return DataMessage { i: self.chain.slot().saturating_sub(1), operations, ..Default::default() };
        }
        // Document/bucket/provider queries need an index the ledger cache
        // doesn't keep (it only supports point lookups by id/name); answer
        // with an empty result rather than fabricate a scan.
        DataMessage { i: self.chain.slot().saturating_sub(1), ..Default::default() }
    }

    /// Submits a locally-originated operation directly into the pending
    /// pool, as if it had arrived over the wire.
    pub fn submit(&mut self, op: fbc_ledger::SignedOperation) -> bool {
        let added = self.queue.borrow_mut().add(op);
        if added {
            self.chain.value_store_updated();
        }
        added
    }

    /// The messages this node wants to gossip to its peers this round.
    pub fn outgoing_messages(&mut self) -> Vec<Message> {
        let mut messages = Vec::new();
        if let Some(op_message) = self.queue.borrow().operation_message() {
            messages.push(Message::Operation(op_message));
        }
        for message in self.chain.outgoing_messages() {
            messages.push(message.into());
        }
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fbc_crypto::KeyPair;
    use fbc_ledger::operation::SendOperation;
    use fbc_ledger::{Operation, SignedOperation};

    fn node(id: &str, members: &[&str]) -> Node {
        let qs = QuorumSlice::majority_of(members.iter().map(|m| m.to_string()).collect());
        Node::genesis(KeyPair::from_secret_phrase(id).public_key(), qs)
    }

    #[test]
    fn a_solipsist_node_externalizes_its_own_suggestion() {
        let mut n = node("solo", &["solo"]);
        let mint = KeyPair::from_secret_phrase(MINT_PHRASE);
        let op = SignedOperation::new(
            Operation::Send(SendOperation {
                signer: mint.public_key().to_string(),
                sequence: 1,
                fee: 0,
                to: "bob".into(),
                amount: 100,
            }),
            &mint,
        );
        assert!(n.submit(op));

        for _ in 0..10 {
            n.outgoing_messages();
            if n.slot() == 2 {
                break;
            }
        }
        assert_eq!(n.slot(), 2);
    }

    #[test]
    fn account_query_reports_none_for_an_unknown_owner() {
        let n = node("solo", &["solo"]);
        let data = n.answer_query(&QueryMessage::for_account("nobody"));
        assert_eq!(data.accounts.get("nobody"), Some(&None));
    }

    #[test]
    fn account_query_reports_the_airdropped_mint_balance() {
        let n = node("solo", &["solo"]);
        let mint = KeyPair::from_secret_phrase(MINT_PHRASE).public_key().to_string();
        let data = n.answer_query(&QueryMessage::for_account(mint.clone()));
        assert_eq!(data.accounts.get(&mint).unwrap().as_ref().unwrap().balance, TOTAL_MONEY);
    }
}
