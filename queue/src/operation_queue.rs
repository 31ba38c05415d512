//! The pending-operation pool: a `ValueStore` backed by an `fbc_ledger::Cache`,
//! holding unconfirmed operations in `HighestFeeFirst` order and turning them
//! into candidate `LedgerChunk`s for nomination. Grounded on
//! `data/operation_queue.go`.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use fbc_common::fatal;
use fbc_common::Logger;
use fbc_consensus_scp::ValueStore;
use fbc_consensus_scp_types::{QuorumSlice, SlotValue};
use fbc_ledger::{Cache, LedgerChunk, Operation, PersistedBlock, SignedOperation, MAX_CHUNK_SIZE};

use crate::error::QueueError;
use crate::message::{ErrorMessage, OperationMessage};

/// No more than this many operations sit in the pending pool at once; past
/// this, the lowest-priority (last in `HighestFeeFirst` order) operation is
/// evicted to make room.
pub const QUEUE_LIMIT: usize = 1000;

/// A pool of pending operations, plus every candidate chunk built from them
/// that is currently circulating in nomination for the current slot.
pub struct OperationQueue {
    cache: Rc<RefCell<Cache>>,
    pending: BTreeSet<SignedOperation>,
    chunks: BTreeMap<SlotValue, LedgerChunk>,
    last_hash: SlotValue,
    slot: u64,
}

impl OperationQueue {
    /// `last_chunk` must be `Some` unless `slot == 1` — a queue can only
    /// start from scratch at the very first slot.
    pub fn new(cache: Rc<RefCell<Cache>>, last_chunk: Option<LedgerChunk>, slot: u64) -> Self {
        let last_hash = match &last_chunk {
            Some(chunk) => chunk.hash(),
            None => {
                if slot != 1 {
                    fatal!(Logger, "operation queue for slot {} needs a last chunk", slot);
                }
                SlotValue::empty()
            }
        };
        OperationQueue {
            cache,
            pending: BTreeSet::new(),
            chunks: BTreeMap::new(),
            last_hash,
            slot,
        }
    }

    /// A fresh queue over a standalone in-memory cache, for tests and for
    /// bootstrapping a brand new chain.
    pub fn standalone() -> Self {
        OperationQueue::new(Rc::new(RefCell::new(Cache::new())), None, 1)
    }

    pub fn slot(&self) -> u64 {
        self.slot
    }

    pub fn cache(&self) -> Rc<RefCell<Cache>> {
        Rc::clone(&self.cache)
    }

    /// The `n` highest-priority pending operations.
    pub fn top(&self, n: usize) -> Vec<SignedOperation> {
        self.pending.iter().take(n).cloned().collect()
    }

    pub fn operations(&self) -> Vec<SignedOperation> {
        self.pending.iter().cloned().collect()
    }

    pub fn contains(&self, op: &SignedOperation) -> bool {
        self.pending.contains(op)
    }

    pub fn remove(&mut self, op: &SignedOperation) -> bool {
        self.pending.remove(op)
    }

    /// Structural, signature, and ledger-state validation for a candidate
    /// operation, in that order.
    pub fn validate(&self, op: &SignedOperation) -> Result<(), QueueError> {
        op.verify()?;
        self.cache.borrow_mut().validate(&op.operation)?;
        Ok(())
    }

    /// Adds `op` to the pool if it validates, evicting the current
    /// lowest-priority operation if the pool is now over `QUEUE_LIMIT`.
    /// Returns whether `op` is in the pool afterwards — it may have been
    /// the operation evicted.
    pub fn add(&mut self, op: SignedOperation) -> bool {
        if self.validate(&op).is_err() {
            return false;
        }
        self.pending.insert(op.clone());
        if self.pending.len() > QUEUE_LIMIT {
            self.pending.pop_last();
        }
        self.pending.contains(&op)
    }

    /// Drops every pending operation that no longer validates against
    /// current cache state, e.g. because its sequence number has since
    /// been consumed by a finalized block.
    pub fn revalidate(&mut self) {
        let stale: Vec<SignedOperation> = self
            .pending
            .iter()
            .filter(|op| self.validate(op).is_err())
            .cloned()
            .collect();
        for op in stale {
            self.pending.remove(&op);
        }
    }

    /// Builds a candidate chunk out of `ops`, which must already be sorted
    /// `HighestFeeFirst`. Operations that fail to process against a
    /// speculative copy of the cache are silently dropped; the chunk caps
    /// out at `MAX_CHUNK_SIZE` accepted operations. Returns `None` only
    /// when `ops` itself was empty — a chunk with zero operations but a
    /// valid account/counter snapshot is still a meaningful result.
    pub fn new_chunk(&self, ops: &[SignedOperation]) -> Option<LedgerChunk> {
        if ops.is_empty() {
            return None;
        }
        if !ops.windows(2).all(|w| w[0] <= w[1]) {
            fatal!(Logger, "new_chunk requires operations in HighestFeeFirst order");
        }

        let speculative = Rc::new(RefCell::new(Cache::cow_copy(&self.cache)));
        let mut accepted = Vec::new();
        let mut touched = BTreeSet::new();
        for op in ops {
            if accepted.len() >= MAX_CHUNK_SIZE {
                break;
            }
            let processed = speculative.borrow_mut().process(&op.operation).is_ok();
            if processed {
                touched.insert(op.operation.signer().to_string());
                if let Operation::Send(send) = &op.operation {
                    touched.insert(send.to.clone());
                }
                accepted.push(op.clone());
            }
        }

        let mut accounts = BTreeMap::new();
        for owner in &touched {
            if let Some(account) = speculative.borrow_mut().get_account(owner) {
                accounts.insert(owner.clone(), account);
            }
        }
        let (next_document_id, next_provider_id) = {
            let cache = speculative.borrow();
            (cache.next_document_id, cache.next_provider_id)
        };

        Some(LedgerChunk {
            operations: accepted,
            accounts,
            next_document_id,
            next_provider_id,
        })
    }

    /// An `OperationMessage` announcing every pending operation, or `None`
    /// if the pool is empty.
    pub fn operation_message(&self) -> Option<OperationMessage> {
        if self.pending.is_empty() {
            return None;
        }
        Some(OperationMessage::new(self.operations()))
    }

    /// Looks up a previously finalized block by slot, for nodes catching up.
    pub fn old_block_message(&self, slot: u64) -> Option<PersistedBlock> {
        self.cache.borrow().get_block(slot)
    }

    /// Folds a received `OperationMessage` into the pool and chunk table.
    /// Returns an error message to send back only if nothing in the
    /// message could be used at all, plus whether anything new was learned.
    pub fn handle_operation_message(&mut self, message: &OperationMessage) -> (Option<ErrorMessage>, bool) {
        let mut updated = false;
        let mut any_ok = message.operations.is_empty();
        for op in &message.operations {
            if self.add(op.clone()) {
                updated = true;
                any_ok = true;
            }
        }

        let mut chunk_error = None;
        for (hash, chunk) in &message.chunks {
            if self.chunks.contains_key(hash) {
                continue;
            }
            match Cache::validate_chunk(&self.cache, chunk) {
                Ok(()) => {
                    if &chunk.hash() == hash {
                        self.chunks.insert(hash.clone(), chunk.clone());
                        updated = true;
                    }
                    // a hash mismatch is silently dropped: the sender's
                    // claimed key doesn't match the chunk it sent.
                }
                Err(e) => {
                    chunk_error = Some(ErrorMessage::new(e.to_string()));
                }
            }
        }

        if !any_ok {
            return (Some(ErrorMessage::new("no operation in the message could be added to the pool")), updated);
        }
        (chunk_error, updated)
    }
}

impl ValueStore for OperationQueue {
    fn combine(&mut self, values: &[SlotValue]) -> SlotValue {
        let mut set: BTreeSet<SignedOperation> = BTreeSet::new();
        for v in values {
            if let Some(chunk) = self.chunks.get(v) {
                for op in &chunk.operations {
                    set.insert(op.clone());
                }
            }
        }
        let ops: Vec<SignedOperation> = set.into_iter().collect();
        let chunk = self
            .new_chunk(&ops)
            .unwrap_or_else(|| fatal!(Logger, "combining known chunks produced nothing"));
        let hash = chunk.hash();
        self.chunks.insert(hash.clone(), chunk);
        hash
    }

    fn can_finalize(&self, v: &SlotValue) -> bool {
        v.is_empty() || self.chunks.contains_key(v)
    }

    fn finalize(&mut self, v: &SlotValue, c: u32, h: u32, quorum_slice: &QuorumSlice) {
        let chunk = if v.is_empty() {
            let cache = self.cache.borrow();
            LedgerChunk {
                operations: Vec::new(),
                accounts: BTreeMap::new(),
                next_document_id: cache.next_document_id,
                next_provider_id: cache.next_provider_id,
            }
        } else {
            self.chunks
                .get(v)
                .cloned()
                .unwrap_or_else(|| fatal!(Logger, "finalizing an unknown chunk {}", v))
        };

        let block = PersistedBlock {
            slot: self.slot,
            chunk,
            c,
            h,
            quorum_slice: quorum_slice.clone(),
        };
        Cache::finalize_block(&self.cache, block);

        self.last_hash = v.clone();
        self.slot += 1;
        self.chunks.clear();
        self.revalidate();
    }

    fn last(&self) -> SlotValue {
        self.last_hash.clone()
    }

    fn suggest_value(&mut self) -> Option<SlotValue> {
        let ops = self.top(MAX_CHUNK_SIZE);
        let chunk = self.new_chunk(&ops)?;
        let hash = chunk.hash();
        self.chunks.insert(hash.clone(), chunk);
        Some(hash)
    }

    fn validate_value(&self, v: &SlotValue) -> bool {
        v.is_empty() || self.chunks.contains_key(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fbc_crypto::KeyPair;
    use fbc_ledger::operation::SendOperation;
    use fbc_ledger::Account;

    fn queue_with_account(owner: &str, balance: u64) -> (OperationQueue, KeyPair) {
        let kp = KeyPair::from_secret_phrase(owner);
        let cache = Rc::new(RefCell::new(Cache::new()));
        cache.borrow_mut().upsert_account(Account::new(kp.public_key().to_string(), balance));
        (OperationQueue::new(cache, None, 1), kp)
    }

    fn send(kp: &KeyPair, sequence: u32, fee: u64, amount: u64) -> SignedOperation {
        let op = Operation::Send(SendOperation {
            signer: kp.public_key().to_string(),
            sequence,
            fee,
            to: "bob".into(),
            amount,
        });
        SignedOperation::new(op, kp)
    }

    #[test]
    fn add_accepts_a_valid_operation_and_rejects_a_stale_one() {
        let (mut queue, kp) = queue_with_account("alice", 1000);
        let op = send(&kp, 1, 1, 10);
        assert!(queue.add(op.clone()));
        assert!(queue.contains(&op));

        let stale = send(&kp, 1, 1, 20);
        assert!(!queue.add(stale));
    }

    #[test]
    fn top_orders_by_highest_fee_first() {
        let (mut queue, kp) = queue_with_account("alice", 1000);
        let low = Operation::Send(SendOperation { signer: kp.public_key().to_string(), sequence: 1, fee: 1, to: "bob".into(), amount: 1 });
        let high = Operation::Send(SendOperation { signer: kp.public_key().to_string(), sequence: 1, fee: 50, to: "carol".into(), amount: 1 });
        let low = SignedOperation::new(low, &kp);
        let high = SignedOperation::new(high, &kp);
        queue.add(low.clone());
        queue.add(high.clone());
        assert_eq!(queue.top(1)[0], high);
        assert_eq!(queue.top(2), vec![high, low]);
    }

    #[test]
    fn new_chunk_drops_invalid_operations_but_keeps_the_rest() {
        let (queue, kp) = queue_with_account("alice", 1000);
        let good = send(&kp, 1, 1, 10);
        let bad = send(&kp, 99, 1, 10);
        let chunk = queue.new_chunk(&[good.clone(), bad]).unwrap();
        assert_eq!(chunk.operations.len(), 1);
        assert_eq!(chunk.operations[0], good);
    }

    #[test]
    fn new_chunk_of_empty_input_is_none() {
        let (queue, _) = queue_with_account("alice", 1000);
        assert!(queue.new_chunk(&[]).is_none());
    }

    #[test]
    fn suggest_value_and_combine_round_trip_through_finalize() {
        let (mut queue, kp) = queue_with_account("alice", 1000);
        let op = send(&kp, 1, 1, 10);
        queue.add(op);
        let suggested = queue.suggest_value().expect("pending pool is non-empty");
        assert!(queue.validate_value(&suggested));

        let combined = queue.combine(&[suggested.clone()]);
        assert_eq!(combined, suggested);

        let qs = QuorumSlice::new(vec!["alice".into()], 1);
        queue.finalize(&combined, 1, 1, &qs);
        assert_eq!(queue.slot(), 2);
        assert_eq!(queue.last(), combined);
    }

    #[test]
    fn finalize_with_empty_value_advances_the_slot_without_a_block_hash() {
        let (mut queue, _) = queue_with_account("alice", 1000);
        let qs = QuorumSlice::new(vec!["alice".into()], 1);
        queue.finalize(&SlotValue::empty(), 0, 0, &qs);
        assert_eq!(queue.slot(), 2);
        assert!(queue.last().is_empty());
    }

    #[test]
    fn handle_operation_message_reports_an_error_when_nothing_was_added() {
        let (mut queue, kp) = queue_with_account("alice", 1000);
        let stale = send(&kp, 99, 1, 10);
        let message = OperationMessage::new(vec![stale]);
        let (err, updated) = queue.handle_operation_message(&message);
        assert!(err.is_some());
        assert!(!updated);
    }

    #[test]
    fn handle_operation_message_learns_new_operations_without_error() {
        let (mut queue, kp) = queue_with_account("alice", 1000);
        let op = send(&kp, 1, 1, 10);
        let message = OperationMessage::new(vec![op.clone()]);
        let (err, updated) = queue.handle_operation_message(&message);
        assert!(err.is_none());
        assert!(updated);
        assert!(queue.contains(&op));
    }
}
