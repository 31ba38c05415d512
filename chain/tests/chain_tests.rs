//! End-to-end exercises of `Chain` over a real `OperationQueue`-backed
//! value store: a fully-connected network converging on one slot, and the
//! catch-up path for a peer behind on its slot.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use fbc_chain::Chain;
use fbc_consensus_scp::{ConsensusMessage, SharedValueStore};
use fbc_consensus_scp_types::{BallotMessage, ExternalizeMessage, NominationMessage, QuorumSlice, SlotValue};
use fbc_crypto::KeyPair;
use fbc_ledger::operation::SendOperation;
use fbc_ledger::{Account, Cache, Operation, SignedOperation};
use fbc_operation_queue::OperationQueue;

fn shared_queue_with_account(owner_key: &KeyPair) -> SharedValueStore<OperationQueue> {
    let cache = Rc::new(RefCell::new(Cache::new()));
    cache.borrow_mut().upsert_account(Account::new(owner_key.public_key().to_string(), 1_000));
    SharedValueStore::new(OperationQueue::new(cache, None, 1))
}

fn send_from(kp: &KeyPair) -> SignedOperation {
    let op = Operation::Send(SendOperation {
        signer: kp.public_key().to_string(),
        sequence: 1,
        fee: 1,
        to: "bob".into(),
        amount: 10,
    });
    SignedOperation::new(op, kp)
}

#[test]
fn three_node_network_converges_and_advances_to_the_next_slot() {
    let node_ids: Vec<String> = vec!["a".into(), "b".into(), "c".into()];
    let quorum_slice = QuorumSlice::majority_of(node_ids.clone());
    let alice = KeyPair::from_secret_phrase("alice");
    let op = send_from(&alice);

    let mut chains: HashMap<String, Chain<SharedValueStore<OperationQueue>>> = HashMap::new();
    for id in &node_ids {
        let values = shared_queue_with_account(&alice);
        values.borrow_mut().add(op.clone());
        chains.insert(id.clone(), Chain::new_empty_chain(id.clone(), quorum_slice.clone(), values));
    }

    for _round in 0..50 {
        let mut outgoing: Vec<(String, ConsensusMessage)> = Vec::new();
        for id in &node_ids {
            for message in chains.get_mut(id).unwrap().outgoing_messages() {
                outgoing.push((id.clone(), message));
            }
        }
        for (sender, message) in outgoing {
            for id in &node_ids {
                if id == &sender {
                    continue;
                }
                chains.get_mut(id).unwrap().handle(&sender, message.clone());
            }
        }
        if node_ids.iter().all(|id| chains[id].slot() == 2) {
            break;
        }
    }

    for id in &node_ids {
        assert_eq!(chains[id].slot(), 2, "node {id} failed to advance past slot 1");
    }
    let externalized: Vec<SlotValue> = node_ids
        .iter()
        .map(|id| chains[id].get_last().unwrap().x.clone())
        .collect();
    assert!(externalized.iter().all(|x| x == &externalized[0]), "nodes externalized different values");
    assert!(!externalized[0].is_empty());
}

fn fake_external(slot: u64, qs: &QuorumSlice) -> ExternalizeMessage {
    ExternalizeMessage {
        slot,
        x: SlotValue::from(format!("chunk-{slot}")),
        cn: 1,
        hn: 1,
        quorum_slice: qs.clone(),
    }
}

#[test]
fn catch_up_returns_the_archived_externalize_message_for_an_old_slot() {
    let qs = QuorumSlice::new(vec!["a".into(), "b".into()], 1);
    let values = shared_queue_with_account(&KeyPair::from_secret_phrase("alice"));
    let last = fake_external(1, &qs);
    let mut chain = Chain::new_chain("a".to_string(), qs.clone(), values, last.clone());
    assert_eq!(chain.slot(), 2);

    let stale = ConsensusMessage::Nomination(NominationMessage {
        slot: 1,
        nominated: vec![],
        accepted: vec![],
        quorum_slice: qs,
    });
    let response = chain.handle("b", stale);
    match response {
        Some(ConsensusMessage::Ballot(BallotMessage::Externalize(ext))) => assert_eq!(ext, last),
        other => panic!("expected a catch-up externalize message, got {other:?}"),
    }
}

#[test]
fn catch_up_ignores_a_message_for_a_slot_with_no_archived_history() {
    let qs = QuorumSlice::new(vec!["a".into(), "b".into()], 1);
    let values = shared_queue_with_account(&KeyPair::from_secret_phrase("alice"));
    let mut chain = Chain::new_empty_chain("a".to_string(), qs.clone(), values);

    let from_the_future = ConsensusMessage::Nomination(NominationMessage {
        slot: 5,
        nominated: vec![],
        accepted: vec![],
        quorum_slice: qs,
    });
    assert!(chain.handle("b", from_the_future).is_none());
}

#[test]
fn a_chains_own_echoed_message_is_ignored() {
    let qs = QuorumSlice::new(vec!["a".into(), "b".into()], 1);
    let values = shared_queue_with_account(&KeyPair::from_secret_phrase("alice"));
    let mut chain = Chain::new_empty_chain("a".to_string(), qs.clone(), values);

    let echo = ConsensusMessage::Nomination(NominationMessage {
        slot: 1,
        nominated: vec![SlotValue::from("x")],
        accepted: vec![],
        quorum_slice: qs,
    });
    assert!(chain.handle("a", echo).is_none());
}
