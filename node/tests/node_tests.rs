//! End-to-end exercises of `Node`: a four-node send-money round, and
//! resuming a node from a persisted store after a restart.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use fbc_consensus_scp_types::QuorumSlice;
use fbc_crypto::KeyPair;
use fbc_ledger::account::TOTAL_MONEY;
use fbc_ledger::operation::SendOperation;
use fbc_ledger::{MemoryStore, Operation, SignedOperation, Store};
use fbc_node::{Message, Node, MINT_PHRASE};

fn mint_send(sequence: u32, to: &str, amount: u64) -> SignedOperation {
    let mint = KeyPair::from_secret_phrase(MINT_PHRASE);
    let op = Operation::Send(SendOperation {
        signer: mint.public_key().to_string(),
        sequence,
        fee: 0,
        to: to.to_string(),
        amount,
    });
    SignedOperation::new(op, &mint)
}

#[test]
fn four_node_send_money_round_converges_and_applies_the_operation() {
    let ids = ["node0", "node1", "node2", "node3"];
    let qs = QuorumSlice::new(ids.iter().map(|s| s.to_string()).collect(), 3);

    let mut nodes: HashMap<String, Node> = HashMap::new();
    for id in &ids {
        let public_key = KeyPair::from_secret_phrase(id).public_key();
        nodes.insert(public_key.to_string(), Node::genesis(public_key, qs.clone()));
    }
    let node_ids: Vec<String> = nodes.keys().cloned().collect();

    let op = mint_send(1, "bob", 100);
    for id in &node_ids {
        assert!(nodes.get_mut(id).unwrap().submit(op.clone()));
    }

    for _round in 0..30 {
        let mut outgoing: Vec<(String, Message)> = Vec::new();
        for id in &node_ids {
            for message in nodes.get_mut(id).unwrap().outgoing_messages() {
                outgoing.push((id.clone(), message));
            }
        }
        for (sender, message) in outgoing {
            for id in &node_ids {
                if id == &sender {
                    continue;
                }
                if let Some(response) = nodes.get_mut(id).unwrap().handle(&sender, message.clone()) {
                    nodes.get_mut(&sender).unwrap().handle(id, response);
                }
            }
        }
        if node_ids.iter().all(|id| nodes[id].slot() == 2) {
            break;
        }
    }

    for id in &node_ids {
        assert_eq!(nodes[id].slot(), 2, "{id} failed to advance past slot 1");

        let mint_key = KeyPair::from_secret_phrase(MINT_PHRASE).public_key().to_string();
        let data = nodes.get_mut(id).unwrap().handle(id, Message::Query(fbc_node::QueryMessage::for_account(mint_key.clone())));
        let Some(Message::Data(data)) = data else {
            panic!("expected a data response for {id}");
        };
        let mint_account = data.accounts.get(&mint_key).unwrap().as_ref().expect("mint account exists");
        assert_eq!(mint_account.balance, TOTAL_MONEY - 100);
        assert_eq!(mint_account.sequence, 1);

        let bob_data = nodes.get_mut(id).unwrap().handle(id, Message::Query(fbc_node::QueryMessage::for_account("bob")));
        let Some(Message::Data(bob_data)) = bob_data else {
            panic!("expected a data response for {id}");
        };
        let bob_account = bob_data.accounts.get("bob").unwrap().as_ref().expect("bob account exists");
        assert_eq!(bob_account.balance, 100);
    }
}

#[test]
fn a_node_resumes_from_a_persisted_store_after_restart() {
    let qs = QuorumSlice::new(vec!["solo".into()], 1);
    let public_key = KeyPair::from_secret_phrase("solo").public_key();
    let store: Rc<RefCell<dyn Store>> = Rc::new(RefCell::new(MemoryStore::new()));

    {
        let mut node = Node::with_store(public_key, qs.clone(), Rc::clone(&store));
        assert!(node.submit(mint_send(1, "bob", 50)));
        for _ in 0..10 {
            node.outgoing_messages();
            if node.slot() == 2 {
                break;
            }
        }
        assert_eq!(node.slot(), 2);
    }

    assert!(store.borrow().last_block().is_some());

    let mut resumed = Node::with_store(public_key, qs, Rc::clone(&store));
    assert_eq!(resumed.slot(), 2);

    assert!(resumed.submit(mint_send(2, "carol", 25)));
    for _ in 0..10 {
        resumed.outgoing_messages();
        if resumed.slot() == 3 {
            break;
        }
    }
    assert_eq!(resumed.slot(), 3);
}
