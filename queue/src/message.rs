//! Wire shapes that travel alongside the pending-operation pool: a batch
//! of newly-known operations plus any chunks that might follow, and the
//! plain-text error report sent back when none of them could be used.
//! Grounded on `data/operation_message.go` and `util/error_message.go`.

use std::collections::BTreeMap;

use fbc_consensus_scp_types::SlotValue;
use serde::{Deserialize, Serialize};

use fbc_ledger::{LedgerChunk, SignedOperation};

/// Announces operations the sender knows about that the recipient might
/// not, plus any ledger chunks built from them that are already circulating
/// in nomination. `operations` is expected to be sorted `HighestFeeFirst`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationMessage {
    pub operations: Vec<SignedOperation>,
    pub chunks: BTreeMap<SlotValue, LedgerChunk>,
}

impl OperationMessage {
    pub fn new(mut operations: Vec<SignedOperation>) -> Self {
        operations.sort();
        OperationMessage {
            operations,
            chunks: BTreeMap::new(),
        }
    }

    pub fn with_chunk(chunk: LedgerChunk) -> Self {
        let mut chunks = BTreeMap::new();
        chunks.insert(chunk.hash(), chunk);
        OperationMessage {
            operations: Vec::new(),
            chunks,
        }
    }
}

/// No computer-readable meaning — just a string to show a human.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub error: String,
}

impl ErrorMessage {
    pub fn new(error: impl Into<String>) -> Self {
        ErrorMessage { error: error.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sorts_operations_highest_fee_first() {
        use fbc_crypto::KeyPair;
        use fbc_ledger::operation::SendOperation;
        use fbc_ledger::Operation;

        let kp = KeyPair::from_secret_phrase("alice");
        let low = SignedOperation::new(
            Operation::Send(SendOperation { signer: kp.public_key().to_string(), sequence: 1, fee: 1, to: "bob".into(), amount: 1 }),
            &kp,
        );
        let high = SignedOperation::new(
            Operation::Send(SendOperation { signer: kp.public_key().to_string(), sequence: 1, fee: 10, to: "bob".into(), amount: 1 }),
            &kp,
        );
        let msg = OperationMessage::new(vec![low.clone(), high.clone()]);
        assert_eq!(msg.operations[0], high);
        assert_eq!(msg.operations[1], low);
    }
}
