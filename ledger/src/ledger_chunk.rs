//! The content of a block: an ordered operation list plus the post-state
//! snapshot of every account it touched. Grounded on `data/ledger_chunk.go`.

use std::collections::BTreeMap;

use fbc_consensus_scp_types::SlotValue;
use fbc_crypto::hash_string;
use serde::{Deserialize, Serialize};

use crate::account::Account;
use crate::signed_operation::SignedOperation;

/// No chunk may carry more operations than this; `OperationQueue` enforces
/// it when forming a new chunk.
pub const MAX_CHUNK_SIZE: usize = 100;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerChunk {
    pub operations: Vec<SignedOperation>,
    pub accounts: BTreeMap<String, Account>,
    pub next_document_id: u64,
    pub next_provider_id: u64,
}

impl LedgerChunk {
    /// The deterministic fingerprint this chunk binds to as a `SlotValue`:
    /// each operation's signature in order, then each touched account's
    /// post-state bytes in sorted-owner order.
    pub fn hash(&self) -> SlotValue {
        let mut bytes = Vec::new();
        for op in &self.operations {
            bytes.extend(op.signature.as_bytes());
        }
        for account in self.accounts.values() {
            bytes.extend(account.hashable_bytes());
        }
        SlotValue::from(hash_string(&bytes))
    }

    pub fn get_operation(&self, signature: &str) -> Option<&SignedOperation> {
        self.operations.iter().find(|op| op.signature == signature)
    }
}
