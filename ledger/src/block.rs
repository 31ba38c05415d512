//! A finalized slot's persisted record: the chunk that externalized plus
//! the commit range and quorum slice that finalized it. Grounded on
//! `data/block.go`. Named `PersistedBlock` to keep it distinct from
//! `fbc_consensus_scp::Block`, the in-flight per-slot consensus state.

use fbc_consensus_scp_types::{ExternalizeMessage, QuorumSlice};
use serde::{Deserialize, Serialize};

use crate::ledger_chunk::LedgerChunk;
use crate::signed_operation::SignedOperation;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersistedBlock {
    pub slot: u64,
    pub chunk: LedgerChunk,
    pub c: u32,
    pub h: u32,
    pub quorum_slice: QuorumSlice,
}

impl PersistedBlock {
    /// The catch-up message a lagging peer is sent for this slot.
    pub fn externalize_message(&self) -> ExternalizeMessage {
        ExternalizeMessage {
            slot: self.slot,
            x: self.chunk.hash(),
            cn: self.c,
            hn: self.h,
            quorum_slice: self.quorum_slice.clone(),
        }
    }

    pub fn get_operation(&self, signature: &str) -> Option<&SignedOperation> {
        self.chunk.get_operation(signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn externalize_message_carries_the_chunk_hash() {
        let chunk = LedgerChunk {
            operations: vec![],
            accounts: BTreeMap::new(),
            next_document_id: 1,
            next_provider_id: 1,
        };
        let block = PersistedBlock {
            slot: 1,
            chunk: chunk.clone(),
            c: 3,
            h: 5,
            quorum_slice: QuorumSlice::new(vec!["a".into()], 1),
        };
        let ext = block.externalize_message();
        assert_eq!(ext.slot, 1);
        assert_eq!(ext.x, chunk.hash());
        assert_eq!((ext.cn, ext.hn), (3, 5));
    }
}
