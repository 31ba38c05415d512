//! The response to a `QueryMessage`. Grounded on `data/data_message.go`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use fbc_ledger::{Account, Bucket, Document, PersistedBlock, Provider, SignedOperation};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DataMessage {
    /// The last finalized slot at the moment this snapshot was taken. Zero
    /// means the sender isn't reporting which slot this reflects.
    #[serde(default)]
    pub i: u64,
    /// A `None` value means no account exists for that owner.
    #[serde(default)]
    pub accounts: BTreeMap<String, Option<Account>>,
    /// A `None` value means that slot has not finalized yet.
    #[serde(default)]
    pub blocks: BTreeMap<u64, Option<PersistedBlock>>,
    #[serde(default)]
    pub documents: Vec<Document>,
    #[serde(default)]
    pub buckets: Vec<Bucket>,
    #[serde(default)]
    pub providers: Vec<Provider>,
    #[serde(default)]
    pub operations: BTreeMap<String, SignedOperation>,
}

impl DataMessage {
    /// A `DataMessage` carrying a single finalized block, used to answer a
    /// peer catching up on a slot it fell behind on.
    pub fn for_old_block(block: PersistedBlock) -> Self {
        let mut blocks = BTreeMap::new();
        let slot = block.slot;
        blocks.insert(slot, Some(block));
        DataMessage { i: slot, blocks, ..Default::default() }
    }
}
