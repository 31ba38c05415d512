//! The SQL persistence boundary the `Cache` writes through to. Concrete
//! schema and transaction handling live outside this crate (see
//! `data/database.go` for the reference implementation); `MemoryStore`
//! below is a small in-memory double for tests that need a real `Store`
//! to restart a `Cache` against.

use std::collections::HashMap;

use crate::account::Account;
use crate::block::PersistedBlock;
use crate::bucket::Bucket;
use crate::document::Document;
use crate::provider::Provider;

/// Everything the `Cache` needs from a backing store: point lookups by
/// key, write-through upserts, and the two bits of startup state (the
/// last persisted block, and the next free document/provider id implied
/// by it).
pub trait Store {
    fn get_account(&self, owner: &str) -> Option<Account>;
    fn get_document(&self, id: u64) -> Option<Document>;
    fn get_bucket(&self, name: &str) -> Option<Bucket>;
    fn get_provider(&self, id: u64) -> Option<Provider>;
    fn get_block(&self, slot: u64) -> Option<PersistedBlock>;
    fn last_block(&self) -> Option<PersistedBlock>;
    fn max_balance(&self) -> u64;

    fn upsert_account(&mut self, account: Account);
    fn insert_document(&mut self, document: Document);
    fn update_document(&mut self, document: Document);
    fn delete_document(&mut self, id: u64);
    fn insert_bucket(&mut self, bucket: Bucket);
    fn update_bucket(&mut self, bucket: Bucket);
    fn delete_bucket(&mut self, name: &str);
    fn insert_provider(&mut self, provider: Provider);
    fn update_provider(&mut self, provider: Provider);
    fn delete_provider(&mut self, id: u64);
    fn insert_block(&mut self, block: PersistedBlock);

    /// Commits the pending write-through transaction. A no-op for stores
    /// that write through immediately (like `MemoryStore`).
    fn commit(&mut self);
}

/// An in-memory `Store`, for tests that need to restart a `Cache` against
/// real persisted state (database-restart and tamper-rejection scenarios)
/// without a real database.
#[derive(Default)]
pub struct MemoryStore {
    accounts: HashMap<String, Account>,
    documents: HashMap<u64, Document>,
    buckets: HashMap<String, Bucket>,
    providers: HashMap<u64, Provider>,
    blocks: HashMap<u64, PersistedBlock>,
    last_slot: Option<u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

impl Store for MemoryStore {
    fn get_account(&self, owner: &str) -> Option<Account> {
        self.accounts.get(owner).cloned()
    }
    fn get_document(&self, id: u64) -> Option<Document> {
        self.documents.get(&id).cloned()
    }
    fn get_bucket(&self, name: &str) -> Option<Bucket> {
        self.buckets.get(name).cloned()
    }
    fn get_provider(&self, id: u64) -> Option<Provider> {
        self.providers.get(&id).cloned()
    }
    fn get_block(&self, slot: u64) -> Option<PersistedBlock> {
        self.blocks.get(&slot).cloned()
    }
    fn last_block(&self) -> Option<PersistedBlock> {
        self.last_slot.and_then(|slot| self.blocks.get(&slot).cloned())
    }
    fn max_balance(&self) -> u64 {
        self.accounts.values().map(|a| a.balance).max().unwrap_or(0)
    }

    fn upsert_account(&mut self, account: Account) {
        self.accounts.insert(account.owner.clone(), account);
    }
    fn insert_document(&mut self, document: Document) {
        self.documents.insert(document.id, document);
    }
    fn update_document(&mut self, document: Document) {
        self.documents.insert(document.id, document);
    }
    fn delete_document(&mut self, id: u64) {
        self.documents.remove(&id);
    }
    fn insert_bucket(&mut self, bucket: Bucket) {
        self.buckets.insert(bucket.name.clone(), bucket);
    }
    fn update_bucket(&mut self, bucket: Bucket) {
        self.buckets.insert(bucket.name.clone(), bucket);
    }
    fn delete_bucket(&mut self, name: &str) {
        self.buckets.remove(name);
    }
    fn insert_provider(&mut self, provider: Provider) {
        self.providers.insert(provider.id, provider);
    }
    fn update_provider(&mut self, provider: Provider) {
        self.providers.insert(provider.id, provider);
    }
    fn delete_provider(&mut self, id: u64) {
        self.providers.remove(&id);
    }
    fn insert_block(&mut self, block: PersistedBlock) {
        self.last_slot = Some(block.slot);
        self.blocks.insert(block.slot, block);
    }
    fn commit(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trips_an_account() {
        let mut store = MemoryStore::new();
        store.upsert_account(Account::new("alice", 100));
        assert_eq!(store.get_account("alice").unwrap().balance, 100);
        assert!(store.get_account("bob").is_none());
    }

    #[test]
    fn memory_store_tracks_the_last_block() {
        let mut store = MemoryStore::new();
        assert!(store.last_block().is_none());
        let block = PersistedBlock {
            slot: 1,
            chunk: crate::ledger_chunk::LedgerChunk::default(),
            c: 1,
            h: 1,
            quorum_slice: fbc_consensus_scp_types::QuorumSlice::new(vec!["a".into()], 1),
        };
        store.insert_block(block.clone());
        assert_eq!(store.last_block().unwrap().slot, 1);
    }
}
