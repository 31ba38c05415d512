//! A deterministic, replayable view over ledger state. Supports three
//! modes: standalone in-memory, database-backed (write-through to a
//! `Store`), and a copy-on-write overlay used for speculative validation.
//! Grounded on `data/cache.go`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use fbc_common::fatal;
use fbc_common::Logger;

use crate::account::Account;
use crate::block::PersistedBlock;
use crate::bucket::{is_valid_magnet, Bucket, ProviderRef};
use crate::document::Document;
use crate::error::{LedgerError, LedgerResult};
use crate::ledger_chunk::{LedgerChunk, MAX_CHUNK_SIZE};
use crate::operation::Operation;
use crate::provider::{BucketRef, Provider};
use crate::store::Store;

/// `accounts`/`documents`/`buckets`/`providers` use `Option<T>` values, not
/// just presence/absence of the key, so a cached "known absent" read can be
/// told apart from "never looked up" — mirroring the Go cache's nil-valued
/// map entries.
pub struct Cache {
    accounts: HashMap<String, Option<Account>>,
    documents: HashMap<u64, Option<Document>>,
    buckets: HashMap<String, Option<Bucket>>,
    providers: HashMap<u64, Option<Provider>>,
    blocks: HashMap<u64, PersistedBlock>,

    read_only: Option<Rc<RefCell<Cache>>>,
    store: Option<Rc<RefCell<dyn Store>>>,

    pub next_document_id: u64,
    pub next_provider_id: u64,
}

impl Cache {
    pub fn new() -> Self {
        Cache {
            accounts: HashMap::new(),
            documents: HashMap::new(),
            buckets: HashMap::new(),
            providers: HashMap::new(),
            blocks: HashMap::new(),
            read_only: None,
            store: None,
            next_document_id: 1,
            next_provider_id: 1,
        }
    }

    pub fn with_store(store: Rc<RefCell<dyn Store>>, next_document_id: u64, next_provider_id: u64) -> Self {
        let mut cache = Cache::new();
        cache.store = Some(store);
        cache.next_document_id = next_document_id;
        cache.next_provider_id = next_provider_id;
        cache
    }

    /// A copy-on-write layer over `parent`: reads fall through, writes
    /// never leak back.
    pub fn cow_copy(parent: &Rc<RefCell<Cache>>) -> Cache {
        let mut cache = Cache::new();
        let p = parent.borrow();
        cache.next_document_id = p.next_document_id;
        cache.next_provider_id = p.next_provider_id;
        drop(p);
        cache.read_only = Some(Rc::clone(parent));
        cache
    }

    // ---- accounts ----

    pub fn get_account(&mut self, owner: &str) -> Option<Account> {
        if let Some(a) = self.accounts.get(owner) {
            return a.clone();
        }
        if let Some(parent) = self.read_only.clone() {
            return parent.borrow_mut().get_account(owner);
        }
        if let Some(store) = self.store.clone() {
            let answer = store.borrow().get_account(owner);
            self.accounts.insert(owner.to_string(), answer.clone());
            return answer;
        }
        None
    }

    pub fn upsert_account(&mut self, account: Account) {
        if account.owner.is_empty() {
            fatal!(Logger, "cannot upsert account with no owner");
        }
        if let Some(store) = &self.store {
            store.borrow_mut().upsert_account(account.clone());
        }
        self.accounts.insert(account.owner.clone(), Some(account));
    }

    fn process_send_operation(&mut self, op: &crate::operation::SendOperation) {
        let source = self.get_account(&op.signer).expect("validated before processing");
        let target = self.get_account(&op.to).unwrap_or_else(|| Account::new(op.to.clone(), 0));
        let new_source = Account {
            owner: op.signer.clone(),
            sequence: op.sequence,
            balance: source.balance - op.amount - op.fee,
            storage: source.storage,
        };
        let new_target = Account {
            owner: op.to.clone(),
            sequence: target.sequence,
            balance: target.balance + op.amount,
            storage: target.storage,
        };
        self.upsert_account(new_source);
        self.upsert_account(new_target);
    }

    /// Bumps the signer's sequence and debits its fee. Called after every
    /// successfully processed operation other than `Send`, which folds
    /// both into its own balance arithmetic.
    fn increment_sequence_and_debit_fee(&mut self, op: &Operation) {
        let account = self
            .get_account(op.signer())
            .unwrap_or_else(|| fatal!(Logger, "sequence bump for unknown account {}", op.signer()));
        if account.sequence + 1 != op.sequence() {
            fatal!(Logger, "sequence numbers were not validated before processing");
        }
        let mut updated = account;
        updated.sequence = op.sequence();
        updated.balance -= op.fee();
        self.upsert_account(updated);
    }

    // ---- documents ----

    pub fn get_document(&mut self, id: u64) -> Option<Document> {
        if let Some(d) = self.documents.get(&id) {
            return d.clone();
        }
        if let Some(parent) = self.read_only.clone() {
            return parent.borrow_mut().get_document(id);
        }
        if let Some(store) = self.store.clone() {
            let answer = store.borrow().get_document(id);
            self.documents.insert(id, answer.clone());
            return answer;
        }
        None
    }

    fn doc_owner(&mut self, id: u64) -> Option<String> {
        self.get_document(id).and_then(|d| d.owner().map(str::to_string))
    }

    fn insert_document(&mut self, document: Document) {
        if let Some(store) = &self.store {
            store.borrow_mut().insert_document(document.clone());
        }
        self.documents.insert(document.id, Some(document));
    }

    fn update_document(&mut self, document: Document) {
        if let Some(store) = &self.store {
            store.borrow_mut().update_document(document.clone());
        }
        self.documents.insert(document.id, Some(document));
    }

    fn delete_document(&mut self, id: u64) {
        if let Some(store) = &self.store {
            store.borrow_mut().delete_document(id);
        }
        self.documents.insert(id, None);
    }

    // ---- buckets ----

    pub fn get_bucket(&mut self, name: &str) -> Option<Bucket> {
        if let Some(b) = self.buckets.get(name) {
            return b.clone();
        }
        if let Some(parent) = self.read_only.clone() {
            let inherited = parent.borrow_mut().get_bucket(name)?;
            self.buckets.insert(name.to_string(), Some(inherited.clone()));
            return Some(inherited);
        }
        if let Some(store) = self.store.clone() {
            let answer = store.borrow().get_bucket(name);
            self.buckets.insert(name.to_string(), answer.clone());
            return answer;
        }
        None
    }

    fn bucket_owner(&mut self, name: &str) -> Option<String> {
        self.get_bucket(name).map(|b| b.owner)
    }

    fn insert_bucket(&mut self, bucket: Bucket) {
        if !bucket.is_valid_new_bucket() {
            fatal!(Logger, "cannot insert invalid new bucket {}", bucket.name);
        }
        if let Some(store) = &self.store {
            store.borrow_mut().insert_bucket(bucket.clone());
        }
        self.buckets.insert(bucket.name.clone(), Some(bucket));
    }

    fn set_magnet(&mut self, name: &str, magnet: &str) {
        if !is_valid_magnet(magnet) {
            fatal!(Logger, "bad magnet in set_magnet: {}", magnet);
        }
        let mut bucket = self.get_bucket(name).unwrap_or_else(|| fatal!(Logger, "set_magnet on unknown bucket {}", name));
        bucket.magnet = magnet.to_string();
        if let Some(store) = &self.store {
            store.borrow_mut().update_bucket(bucket.clone());
        }
        self.buckets.insert(name.to_string(), Some(bucket));
    }

    fn delete_bucket(&mut self, name: &str) {
        let bucket = self
            .get_bucket(name)
            .unwrap_or_else(|| fatal!(Logger, "cannot delete nonexistent bucket: {}", name));
        for p in bucket.providers.clone() {
            self.deallocate(name, p.id);
        }
        if let Some(store) = &self.store {
            store.borrow_mut().delete_bucket(name);
        }
        self.buckets.insert(name.to_string(), None);
    }

    // ---- providers ----

    pub fn get_provider(&mut self, id: u64) -> Option<Provider> {
        if let Some(p) = self.providers.get(&id) {
            return p.clone();
        }
        if let Some(parent) = self.read_only.clone() {
            let inherited = parent.borrow_mut().get_provider(id)?;
            self.providers.insert(id, Some(inherited.clone()));
            return Some(inherited);
        }
        if let Some(store) = self.store.clone() {
            let answer = store.borrow().get_provider(id);
            self.providers.insert(id, answer.clone());
            return answer;
        }
        None
    }

    fn provider_owner(&mut self, id: u64) -> Option<String> {
        self.get_provider(id).map(|p| p.owner)
    }

    fn insert_provider(&mut self, provider: Provider) {
        if !provider.is_valid_new_provider() {
            fatal!(Logger, "cannot insert invalid new provider {}", provider.id);
        }
        if let Some(store) = &self.store {
            store.borrow_mut().insert_provider(provider.clone());
        }
        self.providers.insert(provider.id, Some(provider));
    }

    fn delete_provider(&mut self, id: u64) {
        let provider = self
            .get_provider(id)
            .unwrap_or_else(|| fatal!(Logger, "cannot delete nonexistent provider: {}", id));
        for b in provider.buckets.clone() {
            self.deallocate(&b.name, id);
        }
        if let Some(store) = &self.store {
            store.borrow_mut().delete_provider(id);
        }
        self.providers.insert(id, None);
    }

    // ---- allocation ----

    fn allocate(&mut self, bucket_name: &str, provider_id: u64) {
        let mut bucket = self.get_bucket(bucket_name).unwrap_or_else(|| fatal!(Logger, "invalid allocation: no bucket"));
        let mut provider = self.get_provider(provider_id).unwrap_or_else(|| fatal!(Logger, "invalid allocation: no provider"));
        if bucket.size > provider.available {
            fatal!(Logger, "invalid allocation: not enough space");
        }
        bucket.providers.push(ProviderRef { id: provider_id });
        provider.buckets.push(BucketRef { name: bucket_name.to_string() });
        provider.available -= bucket.size;

        if let Some(store) = &self.store {
            store.borrow_mut().update_bucket(bucket.clone());
            store.borrow_mut().update_provider(provider.clone());
        }
        self.buckets.insert(bucket_name.to_string(), Some(bucket));
        self.providers.insert(provider_id, Some(provider));
    }

    fn deallocate(&mut self, bucket_name: &str, provider_id: u64) {
        let mut bucket = self.get_bucket(bucket_name).unwrap_or_else(|| fatal!(Logger, "invalid deallocation: no bucket"));
        let mut provider = self.get_provider(provider_id).unwrap_or_else(|| fatal!(Logger, "invalid deallocation: no provider"));
        if !bucket.has_provider(provider_id) || !provider.has_bucket(bucket_name) {
            fatal!(Logger, "invalid deallocation: not allocated");
        }
        bucket.remove_provider(provider_id);
        provider.remove_bucket(bucket_name);
        provider.available += bucket.size;

        if let Some(store) = &self.store {
            store.borrow_mut().update_bucket(bucket.clone());
            store.borrow_mut().update_provider(provider.clone());
        }
        self.buckets.insert(bucket_name.to_string(), Some(bucket));
        self.providers.insert(provider_id, Some(provider));
    }

    // ---- operation validation / processing ----

    /// Checks `operation` against currently cached state, beyond the
    /// structural checks `SignedOperation::verify` already covers.
    pub fn validate(&mut self, operation: &Operation) -> LedgerResult<()> {
        let account = self
            .get_account(operation.signer())
            .ok_or_else(|| LedgerError::UnknownAccount(operation.signer().to_string()))?;
        if account.sequence + 1 != operation.sequence() {
            return Err(LedgerError::SequenceMismatch {
                account: account.sequence,
                op: operation.sequence(),
            });
        }
        if account.balance < operation.fee() {
            return Err(LedgerError::InsufficientBalance {
                have: account.balance,
                need: operation.fee(),
            });
        }

        match operation {
            Operation::Send(op) => account.validate_send_operation(op.amount, op.fee),

            Operation::CreateDocument(_) => Ok(()),

            Operation::UpdateDocument(op) => self.check_document_owner(op.id, &op.signer),
            Operation::DeleteDocument(op) => self.check_document_owner(op.id, &op.signer),

            Operation::CreateBucket(op) => {
                if self.get_bucket(&op.name).is_some() {
                    return Err(LedgerError::BucketAlreadyExists(op.name.clone()));
                }
                if !account.can_add_storage(op.size) {
                    return Err(LedgerError::InsufficientBalance {
                        have: account.balance,
                        need: (account.storage as u64 + op.size as u64) * crate::account::COST_PER_MEGABYTE_MONTH,
                    });
                }
                Ok(())
            }

            Operation::UpdateBucket(op) => {
                let owner = self.bucket_owner(&op.name).ok_or_else(|| LedgerError::UnknownBucket(op.name.clone()))?;
                if owner != op.signer {
                    return Err(LedgerError::NotBucketOwner(op.name.clone(), op.signer.clone()));
                }
                Ok(())
            }

            Operation::DeleteBucket(op) => {
                let owner = self.bucket_owner(&op.name).ok_or_else(|| LedgerError::UnknownBucket(op.name.clone()))?;
                if owner != op.signer {
                    return Err(LedgerError::NotBucketOwner(op.name.clone(), op.signer.clone()));
                }
                Ok(())
            }

            Operation::CreateProvider(_) => Ok(()),

            Operation::DeleteProvider(op) => {
                let owner = self.provider_owner(op.id).ok_or(LedgerError::UnknownProvider(op.id))?;
                if owner != op.signer {
                    return Err(LedgerError::NotProviderOwner(op.id, op.signer.clone()));
                }
                Ok(())
            }

            Operation::Allocate(op) => self.validate_allocation(&op.signer, &op.bucket_name, op.provider_id, false),
            Operation::Deallocate(op) => self.validate_allocation(&op.signer, &op.bucket_name, op.provider_id, true),
        }
    }

    fn check_document_owner(&mut self, id: u64, signer: &str) -> LedgerResult<()> {
        let owner = self.doc_owner(id).ok_or(LedgerError::UnknownDocument(id))?;
        if owner != signer {
            return Err(LedgerError::NotDocumentOwner(id, signer.to_string()));
        }
        Ok(())
    }

    fn validate_allocation(&mut self, signer: &str, bucket_name: &str, provider_id: u64, deallocating: bool) -> LedgerResult<()> {
        let provider = self.get_provider(provider_id).ok_or(LedgerError::UnknownProvider(provider_id))?;
        let bucket = self.get_bucket(bucket_name).ok_or_else(|| LedgerError::UnknownBucket(bucket_name.to_string()))?;
        if provider.owner != signer && bucket.owner != signer {
            return Err(LedgerError::NotAllocationAuthorized {
                bucket: bucket_name.to_string(),
                provider: provider_id,
                signer: signer.to_string(),
            });
        }
        let already_allocated = provider.has_bucket(bucket_name) || bucket.has_provider(provider_id);
        if deallocating {
            if !already_allocated {
                return Err(LedgerError::NoAllocation {
                    bucket: bucket_name.to_string(),
                    provider: provider_id,
                });
            }
        } else {
            if already_allocated {
                return Err(LedgerError::AlreadyAllocated {
                    bucket: bucket_name.to_string(),
                    provider: provider_id,
                });
            }
            if provider.available < bucket.size {
                return Err(LedgerError::InsufficientCapacity(provider_id));
            }
        }
        Ok(())
    }

    /// Validates, then applies `operation`'s effect. Callers must have
    /// validated via `SignedOperation::verify` first.
    pub fn process(&mut self, operation: &Operation) -> LedgerResult<()> {
        self.validate(operation)?;

        match operation {
            Operation::Send(op) => {
                self.process_send_operation(op);
            }

            Operation::CreateDocument(op) => {
                self.increment_sequence_and_debit_fee(operation);
                let doc = Document::from_operation(self.next_document_id, &op.signer, &op.data);
                self.insert_document(doc);
                self.next_document_id += 1;
            }

            Operation::UpdateDocument(op) => {
                self.increment_sequence_and_debit_fee(operation);
                let mut doc = self.get_document(op.id).expect("validated above");
                doc.data.update_with(&op.data);
                self.update_document(doc);
            }

            Operation::DeleteDocument(op) => {
                self.increment_sequence_and_debit_fee(operation);
                self.delete_document(op.id);
            }

            Operation::CreateBucket(op) => {
                self.increment_sequence_and_debit_fee(operation);
                let mut account = self.get_account(&op.signer).expect("validated above");
                account.storage += op.size;
                self.upsert_account(account);
                self.insert_bucket(Bucket {
                    name: op.name.clone(),
                    owner: op.signer.clone(),
                    size: op.size,
                    magnet: String::new(),
                    providers: vec![],
                });
            }

            Operation::UpdateBucket(op) => {
                self.increment_sequence_and_debit_fee(operation);
                self.set_magnet(&op.name, &op.magnet);
            }

            Operation::DeleteBucket(op) => {
                self.increment_sequence_and_debit_fee(operation);
                let mut account = self.get_account(&op.signer).expect("validated above");
                let bucket = self.get_bucket(&op.name).expect("validated above");
                if account.storage < bucket.size {
                    return Err(LedgerError::MalformedOperation("account storage underflow".to_string()));
                }
                account.storage -= bucket.size;
                self.upsert_account(account);
                self.delete_bucket(&op.name);
            }

            Operation::CreateProvider(op) => {
                self.increment_sequence_and_debit_fee(operation);
                self.insert_provider(Provider {
                    id: self.next_provider_id,
                    owner: op.signer.clone(),
                    capacity: op.capacity,
                    available: op.capacity,
                    buckets: vec![],
                });
                self.next_provider_id += 1;
            }

            Operation::DeleteProvider(op) => {
                self.increment_sequence_and_debit_fee(operation);
                self.delete_provider(op.id);
            }

            Operation::Allocate(op) => {
                self.increment_sequence_and_debit_fee(operation);
                self.allocate(&op.bucket_name, op.provider_id);
            }

            Operation::Deallocate(op) => {
                self.increment_sequence_and_debit_fee(operation);
                self.deallocate(&op.bucket_name, op.provider_id);
            }
        }
        Ok(())
    }

    // ---- chunk / block processing ----

    /// Returns an error rather than panicking on the first failure — on
    /// error, the cache is left with only some of the chunk's operations
    /// applied and should be discarded, matching the reference
    /// implementation's `ProcessChunk`.
    pub fn process_chunk(&mut self, chunk: &LedgerChunk) -> LedgerResult<()> {
        if chunk.operations.len() > MAX_CHUNK_SIZE {
            return Err(LedgerError::ChunkTooLarge(chunk.operations.len()));
        }
        for op in &chunk.operations {
            op.verify().map_err(|_| LedgerError::BadSignature(op.operation.signer().to_string()))?;
            self.process(&op.operation)?;
        }
        for (owner, expected) in &chunk.accounts {
            let actual = self.get_account(owner);
            if actual.as_ref() != Some(expected) {
                return Err(LedgerError::AccountStateMismatch(owner.clone()));
            }
        }
        if self.next_document_id != chunk.next_document_id || self.next_provider_id != chunk.next_provider_id {
            return Err(LedgerError::IdCounterMismatch);
        }
        Ok(())
    }

    /// True iff `process_chunk` would succeed, without mutating `self`.
    pub fn validate_chunk(self_rc: &Rc<RefCell<Cache>>, chunk: &LedgerChunk) -> LedgerResult<()> {
        let mut speculative = Cache::cow_copy(self_rc);
        speculative.process_chunk(chunk)
    }

    /// Applies a finalized block's chunk, records the block, and commits
    /// the write-through transaction if one is attached. A database error
    /// or an unprocessable finalized chunk is an invariant violation: by
    /// the time a chunk externalizes, every honest node has already
    /// validated it speculatively.
    pub fn finalize_block(self_rc: &Rc<RefCell<Cache>>, block: PersistedBlock) {
        if block.quorum_slice.threshold == 0 {
            fatal!(Logger, "cannot finalize with a zero-threshold quorum slice");
        }
        if let Err(e) = Cache::validate_chunk(self_rc, &block.chunk) {
            fatal!(Logger, "could not validate a finalized chunk: {}", e);
        }
        let mut cache = self_rc.borrow_mut();
        if let Err(e) = cache.process_chunk(&block.chunk) {
            fatal!(Logger, "failure while processing a finalized chunk: {}", e);
        }
        cache.blocks.insert(block.slot, block.clone());
        if let Some(store) = cache.store.clone() {
            store.borrow_mut().insert_block(block);
            store.borrow_mut().commit();
        }
    }

    pub fn get_block(&self, slot: u64) -> Option<PersistedBlock> {
        if let Some(b) = self.blocks.get(&slot) {
            return Some(b.clone());
        }
        self.store.as_ref().and_then(|store| store.borrow().get_block(slot))
    }

    /// Returns an error if any account this cache knows about diverges
    /// from what `store` has on record. Run at startup after reloading a
    /// cache, to catch state corrupted outside the consensus path.
    pub fn check_against_store(&self, store: &dyn Store) -> LedgerResult<()> {
        for (owner, account) in &self.accounts {
            let stored = store.get_account(owner);
            if account.as_ref() != stored.as_ref() {
                return Err(LedgerError::ReplayMismatch(owner.clone()));
            }
        }
        for (name, bucket) in &self.buckets {
            let stored = store.get_bucket(name);
            if bucket.as_ref() != stored.as_ref() {
                return Err(LedgerError::ReplayMismatch(name.clone()));
            }
        }
        for (id, provider) in &self.providers {
            let stored = store.get_provider(*id);
            if provider.as_ref() != stored.as_ref() {
                return Err(LedgerError::ReplayMismatch(id.to_string()));
            }
        }
        Ok(())
    }
}

impl Default for Cache {
    fn default() -> Self {
        Cache::new()
    }
}
