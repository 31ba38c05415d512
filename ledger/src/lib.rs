//! Deterministic ledger state: accounts, documents, storage buckets and
//! providers, the operations that mutate them, and the `Cache` that
//! applies those operations the same way on every honest node. Grounded
//! on the `data` package of the reference implementation.

pub mod account;
pub mod block;
pub mod bucket;
pub mod cache;
pub mod document;
pub mod error;
pub mod json_object;
pub mod ledger_chunk;
pub mod operation;
pub mod provider;
pub mod signed_operation;
pub mod store;

pub use account::Account;
pub use block::PersistedBlock;
pub use bucket::Bucket;
pub use cache::Cache;
pub use document::Document;
pub use error::{LedgerError, LedgerResult};
pub use json_object::JsonObject;
pub use ledger_chunk::{LedgerChunk, MAX_CHUNK_SIZE};
pub use operation::Operation;
pub use provider::Provider;
pub use signed_operation::SignedOperation;
pub use store::{MemoryStore, Store};
