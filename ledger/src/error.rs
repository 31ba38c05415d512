//! Errors produced while validating or applying ledger operations.

use thiserror::Error;

/// Why an operation, chunk, or block was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// account {0} does not exist
    #[error("account {0} does not exist")]
    UnknownAccount(String),
    /// sequence number mismatch: account has {account}, operation has {op}
    #[error("sequence number mismatch: account has {account}, operation has {op}")]
    SequenceMismatch { account: u32, op: u32 },
    /// insufficient balance: have {have}, need {need}
    #[error("insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: u64, need: u64 },
    /// signature verification failed for operation from {0}
    #[error("signature verification failed for operation from {0}")]
    BadSignature(String),
    /// bucket {0} is not a valid new bucket
    #[error("bucket {0} is not a valid new bucket")]
    InvalidNewBucket(String),
    /// bucket {0} does not exist
    #[error("bucket {0} does not exist")]
    UnknownBucket(String),
    /// bucket {0} already exists
    #[error("bucket {0} already exists")]
    BucketAlreadyExists(String),
    /// invalid magnet uri: {0}
    #[error("invalid magnet uri: {0}")]
    InvalidMagnet(String),
    /// provider {0} is not a valid new provider
    #[error("provider {0} is not a valid new provider")]
    InvalidNewProvider(u64),
    /// provider {0} does not exist
    #[error("provider {0} does not exist")]
    UnknownProvider(u64),
    /// document {0} does not exist
    #[error("document {0} does not exist")]
    UnknownDocument(u64),
    /// document {0} is not owned by {1}
    #[error("document {0} is not owned by {1}")]
    NotDocumentOwner(u64, String),
    /// bucket {0} is not owned by {1}
    #[error("bucket {0} is not owned by {1}")]
    NotBucketOwner(String, String),
    /// provider {0} is not owned by {1}
    #[error("provider {0} is not owned by {1}")]
    NotProviderOwner(u64, String),
    /// {signer} is not authorized to allocate or deallocate bucket {bucket} <-> provider {provider}
    #[error("{signer} is not authorized to allocate or deallocate bucket {bucket} <-> provider {provider}")]
    NotAllocationAuthorized { bucket: String, provider: u64, signer: String },
    /// bucket {bucket} <-> provider {provider} is already allocated
    #[error("bucket {bucket} <-> provider {provider} is already allocated")]
    AlreadyAllocated { bucket: String, provider: u64 },
    /// bucket {bucket} has no capacity reserved on provider {provider}
    #[error("bucket {bucket} has no capacity reserved on provider {provider}")]
    NoAllocation { bucket: String, provider: u64 },
    /// provider {0} does not have enough available capacity
    #[error("provider {0} does not have enough available capacity")]
    InsufficientCapacity(u64),
    /// chunk exceeds the maximum of {0} operations
    #[error("chunk exceeds the maximum of {0} operations")]
    ChunkTooLarge(usize),
    /// chunk recomputed hash does not match its claimed key
    #[error("chunk recomputed hash does not match its claimed key")]
    ChunkHashMismatch,
    /// post-chunk account state for {0} does not match the chunk's claim
    #[error("post-chunk account state for {0} does not match the chunk's claim")]
    AccountStateMismatch(String),
    /// next document/provider id counter does not match the chunk's claim
    #[error("next document/provider id counter does not match the chunk's claim")]
    IdCounterMismatch,
    /// replaying persisted blocks produced a different state than storage recorded
    #[error("replaying persisted blocks produced a different state than storage recorded")]
    ReplayMismatch(String),
    /// operation is malformed: {0}
    #[error("operation is malformed: {0}")]
    MalformedOperation(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
