//! Errors produced while decoding wire envelopes or routing messages.

use thiserror::Error;

use fbc_ledger::LedgerError;
use fbc_operation_queue::QueueError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NodeError {
    /// envelope does not have the form e:signer:signature:message
    #[error("envelope does not have the form e:signer:signature:message")]
    MalformedEnvelope,
    /// unrecognized envelope version {0}, expected "e"
    #[error("unrecognized envelope version {0}, expected \"e\"")]
    UnknownEnvelopeVersion(String),
    /// invalid signer public key: {0}
    #[error("invalid signer public key: {0}")]
    BadPublicKey(String),
    /// signature verification failed for sender {0}
    #[error("signature verification failed for sender {0}")]
    BadSignature(String),
    /// message body is not valid json: {0}
    #[error("message body is not valid json: {0}")]
    BadJson(String),
    /// expected a consensus message, got {0}
    #[error("expected a consensus message, got {0}")]
    NotConsensusMessage(&'static str),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Queue(#[from] QueueError),
}

pub type NodeResult<T> = Result<T, NodeError>;
