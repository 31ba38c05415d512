//! Error type for the ballot/nomination state machines.

use thiserror::Error;

/// Errors produced by the federated-voting state machines.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScpError {
    /// invalid ballot: {0}
    #[error("invalid ballot: {0}")]
    InvalidBallot(String),
    /// no quorum slice known for this node
    #[error("no quorum slice known for this node")]
    QuorumNotFound,
    /// invalid slot state: {0}
    #[error("invalid slot state: {0}")]
    InvalidSlotState(String),
    /// prepare invariant violated: {0}
    #[error("prepare invariant violated: {0}")]
    PrepareInvariantViolation(String),
    /// commit invariant violated: {0}
    #[error("commit invariant violated: {0}")]
    CommitInvariantViolation(String),
    /// externalize invariant violated: {0}
    #[error("externalize invariant violated: {0}")]
    ExternalizeInvariantViolation(String),
    /// serialization error: {0}
    #[error("serialization error: {0}")]
    SerializationError(String),
    /// unexpected none: {0}
    #[error("unexpected none: {0}")]
    UnexpectedNone(String),
    /// arithmetic overflow: {0}
    #[error("arithmetic overflow: {0}")]
    ArithmeticOverflow(String),
    /// message failed validation: {0}
    #[error("message failed validation: {0}")]
    MessageValidation(String),
}

pub type ScpResult<T> = Result<T, ScpError>;
