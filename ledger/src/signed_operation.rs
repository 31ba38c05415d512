//! An operation plus the Ed25519 signature authorizing it. Grounded on
//! `data/signed_operation.go`; the priority ordering used by the pending
//! pool and chunk formation is `HighestFeeFirst` from `data/operation_queue.go`.

use std::cmp::Ordering;

use fbc_crypto::{verify_signature, PublicKey};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};
use crate::operation::Operation;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignedOperation {
    #[serde(flatten)]
    pub operation: Operation,
    pub signature: String,
}

impl SignedOperation {
    pub fn new(operation: Operation, signer: &fbc_crypto::KeyPair) -> Self {
        let signature = signer.sign(&operation.signing_payload());
        SignedOperation { operation, signature }
    }

    /// Internal well-formedness plus signature verification — everything
    /// that can be checked without consulting the ledger.
    pub fn verify(&self) -> LedgerResult<()> {
        if !self.operation.verify() {
            return Err(LedgerError::MalformedOperation(self.operation.operation_type().to_string()));
        }
        let signer = PublicKey::parse(self.operation.signer())
            .map_err(|_| LedgerError::BadSignature(self.operation.signer().to_string()))?;
        verify_signature(&signer, &self.operation.signing_payload(), &self.signature)
            .map_err(|_| LedgerError::BadSignature(self.operation.signer().to_string()))
    }
}

/// `HighestFeeFirst`: orders by fee descending, then by signature bytes
/// ascending to break ties deterministically across nodes.
impl Ord for SignedOperation {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .operation
            .fee()
            .cmp(&self.operation.fee())
            .then_with(|| self.signature.cmp(&other.signature))
    }
}

impl PartialOrd for SignedOperation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Eq for SignedOperation {}
