//! The ten operation kinds an account can submit, and the common
//! signer/sequence/fee fields every one of them carries. Grounded on
//! `data/operation.go` and the per-kind `data/*_operation.go` files.

use serde::{Deserialize, Serialize};

use crate::json_object::JsonObject;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SendOperation {
    pub signer: String,
    pub sequence: u32,
    pub fee: u64,
    pub to: String,
    pub amount: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreateDocumentOperation {
    pub signer: String,
    pub sequence: u32,
    pub fee: u64,
    pub data: JsonObject,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpdateDocumentOperation {
    pub signer: String,
    pub sequence: u32,
    pub fee: u64,
    pub id: u64,
    pub data: JsonObject,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeleteDocumentOperation {
    pub signer: String,
    pub sequence: u32,
    pub fee: u64,
    pub id: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreateBucketOperation {
    pub signer: String,
    pub sequence: u32,
    pub fee: u64,
    pub name: String,
    pub size: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpdateBucketOperation {
    pub signer: String,
    pub sequence: u32,
    pub fee: u64,
    pub name: String,
    pub magnet: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeleteBucketOperation {
    pub signer: String,
    pub sequence: u32,
    pub fee: u64,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreateProviderOperation {
    pub signer: String,
    pub sequence: u32,
    pub fee: u64,
    pub capacity: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeleteProviderOperation {
    pub signer: String,
    pub sequence: u32,
    pub fee: u64,
    pub id: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AllocateOperation {
    pub signer: String,
    pub sequence: u32,
    pub fee: u64,
    pub bucket_name: String,
    pub provider_id: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeallocateOperation {
    pub signer: String,
    pub sequence: u32,
    pub fee: u64,
    pub bucket_name: String,
    pub provider_id: u64,
}

/// A single ledger mutation, tagged on the wire by its `OperationType`
/// string (`Send`, `CreateDocument`, ...). `CreateProviderOperation` does
/// not carry an id: the cache assigns one from `next_provider_id`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "operation")]
pub enum Operation {
    Send(SendOperation),
    CreateDocument(CreateDocumentOperation),
    UpdateDocument(UpdateDocumentOperation),
    DeleteDocument(DeleteDocumentOperation),
    CreateBucket(CreateBucketOperation),
    UpdateBucket(UpdateBucketOperation),
    DeleteBucket(DeleteBucketOperation),
    CreateProvider(CreateProviderOperation),
    DeleteProvider(DeleteProviderOperation),
    Allocate(AllocateOperation),
    Deallocate(DeallocateOperation),
}

impl Operation {
    pub fn operation_type(&self) -> &'static str {
        match self {
            Operation::Send(_) => "Send",
            Operation::CreateDocument(_) => "CreateDocument",
            Operation::UpdateDocument(_) => "UpdateDocument",
            Operation::DeleteDocument(_) => "DeleteDocument",
            Operation::CreateBucket(_) => "CreateBucket",
            Operation::UpdateBucket(_) => "UpdateBucket",
            Operation::DeleteBucket(_) => "DeleteBucket",
            Operation::CreateProvider(_) => "CreateProvider",
            Operation::DeleteProvider(_) => "DeleteProvider",
            Operation::Allocate(_) => "Allocate",
            Operation::Deallocate(_) => "Deallocate",
        }
    }

    pub fn signer(&self) -> &str {
        match self {
            Operation::Send(o) => &o.signer,
            Operation::CreateDocument(o) => &o.signer,
            Operation::UpdateDocument(o) => &o.signer,
            Operation::DeleteDocument(o) => &o.signer,
            Operation::CreateBucket(o) => &o.signer,
            Operation::UpdateBucket(o) => &o.signer,
            Operation::DeleteBucket(o) => &o.signer,
            Operation::CreateProvider(o) => &o.signer,
            Operation::DeleteProvider(o) => &o.signer,
            Operation::Allocate(o) => &o.signer,
            Operation::Deallocate(o) => &o.signer,
        }
    }

    pub fn sequence(&self) -> u32 {
        match self {
            Operation::Send(o) => o.sequence,
            Operation::CreateDocument(o) => o.sequence,
            Operation::UpdateDocument(o) => o.sequence,
            Operation::DeleteDocument(o) => o.sequence,
            Operation::CreateBucket(o) => o.sequence,
            Operation::UpdateBucket(o) => o.sequence,
            Operation::DeleteBucket(o) => o.sequence,
            Operation::CreateProvider(o) => o.sequence,
            Operation::DeleteProvider(o) => o.sequence,
            Operation::Allocate(o) => o.sequence,
            Operation::Deallocate(o) => o.sequence,
        }
    }

    pub fn fee(&self) -> u64 {
        match self {
            Operation::Send(o) => o.fee,
            Operation::CreateDocument(o) => o.fee,
            Operation::UpdateDocument(o) => o.fee,
            Operation::DeleteDocument(o) => o.fee,
            Operation::CreateBucket(o) => o.fee,
            Operation::UpdateBucket(o) => o.fee,
            Operation::DeleteBucket(o) => o.fee,
            Operation::CreateProvider(o) => o.fee,
            Operation::DeleteProvider(o) => o.fee,
            Operation::Allocate(o) => o.fee,
            Operation::Deallocate(o) => o.fee,
        }
    }

    /// Internal well-formedness checks that don't need the ledger: field
    /// shape, not whether the signer can actually afford this.
    pub fn verify(&self) -> bool {
        match self {
            Operation::CreateBucket(o) => crate::bucket::is_valid_bucket_name(&o.name) && o.size > 0,
            Operation::UpdateBucket(o) => crate::bucket::is_valid_magnet(&o.magnet) && !o.name.is_empty(),
            Operation::CreateProvider(o) => o.capacity > 0,
            Operation::Allocate(o) => !o.bucket_name.is_empty(),
            Operation::Deallocate(o) => !o.bucket_name.is_empty(),
            _ => true,
        }
    }

    /// The bytes an `Ed25519` signature covers: the operation's type tag
    /// followed by the canonical JSON encoding of its own fields only
    /// (never the `{type, operation, signature}` wire envelope). Relies on
    /// `serde_json`'s default sorted-key map serialization for canonical
    /// ordering.
    pub fn signing_payload(&self) -> Vec<u8> {
        let inner = match self {
            Operation::Send(o) => serde_json::to_vec(o),
            Operation::CreateDocument(o) => serde_json::to_vec(o),
            Operation::UpdateDocument(o) => serde_json::to_vec(o),
            Operation::DeleteDocument(o) => serde_json::to_vec(o),
            Operation::CreateBucket(o) => serde_json::to_vec(o),
            Operation::UpdateBucket(o) => serde_json::to_vec(o),
            Operation::DeleteBucket(o) => serde_json::to_vec(o),
            Operation::CreateProvider(o) => serde_json::to_vec(o),
            Operation::DeleteProvider(o) => serde_json::to_vec(o),
            Operation::Allocate(o) => serde_json::to_vec(o),
            Operation::Deallocate(o) => serde_json::to_vec(o),
        }
        .expect("operation fields always serialize to JSON");
        let mut payload = self.operation_type().as_bytes().to_vec();
        payload.extend(inner);
        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signing_payload_is_type_prefixed_canonical_json() {
        let op = Operation::Send(SendOperation {
            signer: "alice".into(),
            sequence: 1,
            fee: 0,
            to: "bob".into(),
            amount: 100,
        });
        let payload = op.signing_payload();
        assert!(payload.starts_with(b"Send"));
        let json_part = &payload[b"Send".len()..];
        let decoded: serde_json::Value = serde_json::from_slice(json_part).unwrap();
        assert_eq!(decoded["to"], "bob");
    }

    #[test]
    fn wire_shape_flattens_type_and_operation() {
        let op = Operation::Send(SendOperation {
            signer: "alice".into(),
            sequence: 1,
            fee: 0,
            to: "bob".into(),
            amount: 100,
        });
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["type"], "Send");
        assert_eq!(json["operation"]["to"], "bob");
    }

    #[test]
    fn create_bucket_rejects_zero_size() {
        let op = Operation::CreateBucket(CreateBucketOperation {
            signer: "alice".into(),
            sequence: 1,
            fee: 0,
            name: "b1".into(),
            size: 0,
        });
        assert!(!op.verify());
    }
}
