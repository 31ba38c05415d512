//! Client queries, answered with a `DataMessage`. Only one field of a
//! `QueryMessage` should be set at a time. Grounded on
//! `data/query_message.go`, `data/document_query.go`, `data/bucket_query.go`
//! and `data/provider_query.go`.

use serde::{Deserialize, Serialize};

use fbc_ledger::JsonObject;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonObject>,
    #[serde(default)]
    pub limit: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketQuery {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub provider: u64,
    #[serde(default)]
    pub limit: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderQuery {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub ids: Vec<u64>,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub limit: usize,
    #[serde(default)]
    pub available: u32,
    #[serde(default)]
    pub bucket: String,
}

/// Exactly one field should be populated per query.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents: Option<DocumentQuery>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buckets: Option<BucketQuery>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub providers: Option<ProviderQuery>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl QueryMessage {
    pub fn for_account(owner: impl Into<String>) -> Self {
        QueryMessage { account: Some(owner.into()), ..Default::default() }
    }

    pub fn for_block(slot: u64) -> Self {
        QueryMessage { block: Some(slot), ..Default::default() }
    }

    pub fn for_signature(signature: impl Into<String>) -> Self {
        QueryMessage { signature: Some(signature.into()), ..Default::default() }
    }
}
