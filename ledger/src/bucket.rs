//! Storage buckets and the providers hosting them. Grounded on
//! `data/bucket.go` and `data/provider.go`.

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

pub(crate) fn is_valid_bucket_name(name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    if name.starts_with('-') || name.ends_with('-') {
        return false;
    }
    name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// A magnet URI must start with `magnet:` and be otherwise well-formed.
pub fn is_valid_magnet(uri: &str) -> bool {
    uri.starts_with("magnet:") && uri.len() > "magnet:".len()
}

/// A provider's reservation of capacity against a bucket, as stored on
/// the bucket side of the (deliberately bidirectional) allocation link.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRef {
    pub id: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub name: String,
    pub owner: String,
    /// Megabytes.
    pub size: u32,
    pub magnet: String,
    pub providers: Vec<ProviderRef>,
}

impl Bucket {
    pub fn is_valid_new_bucket(&self) -> bool {
        is_valid_bucket_name(&self.name)
            && !self.owner.is_empty()
            && self.size > 0
            && self.providers.is_empty()
    }

    pub fn has_provider(&self, id: u64) -> bool {
        self.providers.iter().any(|p| p.id == id)
    }

    pub fn remove_provider(&mut self, id: u64) {
        self.providers.retain(|p| p.id != id);
    }

    pub fn set_magnet(&mut self, magnet: &str) -> LedgerResult<()> {
        if !is_valid_magnet(magnet) {
            return Err(LedgerError::InvalidMagnet(magnet.to_string()));
        }
        self.magnet = magnet.to_string();
        Ok(())
    }

    /// A copy of this bucket with all provider data stripped down to bare
    /// IDs. Fields are cloned up front (not aliased) so there is no
    /// ambiguity about whether the original bucket is mutated.
    pub fn stub_providers(&self) -> Bucket {
        let mut copy = self.clone();
        copy.providers = self
            .providers
            .iter()
            .map(|p| ProviderRef { id: p.id })
            .collect();
        copy
    }

    pub fn check_equal(&self, other: &Bucket) -> LedgerResult<()> {
        if self.name != other.name || self.owner != other.owner || self.size != other.size {
            return Err(LedgerError::AccountStateMismatch(self.name.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_names_reject_leading_trailing_hyphen() {
        assert!(is_valid_bucket_name("my-bucket"));
        assert!(!is_valid_bucket_name("-my-bucket"));
        assert!(!is_valid_bucket_name("my-bucket-"));
        assert!(!is_valid_bucket_name(""));
    }

    #[test]
    fn magnet_uris_must_have_the_scheme() {
        assert!(is_valid_magnet("magnet:?xt=urn:btih:abc"));
        assert!(!is_valid_magnet("http://example.com"));
        assert!(!is_valid_magnet("magnet:"));
    }

    #[test]
    fn new_bucket_must_have_no_providers_yet() {
        let mut bucket = Bucket {
            name: "b1".into(),
            owner: "alice".into(),
            size: 10,
            magnet: String::new(),
            providers: vec![],
        };
        assert!(bucket.is_valid_new_bucket());
        bucket.providers.push(ProviderRef { id: 1 });
        assert!(!bucket.is_valid_new_bucket());
    }

    #[test]
    fn stub_providers_keeps_only_ids() {
        let bucket = Bucket {
            name: "b1".into(),
            owner: "alice".into(),
            size: 10,
            magnet: "magnet:?xt=x".into(),
            providers: vec![ProviderRef { id: 7 }],
        };
        let stub = bucket.stub_providers();
        assert_eq!(stub.providers, vec![ProviderRef { id: 7 }]);
        assert_eq!(stub.name, bucket.name);
    }
}
