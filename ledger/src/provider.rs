//! Storage providers: nodes offering bucket capacity. Grounded on
//! `data/provider.go`.

use serde::{Deserialize, Serialize};

use crate::bucket::ProviderRef;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketRef {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub id: u64,
    pub owner: String,
    pub capacity: u32,
    pub available: u32,
    pub buckets: Vec<BucketRef>,
}

impl Provider {
    pub fn is_valid_new_provider(&self) -> bool {
        !self.owner.is_empty()
            && self.capacity > 0
            && self.id > 0
            && self.capacity == self.available
            && self.buckets.is_empty()
    }

    pub fn has_bucket(&self, name: &str) -> bool {
        self.buckets.iter().any(|b| b.name == name)
    }

    /// Removes the bucket reference. Does not restore `available` capacity
    /// — matching the reference implementation, that bookkeeping is the
    /// caller's responsibility (see `Cache::deallocate`).
    pub fn remove_bucket(&mut self, name: &str) {
        self.buckets.retain(|b| b.name != name);
    }

    pub fn stub_buckets(&self) -> Provider {
        let mut copy = self.clone();
        copy.buckets = self
            .buckets
            .iter()
            .map(|b| BucketRef { name: b.name.clone() })
            .collect();
        copy
    }

    pub fn to_bucket_provider_ref(&self) -> ProviderRef {
        ProviderRef { id: self.id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_provider() -> Provider {
        Provider {
            id: 1,
            owner: "alice".into(),
            capacity: 100,
            available: 100,
            buckets: vec![],
        }
    }

    #[test]
    fn new_provider_requires_full_available_capacity() {
        let provider = fresh_provider();
        assert!(provider.is_valid_new_provider());

        let mut short = provider.clone();
        short.available = 50;
        assert!(!short.is_valid_new_provider());
    }

    #[test]
    fn remove_bucket_does_not_touch_available() {
        let mut provider = fresh_provider();
        provider.available = 60;
        provider.buckets.push(BucketRef { name: "b1".into() });
        provider.remove_bucket("b1");
        assert!(!provider.has_bucket("b1"));
        assert_eq!(provider.available, 60);
    }
}
