//! The opaque value nodes reach consensus on.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A `SlotValue` is an opaque, already-combined candidate for a slot — in
/// this system, the hash of a ledger chunk. SCP itself never looks inside
/// it; it only compares values for equality and ordering.
#[derive(Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct SlotValue(pub String);

impl SlotValue {
    /// The empty value, used as a sentinel for "no value available".
    pub fn empty() -> Self {
        SlotValue(String::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SlotValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SlotValue {
    fn from(s: String) -> Self {
        SlotValue(s)
    }
}

impl From<&str> for SlotValue {
    fn from(s: &str) -> Self {
        SlotValue(s.to_string())
    }
}

/// Checks that `values` contains no duplicate entries.
pub fn assert_no_dupes(values: &[SlotValue]) -> bool {
    let mut seen = std::collections::HashSet::new();
    values.iter().all(|v| seen.insert(v.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_is_empty() {
        assert!(SlotValue::empty().is_empty());
        assert!(!SlotValue::from("x").is_empty());
    }

    #[test]
    fn no_dupes_detects_duplicates() {
        let a = SlotValue::from("a");
        let b = SlotValue::from("b");
        assert!(assert_no_dupes(&[a.clone(), b.clone()]));
        assert!(!assert_no_dupes(&[a.clone(), b, a]));
    }
}
