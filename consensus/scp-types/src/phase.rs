//! The three phases of the ballot protocol.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A slot's position in the ballot protocol. Phases only move forward:
/// `Prepare` -> `Confirm` -> `Externalize`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Phase {
    Prepare = 1,
    Confirm = 2,
    Externalize = 3,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Prepare => "Prepare",
            Phase::Confirm => "Confirm",
            Phase::Externalize => "Externalize",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_order_forward() {
        assert!(Phase::Prepare < Phase::Confirm);
        assert!(Phase::Confirm < Phase::Externalize);
    }
}
