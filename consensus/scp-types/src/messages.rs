//! Ballot-protocol message shapes: `Prepare`, `Confirm`, and `Externalize`,
//! plus the nomination message. Field names and the per-kind predicate
//! methods (`accept_as_prepared`, `vote_to_prepare`, ...) mirror
//! `consensus/ballot_message.go` in the reference implementation.

use serde::{Deserialize, Serialize};

use crate::phase::Phase;
use crate::quorum_slice::QuorumSlice;
use crate::range::{make_range, range_union};
use crate::slot_value::SlotValue;

/// "I accept ballot `(pn, px)` (and `(ppn, ppx)`) as prepared, and I am
/// voting for ballot `(bn, bx)`."
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrepareMessage {
    pub slot: u64,
    pub bn: u32,
    pub bx: SlotValue,
    pub pn: u32,
    pub px: SlotValue,
    pub ppn: u32,
    pub ppx: SlotValue,
    pub cn: u32,
    pub hn: u32,
    pub quorum_slice: QuorumSlice,
}

/// "I have confirmed value `x` as prepared, and I am voting to commit the
/// range `[cn, hn]`."
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfirmMessage {
    pub slot: u64,
    pub x: SlotValue,
    pub pn: u32,
    pub cn: u32,
    pub hn: u32,
    pub quorum_slice: QuorumSlice,
}

/// "I have confirmed that the slot externalized value `x` with commit
/// range `[cn, hn]`."
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExternalizeMessage {
    pub slot: u64,
    pub x: SlotValue,
    pub cn: u32,
    pub hn: u32,
    pub quorum_slice: QuorumSlice,
}

/// A ballot-protocol message in any of its three phases.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum BallotMessage {
    Prepare(PrepareMessage),
    Confirm(ConfirmMessage),
    Externalize(ExternalizeMessage),
}

impl BallotMessage {
    pub fn slot(&self) -> u64 {
        match self {
            BallotMessage::Prepare(m) => m.slot,
            BallotMessage::Confirm(m) => m.slot,
            BallotMessage::Externalize(m) => m.slot,
        }
    }

    pub fn phase(&self) -> Phase {
        match self {
            BallotMessage::Prepare(_) => Phase::Prepare,
            BallotMessage::Confirm(_) => Phase::Confirm,
            BallotMessage::Externalize(_) => Phase::Externalize,
        }
    }

    pub fn quorum_slice(&self) -> &QuorumSlice {
        match self {
            BallotMessage::Prepare(m) => &m.quorum_slice,
            BallotMessage::Confirm(m) => &m.quorum_slice,
            BallotMessage::Externalize(m) => &m.quorum_slice,
        }
    }

    /// The highest ballot counter the sender has voted on, used for
    /// staleness comparisons.
    pub fn ballot_number(&self) -> u32 {
        match self {
            BallotMessage::Prepare(m) => m.bn,
            BallotMessage::Confirm(m) => m.hn,
            BallotMessage::Externalize(m) => m.hn,
        }
    }

    /// True if the sender already accepts ballot `(n, x)` as prepared.
    pub fn accept_as_prepared(&self, n: u32, x: &SlotValue) -> bool {
        match self {
            BallotMessage::Prepare(m) => {
                (m.pn >= n && &m.px == x) || (m.ppn >= n && &m.ppx == x)
            }
            BallotMessage::Confirm(m) => &m.x == x,
            BallotMessage::Externalize(m) => &m.x == x,
        }
    }

    /// True if the sender is voting to prepare ballot `(n, x)`.
    pub fn vote_to_prepare(&self, n: u32, x: &SlotValue) -> bool {
        match self {
            BallotMessage::Prepare(m) => m.bx == *x && m.bn >= n,
            BallotMessage::Confirm(_) => false,
            BallotMessage::Externalize(_) => false,
        }
    }

    /// True if the sender already accepts ballot `(n, x)` as committed.
    pub fn accept_as_committed(&self, n: u32, x: &SlotValue) -> bool {
        match self {
            BallotMessage::Prepare(_) => false,
            BallotMessage::Confirm(m) => m.x == *x && m.cn != 0 && m.cn <= n && n <= m.hn,
            BallotMessage::Externalize(m) => m.x == *x && m.cn <= n,
        }
    }

    /// True if the sender is voting to commit ballot `(n, x)`.
    pub fn vote_to_commit(&self, n: u32, x: &SlotValue) -> bool {
        match self {
            BallotMessage::Prepare(m) => m.bx == *x && m.cn != 0 && m.cn <= n && n <= m.hn,
            BallotMessage::Confirm(m) => m.x == *x,
            BallotMessage::Externalize(m) => m.x == *x,
        }
    }

    /// True if the sender's state is still compatible with eventually
    /// voting for `(n, x)` — used to detect blocked/doomed ballots.
    pub fn could_ever_vote_for(&self, n: u32, x: &SlotValue) -> bool {
        match self {
            BallotMessage::Prepare(m) => m.bn <= n || m.bx == *x,
            BallotMessage::Confirm(m) => m.x == *x,
            BallotMessage::Externalize(m) => m.x == *x,
        }
    }

    /// The range of ballot counters this message tells us the sender has
    /// opinions about for value `x`, as a `(low, high)` pair, or `(0, 0)`.
    pub fn relevant_range(&self, x: &SlotValue) -> (u32, u32) {
        match self {
            BallotMessage::Prepare(m) => {
                let mut range = (0u32, 0u32);
                if m.bx == *x {
                    range = range_union(range.0, range.1, m.bn, m.bn);
                }
                if m.px == *x {
                    range = range_union(range.0, range.1, m.pn, m.pn);
                }
                if m.ppx == *x {
                    range = range_union(range.0, range.1, m.ppn, m.ppn);
                }
                range
            }
            BallotMessage::Confirm(m) => {
                if m.x == *x {
                    make_range(&[m.pn, m.cn, m.hn])
                } else {
                    (0, 0)
                }
            }
            BallotMessage::Externalize(m) => {
                if m.x == *x {
                    make_range(&[m.cn, m.hn])
                } else {
                    (0, 0)
                }
            }
        }
    }

    /// The largest ballot counter mentioned anywhere in this message.
    pub fn max_n(&self) -> u32 {
        match self {
            BallotMessage::Prepare(m) => [m.bn, m.pn, m.ppn, m.cn, m.hn].into_iter().max().unwrap(),
            BallotMessage::Confirm(m) => [m.pn, m.cn, m.hn].into_iter().max().unwrap(),
            BallotMessage::Externalize(m) => m.hn,
        }
    }
}

/// "I am nominating `nominated`, and have accepted `accepted`."
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NominationMessage {
    pub slot: u64,
    pub nominated: Vec<SlotValue>,
    pub accepted: Vec<SlotValue>,
    pub quorum_slice: QuorumSlice,
}
