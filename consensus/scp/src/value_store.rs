//! The contract a ledger must satisfy to be driven by the ballot protocol.
//! Grounded on `consensus/value_store.go`.

use fbc_consensus_scp_types::{QuorumSlice, SlotValue};

/// Bridges the abstract federated-voting state machines to a concrete
/// ledger: suggesting new values, validating and combining candidates, and
/// finalizing the one the network agrees on.
pub trait ValueStore {
    /// Combines several candidate values into one, for nodes that need to
    /// accept/confirm a nomination that unions votes from a quorum. Must be
    /// commutative, associative, and idempotent over its inputs so that
    /// nodes reaching the same quorum reach the same combined value.
    fn combine(&mut self, values: &[SlotValue]) -> SlotValue;

    /// True if `v` is known well-formed and can be finalized as-is.
    fn can_finalize(&self, v: &SlotValue) -> bool;

    /// Commits `v` as this slot's externalized value, with its confirmed
    /// commit range `(c, h)` and the quorum slice the accepting node used.
    fn finalize(&mut self, v: &SlotValue, c: u32, h: u32, quorum_slice: &QuorumSlice);

    /// The most recently finalized value, used as the next slot's seed.
    fn last(&self) -> SlotValue;

    /// Proposes a new candidate value for this slot, if one is available.
    fn suggest_value(&mut self) -> Option<SlotValue>;

    /// True if `v` is known and was validated (or produced) by this store.
    fn validate_value(&self, v: &SlotValue) -> bool;
}
