//! Wire shapes and basic value types for federated byzantine agreement:
//! `SlotValue`, `QuorumSlice`, `Ballot`, `Phase`, and the ballot/nomination
//! message enum. No protocol logic lives here — see `fbc-consensus-scp`.

pub mod ballot;
pub mod messages;
pub mod phase;
pub mod quorum_slice;
pub mod range;
pub mod slot_value;

pub use ballot::Ballot;
pub use messages::{BallotMessage, ConfirmMessage, ExternalizeMessage, NominationMessage, PrepareMessage};
pub use phase::Phase;
pub use quorum_slice::QuorumSlice;
pub use range::{make_range, range_union};
pub use slot_value::{assert_no_dupes, SlotValue};
