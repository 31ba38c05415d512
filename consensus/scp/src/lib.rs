//! Federated byzantine agreement: quorum calculus, seed-based proposal
//! priority, nomination, and the three-phase ballot protocol.

pub mod ballot_state;
pub mod block;
pub mod error;
pub mod nomination;
pub mod quorum;
pub mod seed_priority;
pub mod shared_value_store;
pub mod value_store;

pub use ballot_state::BallotState;
pub use block::{Block, ConsensusMessage};
pub use error::{ScpError, ScpResult};
pub use nomination::NominationState;
pub use quorum::{blocked_by, meets_quorum, QuorumFinder};
pub use seed_priority::{seed_priority, seed_sort};
pub use shared_value_store::SharedValueStore;
pub use value_store::ValueStore;

pub use fbc_consensus_scp_types::{
    Ballot, BallotMessage, ConfirmMessage, ExternalizeMessage, NominationMessage, Phase,
    PrepareMessage, QuorumSlice, SlotValue,
};
