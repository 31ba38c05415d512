//! The top-level wire message: a tagged sum over everything a node sends
//! or receives, keyed by its `type` field. Nomination and the three ballot
//! phases are kept as separate variants (rather than nested under a single
//! `Consensus` variant) so the wire `type` tag names them directly, the way
//! `util/message.go`'s registry does by type name.

use serde::{Deserialize, Serialize};

use fbc_consensus_scp::ConsensusMessage;
use fbc_consensus_scp_types::{BallotMessage, ConfirmMessage, ExternalizeMessage, NominationMessage, PrepareMessage};
use fbc_operation_queue::{ErrorMessage, OperationMessage};

use crate::data_message::DataMessage;
use crate::error::NodeError;
use crate::query::QueryMessage;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    Nomination(NominationMessage),
    Prepare(PrepareMessage),
    Confirm(ConfirmMessage),
    Externalize(ExternalizeMessage),
    Operation(OperationMessage),
    Query(QueryMessage),
    Data(DataMessage),
    Error(ErrorMessage),
}

impl Message {
    /// The slot this message concerns, or 0 for slot-independent messages
    /// (operations, queries, errors) and for a `Data` message that isn't
    /// reporting a particular slot.
    pub fn slot(&self) -> u64 {
        match self {
            Message::Nomination(m) => m.slot,
            Message::Prepare(m) => m.slot,
            Message::Confirm(m) => m.slot,
            Message::Externalize(m) => m.slot,
            Message::Data(m) => m.i,
            Message::Operation(_) | Message::Query(_) | Message::Error(_) => 0,
        }
    }

    pub fn message_type(&self) -> &'static str {
        match self {
            Message::Nomination(_) => "Nomination",
            Message::Prepare(_) => "Prepare",
            Message::Confirm(_) => "Confirm",
            Message::Externalize(_) => "Externalize",
            Message::Operation(_) => "Operation",
            Message::Query(_) => "Query",
            Message::Data(_) => "Data",
            Message::Error(_) => "Error",
        }
    }

    pub fn is_consensus(&self) -> bool {
        matches!(self, Message::Nomination(_) | Message::Prepare(_) | Message::Confirm(_) | Message::Externalize(_))
    }
}

impl From<ConsensusMessage> for Message {
    fn from(message: ConsensusMessage) -> Self {
        match message {
            ConsensusMessage::Nomination(m) => Message::Nomination(m),
            ConsensusMessage::Ballot(BallotMessage::Prepare(m)) => Message::Prepare(m),
            ConsensusMessage::Ballot(BallotMessage::Confirm(m)) => Message::Confirm(m),
            ConsensusMessage::Ballot(BallotMessage::Externalize(m)) => Message::Externalize(m),
        }
    }
}

impl TryFrom<Message> for ConsensusMessage {
    type Error = NodeError;

    fn try_from(message: Message) -> Result<Self, Self::Error> {
        match message {
            Message::Nomination(m) => Ok(ConsensusMessage::Nomination(m)),
            Message::Prepare(m) => Ok(ConsensusMessage::Ballot(BallotMessage::Prepare(m))),
            Message::Confirm(m) => Ok(ConsensusMessage::Ballot(BallotMessage::Confirm(m))),
            Message::Externalize(m) => Ok(ConsensusMessage::Ballot(BallotMessage::Externalize(m))),
            other => Err(NodeError::NotConsensusMessage(other.message_type())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fbc_consensus_scp_types::{QuorumSlice, SlotValue};

    #[test]
    fn round_trips_through_consensus_message() {
        let nom = NominationMessage {
            slot: 1,
            nominated: vec![SlotValue::from("x")],
            accepted: vec![],
            quorum_slice: QuorumSlice::new(vec!["a".into()], 1),
        };
        let message: Message = ConsensusMessage::Nomination(nom.clone()).into();
        assert_eq!(message.message_type(), "Nomination");
        let back: ConsensusMessage = message.try_into().unwrap();
        assert_eq!(back.slot(), 1);
    }

    #[test]
    fn non_consensus_messages_reject_the_conversion() {
        let message = Message::Error(ErrorMessage::new("oops"));
        assert!(ConsensusMessage::try_from(message).is_err());
    }

    #[test]
    fn serializes_with_a_type_tag() {
        let message = Message::Error(ErrorMessage::new("oops"));
        let json = serde_json::to_string(&message).unwrap();
        assert!(json.contains("\"type\":\"Error\""));
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back, message);
    }
}
