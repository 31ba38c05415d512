//! The wire envelope: `e:<signer>:<signature>:<message-json>`, or a bare
//! `ok` keepalive with no signature at all. Grounded on
//! `util/signed_message.go`.

use fbc_crypto::{verify_signature, KeyPair, PublicKey};

use crate::error::{NodeError, NodeResult};
use crate::message::Message;

const ENVELOPE_VERSION: &str = "e";
const KEEPALIVE: &str = "ok";

/// A `Message`, the exact JSON bytes it was signed over, and the signature
/// authorizing it. The JSON string is kept alongside the decoded message
/// because the signature covers the literal bytes, not a re-serialization
/// of them — re-encoding could legitimately differ (map key order, for
/// instance) without the message's meaning having changed.
#[derive(Clone, Debug, PartialEq)]
pub struct SignedMessage {
    message: Message,
    message_string: String,
    signer: PublicKey,
    signature: String,
}

impl SignedMessage {
    pub fn new(message: Message, signer: &KeyPair) -> NodeResult<Self> {
        let message_string = serde_json::to_string(&message).map_err(|e| NodeError::BadJson(e.to_string()))?;
        let signature = signer.sign(message_string.as_bytes());
        Ok(SignedMessage {
            message,
            message_string,
            signer: signer.public_key(),
            signature,
        })
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn signer(&self) -> PublicKey {
        self.signer
    }

    pub fn into_message(self) -> Message {
        self.message
    }

    /// `e:<signer>:<signature>:<message-json>`, with no trailing newline.
    pub fn serialize(&self) -> String {
        format!("{ENVELOPE_VERSION}:{}:{}:{}", self.signer, self.signature, self.message_string)
    }

    pub fn from_serialized(line: &str) -> NodeResult<Self> {
        let mut parts = line.splitn(4, ':');
        let version = parts.next().ok_or(NodeError::MalformedEnvelope)?;
        let signer = parts.next().ok_or(NodeError::MalformedEnvelope)?;
        let signature = parts.next().ok_or(NodeError::MalformedEnvelope)?;
        let message_string = parts.next().ok_or(NodeError::MalformedEnvelope)?;
        if version != ENVELOPE_VERSION {
            return Err(NodeError::UnknownEnvelopeVersion(version.to_string()));
        }
        let signer = signer.parse::<PublicKey>().map_err(|e| NodeError::BadPublicKey(e.to_string()))?;
        verify_signature(&signer, message_string.as_bytes(), signature)
            .map_err(|_| NodeError::BadSignature(signer.to_string()))?;
        let message: Message = serde_json::from_str(message_string).map_err(|e| NodeError::BadJson(e.to_string()))?;
        Ok(SignedMessage {
            message,
            message_string: message_string.to_string(),
            signer,
            signature: signature.to_string(),
        })
    }
}

/// Either a real signed message or the content-free keepalive line.
#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    KeepAlive,
    Signed(SignedMessage),
}

impl Frame {
    /// The exact bytes to write to the wire, including the trailing
    /// newline the line-delimited protocol expects.
    pub fn write(&self) -> String {
        match self {
            Frame::KeepAlive => format!("{KEEPALIVE}\n"),
            Frame::Signed(m) => format!("{}\n", m.serialize()),
        }
    }

    /// Parses one line, with its trailing newline already stripped.
    pub fn read(line: &str) -> NodeResult<Self> {
        if line == KEEPALIVE {
            return Ok(Frame::KeepAlive);
        }
        SignedMessage::from_serialized(line).map(Frame::Signed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fbc_operation_queue::ErrorMessage;

    #[test]
    fn round_trips_a_signed_message_through_the_wire_format() {
        let kp = KeyPair::from_secret_phrase("node0");
        let message = Message::Error(ErrorMessage::new("trouble"));
        let signed = SignedMessage::new(message.clone(), &kp).unwrap();
        let line = signed.serialize();
        assert!(line.starts_with("e:0x"));

        let parsed = SignedMessage::from_serialized(&line).unwrap();
        assert_eq!(parsed.message(), &message);
        assert_eq!(parsed.signer(), kp.public_key());
    }

    #[test]
    fn rejects_a_tampered_message_body() {
        let kp = KeyPair::from_secret_phrase("node0");
        let message = Message::Error(ErrorMessage::new("trouble"));
        let signed = SignedMessage::new(message, &kp).unwrap();
        let line = signed.serialize();
        let tampered = line.replace("trouble", "sabotage");
        assert!(SignedMessage::from_serialized(&tampered).is_err());
    }

    #[test]
    fn rejects_an_envelope_with_too_few_fields() {
        assert!(matches!(SignedMessage::from_serialized("e:onlytwo"), Err(NodeError::MalformedEnvelope)));
    }

    #[test]
    fn rejects_an_unknown_envelope_version() {
        let kp = KeyPair::from_secret_phrase("node0");
        let message = Message::Error(ErrorMessage::new("trouble"));
        let signed = SignedMessage::new(message, &kp).unwrap();
        let line = signed.serialize().replacen("e:", "z:", 1);
        assert!(matches!(SignedMessage::from_serialized(&line), Err(NodeError::UnknownEnvelopeVersion(_))));
    }

    #[test]
    fn keepalive_round_trips_as_a_bare_line() {
        assert_eq!(Frame::KeepAlive.write(), "ok\n");
        assert_eq!(Frame::read("ok").unwrap(), Frame::KeepAlive);
    }

    #[test]
    fn signed_frame_round_trips_through_write_and_read() {
        let kp = KeyPair::from_secret_phrase("node0");
        let message = Message::Error(ErrorMessage::new("trouble"));
        let signed = SignedMessage::new(message.clone(), &kp).unwrap();
        let line = Frame::Signed(signed).write();
        let frame = Frame::read(line.trim_end_matches('\n')).unwrap();
        match frame {
            Frame::Signed(m) => assert_eq!(m.message(), &message),
            Frame::KeepAlive => panic!("expected a signed frame"),
        }
    }
}
