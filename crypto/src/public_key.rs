//! Checksummed public key encoding: `0x` + hex(32-byte Ed25519 payload +
//! 2-byte checksum), where the checksum is the first two bytes of
//! `sha512_256(payload)`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, CryptoResult};
use crate::hash::sha512_256;

const PAYLOAD_LEN: usize = 32;
const CHECKSUM_LEN: usize = 2;
const TOTAL_LEN: usize = PAYLOAD_LEN + CHECKSUM_LEN;
const ENCODED_LEN: usize = 2 + TOTAL_LEN * 2; // "0x" + hex

fn check_bytes(payload: &[u8]) -> [u8; CHECKSUM_LEN] {
    let digest = sha512_256(payload);
    [digest[0], digest[1]]
}

/// A checksummed Ed25519 public key, as it appears on the wire and in logs.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PublicKey([u8; TOTAL_LEN]);

impl PublicKey {
    /// Builds a `PublicKey` from a raw 32-byte Ed25519 payload, appending
    /// its checksum.
    pub fn from_payload(payload: [u8; PAYLOAD_LEN]) -> Self {
        let checksum = check_bytes(&payload);
        let mut bytes = [0u8; TOTAL_LEN];
        bytes[..PAYLOAD_LEN].copy_from_slice(&payload);
        bytes[PAYLOAD_LEN..].copy_from_slice(&checksum);
        PublicKey(bytes)
    }

    /// Parses the `0x`-prefixed hex form, validating length and checksum.
    pub fn parse(input: &str) -> CryptoResult<Self> {
        if !input.starts_with("0x") {
            return Err(CryptoError::MissingPrefix);
        }
        if input.len() != ENCODED_LEN {
            return Err(CryptoError::WrongLength(input.len()));
        }
        let raw = hex::decode(&input[2..]).map_err(|e| CryptoError::InvalidHex(e.to_string()))?;
        let mut bytes = [0u8; TOTAL_LEN];
        bytes.copy_from_slice(&raw);
        let key = PublicKey(bytes);
        key.validate()?;
        Ok(key)
    }

    fn validate(&self) -> CryptoResult<()> {
        let expected = check_bytes(&self.payload());
        if expected != self.checksum() {
            return Err(CryptoError::BadChecksum);
        }
        Ok(())
    }

    /// The raw 32-byte Ed25519 payload, without its checksum.
    pub fn payload(&self) -> [u8; PAYLOAD_LEN] {
        let mut payload = [0u8; PAYLOAD_LEN];
        payload.copy_from_slice(&self.0[..PAYLOAD_LEN]);
        payload
    }

    fn checksum(&self) -> [u8; CHECKSUM_LEN] {
        let mut c = [0u8; CHECKSUM_LEN];
        c.copy_from_slice(&self.0[PAYLOAD_LEN..]);
        c
    }

    /// A short hex prefix of the payload, for compact log lines.
    pub fn short_name(&self) -> String {
        hex::encode(&self.payload()[..3])
    }

    /// The raw 32-byte payload as an Ed25519 verifying key, for signature
    /// checks.
    pub fn to_verifying_key(self) -> CryptoResult<ed25519_dalek::VerifyingKey> {
        ed25519_dalek::VerifyingKey::from_bytes(&self.payload())
            .map_err(|e| CryptoError::InvalidHex(e.to_string()))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.short_name())
    }
}

impl std::str::FromStr for PublicKey {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PublicKey::parse(s)
    }
}

impl TryFrom<String> for PublicKey {
    type Error = CryptoError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        PublicKey::parse(&value)
    }
}

impl From<PublicKey> for String {
    fn from(key: PublicKey) -> Self {
        key.to_string()
    }
}
