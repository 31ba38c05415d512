//! Ed25519 keys, checksummed public key encoding, and SHA-512/256 hashing.

pub mod error;
pub mod hash;
pub mod key_pair;
pub mod public_key;

pub use error::{CryptoError, CryptoResult};
pub use hash::{hash_string, sha512_256};
pub use key_pair::{verify_signature, KeyPair};
pub use public_key::PublicKey;
