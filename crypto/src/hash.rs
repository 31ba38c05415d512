//! SHA-512/256 helpers.
//!
//! Every hash in this system — chunk fingerprints, public-key checksums,
//! seed-sort keys — uses SHA-512/256, not SHA-256. The two differ in their
//! initialization vectors and truncation, and are not interchangeable.

use sha2::{Digest, Sha512_256};

/// Returns the raw 32-byte SHA-512/256 digest of `input`.
pub fn sha512_256(input: &[u8]) -> [u8; 32] {
    let mut hasher = Sha512_256::new();
    hasher.update(input);
    let out = hasher.finalize();
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&out);
    bytes
}

/// Returns the unpadded, URL-unsafe base64 encoding of `sha512_256(input)`,
/// matching `util.HashString` in the reference implementation.
pub fn hash_string(input: &[u8]) -> String {
    use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine};
    STANDARD_NO_PAD.encode(sha512_256(input))
}
