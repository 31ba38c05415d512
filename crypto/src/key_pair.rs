//! Ed25519 key pairs: generation, deterministic derivation from a secret
//! phrase, signing, and verification. Signing is pure EdDSA (no prehash),
//! matching `crypto.Hash(0)` in the reference implementation.

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine};
use ed25519_dalek::{Signer, SigningKey, Verifier};
use rand::rngs::OsRng;
use rand_core::{CryptoRng, RngCore};

use crate::error::{CryptoError, CryptoResult};
use crate::hash::sha512_256;
use crate::public_key::PublicKey;

/// An Ed25519 signing key plus its checksummed public key.
pub struct KeyPair {
    signing_key: SigningKey,
    public_key: PublicKey,
}

impl KeyPair {
    fn from_signing_key(signing_key: SigningKey) -> Self {
        let public_key = PublicKey::from_payload(signing_key.verifying_key().to_bytes());
        KeyPair {
            signing_key,
            public_key,
        }
    }

    /// Generates a new key pair from the OS random number generator.
    pub fn new() -> Self {
        Self::from_rng(&mut OsRng)
    }

    /// Generates a new key pair from an arbitrary cryptographic RNG.
    pub fn from_rng<R: CryptoRng + RngCore>(rng: &mut R) -> Self {
        Self::from_signing_key(SigningKey::generate(rng))
    }

    /// Deterministically derives a key pair from a secret phrase: the
    /// phrase's `sha512_256` digest is used directly as the Ed25519 seed.
    /// Used to mint well-known test identities such as `"node0"`.
    pub fn from_secret_phrase(phrase: &str) -> Self {
        let seed = sha512_256(phrase.as_bytes());
        Self::from_signing_key(SigningKey::from_bytes(&seed))
    }

    /// The checksummed public key.
    pub fn public_key(&self) -> PublicKey {
        self.public_key
    }

    /// Signs `message`, returning the unpadded base64-encoded signature.
    pub fn sign(&self, message: &[u8]) -> String {
        let signature = self.signing_key.sign(message);
        STANDARD_NO_PAD.encode(signature.to_bytes())
    }
}

impl Default for KeyPair {
    fn default() -> Self {
        Self::new()
    }
}

/// Verifies a base64-encoded Ed25519 signature over `message` against
/// `public_key`.
pub fn verify_signature(
    public_key: &PublicKey,
    message: &[u8],
    signature: &str,
) -> CryptoResult<()> {
    let sig_bytes = STANDARD_NO_PAD
        .decode(signature)
        .map_err(|e| CryptoError::InvalidSignatureEncoding(e.to_string()))?;
    let sig_array: [u8; 64] = sig_bytes
        .try_into()
        .map_err(|_| CryptoError::InvalidSignatureLength)?;
    let signature = ed25519_dalek::Signature::from_bytes(&sig_array);
    let verifying_key = public_key.to_verifying_key()?;
    verifying_key
        .verify(message, &signature)
        .map_err(|_| CryptoError::VerificationFailed)
}
