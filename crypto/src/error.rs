//! Error type for key parsing, checksum validation, and signature checks.

use thiserror::Error;

/// Errors produced while parsing or validating keys and signatures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// public key string did not start with "0x"
    #[error("public key string did not start with \"0x\"")]
    MissingPrefix,
    /// public key string had length {0}, expected 70
    #[error("public key string had length {0}, expected 70")]
    WrongLength(usize),
    /// public key string was not valid hex: {0}
    #[error("public key string was not valid hex: {0}")]
    InvalidHex(String),
    /// public key checksum did not match its payload
    #[error("public key checksum did not match its payload")]
    BadChecksum,
    /// signature was not valid base64: {0}
    #[error("signature was not valid base64: {0}")]
    InvalidSignatureEncoding(String),
    /// signature had the wrong length for ed25519
    #[error("signature had the wrong length for ed25519")]
    InvalidSignatureLength,
    /// signature verification failed
    #[error("signature verification failed")]
    VerificationFailed,
    /// secret phrase produced an invalid signing key: {0}
    #[error("secret phrase produced an invalid signing key: {0}")]
    InvalidSeed(String),
}

pub type CryptoResult<T> = Result<T, CryptoError>;
