//! Error kinds for wire encoding, name parsing and signing.
//!
//! Propagated by `Result`, never by panics: malformed input from the network
//! is an expected occurrence, not a bug.

use thiserror::Error;

/// Failures from the TLV codec, the name model and the packet codecs.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum CodecError {
    #[error("TLV element truncated")]
    Truncated,
    #[error("unexpected TLV type: wanted {want}, got {got}")]
    UnexpectedType { want: u64, got: u64 },
    #[error("invalid TLV length")]
    InvalidLength,
    #[error("invalid or truncated varnum")]
    InvalidVarnum,
    #[error("invalid NDN URI")]
    InvalidUri,
    #[error("encode buffer too small")]
    BufferTooSmall,
}

/// Failures from signing and signature verification.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum CryptoError {
    #[error("unsupported signature algorithm: {0}")]
    UnsupportedAlgorithm(u8),
    #[error("invalid key for algorithm")]
    InvalidKey,
    #[error("signature verification failed")]
    VerifyFailed,
}
