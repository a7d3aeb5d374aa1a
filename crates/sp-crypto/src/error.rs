//! Crypto error types.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors raised by crypto operations.
///
/// A signature that simply does not verify is not an error; see
/// [`crate::verify_signature`].
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Public key bytes could not be used.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// The algorithm is known but refused by policy.
    #[error("algorithm not allowed: {0}")]
    AlgorithmNotAllowed(&'static str),

    /// The algorithm URI is not recognised.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
}
