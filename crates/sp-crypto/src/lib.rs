//! # sp-crypto
//!
//! Cryptographic primitives used by the SAML service provider, backed by
//! `aws-lc-rs` and `rand`.
//!
//! - [`random`]: protocol message IDs and opaque session IDs
//! - [`digest`]: XML-DSig digest algorithms
//! - [`verify`]: RSA and ECDSA signature verification for XML-DSig

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod digest;
pub mod error;
pub mod random;
pub mod verify;

pub use digest::DigestAlgorithm;
pub use error::{CryptoError, CryptoResult};
pub use random::{generate_message_id, generate_session_id};
pub use verify::{verify_signature, SignatureAlgorithm};
