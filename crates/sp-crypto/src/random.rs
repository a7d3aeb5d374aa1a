//! Cryptographically secure identifier generation.
//!
//! Two kinds of identifiers leave this module:
//! - protocol message IDs, which must be valid XML IDs (no leading digit)
//! - session IDs, which callers treat as bearer capability tokens

use rand::distr::{Alphanumeric, SampleString};
use rand::Rng;

/// Length of generated session identifiers.
pub const SESSION_ID_LEN: usize = 32;

/// Generates a unique protocol message ID.
///
/// The ID is an underscore followed by 32 lowercase hex digits, drawn from a
/// random (v4) UUID. The underscore keeps it a valid `xs:ID`, which may not
/// start with a digit.
#[must_use]
pub fn generate_message_id() -> String {
    format!("_{}", uuid::Uuid::new_v4().simple())
}

/// Generates an opaque session identifier.
///
/// 32 alphanumeric characters, roughly 190 bits of entropy.
#[must_use]
pub fn generate_session_id() -> String {
    random_alphanumeric(SESSION_ID_LEN)
}

/// Generates a random alphanumeric string of `len` characters.
#[must_use]
pub fn random_alphanumeric(len: usize) -> String {
    let mut rng = rand::rng();
    Alphanumeric.sample_string(&mut rng, len)
}

/// Generates `len` random bytes.
#[must_use]
pub fn random_bytes(len: usize) -> Vec<u8> {
    let mut rng = rand::rng();
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes[..]);
    bytes
}
