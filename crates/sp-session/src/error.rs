//! Session error types.

use thiserror::Error;

/// Errors for callers that need to tell a missing session from an expired one.
///
/// Store operations themselves never fail; see [`crate::SessionStore::require`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// No session with this ID exists.
    #[error("session not found")]
    NotFound,

    /// The session existed but outlived its TTL and has been evicted.
    #[error("session expired")]
    Expired,
}

impl SessionError {
    /// Checks if this is a not found error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// Checks if this is an expiration error.
    #[must_use]
    pub const fn is_expired(&self) -> bool {
        matches!(self, Self::Expired)
    }
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
