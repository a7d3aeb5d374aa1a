//! SAML error types.
//!
//! Every failure the SP can hit while handling a protocol message falls into
//! one of a handful of kinds. The `String` payloads carry the internal
//! reason for logs; callers outside the trust boundary only ever see
//! [`SamlError::public_message`].

use thiserror::Error;

/// Result type for SAML operations.
pub type SamlResult<T> = Result<T, SamlError>;

/// SAML protocol errors.
#[derive(Debug, Error)]
pub enum SamlError {
    /// The message could not be decoded or parsed.
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// The IdP answered with a non-success status code.
    #[error("identity provider reported failure: {0}")]
    IdpReportedFailure(String),

    /// Issuer, destination, time, audience or signature checks failed.
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    /// The message or assertion ID was already consumed.
    #[error("replay detected: {0}")]
    ReplayDetected(String),

    /// An outbound message could not be built or encoded.
    #[error("encoding failure: {0}")]
    EncodingFailure(String),

    /// The configured IdP certificate could not be loaded.
    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),

    /// The session exists but is past its lifetime.
    #[error("session expired")]
    SessionExpired,

    /// No session with the given ID.
    #[error("session not found")]
    SessionNotFound,

    /// The SP configuration is unusable.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl SamlError {
    /// Generic text safe to hand to the caller.
    ///
    /// Every validation failure maps to the same text.
    #[must_use]
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::MalformedMessage(_) => "Malformed SAML message",
            Self::IdpReportedFailure(_) => "Identity provider reported an authentication failure",
            Self::ValidationFailed(_) | Self::ReplayDetected(_) => "SAML response validation failed",
            Self::EncodingFailure(_) => "Failed to create SAML message",
            Self::InvalidCertificate(_) | Self::Configuration(_) => "Service provider misconfigured",
            Self::SessionExpired => "Session expired",
            Self::SessionNotFound => "Session not found",
        }
    }

    /// Returns the HTTP status code for this error.
    ///
    /// A rejected or failed authentication is a normal outcome and reports 200.
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        match self {
            Self::MalformedMessage(_) => 400,
            Self::IdpReportedFailure(_) | Self::ValidationFailed(_) | Self::ReplayDetected(_) => 200,
            Self::SessionExpired | Self::SessionNotFound => 401,
            Self::EncodingFailure(_) | Self::InvalidCertificate(_) | Self::Configuration(_) => 500,
        }
    }

    /// Short machine-readable name of the error kind, used as a log field.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MalformedMessage(_) => "malformed_message",
            Self::IdpReportedFailure(_) => "idp_reported_failure",
            Self::ValidationFailed(_) => "validation_failed",
            Self::ReplayDetected(_) => "replay_detected",
            Self::EncodingFailure(_) => "encoding_failure",
            Self::InvalidCertificate(_) => "invalid_certificate",
            Self::SessionExpired => "session_expired",
            Self::SessionNotFound => "session_not_found",
            Self::Configuration(_) => "configuration",
        }
    }

    /// Shorthand for a [`SamlError::ValidationFailed`].
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::ValidationFailed(reason.into())
    }

    /// Shorthand for a [`SamlError::MalformedMessage`].
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedMessage(reason.into())
    }
}

impl From<quick_xml::Error> for SamlError {
    fn from(err: quick_xml::Error) -> Self {
        Self::MalformedMessage(err.to_string())
    }
}

impl From<base64::DecodeError> for SamlError {
    fn from(err: base64::DecodeError) -> Self {
        Self::MalformedMessage(format!("base64: {err}"))
    }
}

impl From<std::io::Error> for SamlError {
    fn from(err: std::io::Error) -> Self {
        Self::EncodingFailure(err.to_string())
    }
}

impl From<sp_session::SessionError> for SamlError {
    fn from(err: sp_session::SessionError) -> Self {
        match err {
            sp_session::SessionError::NotFound => Self::SessionNotFound,
            sp_session::SessionError::Expired => Self::SessionExpired,
        }
    }
}

impl From<sp_core::ConfigError> for SamlError {
    fn from(err: sp_core::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}
