//! Single Logout messages.

use chrono::{DateTime, Utc};

use super::{NameId, Status};
use crate::signature::SignatureNode;

/// SAML LogoutRequest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoutRequest {
    /// Request ID.
    pub id: String,
    /// When the request was issued.
    pub issue_instant: DateTime<Utc>,
    /// Sender entity ID.
    pub issuer: Option<String>,
    /// Endpoint the request is addressed to.
    pub destination: Option<String>,
    /// Subject being logged out.
    pub name_id: Option<NameId>,
    /// Sessions to terminate; empty means every session of the subject.
    pub session_indexes: Vec<String>,
    /// Expiry of the request.
    pub not_on_or_after: Option<DateTime<Utc>>,
    /// Reason URI.
    pub reason: Option<String>,
    /// Enveloped signature.
    pub signature: Option<SignatureNode>,
}

impl LogoutRequest {
    /// Creates a request with a fresh ID issued now.
    #[must_use]
    pub fn new(issuer: impl Into<String>, destination: impl Into<String>, name_id: NameId) -> Self {
        Self {
            id: crate::bindings::generate_id(),
            issue_instant: Utc::now(),
            issuer: Some(issuer.into()),
            destination: Some(destination.into()),
            name_id: Some(name_id),
            session_indexes: Vec::new(),
            not_on_or_after: None,
            reason: None,
            signature: None,
        }
    }

    /// Adds a SessionIndex.
    #[must_use]
    pub fn with_session_index(mut self, index: impl Into<String>) -> Self {
        self.session_indexes.push(index.into());
        self
    }

    /// Sets the reason URI.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Returns true if the request carries an expiry that has passed.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.not_on_or_after.is_some_and(|noa| now >= noa)
    }
}

/// SAML LogoutResponse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoutResponse {
    /// Response ID.
    pub id: String,
    /// Request this response answers.
    pub in_response_to: Option<String>,
    /// When the response was issued.
    pub issue_instant: DateTime<Utc>,
    /// Sender entity ID.
    pub issuer: Option<String>,
    /// Endpoint the response is addressed to.
    pub destination: Option<String>,
    /// Outcome of the logout.
    pub status: Status,
    /// Enveloped signature.
    pub signature: Option<SignatureNode>,
}

impl LogoutResponse {
    /// Creates a response with a fresh ID issued now.
    #[must_use]
    pub fn new(issuer: impl Into<String>, destination: impl Into<String>, status: Status) -> Self {
        Self {
            id: crate::bindings::generate_id(),
            in_response_to: None,
            issue_instant: Utc::now(),
            issuer: Some(issuer.into()),
            destination: Some(destination.into()),
            status,
            signature: None,
        }
    }

    /// Sets the request this answers.
    #[must_use]
    pub fn in_response_to(mut self, request_id: impl Into<String>) -> Self {
        self.in_response_to = Some(request_id.into());
        self
    }

    /// Returns true if the status is Success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}
