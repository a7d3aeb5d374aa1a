//! Response, the IdP's answer to an AuthnRequest.

use chrono::{DateTime, Utc};

use super::{Assertion, Status};
use crate::signature::SignatureNode;

/// SAML Response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Response ID.
    pub id: String,
    /// Request this response answers, if solicited.
    pub in_response_to: Option<String>,
    /// When the response was issued.
    pub issue_instant: DateTime<Utc>,
    /// Endpoint the response was sent to.
    pub destination: Option<String>,
    /// IdP entity ID.
    pub issuer: Option<String>,
    /// Outcome of the request.
    pub status: Status,
    /// Plain assertions, in document order.
    pub assertions: Vec<Assertion>,
    /// Enveloped signature over the whole response.
    pub signature: Option<SignatureNode>,
}

impl Response {
    /// Creates a successful, unsigned response with no assertions.
    #[must_use]
    pub fn success(id: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            in_response_to: None,
            issue_instant: Utc::now(),
            destination: None,
            issuer: Some(issuer.into()),
            status: Status::success(),
            assertions: Vec::new(),
            signature: None,
        }
    }

    /// Sets the destination.
    #[must_use]
    pub fn with_destination(mut self, url: impl Into<String>) -> Self {
        self.destination = Some(url.into());
        self
    }

    /// Appends an assertion.
    #[must_use]
    pub fn with_assertion(mut self, assertion: Assertion) -> Self {
        self.assertions.push(assertion);
        self
    }

    /// Returns the first assertion, which identity extraction uses.
    #[must_use]
    pub fn first_assertion(&self) -> Option<&Assertion> {
        self.assertions.first()
    }

    /// Returns true if the status is Success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}
