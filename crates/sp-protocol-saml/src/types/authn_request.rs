//! AuthnRequest, the SP's request for authentication.

use chrono::{DateTime, Utc};

use super::NameIdPolicy;
use crate::bindings::Binding;

/// SAML Authentication Request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthnRequest {
    /// Unique request ID.
    pub id: String,
    /// When the request was issued.
    pub issue_instant: DateTime<Utc>,
    /// SP entity ID.
    pub issuer: String,
    /// IdP endpoint the request is addressed to.
    pub destination: String,
    /// Where the IdP should deliver its response.
    pub assertion_consumer_service_url: String,
    /// Binding the IdP should use for the response.
    pub protocol_binding: Binding,
    /// Constraints on the returned NameID.
    pub name_id_policy: Option<NameIdPolicy>,
    /// Requested authentication strength.
    pub requested_authn_context: Option<RequestedAuthnContext>,
    /// Whether the IdP must re-authenticate the user.
    pub force_authn: bool,
    /// Whether the IdP must not interact with the user.
    pub is_passive: bool,
}

impl AuthnRequest {
    /// Creates a request with a fresh ID issued now, asking for a POST response.
    #[must_use]
    pub fn new(
        issuer: impl Into<String>,
        destination: impl Into<String>,
        acs_url: impl Into<String>,
    ) -> Self {
        Self {
            id: crate::bindings::generate_id(),
            issue_instant: Utc::now(),
            issuer: issuer.into(),
            destination: destination.into(),
            assertion_consumer_service_url: acs_url.into(),
            protocol_binding: Binding::Post,
            name_id_policy: None,
            requested_authn_context: None,
            force_authn: false,
            is_passive: false,
        }
    }

    /// Sets the NameID policy.
    #[must_use]
    pub fn with_name_id_policy(mut self, format: impl Into<String>, allow_create: bool) -> Self {
        self.name_id_policy = Some(NameIdPolicy {
            format: Some(format.into()),
            allow_create,
        });
        self
    }

    /// Requests an exact match on a single authentication context class.
    #[must_use]
    pub fn with_exact_authn_context(mut self, class_ref: impl Into<String>) -> Self {
        self.requested_authn_context = Some(RequestedAuthnContext {
            comparison: AuthnContextComparison::Exact,
            class_refs: vec![class_ref.into()],
        });
        self
    }
}

/// RequestedAuthnContext of an AuthnRequest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestedAuthnContext {
    /// How the IdP should compare its context against the requested ones.
    pub comparison: AuthnContextComparison,
    /// Requested class references.
    pub class_refs: Vec<String>,
}

/// Comparison method for requested authentication contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthnContextComparison {
    /// Exactly one of the listed contexts.
    #[default]
    Exact,
    /// At least as strong as one listed.
    Minimum,
    /// At most as strong as one listed.
    Maximum,
    /// Stronger than every listed context.
    Better,
}

impl AuthnContextComparison {
    /// Returns the attribute value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Minimum => "minimum",
            Self::Maximum => "maximum",
            Self::Better => "better",
        }
    }

    /// Parses the attribute value.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "exact" => Some(Self::Exact),
            "minimum" => Some(Self::Minimum),
            "maximum" => Some(Self::Maximum),
            "better" => Some(Self::Better),
            _ => None,
        }
    }
}
