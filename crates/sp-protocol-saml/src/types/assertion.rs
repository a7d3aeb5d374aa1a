//! Assertions and the statements the SP consumes from them.

use chrono::{DateTime, Utc};

use super::NameId;
use crate::signature::SignatureNode;

/// SAML Assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assertion {
    /// Assertion ID.
    pub id: String,
    /// When the assertion was issued.
    pub issue_instant: DateTime<Utc>,
    /// IdP entity ID, if present.
    pub issuer: Option<String>,
    /// Who the assertion is about.
    pub subject: Option<Subject>,
    /// Validity window and audience.
    pub conditions: Option<Conditions>,
    /// The authentication event.
    pub authn_statement: Option<AuthnStatement>,
    /// Identity attributes, in document order.
    pub attribute_statements: Vec<AttributeStatement>,
    /// Enveloped signature over this assertion.
    pub signature: Option<SignatureNode>,
}

impl Assertion {
    /// Creates an assertion with no statements.
    #[must_use]
    pub fn new(id: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            issue_instant: Utc::now(),
            issuer: Some(issuer.into()),
            subject: None,
            conditions: None,
            authn_statement: None,
            attribute_statements: Vec::new(),
            signature: None,
        }
    }

    /// Returns the subject NameID, if any.
    #[must_use]
    pub fn name_id(&self) -> Option<&NameId> {
        self.subject.as_ref().and_then(|s| s.name_id.as_ref())
    }

    /// Returns the AuthnStatement SessionIndex, if any.
    #[must_use]
    pub fn session_index(&self) -> Option<&str> {
        self.authn_statement
            .as_ref()
            .and_then(|s| s.session_index.as_deref())
    }
}

/// Subject of an assertion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subject {
    /// Subject identifier.
    pub name_id: Option<NameId>,
    /// How the subject is confirmed.
    pub confirmations: Vec<SubjectConfirmation>,
}

/// SubjectConfirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectConfirmation {
    /// Confirmation method URI.
    pub method: String,
    /// Constraints on the confirmation.
    pub data: Option<SubjectConfirmationData>,
}

/// SubjectConfirmationData.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectConfirmationData {
    /// Earliest time the subject may be confirmed.
    pub not_before: Option<DateTime<Utc>>,
    /// Time at which the confirmation expires.
    pub not_on_or_after: Option<DateTime<Utc>>,
    /// Endpoint the assertion may be delivered to.
    pub recipient: Option<String>,
    /// Request this assertion answers.
    pub in_response_to: Option<String>,
}

/// Conditions of an assertion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conditions {
    /// Start of the validity window.
    pub not_before: Option<DateTime<Utc>>,
    /// End of the validity window, exclusive.
    pub not_on_or_after: Option<DateTime<Utc>>,
    /// Audience restrictions; the SP must appear in one of them.
    pub audience_restrictions: Vec<AudienceRestriction>,
    /// Whether the assertion may be used only once.
    pub one_time_use: bool,
}

impl Conditions {
    /// Returns true if `now` lies in `[not_before, not_on_or_after)`.
    ///
    /// A missing bound leaves that side open.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.not_before.map_or(true, |nb| nb <= now)
            && self.not_on_or_after.map_or(true, |noa| now < noa)
    }

    /// Returns true if there is no restriction or some restriction lists `audience`.
    #[must_use]
    pub fn permits_audience(&self, audience: &str) -> bool {
        self.audience_restrictions.is_empty()
            || self
                .audience_restrictions
                .iter()
                .any(|r| r.audiences.iter().any(|a| a == audience))
    }
}

/// AudienceRestriction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudienceRestriction {
    /// Permitted audience URIs.
    pub audiences: Vec<String>,
}

/// AuthnStatement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthnStatement {
    /// When the user authenticated.
    pub authn_instant: DateTime<Utc>,
    /// IdP session index, used to target logout.
    pub session_index: Option<String>,
    /// When the IdP session ends.
    pub session_not_on_or_after: Option<DateTime<Utc>>,
    /// Authentication context class reference.
    pub class_ref: Option<String>,
}

/// AttributeStatement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeStatement {
    /// Attributes in document order.
    pub attributes: Vec<Attribute>,
}

/// Attribute with its values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute name.
    pub name: String,
    /// Name format URI.
    pub name_format: Option<String>,
    /// Display name.
    pub friendly_name: Option<String>,
    /// Text content of each AttributeValue.
    pub values: Vec<String>,
}

impl Attribute {
    /// Creates a single-valued attribute.
    #[must_use]
    pub fn single(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            name_format: None,
            friendly_name: None,
            values: vec![value.into()],
        }
    }
}
