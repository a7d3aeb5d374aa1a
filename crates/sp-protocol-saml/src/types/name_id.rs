//! Subject name identifiers.

/// SAML NameID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameId {
    /// The identifier value.
    pub value: String,
    /// Format URI, if the IdP stated one.
    pub format: Option<String>,
    /// Qualifying IdP domain.
    pub name_qualifier: Option<String>,
    /// Qualifying SP entity ID.
    pub sp_name_qualifier: Option<String>,
}

impl NameId {
    /// Creates a NameID with no format.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            format: None,
            name_qualifier: None,
            sp_name_qualifier: None,
        }
    }

    /// Sets the format URI.
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Returns true if the format URI mentions email.
    #[must_use]
    pub fn is_email_format(&self) -> bool {
        self.format.as_deref().is_some_and(|f| f.contains("email"))
    }
}

/// NameIDPolicy of an AuthnRequest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameIdPolicy {
    /// Requested format URI.
    pub format: Option<String>,
    /// Whether the IdP may create a new identifier for the subject.
    pub allow_create: bool,
}
