//! Identity extraction from a validated Response.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::{SamlError, SamlResult};
use crate::types::Response;

/// Attribute key holding the subject NameID.
pub const NAME_ID_KEY: &str = "nameId";
/// Attribute key holding the NameID format (empty when absent).
pub const NAME_ID_FORMAT_KEY: &str = "nameIdFormat";
/// Attribute key set to the NameID for email-format subjects.
pub const EMAIL_KEY: &str = "email";

/// The authenticated subject of a Response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Subject NameID.
    pub name_id: String,
    /// NameID format, if the IdP sent one.
    pub name_id_format: Option<String>,
    /// SessionIndex of the AuthnStatement, if any.
    pub session_index: Option<String>,
    /// Single-valued attribute map, derived keys included.
    pub attributes: HashMap<String, String>,
}

/// Flattens the first assertion of `response` into an [`Identity`].
///
/// Only the first assertion is read. Each attribute keeps its first value
/// (empty when it has none) and a later attribute of the same name replaces
/// an earlier one. `nameId` and `nameIdFormat` are always added, and
/// `email` is set to the NameID when the format mentions email.
pub fn extract_identity(response: &Response) -> SamlResult<Identity> {
    let assertion = response
        .first_assertion()
        .ok_or_else(|| SamlError::validation("response contains no assertion"))?;
    let name_id = assertion
        .name_id()
        .ok_or_else(|| SamlError::validation(format!("assertion {} has no NameID", assertion.id)))?;

    let mut attributes: HashMap<String, String> = assertion
        .attribute_statements
        .iter()
        .flat_map(|statement| &statement.attributes)
        .map(|attribute| {
            let value = attribute.values.first().cloned().unwrap_or_default();
            (attribute.name.clone(), value)
        })
        .collect();

    attributes.insert(NAME_ID_KEY.to_string(), name_id.value.clone());
    attributes.insert(
        NAME_ID_FORMAT_KEY.to_string(),
        name_id.format.clone().unwrap_or_default(),
    );
    if name_id.is_email_format() {
        attributes.insert(EMAIL_KEY.to_string(), name_id.value.clone());
    }

    Ok(Identity {
        name_id: name_id.value.clone(),
        name_id_format: name_id.format.clone(),
        session_index: assertion.session_index().map(String::from),
        attributes,
    })
}
