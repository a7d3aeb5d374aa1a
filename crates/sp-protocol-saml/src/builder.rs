//! Outbound message construction.
//!
//! Builds AuthnRequest, LogoutRequest and LogoutResponse objects from the
//! SP configuration and encodes them for either binding.

use std::sync::Arc;

use sp_core::SpConfig;

use crate::bindings::{HttpPostBinding, HttpRedirectBinding, MessageParam};
use crate::error::{SamlError, SamlResult};
use crate::types::{
    authn_context, logout_reasons, AuthnRequest, LogoutRequest, LogoutResponse, NameId,
    ProtocolMessage, Status,
};
use crate::xml::XmlSecurityProvider;

/// Builds and encodes the messages the SP sends.
#[derive(Clone)]
pub struct RequestBuilder {
    config: Arc<SpConfig>,
    security: Arc<dyn XmlSecurityProvider>,
}

impl RequestBuilder {
    /// Creates a builder.
    pub fn new(config: Arc<SpConfig>, security: Arc<dyn XmlSecurityProvider>) -> Self {
        Self { config, security }
    }

    /// Creates an AuthnRequest to the configured IdP SSO endpoint.
    ///
    /// The request asks for the HTTP-POST binding back to the ACS, the
    /// configured NameID format (creation allowed) and exactly
    /// PasswordProtectedTransport.
    #[must_use]
    pub fn create_authn_request(&self) -> AuthnRequest {
        AuthnRequest::new(
            self.config.entity_id.as_str(),
            self.config.idp_sso_url.as_str(),
            self.config.acs_url.as_str(),
        )
        .with_name_id_policy(self.config.name_id_format.as_str(), true)
        .with_exact_authn_context(authn_context::PASSWORD_PROTECTED_TRANSPORT)
    }

    /// Encodes `request` as an HTTP-Redirect URL.
    pub fn create_redirect_url(&self, request: &AuthnRequest, relay_state: Option<&str>) -> SamlResult<String> {
        self.redirect_url(&request.clone().into(), relay_state)
    }

    /// Encodes `request` as an HTTP-POST form body.
    pub fn create_post_form_data(&self, request: &AuthnRequest, relay_state: Option<&str>) -> SamlResult<String> {
        self.post_form_data(&request.clone().into(), relay_state)
    }

    /// Creates a LogoutRequest to the IdP SLO endpoint for `name_id`.
    #[must_use]
    pub fn create_logout_request(&self, name_id: &str, session_index: Option<&str>) -> LogoutRequest {
        let name_id = NameId::new(name_id).with_format(self.config.name_id_format.as_str());
        let request = LogoutRequest::new(
            self.config.entity_id.as_str(),
            self.config.idp_slo_url.as_str(),
            name_id,
        )
        .with_reason(logout_reasons::USER);

        match session_index.filter(|s| !s.is_empty()) {
            Some(index) => request.with_session_index(index),
            None => request,
        }
    }

    /// Creates a LogoutResponse to the IdP SLO endpoint answering `in_response_to`.
    #[must_use]
    pub fn create_logout_response(&self, in_response_to: &str, success: bool) -> LogoutResponse {
        LogoutResponse::new(
            self.config.entity_id.as_str(),
            self.config.idp_slo_url.as_str(),
            Status::from_outcome(success),
        )
        .in_response_to(in_response_to)
    }

    /// Encodes any message as an HTTP-Redirect URL to its Destination.
    pub fn redirect_url(&self, message: &ProtocolMessage, relay_state: Option<&str>) -> SamlResult<String> {
        let xml = self.security.serialize(message)?;
        HttpRedirectBinding::build_url(destination(message)?, param_for(message), &xml, relay_state)
    }

    /// Encodes any message as an HTTP-POST form body.
    pub fn post_form_data(&self, message: &ProtocolMessage, relay_state: Option<&str>) -> SamlResult<String> {
        let xml = self.security.serialize(message)?;
        Ok(HttpPostBinding::form_data(param_for(message), &xml, relay_state))
    }

    /// Renders an auto-submitting HTML form posting `message` to its Destination.
    pub fn post_form_page(&self, message: &ProtocolMessage, relay_state: Option<&str>) -> SamlResult<String> {
        let xml = self.security.serialize(message)?;
        Ok(HttpPostBinding::auto_submit_form(
            destination(message)?,
            param_for(message),
            &xml,
            relay_state,
        ))
    }
}

fn param_for(message: &ProtocolMessage) -> MessageParam {
    match message {
        ProtocolMessage::AuthnRequest(_) | ProtocolMessage::LogoutRequest(_) => MessageParam::Request,
        ProtocolMessage::Response(_) | ProtocolMessage::LogoutResponse(_) => MessageParam::Response,
    }
}

fn destination(message: &ProtocolMessage) -> SamlResult<&str> {
    let destination = match message {
        ProtocolMessage::AuthnRequest(m) => Some(m.destination.as_str()),
        ProtocolMessage::Response(m) => m.destination.as_deref(),
        ProtocolMessage::LogoutRequest(m) => m.destination.as_deref(),
        ProtocolMessage::LogoutResponse(m) => m.destination.as_deref(),
    };
    destination
        .filter(|d| !d.is_empty())
        .ok_or_else(|| SamlError::EncodingFailure(format!("{} has no Destination", message.element_name())))
}
