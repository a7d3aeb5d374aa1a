//! Service provider facade.
//!
//! [`ServiceProvider`] wires the request builder, response validator,
//! identity extractor and logout orchestrator to the injected session and
//! replay stores, and turns their results into caller-facing outcomes.
//!
//! Outcomes never carry the internal failure reason. Their `http_status`
//! comes from [`SamlError::http_status`].

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sp_core::SpConfig;
use sp_session::{ReplayCache, Session, SessionStore};
use tracing::{info, warn};

use crate::bindings::Binding;
use crate::builder::RequestBuilder;
use crate::error::{SamlError, SamlResult};
use crate::identity::extract_identity;
use crate::metadata::sp_metadata;
use crate::slo::LogoutOrchestrator;
use crate::validator::ResponseValidator;
use crate::xml::XmlSecurityProvider;

/// Message of a successful login.
pub const LOGIN_SUCCESS: &str = "Authentication successful";
/// Message of a successful logout.
pub const LOGOUT_SUCCESS: &str = "Logout successful";

/// Result of starting a login or logout: where to send the browser.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOutcome {
    /// Whether a request was built.
    pub success: bool,
    /// URL to redirect the browser to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    /// ID of the request that was built.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Human-readable status.
    pub message: String,
    /// HTTP status an endpoint should answer with.
    #[serde(skip)]
    pub http_status: u16,
}

impl LoginOutcome {
    fn redirect(request_id: String, url: String, message: &str) -> Self {
        Self {
            success: true,
            redirect_url: Some(url),
            request_id: Some(request_id),
            message: message.to_string(),
            http_status: 200,
        }
    }

    pub(crate) fn failure(error: &SamlError) -> Self {
        Self {
            success: false,
            redirect_url: None,
            request_id: None,
            message: error.public_message().to_string(),
            http_status: error.http_status(),
        }
    }
}

/// Result of consuming a Response at the ACS.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcsOutcome {
    /// Whether the user is now authenticated.
    pub success: bool,
    /// Human-readable status.
    pub message: String,
    /// Authenticated NameID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    /// RelayState echoed back.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relay_state: Option<String>,
    /// Identity attributes.
    pub attributes: HashMap<String, String>,
    /// Session created for the user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// HTTP status an endpoint should answer with.
    #[serde(skip)]
    pub http_status: u16,
}

impl AcsOutcome {
    pub(crate) fn failure(error: &SamlError, relay_state: Option<String>) -> Self {
        Self {
            success: false,
            message: error.public_message().to_string(),
            user_name: None,
            relay_state,
            attributes: HashMap::new(),
            session_id: None,
            http_status: error.http_status(),
        }
    }
}

/// Result of handling an inbound logout message.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SloOutcome {
    /// Whether the logout was accepted.
    pub success: bool,
    /// Human-readable status.
    pub message: String,
    /// RelayState echoed back.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relay_state: Option<String>,
    /// LogoutResponse redirect back to the IdP, for IdP-initiated logout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    /// HTTP status an endpoint should answer with.
    #[serde(skip)]
    pub http_status: u16,
}

impl SloOutcome {
    pub(crate) fn failure(error: &SamlError, relay_state: Option<String>, redirect_url: Option<String>) -> Self {
        Self {
            success: false,
            message: error.public_message().to_string(),
            relay_state,
            redirect_url,
            http_status: error.http_status(),
        }
    }
}

/// A SAML service provider bound to one IdP.
pub struct ServiceProvider {
    config: Arc<SpConfig>,
    builder: RequestBuilder,
    validator: ResponseValidator,
    logout: LogoutOrchestrator,
    sessions: Arc<SessionStore>,
}

impl ServiceProvider {
    /// Creates a service provider over the given stores.
    ///
    /// The configuration is validated and the IdP certificate, if any, is
    /// loaded here so that either fault stops startup.
    pub fn new(
        config: SpConfig,
        security: Arc<dyn XmlSecurityProvider>,
        sessions: Arc<SessionStore>,
        replay: Arc<ReplayCache>,
    ) -> SamlResult<Self> {
        config.validate()?;

        let certificate = match config.idp_certificate.as_deref().filter(|pem| !pem.trim().is_empty()) {
            Some(pem) => {
                let certificate = security.load_certificate(pem)?;
                if certificate.is_expired_at(Utc::now()) {
                    warn!(subject = certificate.subject(), "IdP certificate has expired");
                }
                Some(certificate)
            }
            None if config.allow_unsigned_without_certificate => {
                warn!("no IdP certificate configured; signatures will not be verified");
                None
            }
            None => {
                warn!("no IdP certificate configured; signed responses will be rejected");
                None
            }
        };

        let config = Arc::new(config);
        Ok(Self {
            builder: RequestBuilder::new(Arc::clone(&config), Arc::clone(&security)),
            validator: ResponseValidator::new(
                Arc::clone(&config),
                Arc::clone(&security),
                certificate.clone(),
                Arc::clone(&replay),
            ),
            logout: LogoutOrchestrator::new(
                Arc::clone(&config),
                security,
                certificate,
                Arc::clone(&sessions),
                replay,
            ),
            sessions,
            config,
        })
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &SpConfig {
        &self.config
    }

    /// The request builder.
    #[must_use]
    pub fn builder(&self) -> &RequestBuilder {
        &self.builder
    }

    /// The session store.
    #[must_use]
    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Builds an AuthnRequest and the redirect URL carrying it.
    pub fn initiate_login(&self, relay_state: Option<&str>) -> LoginOutcome {
        let request = self.builder.create_authn_request();
        match self.builder.create_redirect_url(&request, relay_state) {
            Ok(url) => {
                info!(request_id = %request.id, "login initiated");
                LoginOutcome::redirect(request.id, url, "Redirecting to identity provider")
            }
            Err(error) => {
                warn!(reason = %error, "failed to build AuthnRequest");
                LoginOutcome::failure(&error)
            }
        }
    }

    /// Validates a Response and, on success, opens a session.
    pub fn consume_response(&self, encoded: &str, binding: Binding, relay_state: Option<String>) -> AcsOutcome {
        self.consume_response_at(encoded, binding, relay_state, Utc::now())
    }

    /// [`ServiceProvider::consume_response`] evaluated at `now`.
    pub fn consume_response_at(
        &self,
        encoded: &str,
        binding: Binding,
        relay_state: Option<String>,
        now: DateTime<Utc>,
    ) -> AcsOutcome {
        let identity = self
            .validator
            .validate_at(encoded, binding, now)
            .and_then(|response| extract_identity(&response).map(|identity| (response.id, identity)));

        let (response_id, identity) = match identity {
            Ok(found) => found,
            Err(error) => return AcsOutcome::failure(&error, relay_state),
        };

        let session_index = identity.session_index.clone().unwrap_or(response_id);
        let session_id = self.sessions.create_at(
            identity.name_id.as_str(),
            Some(session_index),
            identity.attributes.clone(),
            now,
        );
        info!(name_id = %identity.name_id, "user authenticated");

        AcsOutcome {
            success: true,
            message: LOGIN_SUCCESS.to_string(),
            user_name: Some(identity.name_id),
            relay_state,
            attributes: identity.attributes,
            session_id: Some(session_id),
            http_status: 200,
        }
    }

    /// Builds a LogoutRequest for `name_id` and the redirect URL carrying it.
    pub fn initiate_logout(&self, name_id: &str, session_index: Option<&str>, relay_state: Option<&str>) -> LoginOutcome {
        if name_id.is_empty() {
            return LoginOutcome::failure(&SamlError::malformed("NameID is required"));
        }

        let request = self.builder.create_logout_request(name_id, session_index);
        let request_id = request.id.clone();
        match self.builder.redirect_url(&request.into(), relay_state) {
            Ok(url) => {
                info!(request_id = %request_id, "logout initiated");
                LoginOutcome::redirect(request_id, url, "Redirecting to identity provider for logout")
            }
            Err(error) => {
                warn!(reason = %error, "failed to build LogoutRequest");
                LoginOutcome::failure(&error)
            }
        }
    }

    /// Handles an IdP-initiated LogoutRequest and answers with a
    /// LogoutResponse redirect.
    pub fn handle_logout_request(&self, encoded: &str, binding: Binding, relay_state: Option<String>) -> SloOutcome {
        self.handle_logout_request_at(encoded, binding, relay_state, Utc::now())
    }

    /// [`ServiceProvider::handle_logout_request`] evaluated at `now`.
    pub fn handle_logout_request_at(
        &self,
        encoded: &str,
        binding: Binding,
        relay_state: Option<String>,
        now: DateTime<Utc>,
    ) -> SloOutcome {
        let request = match self.logout.decode_logout_request(encoded, binding) {
            Ok(request) => request,
            Err(error) => return SloOutcome::failure(&error, relay_state, None),
        };

        let result = self.logout.apply_logout_request_at(&request, now);
        let response = self.builder.create_logout_response(&request.id, result.is_ok());
        let redirect_url = match self.builder.redirect_url(&response.into(), relay_state.as_deref()) {
            Ok(url) => Some(url),
            Err(error) => {
                warn!(reason = %error, "failed to build LogoutResponse");
                return SloOutcome::failure(&error, relay_state, None);
            }
        };

        match result {
            Ok(_) => SloOutcome {
                success: true,
                message: LOGOUT_SUCCESS.to_string(),
                relay_state,
                redirect_url,
                http_status: 200,
            },
            Err(error) => SloOutcome::failure(&error, relay_state, redirect_url),
        }
    }

    /// Handles the IdP's LogoutResponse to an SP-initiated logout.
    pub fn handle_logout_response(&self, encoded: &str, binding: Binding, relay_state: Option<String>) -> SloOutcome {
        match self.logout.process_logout_response(encoded, binding) {
            Ok(_) => SloOutcome {
                success: true,
                message: LOGOUT_SUCCESS.to_string(),
                relay_state,
                redirect_url: None,
                http_status: 200,
            },
            Err(error) => SloOutcome::failure(&error, relay_state, None),
        }
    }

    /// Looks up a live session.
    pub fn session(&self, session_id: &str) -> SamlResult<Session> {
        let session = self.sessions.require(session_id)?;
        Ok(Session::clone(&session))
    }

    /// Ends a local session without involving the IdP.
    pub fn end_session(&self, session_id: &str) -> bool {
        self.sessions.invalidate(session_id)
    }

    /// SP metadata document.
    #[must_use]
    pub fn metadata(&self) -> String {
        sp_metadata(&self.config)
    }
}
