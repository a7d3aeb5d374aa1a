//! Single Logout.
//!
//! Inbound LogoutRequests from the IdP end the subject's local sessions;
//! inbound LogoutResponses confirm an SP-initiated logout. Both share the
//! replay cache and signature policy of the login flow.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sp_core::SpConfig;
use sp_session::{ReplayCache, SessionStore};
use tracing::{info, warn};

use crate::bindings::Binding;
use crate::error::{SamlError, SamlResult};
use crate::signature::{Certificate, SignatureNode};
use crate::types::{LogoutRequest, LogoutResponse, ProtocolMessage};
use crate::validator::TrustAnchor;
use crate::xml::XmlSecurityProvider;

/// Result of an accepted IdP-initiated LogoutRequest.
#[derive(Debug, Clone)]
pub struct LogoutRequestOutcome {
    /// The validated request.
    pub request: LogoutRequest,
    /// Number of local sessions ended.
    pub sessions_removed: usize,
}

/// Validates inbound logout messages and ends sessions.
pub struct LogoutOrchestrator {
    config: Arc<SpConfig>,
    security: Arc<dyn XmlSecurityProvider>,
    trust: TrustAnchor,
    sessions: Arc<SessionStore>,
    replay: Arc<ReplayCache>,
}

impl LogoutOrchestrator {
    /// Creates an orchestrator over the shared stores.
    pub fn new(
        config: Arc<SpConfig>,
        security: Arc<dyn XmlSecurityProvider>,
        certificate: Option<Certificate>,
        sessions: Arc<SessionStore>,
        replay: Arc<ReplayCache>,
    ) -> Self {
        let trust = TrustAnchor::new(&config, certificate);
        Self {
            config,
            security,
            trust,
            sessions,
            replay,
        }
    }

    /// Handles a LogoutRequest from the IdP and ends the matching sessions.
    pub fn process_logout_request(&self, encoded: &str, binding: Binding) -> SamlResult<LogoutRequestOutcome> {
        self.process_logout_request_at(encoded, binding, Utc::now())
    }

    /// [`LogoutOrchestrator::process_logout_request`] evaluated at `now`.
    pub fn process_logout_request_at(
        &self,
        encoded: &str,
        binding: Binding,
        now: DateTime<Utc>,
    ) -> SamlResult<LogoutRequestOutcome> {
        let request = self.decode_logout_request(encoded, binding)?;
        let sessions_removed = self.apply_logout_request_at(&request, now)?;
        Ok(LogoutRequestOutcome {
            request,
            sessions_removed,
        })
    }

    /// Decodes and parses a LogoutRequest without validating it.
    pub fn decode_logout_request(&self, encoded: &str, binding: Binding) -> SamlResult<LogoutRequest> {
        match self.decode(encoded, binding)? {
            ProtocolMessage::LogoutRequest(request) => Ok(request),
            other => Err(SamlError::malformed(format!(
                "expected LogoutRequest, got {}",
                other.element_name()
            ))),
        }
    }

    /// Validates a parsed LogoutRequest and ends the matching sessions,
    /// returning how many were removed.
    pub fn apply_logout_request_at(&self, request: &LogoutRequest, now: DateTime<Utc>) -> SamlResult<usize> {
        self.check_request(request, now).map_err(|error| {
            warn!(request_id = %request.id, reason = %error, "LogoutRequest rejected");
            error
        })?;

        let name_id = request.name_id.as_ref().map(|n| n.value.as_str()).unwrap_or_default();
        let removed = self.sessions.invalidate_by_name_id(name_id, &request.session_indexes);
        info!(request_id = %request.id, sessions = removed, "IdP-initiated logout");
        Ok(removed)
    }

    /// Handles the IdP's LogoutResponse to an SP-initiated logout.
    pub fn process_logout_response(&self, encoded: &str, binding: Binding) -> SamlResult<LogoutResponse> {
        let response = match self.decode(encoded, binding)? {
            ProtocolMessage::LogoutResponse(response) => response,
            other => {
                return Err(SamlError::malformed(format!(
                    "expected LogoutResponse, got {}",
                    other.element_name()
                )))
            }
        };

        self.check_response(&response).map_err(|error| {
            warn!(response_id = %response.id, reason = %error, "LogoutResponse rejected");
            error
        })?;

        info!(response_id = %response.id, "logout confirmed by IdP");
        Ok(response)
    }

    fn decode(&self, encoded: &str, binding: Binding) -> SamlResult<ProtocolMessage> {
        let xml = binding.decode(encoded)?;
        self.security.parse(xml.as_bytes())
    }

    fn check_request(&self, request: &LogoutRequest, now: DateTime<Utc>) -> SamlResult<()> {
        self.check_issuer(request.issuer.as_deref())?;

        if let Some(destination) = &request.destination {
            if *destination != self.config.slo_url {
                return Err(SamlError::validation(format!("destination {destination} is not the SLO URL")));
            }
        }
        if request.is_expired_at(now) {
            return Err(SamlError::validation("LogoutRequest expired"));
        }
        if !request.name_id.as_ref().is_some_and(|n| !n.value.is_empty()) {
            return Err(SamlError::validation("LogoutRequest has no NameID"));
        }
        self.check_signature(request.signature.as_ref())?;

        let keep_until = request.not_on_or_after.unwrap_or(now);
        if !self.replay.check_and_record_until(&request.id, now, keep_until) {
            return Err(SamlError::ReplayDetected(format!("LogoutRequest {} already consumed", request.id)));
        }
        Ok(())
    }

    fn check_response(&self, response: &LogoutResponse) -> SamlResult<()> {
        self.check_issuer(response.issuer.as_deref())?;
        self.check_signature(response.signature.as_ref())?;

        if !self.replay.check_and_record(&response.id) {
            return Err(SamlError::ReplayDetected(format!("LogoutResponse {} already consumed", response.id)));
        }
        if !response.is_success() {
            return Err(SamlError::IdpReportedFailure(response.status.code.describe()));
        }
        Ok(())
    }

    fn check_issuer(&self, issuer: Option<&str>) -> SamlResult<()> {
        match issuer {
            Some(issuer) if issuer == self.config.idp_entity_id => Ok(()),
            other => Err(SamlError::validation(format!("unexpected issuer {other:?}"))),
        }
    }

    /// Unsigned logout messages are accepted; a signature that is present
    /// must verify.
    fn check_signature(&self, signature: Option<&SignatureNode>) -> SamlResult<()> {
        match signature {
            Some(signature) => self
                .trust
                .verify(self.security.as_ref(), signature)
                .map_err(SamlError::ValidationFailed),
            None => Ok(()),
        }
    }
}
