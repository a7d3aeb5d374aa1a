//! Response validation pipeline.
//!
//! Every stage is a hard gate. The stage that rejected a response is logged
//! here with its reason; callers only ever see the error's
//! [`public_message`](SamlError::public_message).
//!
//! Stages, in order:
//!
//! 1. decode per binding, then parse (`MalformedMessage`)
//! 2. top-level status is Success (`IdpReportedFailure`)
//! 3. Issuer is the configured IdP
//! 4. Destination is the ACS URL
//! 5. IssueInstant within the allowed age
//! 6. response ID first seen (`ReplayDetected`)
//! 7. per assertion: issuer, subject, confirmation data, conditions,
//!    audience, signature, then OneTimeUse (`ReplayDetected`)
//! 8. response signature
//!
//! Failures in 3 to 8 other than replays are `ValidationFailed`.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use sp_core::SpConfig;
use sp_session::ReplayCache;
use tracing::{debug, warn};

use crate::bindings::Binding;
use crate::error::{SamlError, SamlResult};
use crate::signature::{Certificate, SignatureNode};
use crate::types::{Assertion, ProtocolMessage, Response};
use crate::xml::XmlSecurityProvider;

/// How signatures are treated, fixed at construction.
#[derive(Debug, Clone)]
pub(crate) enum TrustAnchor {
    /// Verify against this certificate.
    Certificate(Certificate),
    /// No certificate and unsigned messages explicitly allowed.
    SkipVerification,
    /// No certificate; anything needing a signature fails.
    Missing,
}

impl TrustAnchor {
    pub(crate) fn new(config: &SpConfig, certificate: Option<Certificate>) -> Self {
        match certificate {
            Some(cert) => Self::Certificate(cert),
            None if config.allow_unsigned_without_certificate => Self::SkipVerification,
            None => Self::Missing,
        }
    }

    pub(crate) const fn skips_verification(&self) -> bool {
        matches!(self, Self::SkipVerification)
    }

    /// Checks `signature`, returning the reason it was not accepted.
    pub(crate) fn verify(&self, security: &dyn XmlSecurityProvider, signature: &SignatureNode) -> Result<(), String> {
        match self {
            Self::Certificate(cert) if security.verify_signature(signature, cert) => Ok(()),
            Self::Certificate(_) => Err(format!("signature on {} did not verify", signature.element_id)),
            Self::SkipVerification => Ok(()),
            Self::Missing => Err("no IdP certificate configured".to_string()),
        }
    }
}

/// A rejected response with the stage that rejected it.
struct Rejection {
    stage: &'static str,
    error: SamlError,
}

impl Rejection {
    fn new(stage: &'static str, error: SamlError) -> Self {
        Self { stage, error }
    }

    fn invalid(stage: &'static str, reason: impl Into<String>) -> Self {
        Self::new(stage, SamlError::validation(reason))
    }
}

type StageResult<T> = Result<T, Rejection>;

/// Validates inbound Responses against the SP configuration.
pub struct ResponseValidator {
    config: Arc<SpConfig>,
    security: Arc<dyn XmlSecurityProvider>,
    trust: TrustAnchor,
    replay: Arc<ReplayCache>,
}

impl ResponseValidator {
    /// Creates a validator.
    ///
    /// `certificate` is the trusted IdP certificate. Without one, signed
    /// content is rejected unless the configuration explicitly allows
    /// unsigned responses.
    pub fn new(
        config: Arc<SpConfig>,
        security: Arc<dyn XmlSecurityProvider>,
        certificate: Option<Certificate>,
        replay: Arc<ReplayCache>,
    ) -> Self {
        let trust = TrustAnchor::new(&config, certificate);
        Self {
            config,
            security,
            trust,
            replay,
        }
    }

    /// Validates a wire-encoded Response received over `binding`.
    pub fn validate(&self, encoded: &str, binding: Binding) -> SamlResult<Response> {
        self.validate_at(encoded, binding, Utc::now())
    }

    /// [`ResponseValidator::validate`] evaluated at `now`.
    pub fn validate_at(&self, encoded: &str, binding: Binding, now: DateTime<Utc>) -> SamlResult<Response> {
        let response = match self.decode(encoded, binding) {
            Ok(response) => response,
            Err(rejection) => {
                warn!(stage = rejection.stage, reason = %rejection.error, "SAML response rejected");
                return Err(rejection.error);
            }
        };

        match self.check(&response, now) {
            Ok(()) => {
                debug!(response_id = %response.id, "SAML response accepted");
                Ok(response)
            }
            Err(rejection) => {
                warn!(
                    stage = rejection.stage,
                    reason = %rejection.error,
                    response_id = %response.id,
                    "SAML response rejected"
                );
                Err(rejection.error)
            }
        }
    }

    fn decode(&self, encoded: &str, binding: Binding) -> StageResult<Response> {
        let xml = binding.decode(encoded).map_err(|e| Rejection::new("decode", e))?;
        match self.security.parse(xml.as_bytes()) {
            Ok(ProtocolMessage::Response(response)) => Ok(response),
            Ok(other) => Err(Rejection::new(
                "parse",
                SamlError::malformed(format!("expected Response, got {}", other.element_name())),
            )),
            Err(e) => Err(Rejection::new("parse", e)),
        }
    }

    fn check(&self, response: &Response, now: DateTime<Utc>) -> StageResult<()> {
        if !response.is_success() {
            return Err(Rejection::new(
                "status",
                SamlError::IdpReportedFailure(response.status.code.describe()),
            ));
        }

        self.check_issuer("issuer", response.issuer.as_deref())?;

        if response.destination.as_deref() != Some(self.config.acs_url.as_str()) {
            return Err(Rejection::invalid(
                "destination",
                format!("destination {:?} is not the ACS URL", response.destination),
            ));
        }

        self.check_freshness(response.issue_instant, now)?;

        let fresh_until = response
            .issue_instant
            .checked_add_signed(self.max_response_age())
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        if !self.replay.check_and_record_until(&response.id, now, fresh_until) {
            return Err(Rejection::new(
                "replay",
                SamlError::ReplayDetected(format!("response {} already consumed", response.id)),
            ));
        }

        if self.trust.skips_verification() {
            warn!(
                response_id = %response.id,
                "no IdP certificate configured; signature verification skipped"
            );
        }

        if response.assertions.is_empty() {
            return Err(Rejection::invalid("assertion", "response contains no assertion"));
        }
        for assertion in &response.assertions {
            self.check_assertion(assertion, response.signature.is_some(), now)?;
        }

        if let Some(signature) = &response.signature {
            self.check_signature("response_signature", signature)?;
        }
        Ok(())
    }

    fn check_issuer(&self, stage: &'static str, issuer: Option<&str>) -> StageResult<()> {
        match issuer {
            Some(issuer) if issuer == self.config.idp_entity_id => Ok(()),
            other => Err(Rejection::invalid(stage, format!("unexpected issuer {other:?}"))),
        }
    }

    fn max_response_age(&self) -> TimeDelta {
        TimeDelta::from_std(self.config.max_response_age()).unwrap_or(TimeDelta::MAX)
    }

    fn check_freshness(&self, issue_instant: DateTime<Utc>, now: DateTime<Utc>) -> StageResult<()> {
        let max_age = self.max_response_age();
        if now.checked_sub_signed(max_age).is_some_and(|earliest| issue_instant < earliest) {
            return Err(Rejection::invalid("issue_instant", format!("issued too long ago at {issue_instant}")));
        }
        if now.checked_add_signed(max_age).is_some_and(|latest| issue_instant > latest) {
            return Err(Rejection::invalid("issue_instant", format!("issued in the future at {issue_instant}")));
        }
        Ok(())
    }

    fn check_assertion(&self, assertion: &Assertion, response_signed: bool, now: DateTime<Utc>) -> StageResult<()> {
        self.check_issuer("assertion_issuer", assertion.issuer.as_deref())?;

        let subject = assertion
            .subject
            .as_ref()
            .ok_or_else(|| Rejection::invalid("subject", format!("assertion {} has no subject", assertion.id)))?;
        if !subject.name_id.as_ref().is_some_and(|n| !n.value.is_empty()) {
            return Err(Rejection::invalid("subject", format!("assertion {} has no NameID", assertion.id)));
        }

        for confirmation in &subject.confirmations {
            let data = confirmation.data.as_ref().ok_or_else(|| {
                Rejection::invalid(
                    "subject_confirmation",
                    format!("assertion {} has a confirmation without data", assertion.id),
                )
            })?;
            if let Some(recipient) = &data.recipient {
                if *recipient != self.config.acs_url {
                    return Err(Rejection::invalid(
                        "subject_confirmation",
                        format!("recipient {recipient} is not the ACS URL"),
                    ));
                }
            }
            if data.not_on_or_after.is_some_and(|noa| now >= noa) {
                return Err(Rejection::invalid("subject_confirmation", "subject confirmation expired"));
            }
            if data.not_before.is_some_and(|nb| now < nb) {
                return Err(Rejection::invalid("subject_confirmation", "subject confirmation not yet valid"));
            }
        }

        if let Some(conditions) = &assertion.conditions {
            if !conditions.is_valid_at(now) {
                return Err(Rejection::invalid(
                    "conditions",
                    format!("assertion {} outside its validity window", assertion.id),
                ));
            }
            if !conditions.permits_audience(&self.config.entity_id) {
                return Err(Rejection::invalid(
                    "audience",
                    format!("assertion {} not addressed to {}", assertion.id, self.config.entity_id),
                ));
            }
        }

        match &assertion.signature {
            Some(signature) => self.check_signature("assertion_signature", signature)?,
            None if self.config.want_assertions_signed
                && !response_signed
                && !self.trust.skips_verification() =>
            {
                return Err(Rejection::invalid(
                    "assertion_signature",
                    format!("assertion {} is not signed", assertion.id),
                ));
            }
            None => {}
        }

        let one_time = assertion.conditions.as_ref().filter(|c| c.one_time_use);
        if let Some(conditions) = one_time {
            let keep_until = conditions.not_on_or_after.unwrap_or(now);
            if !self.replay.check_and_record_assertion_until(&assertion.id, now, keep_until) {
                return Err(Rejection::new(
                    "one_time_use",
                    SamlError::ReplayDetected(format!("assertion {} already consumed", assertion.id)),
                ));
            }
        }

        Ok(())
    }

    fn check_signature(&self, stage: &'static str, signature: &SignatureNode) -> StageResult<()> {
        self.trust
            .verify(self.security.as_ref(), signature)
            .map_err(|reason| Rejection::invalid(stage, reason))
    }
}
