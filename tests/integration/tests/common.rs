//! Common test utilities and fixtures.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use chrono::{SecondsFormat, TimeDelta, Utc};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use sp_core::SpConfig;
use sp_protocol_saml::bindings::{compress_and_encode, encode_base64};
use sp_protocol_saml::{
    Certificate, DefaultXmlSecurity, ProtocolMessage, SamlResult, ServiceProvider, SignatureNode,
    XmlSecurityProvider,
};
use sp_session::{ReplayCache, SessionStore};

pub const IDP: &str = "https://idp.example";
pub const ACS: &str = "https://sp.example/acs";
pub const SLO: &str = "https://sp.example/slo";

/// Real parsing with a fixed signature verdict.
pub struct FixedVerdict(pub bool);

impl XmlSecurityProvider for FixedVerdict {
    fn parse(&self, xml: &[u8]) -> SamlResult<ProtocolMessage> {
        DefaultXmlSecurity::default().parse(xml)
    }

    fn serialize(&self, message: &ProtocolMessage) -> SamlResult<String> {
        DefaultXmlSecurity::default().serialize(message)
    }

    fn verify_signature(&self, _signature: &SignatureNode, _certificate: &Certificate) -> bool {
        self.0
    }

    fn load_certificate(&self, pem: &str) -> SamlResult<Certificate> {
        Ok(Certificate::from_public_key(pem.as_bytes().to_vec()))
    }
}

/// In-memory test environment around the server router.
pub struct TestEnv {
    /// Application router, security layers included.
    pub app: Router,
    /// Session store shared with the service provider.
    pub sessions: Arc<SessionStore>,
}

impl TestEnv {
    /// Environment with a certificate and signatures that verify.
    pub fn new() -> Self {
        Self::with(
            SpConfig {
                idp_certificate: Some("test-certificate".to_string()),
                ..SpConfig::for_testing()
            },
            true,
        )
    }

    /// Environment whose signature checks always fail.
    pub fn rejecting_signatures() -> Self {
        Self::with(
            SpConfig {
                idp_certificate: Some("test-certificate".to_string()),
                ..SpConfig::for_testing()
            },
            false,
        )
    }

    /// Environment over an explicit configuration.
    pub fn with(config: SpConfig, verdict: bool) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("sp_=debug")
            .with_test_writer()
            .try_init();

        let sessions = Arc::new(SessionStore::new(config.session_ttl()));
        let replay = Arc::new(ReplayCache::new(config.replay_window()));
        let sp = ServiceProvider::new(config, Arc::new(FixedVerdict(verdict)), Arc::clone(&sessions), replay)
            .expect("service provider");

        Self {
            app: sp_server::create_router(Arc::new(sp)),
            sessions,
        }
    }

    /// Sends a GET and returns status, headers and the body as JSON (or a string).
    pub async fn get(&self, uri: &str) -> (StatusCode, HeaderMap, Value) {
        let request = Request::get(uri).body(Body::empty()).expect("request");
        self.send(request).await
    }

    /// Sends an urlencoded form POST.
    pub async fn post_form(&self, uri: &str, fields: &[(&str, &str)]) -> (StatusCode, HeaderMap, Value) {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .expect("request");
        self.send(request).await
    }

    /// Posts a Response to the ACS and returns the outcome body.
    pub async fn login(&self, response: &IdpResponse) -> Value {
        let encoded = response.post();
        let (status, _, body) = self.post_form("/saml/acs", &[("SAMLResponse", encoded.as_str())]).await;
        assert_eq!(status, StatusCode::OK, "ACS answered {body}");
        body
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = self.app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, headers, body)
    }
}

/// Timestamp `offset_secs` from now in SAML form.
pub fn instant(offset_secs: i64) -> String {
    (Utc::now() + TimeDelta::seconds(offset_secs)).to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// An IdP Response issued just now for `alice@example.com`.
#[derive(Debug, Clone)]
pub struct IdpResponse {
    pub id: String,
    pub issuer: String,
    pub destination: String,
    pub status: String,
    pub assertion_id: String,
    pub audience: String,
    pub session_index: Option<String>,
    pub not_on_or_after: String,
    pub one_time_use: bool,
    pub signed: bool,
}

impl Default for IdpResponse {
    fn default() -> Self {
        Self {
            id: "_response-1".to_string(),
            issuer: IDP.to_string(),
            destination: ACS.to_string(),
            status: "urn:oasis:names:tc:SAML:2.0:status:Success".to_string(),
            assertion_id: "_assertion-1".to_string(),
            audience: "https://sp.example".to_string(),
            session_index: Some("_idp-session-1".to_string()),
            not_on_or_after: instant(300),
            one_time_use: false,
            signed: true,
        }
    }
}

impl IdpResponse {
    /// A default response with the given ID.
    pub fn with_id(id: &str) -> Self {
        Self {
            id: id.to_string(),
            assertion_id: format!("{id}-assertion"),
            ..Self::default()
        }
    }

    pub fn xml(&self) -> String {
        let signature = if self.signed { signature_block(&self.assertion_id) } else { String::new() };
        let session_index = self
            .session_index
            .as_ref()
            .map(|s| format!(r#" SessionIndex="{s}""#))
            .unwrap_or_default();
        let one_time_use = if self.one_time_use { "<saml:OneTimeUse/>" } else { "" };
        let issued = instant(-5);

        format!(
            r#"<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="{id}" Version="2.0" IssueInstant="{issued}" Destination="{destination}"><saml:Issuer>{issuer}</saml:Issuer><samlp:Status><samlp:StatusCode Value="{status}"/></samlp:Status><saml:Assertion ID="{assertion_id}" Version="2.0" IssueInstant="{issued}"><saml:Issuer>{issuer}</saml:Issuer>{signature}<saml:Subject><saml:NameID Format="urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress">alice@example.com</saml:NameID><saml:SubjectConfirmation Method="urn:oasis:names:tc:SAML:2.0:cm:bearer"><saml:SubjectConfirmationData NotOnOrAfter="{noa}" Recipient="{ACS}"/></saml:SubjectConfirmation></saml:Subject><saml:Conditions NotBefore="{nb}" NotOnOrAfter="{noa}"><saml:AudienceRestriction><saml:Audience>{audience}</saml:Audience></saml:AudienceRestriction>{one_time_use}</saml:Conditions><saml:AuthnStatement AuthnInstant="{issued}"{session_index}/><saml:AttributeStatement><saml:Attribute Name="givenName"><saml:AttributeValue>Alice</saml:AttributeValue></saml:Attribute><saml:Attribute Name="groups"><saml:AttributeValue>admins</saml:AttributeValue><saml:AttributeValue>staff</saml:AttributeValue></saml:Attribute></saml:AttributeStatement></saml:Assertion></samlp:Response>"#,
            id = self.id,
            destination = self.destination,
            issuer = self.issuer,
            status = self.status,
            assertion_id = self.assertion_id,
            noa = self.not_on_or_after,
            nb = instant(-60),
            audience = self.audience,
        )
    }

    /// Base64 for the POST binding.
    pub fn post(&self) -> String {
        encode_base64(&self.xml())
    }

    /// DEFLATE + Base64 for the Redirect binding, not yet URL-encoded.
    pub fn redirect(&self) -> String {
        compress_and_encode(&self.xml()).expect("deflate")
    }
}

/// LogoutRequest from the IdP for `alice@example.com`.
pub fn idp_logout_request(id: &str, session_index: Option<&str>) -> String {
    let index = session_index
        .map(|s| format!("<samlp:SessionIndex>{s}</samlp:SessionIndex>"))
        .unwrap_or_default();
    format!(
        r#"<samlp:LogoutRequest xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="{id}" Version="2.0" IssueInstant="{issued}" Destination="{SLO}" NotOnOrAfter="{noa}"><saml:Issuer>{IDP}</saml:Issuer><saml:NameID Format="urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress">alice@example.com</saml:NameID>{index}</samlp:LogoutRequest>"#,
        issued = instant(-5),
        noa = instant(300),
    )
}

/// LogoutResponse from the IdP answering `in_response_to`.
pub fn idp_logout_response(id: &str, in_response_to: &str, status: &str) -> String {
    format!(
        r#"<samlp:LogoutResponse xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="{id}" Version="2.0" IssueInstant="{issued}" Destination="{SLO}" InResponseTo="{in_response_to}"><saml:Issuer>{IDP}</saml:Issuer><samlp:Status><samlp:StatusCode Value="{status}"/></samlp:Status></samlp:LogoutResponse>"#,
        issued = instant(-5),
    )
}

/// A structurally complete signature; its values are judged by [`FixedVerdict`].
fn signature_block(id: &str) -> String {
    format!(
        r##"<ds:Signature xmlns:ds="http://www.w3.org/2000/09/xmldsig#"><ds:SignedInfo><ds:CanonicalizationMethod Algorithm="http://www.w3.org/2001/10/xml-exc-c14n#"/><ds:SignatureMethod Algorithm="http://www.w3.org/2001/04/xmldsig-more#rsa-sha256"/><ds:Reference URI="#{id}"><ds:Transforms><ds:Transform Algorithm="http://www.w3.org/2000/09/xmldsig#enveloped-signature"/></ds:Transforms><ds:DigestMethod Algorithm="http://www.w3.org/2001/04/xmlenc#sha256"/><ds:DigestValue>AAAA</ds:DigestValue></ds:Reference></ds:SignedInfo><ds:SignatureValue>AAAA</ds:SignatureValue></ds:Signature>"##
    )
}
