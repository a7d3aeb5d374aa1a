//! Fixtures shared by unit tests.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, TimeDelta, Utc};

use crate::error::SamlResult;
use crate::signature::{Certificate, SignatureNode};
use crate::types::ProtocolMessage;
use crate::xml::{DefaultXmlSecurity, XmlSecurityProvider};

/// Fixed clock for validation tests; fixtures are issued 30 seconds earlier.
pub(crate) fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-05-01T10:00:30Z")
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap()
}

fn at(offset_secs: i64) -> String {
    (now() + TimeDelta::seconds(offset_secs)).to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

/// Real parsing and serialization with a fixed signature verdict.
pub(crate) struct StubSecurity {
    pub verdict: bool,
}

impl StubSecurity {
    pub fn accepting() -> Self {
        Self { verdict: true }
    }

    pub fn rejecting() -> Self {
        Self { verdict: false }
    }
}

impl XmlSecurityProvider for StubSecurity {
    fn parse(&self, xml: &[u8]) -> SamlResult<ProtocolMessage> {
        DefaultXmlSecurity::default().parse(xml)
    }

    fn serialize(&self, message: &ProtocolMessage) -> SamlResult<String> {
        DefaultXmlSecurity::default().serialize(message)
    }

    fn verify_signature(&self, _signature: &SignatureNode, _certificate: &Certificate) -> bool {
        self.verdict
    }

    fn load_certificate(&self, pem: &str) -> SamlResult<Certificate> {
        Ok(Certificate::from_public_key(pem.as_bytes().to_vec()))
    }
}

pub(crate) fn certificate() -> Certificate {
    Certificate::from_public_key(vec![4; 65])
}

/// A Response built field by field; defaults pass every validation stage
/// of `SpConfig::for_testing()` at [`now`].
#[derive(Debug, Clone)]
pub(crate) struct ResponseFixture {
    pub response_id: String,
    pub issuer: String,
    pub destination: Option<String>,
    pub status: String,
    pub issue_instant: String,
    pub sign_response: bool,
    pub include_assertion: bool,
    pub assertion_id: String,
    pub assertion_issuer: String,
    pub name_id: Option<String>,
    pub name_id_format: Option<String>,
    pub recipient: String,
    pub confirmation_not_on_or_after: String,
    pub confirmation_data: bool,
    pub not_before: String,
    pub not_on_or_after: String,
    pub audiences: Vec<String>,
    pub one_time_use: bool,
    pub session_index: Option<String>,
    pub attributes: Vec<(String, Vec<String>)>,
    pub sign_assertion: bool,
}

impl Default for ResponseFixture {
    fn default() -> Self {
        Self {
            response_id: "_resp1".to_string(),
            issuer: "https://idp.example".to_string(),
            destination: Some("https://sp.example/acs".to_string()),
            status: "urn:oasis:names:tc:SAML:2.0:status:Success".to_string(),
            issue_instant: at(-30),
            sign_response: false,
            include_assertion: true,
            assertion_id: "_assert1".to_string(),
            assertion_issuer: "https://idp.example".to_string(),
            name_id: Some("alice@example.com".to_string()),
            name_id_format: Some("urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress".to_string()),
            recipient: "https://sp.example/acs".to_string(),
            confirmation_not_on_or_after: at(270),
            confirmation_data: true,
            not_before: at(-90),
            not_on_or_after: at(270),
            audiences: vec!["https://sp.example".to_string()],
            one_time_use: false,
            session_index: Some("_sess1".to_string()),
            attributes: vec![
                ("givenName".to_string(), vec!["Alice".to_string()]),
                ("groups".to_string(), vec!["admins".to_string(), "staff".to_string()]),
            ],
            sign_assertion: true,
        }
    }
}

impl ResponseFixture {
    pub fn xml(&self) -> String {
        let destination = self
            .destination
            .as_ref()
            .map(|d| format!(r#" Destination="{d}""#))
            .unwrap_or_default();
        let response_sig = if self.sign_response {
            signature_block(&self.response_id)
        } else {
            String::new()
        };
        let assertion = if self.include_assertion {
            self.assertion_xml()
        } else {
            String::new()
        };

        format!(
            r#"<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="{id}" Version="2.0" IssueInstant="{instant}"{destination}><saml:Issuer>{issuer}</saml:Issuer>{response_sig}<samlp:Status><samlp:StatusCode Value="{status}"/></samlp:Status>{assertion}</samlp:Response>"#,
            id = self.response_id,
            instant = self.issue_instant,
            issuer = self.issuer,
            status = self.status,
        )
    }

    fn assertion_xml(&self) -> String {
        let signature = if self.sign_assertion {
            signature_block(&self.assertion_id)
        } else {
            String::new()
        };
        let name_id = self
            .name_id
            .as_ref()
            .map(|value| {
                let format = self
                    .name_id_format
                    .as_ref()
                    .map(|f| format!(r#" Format="{f}""#))
                    .unwrap_or_default();
                format!("<saml:NameID{format}>{value}</saml:NameID>")
            })
            .unwrap_or_default();
        let audiences: String = self
            .audiences
            .iter()
            .map(|a| format!("<saml:Audience>{a}</saml:Audience>"))
            .collect();
        let confirmation_data = if self.confirmation_data {
            format!(
                r#"<saml:SubjectConfirmationData NotOnOrAfter="{}" Recipient="{}"/>"#,
                self.confirmation_not_on_or_after, self.recipient
            )
        } else {
            String::new()
        };
        let one_time_use = if self.one_time_use { "<saml:OneTimeUse/>" } else { "" };
        let session_index = self
            .session_index
            .as_ref()
            .map(|s| format!(r#" SessionIndex="{s}""#))
            .unwrap_or_default();
        let attributes: String = self
            .attributes
            .iter()
            .map(|(name, values)| {
                let values: String = values
                    .iter()
                    .map(|v| format!("<saml:AttributeValue>{v}</saml:AttributeValue>"))
                    .collect();
                format!(r#"<saml:Attribute Name="{name}">{values}</saml:Attribute>"#)
            })
            .collect();

        format!(
            r#"<saml:Assertion ID="{id}" Version="2.0" IssueInstant="{instant}"><saml:Issuer>{issuer}</saml:Issuer>{signature}<saml:Subject>{name_id}<saml:SubjectConfirmation Method="urn:oasis:names:tc:SAML:2.0:cm:bearer">{confirmation_data}</saml:SubjectConfirmation></saml:Subject><saml:Conditions NotBefore="{nb}" NotOnOrAfter="{noa}"><saml:AudienceRestriction>{audiences}</saml:AudienceRestriction>{one_time_use}</saml:Conditions><saml:AuthnStatement AuthnInstant="{instant}"{session_index}/><saml:AttributeStatement>{attributes}</saml:AttributeStatement></saml:Assertion>"#,
            id = self.assertion_id,
            instant = self.issue_instant,
            issuer = self.assertion_issuer,
            nb = self.not_before,
            noa = self.not_on_or_after,
        )
    }

    /// Base64 for the POST binding.
    pub fn post(&self) -> String {
        STANDARD.encode(self.xml())
    }
}

/// A structurally complete signature whose values are never checked by
/// [`StubSecurity`].
fn signature_block(id: &str) -> String {
    format!(
        r##"<ds:Signature xmlns:ds="http://www.w3.org/2000/09/xmldsig#"><ds:SignedInfo><ds:CanonicalizationMethod Algorithm="http://www.w3.org/2001/10/xml-exc-c14n#"/><ds:SignatureMethod Algorithm="http://www.w3.org/2001/04/xmldsig-more#rsa-sha256"/><ds:Reference URI="#{id}"><ds:Transforms><ds:Transform Algorithm="http://www.w3.org/2000/09/xmldsig#enveloped-signature"/></ds:Transforms><ds:DigestMethod Algorithm="http://www.w3.org/2001/04/xmlenc#sha256"/><ds:DigestValue>AAAA</ds:DigestValue></ds:Reference></ds:SignedInfo><ds:SignatureValue>AAAA</ds:SignatureValue></ds:Signature>"##
    )
}
