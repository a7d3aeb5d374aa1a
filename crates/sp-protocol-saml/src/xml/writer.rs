//! Serializes protocol objects to XML.
//!
//! Output is unsigned; captured signatures are never re-emitted.

use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::{SamlError, SamlResult};
use crate::types::{
    Assertion, AuthnRequest, LogoutRequest, LogoutResponse, NameId, ProtocolMessage, Response,
    Status, StatusCode, SAMLP_NS, SAML_NS, SAML_VERSION,
};

/// Serializes `message` without an XML declaration.
pub(crate) fn write_message(message: &ProtocolMessage) -> SamlResult<String> {
    let mut out = XmlOut::new();
    match message {
        ProtocolMessage::AuthnRequest(m) => write_authn_request(&mut out, m)?,
        ProtocolMessage::Response(m) => write_response(&mut out, m)?,
        ProtocolMessage::LogoutRequest(m) => write_logout_request(&mut out, m)?,
        ProtocolMessage::LogoutResponse(m) => write_logout_response(&mut out, m)?,
    }
    out.finish()
}

/// Formats an instant the way SAML expects (`xs:dateTime` in UTC).
pub(crate) fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn write_authn_request(out: &mut XmlOut, m: &AuthnRequest) -> SamlResult<()> {
    let issue_instant = format_instant(&m.issue_instant);
    let mut attrs = vec![
        ("xmlns:samlp", SAMLP_NS),
        ("xmlns:saml", SAML_NS),
        ("ID", m.id.as_str()),
        ("Version", SAML_VERSION),
        ("IssueInstant", issue_instant.as_str()),
        ("Destination", m.destination.as_str()),
        ("AssertionConsumerServiceURL", m.assertion_consumer_service_url.as_str()),
        ("ProtocolBinding", m.protocol_binding.uri()),
    ];
    if m.force_authn {
        attrs.push(("ForceAuthn", "true"));
    }
    if m.is_passive {
        attrs.push(("IsPassive", "true"));
    }

    out.open("samlp:AuthnRequest", &attrs)?;
    out.leaf("saml:Issuer", &[], &m.issuer)?;

    if let Some(policy) = &m.name_id_policy {
        let mut attrs = Vec::new();
        if let Some(format) = &policy.format {
            attrs.push(("Format", format.as_str()));
        }
        attrs.push(("AllowCreate", if policy.allow_create { "true" } else { "false" }));
        out.empty("samlp:NameIDPolicy", &attrs)?;
    }

    if let Some(context) = &m.requested_authn_context {
        out.open("samlp:RequestedAuthnContext", &[("Comparison", context.comparison.as_str())])?;
        for class_ref in &context.class_refs {
            out.leaf("saml:AuthnContextClassRef", &[], class_ref)?;
        }
        out.close("samlp:RequestedAuthnContext")?;
    }

    out.close("samlp:AuthnRequest")
}

fn write_response(out: &mut XmlOut, m: &Response) -> SamlResult<()> {
    let issue_instant = format_instant(&m.issue_instant);
    let mut attrs = vec![
        ("xmlns:samlp", SAMLP_NS),
        ("xmlns:saml", SAML_NS),
        ("ID", m.id.as_str()),
        ("Version", SAML_VERSION),
        ("IssueInstant", issue_instant.as_str()),
    ];
    push_opt(&mut attrs, "Destination", m.destination.as_deref());
    push_opt(&mut attrs, "InResponseTo", m.in_response_to.as_deref());

    out.open("samlp:Response", &attrs)?;
    if let Some(issuer) = &m.issuer {
        out.leaf("saml:Issuer", &[], issuer)?;
    }
    write_status(out, &m.status)?;
    for assertion in &m.assertions {
        write_assertion(out, assertion)?;
    }
    out.close("samlp:Response")
}

fn write_assertion(out: &mut XmlOut, m: &Assertion) -> SamlResult<()> {
    let issue_instant = format_instant(&m.issue_instant);
    out.open(
        "saml:Assertion",
        &[
            ("ID", m.id.as_str()),
            ("Version", SAML_VERSION),
            ("IssueInstant", issue_instant.as_str()),
        ],
    )?;
    if let Some(issuer) = &m.issuer {
        out.leaf("saml:Issuer", &[], issuer)?;
    }

    if let Some(subject) = &m.subject {
        out.open("saml:Subject", &[])?;
        if let Some(name_id) = &subject.name_id {
            write_name_id(out, name_id)?;
        }
        for confirmation in &subject.confirmations {
            out.open("saml:SubjectConfirmation", &[("Method", confirmation.method.as_str())])?;
            if let Some(data) = &confirmation.data {
                let not_before = data.not_before.as_ref().map(format_instant);
                let not_on_or_after = data.not_on_or_after.as_ref().map(format_instant);
                let mut attrs = Vec::new();
                push_opt(&mut attrs, "NotBefore", not_before.as_deref());
                push_opt(&mut attrs, "NotOnOrAfter", not_on_or_after.as_deref());
                push_opt(&mut attrs, "Recipient", data.recipient.as_deref());
                push_opt(&mut attrs, "InResponseTo", data.in_response_to.as_deref());
                out.empty("saml:SubjectConfirmationData", &attrs)?;
            }
            out.close("saml:SubjectConfirmation")?;
        }
        out.close("saml:Subject")?;
    }

    if let Some(conditions) = &m.conditions {
        let not_before = conditions.not_before.as_ref().map(format_instant);
        let not_on_or_after = conditions.not_on_or_after.as_ref().map(format_instant);
        let mut attrs = Vec::new();
        push_opt(&mut attrs, "NotBefore", not_before.as_deref());
        push_opt(&mut attrs, "NotOnOrAfter", not_on_or_after.as_deref());
        out.open("saml:Conditions", &attrs)?;
        for restriction in &conditions.audience_restrictions {
            out.open("saml:AudienceRestriction", &[])?;
            for audience in &restriction.audiences {
                out.leaf("saml:Audience", &[], audience)?;
            }
            out.close("saml:AudienceRestriction")?;
        }
        if conditions.one_time_use {
            out.empty("saml:OneTimeUse", &[])?;
        }
        out.close("saml:Conditions")?;
    }

    if let Some(statement) = &m.authn_statement {
        let authn_instant = format_instant(&statement.authn_instant);
        let session_not_on_or_after = statement.session_not_on_or_after.as_ref().map(format_instant);
        let mut attrs = vec![("AuthnInstant", authn_instant.as_str())];
        push_opt(&mut attrs, "SessionIndex", statement.session_index.as_deref());
        push_opt(&mut attrs, "SessionNotOnOrAfter", session_not_on_or_after.as_deref());
        out.open("saml:AuthnStatement", &attrs)?;
        if let Some(class_ref) = &statement.class_ref {
            out.open("saml:AuthnContext", &[])?;
            out.leaf("saml:AuthnContextClassRef", &[], class_ref)?;
            out.close("saml:AuthnContext")?;
        }
        out.close("saml:AuthnStatement")?;
    }

    for statement in &m.attribute_statements {
        out.open("saml:AttributeStatement", &[])?;
        for attribute in &statement.attributes {
            let mut attrs = vec![("Name", attribute.name.as_str())];
            push_opt(&mut attrs, "NameFormat", attribute.name_format.as_deref());
            push_opt(&mut attrs, "FriendlyName", attribute.friendly_name.as_deref());
            out.open("saml:Attribute", &attrs)?;
            for value in &attribute.values {
                out.leaf("saml:AttributeValue", &[], value)?;
            }
            out.close("saml:Attribute")?;
        }
        out.close("saml:AttributeStatement")?;
    }

    out.close("saml:Assertion")
}

fn write_logout_request(out: &mut XmlOut, m: &LogoutRequest) -> SamlResult<()> {
    let issue_instant = format_instant(&m.issue_instant);
    let not_on_or_after = m.not_on_or_after.as_ref().map(format_instant);
    let mut attrs = vec![
        ("xmlns:samlp", SAMLP_NS),
        ("xmlns:saml", SAML_NS),
        ("ID", m.id.as_str()),
        ("Version", SAML_VERSION),
        ("IssueInstant", issue_instant.as_str()),
    ];
    push_opt(&mut attrs, "Destination", m.destination.as_deref());
    push_opt(&mut attrs, "NotOnOrAfter", not_on_or_after.as_deref());
    push_opt(&mut attrs, "Reason", m.reason.as_deref());

    out.open("samlp:LogoutRequest", &attrs)?;
    if let Some(issuer) = &m.issuer {
        out.leaf("saml:Issuer", &[], issuer)?;
    }
    if let Some(name_id) = &m.name_id {
        write_name_id(out, name_id)?;
    }
    for index in &m.session_indexes {
        out.leaf("samlp:SessionIndex", &[], index)?;
    }
    out.close("samlp:LogoutRequest")
}

fn write_logout_response(out: &mut XmlOut, m: &LogoutResponse) -> SamlResult<()> {
    let issue_instant = format_instant(&m.issue_instant);
    let mut attrs = vec![
        ("xmlns:samlp", SAMLP_NS),
        ("xmlns:saml", SAML_NS),
        ("ID", m.id.as_str()),
        ("Version", SAML_VERSION),
        ("IssueInstant", issue_instant.as_str()),
    ];
    push_opt(&mut attrs, "Destination", m.destination.as_deref());
    push_opt(&mut attrs, "InResponseTo", m.in_response_to.as_deref());

    out.open("samlp:LogoutResponse", &attrs)?;
    if let Some(issuer) = &m.issuer {
        out.leaf("saml:Issuer", &[], issuer)?;
    }
    write_status(out, &m.status)?;
    out.close("samlp:LogoutResponse")
}

fn write_name_id(out: &mut XmlOut, name_id: &NameId) -> SamlResult<()> {
    let mut attrs = Vec::new();
    push_opt(&mut attrs, "Format", name_id.format.as_deref());
    push_opt(&mut attrs, "NameQualifier", name_id.name_qualifier.as_deref());
    push_opt(&mut attrs, "SPNameQualifier", name_id.sp_name_qualifier.as_deref());
    out.leaf("saml:NameID", &attrs, &name_id.value)
}

fn write_status(out: &mut XmlOut, status: &Status) -> SamlResult<()> {
    out.open("samlp:Status", &[])?;
    write_status_code(out, &status.code)?;
    if let Some(message) = &status.message {
        out.leaf("samlp:StatusMessage", &[], message)?;
    }
    out.close("samlp:Status")
}

fn write_status_code(out: &mut XmlOut, code: &StatusCode) -> SamlResult<()> {
    let attrs = [("Value", code.value.as_str())];
    match &code.sub_code {
        Some(sub) => {
            out.open("samlp:StatusCode", &attrs)?;
            write_status_code(out, sub)?;
            out.close("samlp:StatusCode")
        }
        None => out.empty("samlp:StatusCode", &attrs),
    }
}

fn push_opt<'a>(attrs: &mut Vec<(&'static str, &'a str)>, key: &'static str, value: Option<&'a str>) {
    if let Some(value) = value {
        attrs.push((key, value));
    }
}

/// Thin event writer; escaping is left to quick-xml.
struct XmlOut {
    writer: Writer<Vec<u8>>,
}

impl XmlOut {
    fn new() -> Self {
        Self {
            writer: Writer::new(Vec::new()),
        }
    }

    fn write(&mut self, event: Event<'_>) -> SamlResult<()> {
        self.writer
            .write_event(event)
            .map_err(|e| SamlError::EncodingFailure(e.to_string()))
    }

    fn start<'a>(name: &'a str, attrs: &[(&str, &str)]) -> BytesStart<'a> {
        let mut start = BytesStart::new(name);
        for attr in attrs {
            start.push_attribute(*attr);
        }
        start
    }

    fn open(&mut self, name: &str, attrs: &[(&str, &str)]) -> SamlResult<()> {
        self.write(Event::Start(Self::start(name, attrs)))
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> SamlResult<()> {
        self.write(Event::Empty(Self::start(name, attrs)))
    }

    fn close(&mut self, name: &str) -> SamlResult<()> {
        self.write(Event::End(BytesEnd::new(name)))
    }

    fn leaf(&mut self, name: &str, attrs: &[(&str, &str)], text: &str) -> SamlResult<()> {
        self.open(name, attrs)?;
        self.write(Event::Text(BytesText::new(text)))?;
        self.close(name)
    }

    fn finish(self) -> SamlResult<String> {
        String::from_utf8(self.writer.into_inner())
            .map_err(|e| SamlError::EncodingFailure(e.to_string()))
    }
}
