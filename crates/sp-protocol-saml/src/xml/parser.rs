//! Maps an element tree onto protocol objects.
//!
//! Elements are matched by local name. Anything the SP does not consume
//! (extensions, advice, encrypted assertions) is skipped.

use chrono::{DateTime, Utc};

use super::dom::{parse_document, Element};
use crate::error::{SamlError, SamlResult};
use crate::signature::SignatureNode;
use crate::types::{
    Assertion, Attribute, AttributeStatement, AudienceRestriction, AuthnContextComparison,
    AuthnRequest, AuthnStatement, Conditions, LogoutRequest, LogoutResponse, NameId, NameIdPolicy,
    ProtocolMessage, RequestedAuthnContext, Response, Status, StatusCode, Subject,
    SubjectConfirmation, SubjectConfirmationData,
};
use crate::Binding;

/// Parses a top-level protocol message.
pub(crate) fn parse_message(xml: &str) -> SamlResult<ProtocolMessage> {
    let root = parse_document(xml)?;
    match root.local.as_str() {
        "Response" => parse_response(xml, &root).map(ProtocolMessage::Response),
        "AuthnRequest" => parse_authn_request(&root).map(ProtocolMessage::AuthnRequest),
        "LogoutRequest" => parse_logout_request(xml, &root).map(ProtocolMessage::LogoutRequest),
        "LogoutResponse" => parse_logout_response(xml, &root).map(ProtocolMessage::LogoutResponse),
        other => Err(SamlError::malformed(format!("unexpected root element {other}"))),
    }
}

fn parse_response(xml: &str, el: &Element) -> SamlResult<Response> {
    let status = el
        .child("Status")
        .ok_or_else(|| SamlError::malformed("Response has no Status"))
        .and_then(parse_status)?;

    let assertions = el
        .children_named("Assertion")
        .map(|a| parse_assertion(xml, a))
        .collect::<SamlResult<Vec<_>>>()?;

    Ok(Response {
        id: required_attr(el, "ID")?,
        in_response_to: el.attr("InResponseTo").map(String::from),
        issue_instant: required_instant(el, "IssueInstant")?,
        destination: el.attr("Destination").map(String::from),
        issuer: el.child_text("Issuer"),
        status,
        assertions,
        signature: parse_signature(xml, el)?,
    })
}

fn parse_assertion(xml: &str, el: &Element) -> SamlResult<Assertion> {
    let attribute_statements = el
        .children_named("AttributeStatement")
        .map(parse_attribute_statement)
        .collect();

    Ok(Assertion {
        id: required_attr(el, "ID")?,
        issue_instant: required_instant(el, "IssueInstant")?,
        issuer: el.child_text("Issuer"),
        subject: el.child("Subject").map(parse_subject).transpose()?,
        conditions: el.child("Conditions").map(parse_conditions).transpose()?,
        authn_statement: el.child("AuthnStatement").map(parse_authn_statement).transpose()?,
        attribute_statements,
        signature: parse_signature(xml, el)?,
    })
}

fn parse_subject(el: &Element) -> SamlResult<Subject> {
    Ok(Subject {
        name_id: el.child("NameID").map(parse_name_id),
        confirmations: el
            .children_named("SubjectConfirmation")
            .map(parse_confirmation)
            .collect::<SamlResult<Vec<_>>>()?,
    })
}

fn parse_confirmation(el: &Element) -> SamlResult<SubjectConfirmation> {
    let data = match el.child("SubjectConfirmationData") {
        Some(d) => Some(SubjectConfirmationData {
            not_before: instant(d, "NotBefore")?,
            not_on_or_after: instant(d, "NotOnOrAfter")?,
            recipient: d.attr("Recipient").map(String::from),
            in_response_to: d.attr("InResponseTo").map(String::from),
        }),
        None => None,
    };
    Ok(SubjectConfirmation {
        method: el.attr("Method").unwrap_or_default().to_string(),
        data,
    })
}

fn parse_name_id(el: &Element) -> NameId {
    NameId {
        value: el.text().to_string(),
        format: el.attr("Format").map(String::from),
        name_qualifier: el.attr("NameQualifier").map(String::from),
        sp_name_qualifier: el.attr("SPNameQualifier").map(String::from),
    }
}

fn parse_conditions(el: &Element) -> SamlResult<Conditions> {
    Ok(Conditions {
        not_before: instant(el, "NotBefore")?,
        not_on_or_after: instant(el, "NotOnOrAfter")?,
        audience_restrictions: el
            .children_named("AudienceRestriction")
            .map(|r| AudienceRestriction {
                audiences: r.children_named("Audience").map(|a| a.text().to_string()).collect(),
            })
            .collect(),
        one_time_use: el.child("OneTimeUse").is_some(),
    })
}

fn parse_authn_statement(el: &Element) -> SamlResult<AuthnStatement> {
    Ok(AuthnStatement {
        authn_instant: required_instant(el, "AuthnInstant")?,
        session_index: el.attr("SessionIndex").map(String::from),
        session_not_on_or_after: instant(el, "SessionNotOnOrAfter")?,
        class_ref: el
            .child("AuthnContext")
            .and_then(|c| c.child_text("AuthnContextClassRef")),
    })
}

fn parse_attribute_statement(el: &Element) -> AttributeStatement {
    AttributeStatement {
        attributes: el
            .children_named("Attribute")
            .map(|a| Attribute {
                name: a.attr("Name").unwrap_or_default().to_string(),
                name_format: a.attr("NameFormat").map(String::from),
                friendly_name: a.attr("FriendlyName").map(String::from),
                values: a.children_named("AttributeValue").map(|v| v.text().to_string()).collect(),
            })
            .collect(),
    }
}

fn parse_status(el: &Element) -> SamlResult<Status> {
    let code = el
        .child("StatusCode")
        .ok_or_else(|| SamlError::malformed("Status has no StatusCode"))?;
    Ok(Status {
        code: parse_status_code(code)?,
        message: el.child_text("StatusMessage"),
    })
}

fn parse_status_code(el: &Element) -> SamlResult<StatusCode> {
    Ok(StatusCode {
        value: required_attr(el, "Value")?,
        sub_code: el
            .child("StatusCode")
            .map(parse_status_code)
            .transpose()?
            .map(Box::new),
    })
}

fn parse_authn_request(el: &Element) -> SamlResult<AuthnRequest> {
    let protocol_binding = match el.attr("ProtocolBinding") {
        Some(uri) => Binding::from_uri(uri)
            .ok_or_else(|| SamlError::malformed(format!("unsupported binding {uri}")))?,
        None => Binding::Post,
    };

    let requested_authn_context = el.child("RequestedAuthnContext").map(|c| RequestedAuthnContext {
        comparison: c
            .attr("Comparison")
            .and_then(AuthnContextComparison::parse)
            .unwrap_or_default(),
        class_refs: c
            .children_named("AuthnContextClassRef")
            .map(|r| r.text().to_string())
            .collect(),
    });

    Ok(AuthnRequest {
        id: required_attr(el, "ID")?,
        issue_instant: required_instant(el, "IssueInstant")?,
        issuer: el.child_text("Issuer").unwrap_or_default(),
        destination: el.attr("Destination").unwrap_or_default().to_string(),
        assertion_consumer_service_url: el
            .attr("AssertionConsumerServiceURL")
            .unwrap_or_default()
            .to_string(),
        protocol_binding,
        name_id_policy: el.child("NameIDPolicy").map(|p| NameIdPolicy {
            format: p.attr("Format").map(String::from),
            allow_create: p.attr("AllowCreate") == Some("true"),
        }),
        requested_authn_context,
        force_authn: el.attr("ForceAuthn") == Some("true"),
        is_passive: el.attr("IsPassive") == Some("true"),
    })
}

fn parse_logout_request(xml: &str, el: &Element) -> SamlResult<LogoutRequest> {
    Ok(LogoutRequest {
        id: required_attr(el, "ID")?,
        issue_instant: required_instant(el, "IssueInstant")?,
        issuer: el.child_text("Issuer"),
        destination: el.attr("Destination").map(String::from),
        name_id: el.child("NameID").map(parse_name_id),
        session_indexes: el
            .children_named("SessionIndex")
            .map(|s| s.text().to_string())
            .collect(),
        not_on_or_after: instant(el, "NotOnOrAfter")?,
        reason: el.attr("Reason").map(String::from),
        signature: parse_signature(xml, el)?,
    })
}

fn parse_logout_response(xml: &str, el: &Element) -> SamlResult<LogoutResponse> {
    let status = el
        .child("Status")
        .ok_or_else(|| SamlError::malformed("LogoutResponse has no Status"))
        .and_then(parse_status)?;

    Ok(LogoutResponse {
        id: required_attr(el, "ID")?,
        in_response_to: el.attr("InResponseTo").map(String::from),
        issue_instant: required_instant(el, "IssueInstant")?,
        issuer: el.child_text("Issuer"),
        destination: el.attr("Destination").map(String::from),
        status,
        signature: parse_signature(xml, el)?,
    })
}

/// Captures the `ds:Signature` directly enveloped in `el`, if any.
fn parse_signature(xml: &str, el: &Element) -> SamlResult<Option<SignatureNode>> {
    let Some(sig) = el.child("Signature") else {
        return Ok(None);
    };

    let signed_info = sig
        .child("SignedInfo")
        .ok_or_else(|| SamlError::malformed("Signature has no SignedInfo"))?;
    let references: Vec<&Element> = signed_info.children_named("Reference").collect();
    let reference = references
        .first()
        .ok_or_else(|| SamlError::malformed("SignedInfo has no Reference"))?;

    let transforms = reference
        .child("Transforms")
        .map(|t| {
            t.children_named("Transform")
                .map(|t| t.attr("Algorithm").unwrap_or_default().to_string())
                .collect()
        })
        .unwrap_or_default();

    Ok(Some(SignatureNode {
        element_id: required_attr(el, "ID")?,
        reference_uri: reference.attr("URI").unwrap_or_default().to_string(),
        reference_count: references.len(),
        transforms,
        canonicalization_method: algorithm_of(signed_info, "CanonicalizationMethod"),
        signature_method: algorithm_of(signed_info, "SignatureMethod"),
        digest_method: algorithm_of(reference, "DigestMethod"),
        digest_value: reference.child_text("DigestValue").unwrap_or_default(),
        signature_value: sig.child_text("SignatureValue").unwrap_or_default(),
        signed_info_xml: signed_info.standalone_fragment(xml, None)?,
        signed_element_xml: el.standalone_fragment(xml, Some(&sig.span))?,
    }))
}

fn algorithm_of(el: &Element, child: &str) -> String {
    el.child(child)
        .and_then(|c| c.attr("Algorithm"))
        .unwrap_or_default()
        .to_string()
}

fn required_attr(el: &Element, name: &str) -> SamlResult<String> {
    el.attr(name)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .ok_or_else(|| SamlError::malformed(format!("{} has no {name}", el.local)))
}

fn instant(el: &Element, name: &str) -> SamlResult<Option<DateTime<Utc>>> {
    el.attr(name).map(parse_instant).transpose()
}

fn required_instant(el: &Element, name: &str) -> SamlResult<DateTime<Utc>> {
    instant(el, name)?.ok_or_else(|| SamlError::malformed(format!("{} has no {name}", el.local)))
}

fn parse_instant(value: &str) -> SamlResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| SamlError::malformed(format!("bad timestamp {value}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::status_codes;

    const RESPONSE: &str = r##"<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="_resp1" Version="2.0" IssueInstant="2024-05-01T10:00:00Z" Destination="https://sp.example/acs" InResponseTo="_req1">
  <saml:Issuer>https://idp.example</saml:Issuer>
  <samlp:Status><samlp:StatusCode Value="urn:oasis:names:tc:SAML:2.0:status:Success"/></samlp:Status>
  <saml:Assertion ID="_assert1" Version="2.0" IssueInstant="2024-05-01T10:00:00.123Z">
    <saml:Issuer>https://idp.example</saml:Issuer>
    <ds:Signature xmlns:ds="http://www.w3.org/2000/09/xmldsig#">
      <ds:SignedInfo>
        <ds:CanonicalizationMethod Algorithm="http://www.w3.org/2001/10/xml-exc-c14n#"/>
        <ds:SignatureMethod Algorithm="http://www.w3.org/2001/04/xmldsig-more#rsa-sha256"/>
        <ds:Reference URI="#_assert1">
          <ds:Transforms>
            <ds:Transform Algorithm="http://www.w3.org/2000/09/xmldsig#enveloped-signature"/>
            <ds:Transform Algorithm="http://www.w3.org/2001/10/xml-exc-c14n#"/>
          </ds:Transforms>
          <ds:DigestMethod Algorithm="http://www.w3.org/2001/04/xmlenc#sha256"/>
          <ds:DigestValue>AAAA</ds:DigestValue>
        </ds:Reference>
      </ds:SignedInfo>
      <ds:SignatureValue>BBBB</ds:SignatureValue>
    </ds:Signature>
    <saml:Subject>
      <saml:NameID Format="urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress">alice@example.com</saml:NameID>
      <saml:SubjectConfirmation Method="urn:oasis:names:tc:SAML:2.0:cm:bearer">
        <saml:SubjectConfirmationData NotOnOrAfter="2024-05-01T10:05:00Z" Recipient="https://sp.example/acs" InResponseTo="_req1"/>
      </saml:SubjectConfirmation>
    </saml:Subject>
    <saml:Conditions NotBefore="2024-05-01T09:59:00Z" NotOnOrAfter="2024-05-01T10:05:00Z">
      <saml:AudienceRestriction><saml:Audience>https://sp.example</saml:Audience></saml:AudienceRestriction>
      <saml:OneTimeUse/>
    </saml:Conditions>
    <saml:AuthnStatement AuthnInstant="2024-05-01T10:00:00Z" SessionIndex="_sess1">
      <saml:AuthnContext><saml:AuthnContextClassRef>urn:oasis:names:tc:SAML:2.0:ac:classes:PasswordProtectedTransport</saml:AuthnContextClassRef></saml:AuthnContext>
    </saml:AuthnStatement>
    <saml:AttributeStatement>
      <saml:Attribute Name="givenName"><saml:AttributeValue>Alice</saml:AttributeValue><saml:AttributeValue>Al</saml:AttributeValue></saml:Attribute>
      <saml:Attribute Name="groups"/>
    </saml:AttributeStatement>
  </saml:Assertion>
</samlp:Response>"##;

    fn response() -> Response {
        match parse_message(RESPONSE).unwrap() {
            ProtocolMessage::Response(r) => r,
            other => panic!("unexpected {}", other.element_name()),
        }
    }

    #[test]
    fn parses_response_envelope() {
        let r = response();
        assert_eq!(r.id, "_resp1");
        assert_eq!(r.in_response_to.as_deref(), Some("_req1"));
        assert_eq!(r.destination.as_deref(), Some("https://sp.example/acs"));
        assert_eq!(r.issuer.as_deref(), Some("https://idp.example"));
        assert_eq!(r.status.code.value, status_codes::SUCCESS);
        assert!(r.signature.is_none());
        assert_eq!(r.assertions.len(), 1);
    }

    #[test]
    fn parses_assertion_contents() {
        let r = response();
        let a = r.first_assertion().unwrap();
        assert_eq!(a.issuer.as_deref(), Some("https://idp.example"));
        assert_eq!(a.name_id().map(|n| n.value.as_str()), Some("alice@example.com"));
        assert_eq!(a.session_index(), Some("_sess1"));

        let subject = a.subject.as_ref().unwrap();
        let data = subject.confirmations[0].data.as_ref().unwrap();
        assert_eq!(data.recipient.as_deref(), Some("https://sp.example/acs"));
        assert!(data.not_on_or_after.is_some());

        let conditions = a.conditions.as_ref().unwrap();
        assert!(conditions.one_time_use);
        assert_eq!(conditions.audience_restrictions[0].audiences, vec!["https://sp.example"]);

        let attrs = &a.attribute_statements[0].attributes;
        assert_eq!(attrs[0].values, vec!["Alice", "Al"]);
        assert!(attrs[1].values.is_empty());
    }

    #[test]
    fn captures_assertion_signature() {
        let r = response();
        let sig = r.first_assertion().and_then(|a| a.signature.as_ref()).unwrap();
        assert_eq!(sig.element_id, "_assert1");
        assert_eq!(sig.reference_uri, "#_assert1");
        assert_eq!(sig.reference_count, 1);
        assert_eq!(sig.transforms.len(), 2);
        assert_eq!(sig.digest_value, "AAAA");
        assert_eq!(sig.signature_value, "BBBB");

        assert!(sig.signed_info_xml.starts_with("<ds:SignedInfo"));
        assert!(sig.signed_info_xml.contains("xmlns:ds=\"http://www.w3.org/2000/09/xmldsig#\""));
        assert!(sig.signed_element_xml.starts_with("<saml:Assertion"));
        assert!(sig.signed_element_xml.contains("xmlns:saml="));
        assert!(!sig.signed_element_xml.contains("SignatureValue"));
        assert!(sig.signed_element_xml.contains("alice@example.com"));
    }

    #[test]
    fn missing_status_is_malformed() {
        let xml = r#"<samlp:Response xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" ID="_r" IssueInstant="2024-05-01T10:00:00Z"/>"#;
        assert!(matches!(parse_message(xml), Err(SamlError::MalformedMessage(_))));
    }

    #[test]
    fn bad_timestamp_is_malformed() {
        let xml = RESPONSE.replace("2024-05-01T10:00:00Z\" Destination", "yesterday\" Destination");
        assert!(matches!(parse_message(&xml), Err(SamlError::MalformedMessage(_))));
    }

    #[test]
    fn unknown_root_is_malformed() {
        assert!(parse_message("<samlp:ArtifactResolve ID=\"_x\"/>").is_err());
    }

    #[test]
    fn parses_logout_request() {
        let xml = r#"<samlp:LogoutRequest xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" xmlns:saml="urn:oasis:names:tc:SAML:2.0:assertion" ID="_lr1" Version="2.0" IssueInstant="2024-05-01T10:00:00Z" Destination="https://sp.example/slo">
  <saml:Issuer>https://idp.example</saml:Issuer>
  <saml:NameID>alice@example.com</saml:NameID>
  <samlp:SessionIndex>_s1</samlp:SessionIndex>
  <samlp:SessionIndex>_s2</samlp:SessionIndex>
</samlp:LogoutRequest>"#;
        let ProtocolMessage::LogoutRequest(req) = parse_message(xml).unwrap() else {
            panic!("not a LogoutRequest");
        };
        assert_eq!(req.issuer.as_deref(), Some("https://idp.example"));
        assert_eq!(req.name_id.map(|n| n.value).as_deref(), Some("alice@example.com"));
        assert_eq!(req.session_indexes, vec!["_s1", "_s2"]);
    }

    #[test]
    fn parses_nested_status_code() {
        let xml = r#"<samlp:LogoutResponse xmlns:samlp="urn:oasis:names:tc:SAML:2.0:protocol" ID="_lo" IssueInstant="2024-05-01T10:00:00Z"><samlp:Status><samlp:StatusCode Value="urn:oasis:names:tc:SAML:2.0:status:Responder"><samlp:StatusCode Value="urn:oasis:names:tc:SAML:2.0:status:PartialLogout"/></samlp:StatusCode></samlp:Status></samlp:LogoutResponse>"#;
        let ProtocolMessage::LogoutResponse(resp) = parse_message(xml).unwrap() else {
            panic!("not a LogoutResponse");
        };
        assert!(!resp.is_success());
        assert!(resp.status.code.sub_code.is_some());
    }
}
