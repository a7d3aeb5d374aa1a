//! Login and ACS flows.

use axum::http::{header, StatusCode};

use sp_protocol_saml::bindings::HttpRedirectBinding;
use sp_protocol_saml::{DefaultXmlSecurity, ProtocolMessage, XmlSecurityProvider};

use crate::common::{IdpResponse, TestEnv};

#[tokio::test]
async fn login_redirect_carries_authn_request() {
    let env = TestEnv::new();
    let (status, headers, body) = env.get("/saml/login?relayState=%2Fdashboard").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CACHE_CONTROL], "no-store");
    assert_eq!(body["success"], true);

    let url = body["redirectUrl"].as_str().unwrap();
    let message = HttpRedirectBinding::decode_url(url).unwrap();
    assert_eq!(message.relay_state.as_deref(), Some("/dashboard"));

    let ProtocolMessage::AuthnRequest(request) = DefaultXmlSecurity::default().parse(message.xml.as_bytes()).unwrap()
    else {
        panic!("expected AuthnRequest");
    };
    assert_eq!(request.issuer, "https://sp.example");
    assert_eq!(request.destination, "https://idp.example/sso");
    assert_eq!(body["requestId"], request.id.as_str());
}

#[tokio::test]
async fn successful_post_login_opens_session() {
    let env = TestEnv::new();
    let encoded = IdpResponse::default().post();
    let (status, _, body) = env
        .post_form("/saml/acs", &[("SAMLResponse", encoded.as_str()), ("RelayState", "/app")])
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["userName"], "alice@example.com");
    assert_eq!(body["relayState"], "/app");
    assert_eq!(body["attributes"]["givenName"], "Alice");
    assert_eq!(body["attributes"]["groups"], "admins");
    assert_eq!(body["attributes"]["email"], "alice@example.com");

    let session_id = body["sessionId"].as_str().unwrap();
    let (status, _, session) = env.get(&format!("/saml/session/{session_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["nameId"], "alice@example.com");
    assert_eq!(session["sessionIndex"], "_idp-session-1");
}

#[tokio::test]
async fn redirect_binding_login() {
    let env = TestEnv::new();
    let encoded = urlencoding::encode(&IdpResponse::default().redirect()).into_owned();
    let (status, _, body) = env.get(&format!("/saml/acs?SAMLResponse={encoded}")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn session_index_defaults_to_response_id() {
    let env = TestEnv::new();
    let body = env
        .login(&IdpResponse {
            session_index: None,
            ..IdpResponse::default()
        })
        .await;

    let session_id = body["sessionId"].as_str().unwrap();
    let session = env.sessions.get(session_id).unwrap();
    assert_eq!(session.session_index.as_deref(), Some("_response-1"));
}

#[tokio::test]
async fn validation_failures_are_generic() {
    let env = TestEnv::new();
    let cases = [
        IdpResponse {
            issuer: "https://evil.example".to_string(),
            ..IdpResponse::with_id("_bad-issuer")
        },
        IdpResponse {
            destination: "https://other.example/acs".to_string(),
            ..IdpResponse::with_id("_bad-destination")
        },
        IdpResponse {
            audience: "https://other.example".to_string(),
            ..IdpResponse::with_id("_bad-audience")
        },
        IdpResponse {
            not_on_or_after: crate::common::instant(-10),
            ..IdpResponse::with_id("_expired")
        },
        IdpResponse {
            signed: false,
            ..IdpResponse::with_id("_unsigned")
        },
    ];

    for response in cases {
        let body = env.login(&response).await;
        assert_eq!(body["success"], false, "{} was accepted", response.id);
        assert_eq!(body["message"], "SAML response validation failed");
        assert!(body.get("sessionId").map_or(true, |v| v.is_null()));
    }
    assert!(env.sessions.is_empty());
}

#[tokio::test]
async fn idp_failure_status_is_reported_generically() {
    let env = TestEnv::new();
    let body = env
        .login(&IdpResponse {
            status: "urn:oasis:names:tc:SAML:2.0:status:Requester".to_string(),
            ..IdpResponse::default()
        })
        .await;
    assert_eq!(body["success"], false);
    assert!(!body["message"].as_str().unwrap().contains("Requester"));
}

#[tokio::test]
async fn bad_signature_is_rejected() {
    let env = TestEnv::rejecting_signatures();
    let body = env.login(&IdpResponse::default()).await;
    assert_eq!(body["success"], false);
    assert!(env.sessions.is_empty());
}

#[tokio::test]
async fn garbage_is_bad_request() {
    let env = TestEnv::new();
    let (status, _, body) = env.post_form("/saml/acs", &[("SAMLResponse", "not base64!")]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn metadata_describes_sp() {
    let env = TestEnv::new();
    let (status, headers, body) = env.get("/saml/metadata").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/samlmetadata+xml");
    assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");

    let xml = body.as_str().unwrap();
    assert!(xml.contains(r#"entityID="https://sp.example""#));
    assert!(xml.contains("AssertionConsumerService"));
}

#[tokio::test]
async fn health_check() {
    let env = TestEnv::new();
    let (status, _, body) = env.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}
