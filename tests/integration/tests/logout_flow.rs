//! Single Logout flows in both directions.

use axum::http::StatusCode;

use sp_protocol_saml::bindings::{compress_and_encode, encode_base64, HttpRedirectBinding, MessageParam};
use sp_protocol_saml::{DefaultXmlSecurity, ProtocolMessage, XmlSecurityProvider};

use crate::common::{idp_logout_request, idp_logout_response, IdpResponse, TestEnv};

const SUCCESS: &str = "urn:oasis:names:tc:SAML:2.0:status:Success";

fn parse(xml: &str) -> ProtocolMessage {
    DefaultXmlSecurity::default().parse(xml.as_bytes()).unwrap()
}

#[tokio::test]
async fn idp_initiated_logout_ends_session() {
    let env = TestEnv::new();
    let login = env.login(&IdpResponse::default()).await;
    let session_id = login["sessionId"].as_str().unwrap().to_string();

    let encoded = compress_and_encode(&idp_logout_request("_logout-1", Some("_idp-session-1"))).unwrap();
    let (status, _, body) = env
        .get(&format!(
            "/saml/slo?SAMLRequest={}&RelayState=%2Fbye",
            urlencoding::encode(&encoded)
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["relayState"], "/bye");

    let redirect = HttpRedirectBinding::decode_url(body["redirectUrl"].as_str().unwrap()).unwrap();
    assert_eq!(redirect.param, MessageParam::Response);
    assert_eq!(redirect.relay_state.as_deref(), Some("/bye"));
    let ProtocolMessage::LogoutResponse(response) = parse(&redirect.xml) else {
        panic!("expected LogoutResponse");
    };
    assert!(response.is_success());
    assert_eq!(response.in_response_to.as_deref(), Some("_logout-1"));

    let (status, _, _) = env.get(&format!("/saml/session/{session_id}")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_of_other_session_index_keeps_session() {
    let env = TestEnv::new();
    let login = env.login(&IdpResponse::default()).await;
    let session_id = login["sessionId"].as_str().unwrap().to_string();

    let encoded = encode_base64(&idp_logout_request("_logout-2", Some("_some-other-session")));
    let (status, _, body) = env.post_form("/saml/slo", &[("SAMLRequest", encoded.as_str())]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, _, _) = env.get(&format!("/saml/session/{session_id}")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn rejected_logout_request_answers_responder() {
    let env = TestEnv::new();
    env.login(&IdpResponse::default()).await;

    let xml = idp_logout_request("_logout-3", None).replace("https://idp.example<", "https://evil.example<");
    let encoded = encode_base64(&xml);
    let (status, _, body) = env.post_form("/saml/slo", &[("SAMLRequest", encoded.as_str())]).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);

    let redirect = HttpRedirectBinding::decode_url(body["redirectUrl"].as_str().unwrap()).unwrap();
    let ProtocolMessage::LogoutResponse(response) = parse(&redirect.xml) else {
        panic!("expected LogoutResponse");
    };
    assert!(!response.is_success());
    assert_eq!(env.sessions.len(), 1);
}

#[tokio::test]
async fn sp_initiated_logout_round_trip() {
    let env = TestEnv::new();
    let (status, _, body) = env
        .get("/saml/logout?nameId=alice%40example.com&sessionIndex=_idp-session-1&relayState=%2Fhome")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let redirect = HttpRedirectBinding::decode_url(body["redirectUrl"].as_str().unwrap()).unwrap();
    assert_eq!(redirect.param, MessageParam::Request);
    let ProtocolMessage::LogoutRequest(request) = parse(&redirect.xml) else {
        panic!("expected LogoutRequest");
    };
    assert_eq!(request.name_id.as_ref().unwrap().value, "alice@example.com");
    assert_eq!(request.session_indexes, vec!["_idp-session-1".to_string()]);

    let answer = encode_base64(&idp_logout_response("_logout-answer", &request.id, SUCCESS));
    let (status, _, body) = env
        .post_form(
            "/saml/slo-response",
            &[("SAMLResponse", answer.as_str()), ("RelayState", "/home")],
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["relayState"], "/home");
}

#[tokio::test]
async fn failed_logout_response_is_reported() {
    let env = TestEnv::new();
    let answer = compress_and_encode(&idp_logout_response(
        "_logout-answer",
        "_req",
        "urn:oasis:names:tc:SAML:2.0:status:Responder",
    ))
    .unwrap();
    let (status, _, body) = env
        .get(&format!("/saml/slo-response?SAMLResponse={}", urlencoding::encode(&answer)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn logout_without_name_id_is_bad_request() {
    let env = TestEnv::new();
    let (status, _, body) = env.get("/saml/logout").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}
