//! Replay protection across the ACS and SLO endpoints.

use std::sync::Arc;

use axum::http::StatusCode;

use sp_protocol_saml::bindings::encode_base64;

use crate::common::{idp_logout_request, IdpResponse, TestEnv};

#[tokio::test]
async fn replayed_response_is_rejected() {
    let env = TestEnv::new();
    let response = IdpResponse::default();

    assert_eq!(env.login(&response).await["success"], true);
    let replayed = env.login(&response).await;
    assert_eq!(replayed["success"], false);
    assert_eq!(env.sessions.len(), 1);
}

#[tokio::test]
async fn one_time_use_assertion_cannot_be_rewrapped() {
    let env = TestEnv::new();
    let first = IdpResponse {
        one_time_use: true,
        ..IdpResponse::with_id("_wrap-1")
    };
    let rewrapped = IdpResponse {
        id: "_wrap-2".to_string(),
        ..first.clone()
    };

    assert_eq!(env.login(&first).await["success"], true);
    assert_eq!(env.login(&rewrapped).await["success"], false);
}

#[tokio::test]
async fn reusable_assertion_under_new_response_is_accepted() {
    let env = TestEnv::new();
    let first = IdpResponse::with_id("_reuse-1");
    let second = IdpResponse {
        id: "_reuse-2".to_string(),
        ..first.clone()
    };

    assert_eq!(env.login(&first).await["success"], true);
    assert_eq!(env.login(&second).await["success"], true);
}

#[tokio::test]
async fn replayed_logout_request_is_rejected() {
    let env = TestEnv::new();
    let encoded = encode_base64(&idp_logout_request("_logout-replay", None));

    let (_, _, first) = env.post_form("/saml/slo", &[("SAMLRequest", encoded.as_str())]).await;
    assert_eq!(first["success"], true);

    let (status, _, second) = env.post_form("/saml/slo", &[("SAMLRequest", encoded.as_str())]).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["success"], false);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_submissions_open_one_session() {
    let env = Arc::new(TestEnv::new());
    let response = IdpResponse::with_id("_race");

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let env = Arc::clone(&env);
            let response = response.clone();
            tokio::spawn(async move { env.login(&response).await["success"] == true })
        })
        .collect();

    let mut accepted = 0;
    for handle in handles {
        if handle.await.unwrap() {
            accepted += 1;
        }
    }
    assert_eq!(accepted, 1);
    assert_eq!(env.sessions.len(), 1);
}
