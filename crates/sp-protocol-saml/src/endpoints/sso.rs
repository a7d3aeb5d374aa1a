//! Login and Assertion Consumer Service endpoints.

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Form;
use serde::Deserialize;
use serde_json::json;

use super::json_outcome;
use super::state::SamlState;
use crate::bindings::Binding;
use crate::error::SamlError;
use crate::service::AcsOutcome;

/// Query parameters of the login endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginParams {
    /// Opaque state returned after authentication.
    pub relay_state: Option<String>,
}

/// SAMLResponse carried in a form body or query string.
#[derive(Debug, Deserialize)]
pub struct AcsParams {
    /// The encoded Response.
    #[serde(rename = "SAMLResponse")]
    pub saml_response: Option<String>,

    /// Relay state.
    #[serde(rename = "RelayState")]
    pub relay_state: Option<String>,
}

/// GET handler starting a login.
pub async fn login(State(state): State<SamlState>, Query(params): Query<LoginParams>) -> Response {
    let outcome = state.sp.initiate_login(params.relay_state.as_deref());
    json_outcome(outcome.http_status, outcome)
}

/// POST handler for the ACS (HTTP-POST binding).
pub async fn acs_post(State(state): State<SamlState>, Form(params): Form<AcsParams>) -> Response {
    consume(&state, params, Binding::Post)
}

/// GET handler for the ACS (HTTP-Redirect binding).
pub async fn acs_redirect(State(state): State<SamlState>, Query(params): Query<AcsParams>) -> Response {
    consume(&state, params, Binding::Redirect)
}

fn consume(state: &SamlState, params: AcsParams, binding: Binding) -> Response {
    let outcome = match params.saml_response.as_deref().filter(|s| !s.is_empty()) {
        Some(encoded) => state.sp.consume_response(encoded, binding, params.relay_state),
        None => AcsOutcome::failure(
            &SamlError::malformed("SAMLResponse parameter required"),
            params.relay_state,
        ),
    };
    json_outcome(outcome.http_status, outcome)
}

/// GET handler returning a live session, or 401.
pub async fn session_info(State(state): State<SamlState>, Path(id): Path<String>) -> Response {
    match state.sp.session(&id) {
        Ok(session) => json_outcome(200, session),
        Err(e) => json_outcome(e.http_status(), json!({ "error": e.public_message() })),
    }
}
