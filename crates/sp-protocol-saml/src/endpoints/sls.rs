//! Single Logout endpoints.

use axum::extract::{Query, State};
use axum::response::Response;
use axum::Form;
use serde::Deserialize;

use super::json_outcome;
use super::state::SamlState;
use crate::bindings::Binding;
use crate::error::SamlError;
use crate::service::{LoginOutcome, SloOutcome};

/// Query parameters of the SP-initiated logout endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutParams {
    /// Subject to log out.
    pub name_id: Option<String>,
    /// IdP session to end.
    pub session_index: Option<String>,
    /// Opaque state returned after logout.
    pub relay_state: Option<String>,
}

/// SAMLRequest carried in a form body or query string.
#[derive(Debug, Deserialize)]
pub struct SloRequestParams {
    /// The encoded LogoutRequest.
    #[serde(rename = "SAMLRequest")]
    pub saml_request: Option<String>,

    /// Relay state.
    #[serde(rename = "RelayState")]
    pub relay_state: Option<String>,
}

/// SAMLResponse carried in a form body or query string.
#[derive(Debug, Deserialize)]
pub struct SloResponseParams {
    /// The encoded LogoutResponse.
    #[serde(rename = "SAMLResponse")]
    pub saml_response: Option<String>,

    /// Relay state.
    #[serde(rename = "RelayState")]
    pub relay_state: Option<String>,
}

/// GET handler starting an SP-initiated logout.
pub async fn logout(State(state): State<SamlState>, Query(params): Query<LogoutParams>) -> Response {
    let outcome = match params.name_id.as_deref().filter(|s| !s.is_empty()) {
        Some(name_id) => state.sp.initiate_logout(
            name_id,
            params.session_index.as_deref(),
            params.relay_state.as_deref(),
        ),
        None => LoginOutcome::failure(&SamlError::malformed("nameId parameter required")),
    };
    json_outcome(outcome.http_status, outcome)
}

/// POST handler for IdP-initiated logout.
pub async fn slo_post(State(state): State<SamlState>, Form(params): Form<SloRequestParams>) -> Response {
    handle_request(&state, params, Binding::Post)
}

/// GET handler for IdP-initiated logout.
pub async fn slo_redirect(State(state): State<SamlState>, Query(params): Query<SloRequestParams>) -> Response {
    handle_request(&state, params, Binding::Redirect)
}

/// POST handler for the IdP's LogoutResponse.
pub async fn slo_response_post(State(state): State<SamlState>, Form(params): Form<SloResponseParams>) -> Response {
    handle_response(&state, params, Binding::Post)
}

/// GET handler for the IdP's LogoutResponse.
pub async fn slo_response_redirect(
    State(state): State<SamlState>,
    Query(params): Query<SloResponseParams>,
) -> Response {
    handle_response(&state, params, Binding::Redirect)
}

fn handle_request(state: &SamlState, params: SloRequestParams, binding: Binding) -> Response {
    let outcome = match params.saml_request.as_deref().filter(|s| !s.is_empty()) {
        Some(encoded) => state.sp.handle_logout_request(encoded, binding, params.relay_state),
        None => missing("SAMLRequest", params.relay_state),
    };
    json_outcome(outcome.http_status, outcome)
}

fn handle_response(state: &SamlState, params: SloResponseParams, binding: Binding) -> Response {
    let outcome = match params.saml_response.as_deref().filter(|s| !s.is_empty()) {
        Some(encoded) => state.sp.handle_logout_response(encoded, binding, params.relay_state),
        None => missing("SAMLResponse", params.relay_state),
    };
    json_outcome(outcome.http_status, outcome)
}

fn missing(param: &str, relay_state: Option<String>) -> SloOutcome {
    SloOutcome::failure(
        &SamlError::malformed(format!("{param} parameter required")),
        relay_state,
        None,
    )
}
