//! SAML router configuration.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;

use super::metadata::sp_metadata_descriptor;
use super::sls::{logout, slo_post, slo_redirect, slo_response_post, slo_response_redirect};
use super::sso::{acs_post, acs_redirect, login, session_info};
use super::state::SamlState;
use crate::service::ServiceProvider;

/// Creates the SAML router, to be nested under `/saml`.
///
/// # Endpoints
///
/// | Method   | Path             | Handler                  | Description                          |
/// |----------|------------------|--------------------------|--------------------------------------|
/// | GET      | `/login`         | `login`                  | AuthnRequest redirect URL            |
/// | GET/POST | `/acs`           | `acs_redirect`/`acs_post`| Assertion Consumer Service           |
/// | GET      | `/logout`        | `logout`                 | SP-initiated LogoutRequest           |
/// | GET/POST | `/slo`           | `slo_redirect`/`slo_post`| IdP-initiated LogoutRequest          |
/// | GET/POST | `/slo-response`  | `slo_response_*`         | LogoutResponse to SP-initiated logout|
/// | GET      | `/metadata`      | `sp_metadata_descriptor` | SP metadata                          |
/// | GET      | `/session/{id}`  | `session_info`           | Session lookup                       |
pub fn saml_router(sp: Arc<ServiceProvider>) -> Router {
    Router::new()
        .route("/login", get(login))
        .route("/acs", get(acs_redirect).post(acs_post))
        .route("/logout", get(logout))
        .route("/slo", get(slo_redirect).post(slo_post))
        .route("/slo-response", get(slo_response_redirect).post(slo_response_post))
        .route("/metadata", get(sp_metadata_descriptor))
        .route("/session/{id}", get(session_info))
        .with_state(SamlState::new(sp))
}
