//! SAML endpoint handlers.
//!
//! Axum handlers exposing the [`ServiceProvider`](crate::ServiceProvider):
//!
//! - **Login** - builds an AuthnRequest redirect
//! - **ACS** - consumes Responses over either binding
//! - **SLO** - SP-initiated logout plus inbound LogoutRequest/LogoutResponse
//! - **Metadata** - serves the SP EntityDescriptor
//! - **Session** - looks up a live session
//!
//! # Example
//!
//! ```rust,ignore
//! use sp_protocol_saml::endpoints::saml_router;
//! use axum::Router;
//!
//! let app = Router::new().nest("/saml", saml_router(service_provider));
//! ```

mod metadata;
mod router;
mod sls;
mod sso;
mod state;

pub use metadata::*;
pub use router::*;
pub use sls::*;
pub use sso::*;
pub use state::*;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Serializes `body` as JSON with the outcome's status code.
fn json_outcome<T: Serialize>(status: u16, body: T) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(body)).into_response()
}
