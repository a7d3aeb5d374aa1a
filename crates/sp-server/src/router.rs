//! Router configuration.
//!
//! Nests the SAML endpoints under `/saml` and adds health checks, request
//! tracing and security response headers.

use std::sync::Arc;

use axum::http::{header, HeaderValue};
use axum::{response::Json, routing::get, Router};
use serde::Serialize;
use sp_protocol_saml::endpoints::saml_router;
use sp_protocol_saml::ServiceProvider;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

/// Creates the main application router.
pub fn create_router(sp: Arc<ServiceProvider>) -> Router {
    let health = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/saml", saml_router(sp))
        .merge(health)
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::PRAGMA,
            HeaderValue::from_static("no-cache"),
        ))
}

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Basic health check.
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}
