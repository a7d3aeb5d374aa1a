//! SP metadata endpoint.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;

use super::state::SamlState;
use crate::metadata::METADATA_CONTENT_TYPE;

/// GET handler serving the SP EntityDescriptor.
pub async fn sp_metadata_descriptor(State(state): State<SamlState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, METADATA_CONTENT_TYPE)],
        state.sp.metadata(),
    )
}
