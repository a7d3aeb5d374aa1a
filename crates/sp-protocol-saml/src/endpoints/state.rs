//! Shared endpoint state.

use std::sync::Arc;

use crate::service::ServiceProvider;

/// State handed to every SAML handler.
#[derive(Clone)]
pub struct SamlState {
    /// The service provider all handlers delegate to.
    pub sp: Arc<ServiceProvider>,
}

impl SamlState {
    /// Creates the state.
    pub fn new(sp: Arc<ServiceProvider>) -> Self {
        Self { sp }
    }
}
