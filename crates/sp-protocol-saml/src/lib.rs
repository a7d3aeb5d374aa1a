//! SAML 2.0 service provider protocol engine.
//!
//! This crate implements the SP side of Web Browser SSO and Single Logout
//! against one trusted identity provider:
//!
//! - **Bindings** - HTTP-Redirect (DEFLATE + Base64) and HTTP-POST (Base64)
//!   encoding of protocol messages
//! - **Request building** - AuthnRequest, LogoutRequest and LogoutResponse
//! - **Response validation** - a staged, fail-closed pipeline over status,
//!   issuer, destination, freshness, replay, conditions and signatures
//! - **Identity extraction** - flattening a validated assertion into a
//!   single-valued attribute map
//! - **Single Logout** - inbound LogoutRequest/LogoutResponse handling
//!
//! # Architecture
//!
//! - [`bindings`] - wire encodings and the DEFLATE/Base64 codec
//! - [`types`] - the closed set of protocol objects the SP consumes
//! - [`xml`] - the [`XmlSecurityProvider`] seam plus its quick-xml backed default
//! - [`signature`] - enveloped XML-DSig verification and certificate loading
//! - [`builder`], [`validator`], [`identity`], [`slo`] - the protocol steps
//! - [`service`] - the [`ServiceProvider`] facade tying them to the stores
//! - [`endpoints`] - axum handlers mounted under `/saml`
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sp_protocol_saml::{endpoints::saml_router, DefaultXmlSecurity, ServiceProvider};
//!
//! let sp = ServiceProvider::new(config, Arc::new(DefaultXmlSecurity::new(false)), sessions, replay)?;
//! let app = axum::Router::new().nest("/saml", saml_router(Arc::new(sp)));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bindings;
pub mod builder;
pub mod endpoints;
pub mod error;
pub mod identity;
pub mod metadata;
pub mod service;
pub mod signature;
pub mod slo;
pub mod types;
pub mod validator;
pub mod xml;

#[cfg(test)]
mod testing;

pub use bindings::Binding;
pub use builder::RequestBuilder;
pub use error::{SamlError, SamlResult};
pub use identity::{extract_identity, Identity};
pub use service::{AcsOutcome, LoginOutcome, ServiceProvider, SloOutcome};
pub use signature::{Certificate, SignatureNode};
pub use slo::LogoutOrchestrator;
pub use types::*;
pub use validator::ResponseValidator;
pub use xml::{DefaultXmlSecurity, XmlSecurityProvider};
