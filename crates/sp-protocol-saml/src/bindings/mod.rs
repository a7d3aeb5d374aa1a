//! SAML bindings and the message codec.
//!
//! Two bindings carry messages between the SP and the IdP:
//!
//! - **HTTP-Redirect** - raw DEFLATE, then Base64, then URL-encoded into a
//!   query parameter
//! - **HTTP-POST** - plain Base64 in a form field
//!
//! # Usage
//!
//! ```rust,ignore
//! use sp_protocol_saml::bindings::{HttpRedirectBinding, MessageParam};
//!
//! let url = HttpRedirectBinding::build_url(
//!     "https://idp.example/sso",
//!     MessageParam::Request,
//!     &request_xml,
//!     Some("/dashboard"),
//! )?;
//! ```

mod codec;
mod post;
mod redirect;

pub use codec::*;
pub use post::*;
pub use redirect::*;

use serde::{Deserialize, Serialize};

use crate::types::binding_uris;

/// Transport binding of an inbound or outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Binding {
    /// HTTP-Redirect: DEFLATE + Base64 in the query string.
    Redirect,
    /// HTTP-POST: Base64 in a form field.
    Post,
}

impl Binding {
    /// Returns the binding URI.
    #[must_use]
    pub const fn uri(self) -> &'static str {
        match self {
            Self::Redirect => binding_uris::HTTP_REDIRECT,
            Self::Post => binding_uris::HTTP_POST,
        }
    }

    /// Parses a binding from its URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            binding_uris::HTTP_REDIRECT => Some(Self::Redirect),
            binding_uris::HTTP_POST => Some(Self::Post),
            _ => None,
        }
    }

    /// Decodes a wire value received over this binding into XML text.
    ///
    /// The value must already be URL-decoded (as form and query extractors
    /// deliver it).
    pub fn decode(self, encoded: &str) -> crate::SamlResult<String> {
        match self {
            Self::Redirect => decode_and_decompress(encoded),
            Self::Post => decode_base64(encoded),
        }
    }
}

/// Name of the parameter a message travels in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageParam {
    /// `SAMLRequest`: AuthnRequest and LogoutRequest.
    Request,
    /// `SAMLResponse`: Response and LogoutResponse.
    Response,
}

impl MessageParam {
    /// Returns the form/query parameter name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Request => "SAMLRequest",
            Self::Response => "SAMLResponse",
        }
    }
}
