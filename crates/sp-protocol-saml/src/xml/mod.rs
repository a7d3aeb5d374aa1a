//! XML security provider.
//!
//! Everything that touches raw XML goes through [`XmlSecurityProvider`]:
//! parsing inbound messages, serializing outbound ones, verifying enveloped
//! signatures and loading the trusted certificate. [`DefaultXmlSecurity`]
//! backs it with quick-xml, exclusive c14n and aws-lc-rs.

mod dom;
mod parser;
mod writer;

use crate::error::{SamlError, SamlResult};
use crate::signature::{verify_enveloped, Certificate, SignatureNode};
use crate::types::ProtocolMessage;


/// Parse, serialize and signature primitives used by the protocol steps.
pub trait XmlSecurityProvider: Send + Sync {
    /// Parses a protocol message.
    ///
    /// # Errors
    ///
    /// [`SamlError::MalformedMessage`] if the bytes are not a well-formed
    /// message the SP understands.
    fn parse(&self, xml: &[u8]) -> SamlResult<ProtocolMessage>;

    /// Serializes a protocol message to XML text.
    ///
    /// # Errors
    ///
    /// [`SamlError::EncodingFailure`] if the writer fails.
    fn serialize(&self, message: &ProtocolMessage) -> SamlResult<String>;

    /// Returns true only if `signature` verifies under `certificate`.
    fn verify_signature(&self, signature: &SignatureNode, certificate: &Certificate) -> bool;

    /// Loads a PEM (or bare Base64 DER) certificate.
    ///
    /// # Errors
    ///
    /// [`SamlError::InvalidCertificate`] if it cannot be parsed.
    fn load_certificate(&self, pem: &str) -> SamlResult<Certificate>;
}

/// The built-in provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultXmlSecurity {
    allow_sha1: bool,
}

impl DefaultXmlSecurity {
    /// Creates a provider; `allow_sha1` admits legacy SHA-1 digests and
    /// signature methods.
    #[must_use]
    pub const fn new(allow_sha1: bool) -> Self {
        Self { allow_sha1 }
    }
}

impl XmlSecurityProvider for DefaultXmlSecurity {
    fn parse(&self, xml: &[u8]) -> SamlResult<ProtocolMessage> {
        let text = std::str::from_utf8(xml)
            .map_err(|e| SamlError::malformed(format!("message is not UTF-8: {e}")))?;
        parser::parse_message(text)
    }

    fn serialize(&self, message: &ProtocolMessage) -> SamlResult<String> {
        writer::write_message(message)
    }

    fn verify_signature(&self, signature: &SignatureNode, certificate: &Certificate) -> bool {
        match verify_enveloped(signature, certificate, self.allow_sha1) {
            Ok(()) => true,
            Err(reason) => {
                tracing::debug!(element_id = %signature.element_id, %reason, "signature rejected");
                false
            }
        }
    }

    fn load_certificate(&self, pem: &str) -> SamlResult<Certificate> {
        Certificate::from_pem(pem)
    }
}
