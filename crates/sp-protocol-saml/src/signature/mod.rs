//! Enveloped XML signature support.
//!
//! The parser captures every `ds:Signature` it meets as a [`SignatureNode`]
//! holding both the signature fields and standalone copies of the signed
//! content. [`verify_enveloped`] then checks it against a trusted
//! [`Certificate`]:
//!
//! 1. exactly one Reference, pointing at the element carrying the signature
//! 2. only enveloped-signature and exclusive c14n transforms
//! 3. digest of the canonicalized element matches DigestValue
//! 4. SignatureValue verifies over the canonicalized SignedInfo
//!
//! SHA-1 digests and signature methods are refused unless explicitly allowed.

mod certificate;
mod verify;

pub use certificate::Certificate;
pub use verify::{canonicalize, verify_enveloped};

/// A `ds:Signature` captured from an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureNode {
    /// `ID` of the element the signature is enveloped in.
    pub element_id: String,
    /// URI of the first Reference.
    pub reference_uri: String,
    /// Number of Reference elements in SignedInfo.
    pub reference_count: usize,
    /// Transform URIs of the first Reference, in order.
    pub transforms: Vec<String>,
    /// CanonicalizationMethod URI for SignedInfo.
    pub canonicalization_method: String,
    /// SignatureMethod URI.
    pub signature_method: String,
    /// DigestMethod URI of the first Reference.
    pub digest_method: String,
    /// Base64 DigestValue of the first Reference.
    pub digest_value: String,
    /// Base64 SignatureValue.
    pub signature_value: String,
    /// SignedInfo as a standalone fragment with its in-scope namespaces.
    pub signed_info_xml: String,
    /// The signed element with the Signature removed, as a standalone fragment.
    pub signed_element_xml: String,
}
