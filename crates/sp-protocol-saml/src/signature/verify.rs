//! Enveloped signature verification.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sp_crypto::{DigestAlgorithm, SignatureAlgorithm};
use xml_canonicalization::Canonicalizer;

use super::{Certificate, SignatureNode};
use crate::types::transforms;

/// Applies exclusive XML canonicalization to a standalone fragment.
pub fn canonicalize(xml: &str, with_comments: bool) -> Result<String, String> {
    let mut output = Vec::new();
    Canonicalizer::read_from_str(xml)
        .write_to_writer(&mut output)
        .canonicalize(with_comments)
        .map_err(|e| format!("canonicalization failed: {e}"))?;
    String::from_utf8(output).map_err(|e| format!("canonical form is not UTF-8: {e}"))
}

/// Verifies `signature` against `certificate`.
///
/// Returns the reason on failure; the caller decides how much of it to log.
pub fn verify_enveloped(
    signature: &SignatureNode,
    certificate: &Certificate,
    allow_sha1: bool,
) -> Result<(), String> {
    if signature.reference_count != 1 {
        return Err(format!(
            "expected exactly one reference, found {}",
            signature.reference_count
        ));
    }
    if signature.reference_uri != format!("#{}", signature.element_id) {
        return Err(format!(
            "reference {} does not point at signed element {}",
            signature.reference_uri, signature.element_id
        ));
    }

    let mut content_with_comments = false;
    for transform in &signature.transforms {
        match transform.as_str() {
            transforms::ENVELOPED_SIGNATURE | transforms::EXCLUSIVE_C14N => {}
            transforms::EXCLUSIVE_C14N_WITH_COMMENTS => content_with_comments = true,
            other => return Err(format!("unsupported transform {other}")),
        }
    }
    let signed_info_with_comments = match signature.canonicalization_method.as_str() {
        transforms::EXCLUSIVE_C14N => false,
        transforms::EXCLUSIVE_C14N_WITH_COMMENTS => true,
        other => return Err(format!("unsupported canonicalization {other}")),
    };

    let digest = DigestAlgorithm::from_uri(&signature.digest_method)
        .ok_or_else(|| format!("unsupported digest {}", signature.digest_method))?;
    if digest.is_deprecated() && !allow_sha1 {
        return Err("SHA-1 digests are not allowed".to_string());
    }

    let canonical_element = canonicalize(&signature.signed_element_xml, content_with_comments)?;
    let expected_digest = decode(&signature.digest_value, "DigestValue")?;
    if digest.digest(canonical_element.as_bytes()) != expected_digest {
        return Err("digest mismatch".to_string());
    }

    let algorithm = SignatureAlgorithm::from_uri(&signature.signature_method)
        .ok_or_else(|| format!("unsupported signature method {}", signature.signature_method))?;
    let canonical_signed_info = canonicalize(&signature.signed_info_xml, signed_info_with_comments)?;
    let signature_bytes = decode(&signature.signature_value, "SignatureValue")?;

    match sp_crypto::verify_signature(
        algorithm,
        certificate.public_key(),
        canonical_signed_info.as_bytes(),
        &signature_bytes,
        allow_sha1,
    ) {
        Ok(true) => Ok(()),
        Ok(false) => Err("signature value mismatch".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

fn decode(value: &str, what: &str) -> Result<Vec<u8>, String> {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|e| format!("{what} is not base64: {e}"))
}
