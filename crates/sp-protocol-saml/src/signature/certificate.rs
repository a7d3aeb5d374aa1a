//! Trusted IdP certificates.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use x509_parser::prelude::*;

use crate::error::{SamlError, SamlResult};

/// A trusted verification key, usually taken from an X.509 certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    public_key: Vec<u8>,
    subject: String,
    not_after: Option<DateTime<Utc>>,
}

impl Certificate {
    /// Loads a certificate from PEM, or from bare Base64 DER without the
    /// `BEGIN`/`END` lines.
    pub fn from_pem(pem: &str) -> SamlResult<Self> {
        let body: String = pem
            .lines()
            .filter(|line| !line.trim_start().starts_with("-----"))
            .flat_map(|line| line.chars().filter(|c| !c.is_whitespace()))
            .collect();
        if body.is_empty() {
            return Err(SamlError::InvalidCertificate("empty certificate".to_string()));
        }

        let der = STANDARD
            .decode(body)
            .map_err(|e| SamlError::InvalidCertificate(format!("base64: {e}")))?;
        Self::from_der(&der)
    }

    /// Loads a DER encoded X.509 certificate.
    pub fn from_der(der: &[u8]) -> SamlResult<Self> {
        let (_, cert) = X509Certificate::from_der(der)
            .map_err(|e| SamlError::InvalidCertificate(format!("failed to parse certificate: {e}")))?;

        let public_key = cert.public_key().subject_public_key.data.to_vec();
        if public_key.is_empty() {
            return Err(SamlError::InvalidCertificate("certificate has no public key".to_string()));
        }

        Ok(Self {
            public_key,
            subject: cert.subject().to_string(),
            not_after: DateTime::from_timestamp(cert.validity().not_after.timestamp(), 0),
        })
    }

    /// Wraps a bare public key (PKCS#1 RSA key or uncompressed EC point).
    #[must_use]
    pub fn from_public_key(public_key: Vec<u8>) -> Self {
        Self {
            public_key,
            subject: String::new(),
            not_after: None,
        }
    }

    /// Raw `subjectPublicKey` bytes.
    #[must_use]
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// Subject distinguished name.
    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Returns true if the certificate's validity ended before `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.not_after.is_some_and(|na| na < now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_pem_is_rejected() {
        let err = Certificate::from_pem("-----BEGIN CERTIFICATE-----\n-----END CERTIFICATE-----").unwrap_err();
        assert!(matches!(err, SamlError::InvalidCertificate(_)));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            Certificate::from_pem("not a certificate").unwrap_err(),
            SamlError::InvalidCertificate(_)
        ));
        let not_der = STANDARD.encode(b"definitely not DER");
        assert!(matches!(
            Certificate::from_pem(&not_der).unwrap_err(),
            SamlError::InvalidCertificate(_)
        ));
    }

    #[test]
    fn bare_public_key_never_expires() {
        let cert = Certificate::from_public_key(vec![4, 1, 2]);
        assert_eq!(cert.public_key(), &[4, 1, 2]);
        assert!(!cert.is_expired_at(Utc::now()));
    }
}
