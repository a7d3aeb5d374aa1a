//! Service provider configuration.
//!
//! Configuration is loaded from environment variables (optionally seeded from
//! a `.env` file) with defaults for everything that has a sensible one. The
//! IdP coordinates have no default and must be supplied.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Default NameID format requested from the IdP.
pub const DEFAULT_NAME_ID_FORMAT: &str = "urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress";

/// Service provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpConfig {
    /// Entity ID of this service provider.
    pub entity_id: String,

    /// Assertion Consumer Service URL of this SP.
    pub acs_url: String,

    /// Single Logout Service URL of this SP.
    pub slo_url: String,

    /// Entity ID of the trusted identity provider.
    pub idp_entity_id: String,

    /// IdP Single Sign-On endpoint.
    pub idp_sso_url: String,

    /// IdP Single Logout endpoint.
    pub idp_slo_url: String,

    /// PEM (or bare base64 DER) certificate used to verify IdP signatures.
    pub idp_certificate: Option<String>,

    /// NameID format requested in AuthnRequests.
    pub name_id_format: String,

    /// Reject assertions that carry no signature (directly or via the response).
    pub want_assertions_signed: bool,

    /// Skip signature verification when no IdP certificate is configured.
    ///
    /// Off by default: without a certificate every signature check fails.
    pub allow_unsigned_without_certificate: bool,

    /// Accept SHA-1 based XML signatures.
    pub allow_sha1_signatures: bool,

    /// Session lifetime measured from creation, in seconds.
    pub session_ttl_secs: u64,

    /// How long consumed message IDs are remembered, in seconds.
    pub replay_window_secs: u64,

    /// Maximum accepted age of a response `IssueInstant`, in seconds.
    pub max_response_age_secs: u64,

    /// Interval between background store sweeps, in seconds.
    pub sweep_interval_secs: u64,

    /// Host to bind the HTTP listener to.
    pub host: String,

    /// Port to bind the HTTP listener to.
    pub port: u16,
}

impl SpConfig {
    /// Loads configuration from environment variables.
    ///
    /// A `.env` file in the working directory is read first when present.
    pub fn from_env() -> ConfigResult<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let text = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let idp_certificate = match (lookup("SAML_IDP_CERTIFICATE"), lookup("SAML_IDP_CERTIFICATE_FILE")) {
            (Some(pem), _) if !pem.trim().is_empty() => Some(pem),
            (_, Some(path)) if !path.trim().is_empty() => {
                let pem = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                    path: path.clone(),
                    source,
                })?;
                Some(pem)
            }
            _ => None,
        };

        let config = Self {
            entity_id: text("SAML_SP_ENTITY_ID", &defaults.entity_id),
            acs_url: text("SAML_SP_ACS_URL", &defaults.acs_url),
            slo_url: text("SAML_SP_SLO_URL", &defaults.slo_url),
            idp_entity_id: required("SAML_IDP_ENTITY_ID")?,
            idp_sso_url: required("SAML_IDP_SSO_URL")?,
            idp_slo_url: required("SAML_IDP_SLO_URL")?,
            idp_certificate,
            name_id_format: text("SAML_NAME_ID_FORMAT", &defaults.name_id_format),
            want_assertions_signed: parse_flag(
                lookup("SAML_WANT_ASSERTIONS_SIGNED"),
                defaults.want_assertions_signed,
            ),
            allow_unsigned_without_certificate: parse_flag(
                lookup("SAML_ALLOW_UNSIGNED"),
                defaults.allow_unsigned_without_certificate,
            ),
            allow_sha1_signatures: parse_flag(
                lookup("SAML_ALLOW_SHA1"),
                defaults.allow_sha1_signatures,
            ),
            session_ttl_secs: parse_number(
                "SAML_SESSION_TTL_SECS",
                lookup("SAML_SESSION_TTL_SECS"),
                defaults.session_ttl_secs,
            )?,
            replay_window_secs: parse_number(
                "SAML_REPLAY_WINDOW_SECS",
                lookup("SAML_REPLAY_WINDOW_SECS"),
                defaults.replay_window_secs,
            )?,
            max_response_age_secs: parse_number(
                "SAML_MAX_RESPONSE_AGE_SECS",
                lookup("SAML_MAX_RESPONSE_AGE_SECS"),
                defaults.max_response_age_secs,
            )?,
            sweep_interval_secs: parse_number(
                "SAML_SWEEP_INTERVAL_SECS",
                lookup("SAML_SWEEP_INTERVAL_SECS"),
                defaults.sweep_interval_secs,
            )?,
            host: text("SP_HOST", &defaults.host),
            port: parse_number("SP_PORT", lookup("SP_PORT"), defaults.port)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Creates a configuration for tests using `example` hosts.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            entity_id: "https://sp.example".to_string(),
            acs_url: "https://sp.example/acs".to_string(),
            slo_url: "https://sp.example/slo".to_string(),
            idp_entity_id: "https://idp.example".to_string(),
            idp_sso_url: "https://idp.example/sso".to_string(),
            idp_slo_url: "https://idp.example/slo".to_string(),
            host: "127.0.0.1".to_string(),
            port: 0,
            ..Self::default()
        }
    }

    /// Checks that required settings are present and lifetimes are positive.
    pub fn validate(&self) -> ConfigResult<()> {
        let urls = [
            ("SAML_SP_ENTITY_ID", &self.entity_id),
            ("SAML_SP_ACS_URL", &self.acs_url),
            ("SAML_SP_SLO_URL", &self.slo_url),
            ("SAML_IDP_ENTITY_ID", &self.idp_entity_id),
            ("SAML_IDP_SSO_URL", &self.idp_sso_url),
            ("SAML_IDP_SLO_URL", &self.idp_slo_url),
        ];
        for (name, value) in urls {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing(name));
            }
        }

        let lifetimes = [
            ("SAML_SESSION_TTL_SECS", self.session_ttl_secs),
            ("SAML_REPLAY_WINDOW_SECS", self.replay_window_secs),
            ("SAML_MAX_RESPONSE_AGE_SECS", self.max_response_age_secs),
            ("SAML_SWEEP_INTERVAL_SECS", self.sweep_interval_secs),
        ];
        for (name, value) in lifetimes {
            if value == 0 {
                return Err(ConfigError::invalid(name, "must be greater than zero"));
            }
        }

        Ok(())
    }

    /// Returns true when an IdP certificate has been configured.
    #[must_use]
    pub fn has_idp_certificate(&self) -> bool {
        self.idp_certificate
            .as_deref()
            .is_some_and(|pem| !pem.trim().is_empty())
    }

    /// Session lifetime.
    #[must_use]
    pub const fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    /// Replay window.
    #[must_use]
    pub const fn replay_window(&self) -> Duration {
        Duration::from_secs(self.replay_window_secs)
    }

    /// Maximum response age.
    #[must_use]
    pub const fn max_response_age(&self) -> Duration {
        Duration::from_secs(self.max_response_age_secs)
    }

    /// Sweep interval.
    #[must_use]
    pub const fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for SpConfig {
    fn default() -> Self {
        Self {
            entity_id: "http://localhost:8080/saml/metadata".to_string(),
            acs_url: "http://localhost:8080/saml/acs".to_string(),
            slo_url: "http://localhost:8080/saml/slo".to_string(),
            idp_entity_id: String::new(),
            idp_sso_url: String::new(),
            idp_slo_url: String::new(),
            idp_certificate: None,
            name_id_format: DEFAULT_NAME_ID_FORMAT.to_string(),
            want_assertions_signed: true,
            allow_unsigned_without_certificate: false,
            allow_sha1_signatures: false,
            session_ttl_secs: 1800, // 30 minutes
            replay_window_secs: 300, // 5 minutes
            max_response_age_secs: 300,
            sweep_interval_secs: 60,
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

fn parse_flag(value: Option<String>, default: bool) -> bool {
    value
        .map(|v| {
            let v = v.trim().to_ascii_lowercase();
            !(v == "false" || v == "0" || v == "no" || v == "off")
        })
        .unwrap_or(default)
}

fn parse_number<T>(name: &'static str, value: Option<String>, default: T) -> ConfigResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::invalid(name, e.to_string())),
        None => Ok(default),
    }
}
