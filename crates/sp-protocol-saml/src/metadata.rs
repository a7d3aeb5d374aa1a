//! SP metadata.
//!
//! Describes this service provider to the IdP: entity ID, supported NameID
//! format and the ACS and SLO endpoints for both bindings.

use sp_core::SpConfig;

use crate::bindings::Binding;
use crate::types::{MD_NS, SAMLP_NS};

/// Content type of a metadata document.
pub const METADATA_CONTENT_TYPE: &str = "application/samlmetadata+xml";

/// Renders the SP `EntityDescriptor`.
#[must_use]
pub fn sp_metadata(config: &SpConfig) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<md:EntityDescriptor xmlns:md="{md}" entityID="{entity_id}">
    <md:SPSSODescriptor AuthnRequestsSigned="false" WantAssertionsSigned="{want_signed}" protocolSupportEnumeration="{protocol}">
        <md:SingleLogoutService Binding="{redirect}" Location="{slo}"/>
        <md:SingleLogoutService Binding="{post}" Location="{slo}"/>
        <md:NameIDFormat>{name_id_format}</md:NameIDFormat>
        <md:AssertionConsumerService Binding="{post}" Location="{acs}" index="0" isDefault="true"/>
        <md:AssertionConsumerService Binding="{redirect}" Location="{acs}" index="1"/>
    </md:SPSSODescriptor>
</md:EntityDescriptor>"#,
        md = MD_NS,
        protocol = SAMLP_NS,
        entity_id = escape(&config.entity_id),
        want_signed = config.want_assertions_signed,
        redirect = Binding::Redirect.uri(),
        post = Binding::Post.uri(),
        slo = escape(&config.slo_url),
        acs = escape(&config.acs_url),
        name_id_format = escape(&config.name_id_format),
    )
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
