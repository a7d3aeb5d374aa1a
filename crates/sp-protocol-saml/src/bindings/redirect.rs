//! HTTP-Redirect binding.
//!
//! Messages travel as a DEFLATE-compressed, Base64 encoded, URL-encoded
//! query parameter on a `GET` to the destination.

use crate::error::{SamlError, SamlResult};

use super::{compress_and_encode, decode_and_decompress, MessageParam};

/// A message pulled back out of a redirect URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectMessage {
    /// Which parameter carried the message.
    pub param: MessageParam,
    /// Decoded XML text.
    pub xml: String,
    /// RelayState, if the URL carried one.
    pub relay_state: Option<String>,
}

/// HTTP-Redirect binding encoder/decoder.
pub struct HttpRedirectBinding;

impl HttpRedirectBinding {
    /// Builds `<destination>?<param>=<encoded>[&RelayState=<state>]`.
    ///
    /// `&` is used instead of `?` when the destination already has a query.
    /// An empty or absent RelayState is left out entirely.
    pub fn build_url(
        destination: &str,
        param: MessageParam,
        xml: &str,
        relay_state: Option<&str>,
    ) -> SamlResult<String> {
        let encoded = compress_and_encode(xml)?;
        let separator = if destination.contains('?') { '&' } else { '?' };

        let mut url = format!(
            "{destination}{separator}{}={}",
            param.name(),
            urlencoding::encode(&encoded)
        );
        if let Some(state) = relay_state.filter(|s| !s.is_empty()) {
            url.push_str("&RelayState=");
            url.push_str(&urlencoding::encode(state));
        }
        Ok(url)
    }

    /// Decodes the message carried by a full redirect URL.
    pub fn decode_url(url: &str) -> SamlResult<RedirectMessage> {
        let parsed =
            url::Url::parse(url).map_err(|e| SamlError::malformed(format!("invalid URL: {e}")))?;

        let mut message = None;
        let mut relay_state = None;
        for (key, value) in parsed.query_pairs() {
            match key.as_ref() {
                "SAMLRequest" => message = Some((MessageParam::Request, value.into_owned())),
                "SAMLResponse" => message = Some((MessageParam::Response, value.into_owned())),
                "RelayState" => relay_state = Some(value.into_owned()),
                _ => {}
            }
        }

        let (param, encoded) =
            message.ok_or_else(|| SamlError::malformed("no SAMLRequest or SAMLResponse parameter"))?;
        Ok(RedirectMessage {
            param,
            xml: decode_and_decompress(&encoded)?,
            relay_state,
        })
    }
}
