//! HTTP-POST binding.
//!
//! Messages travel Base64 encoded (no compression) in a form field. The SP
//! hands the browser either the raw form body or an auto-submitting page.

use super::{encode_base64, MessageParam};

/// HTTP-POST binding encoder.
pub struct HttpPostBinding;

impl HttpPostBinding {
    /// Builds the `application/x-www-form-urlencoded` body
    /// `<param>=<base64>[&RelayState=<state>]`.
    ///
    /// An empty or absent RelayState is left out entirely.
    #[must_use]
    pub fn form_data(param: MessageParam, xml: &str, relay_state: Option<&str>) -> String {
        let mut body = format!("{}={}", param.name(), urlencoding::encode(&encode_base64(xml)));
        if let Some(state) = relay_state.filter(|s| !s.is_empty()) {
            body.push_str("&RelayState=");
            body.push_str(&urlencoding::encode(state));
        }
        body
    }

    /// Renders an HTML page that auto-submits the message to `destination`.
    #[must_use]
    pub fn auto_submit_form(
        destination: &str,
        param: MessageParam,
        xml: &str,
        relay_state: Option<&str>,
    ) -> String {
        let relay_state_input = relay_state
            .filter(|s| !s.is_empty())
            .map(|rs| {
                format!(
                    r#"<input type="hidden" name="RelayState" value="{}"/>"#,
                    html_escape(rs)
                )
            })
            .unwrap_or_default();

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>Continue to identity provider</title>
</head>
<body onload="document.forms[0].submit()">
    <form method="post" action="{}">
        <input type="hidden" name="{}" value="{}"/>
        {}
        <noscript>
            <input type="submit" value="Continue"/>
        </noscript>
    </form>
</body>
</html>"#,
            html_escape(destination),
            param.name(),
            encode_base64(xml),
            relay_state_input
        )
    }
}

/// Escapes HTML special characters.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
