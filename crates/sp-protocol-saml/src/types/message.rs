//! The closed set of top-level protocol messages.

use super::{AuthnRequest, LogoutRequest, LogoutResponse, Response};

/// Any top-level message the SP sends or receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolMessage {
    /// SP to IdP authentication request.
    AuthnRequest(AuthnRequest),
    /// IdP to SP authentication response.
    Response(Response),
    /// Logout request, either direction.
    LogoutRequest(LogoutRequest),
    /// Logout response, either direction.
    LogoutResponse(LogoutResponse),
}

impl ProtocolMessage {
    /// Local name of the root element.
    #[must_use]
    pub const fn element_name(&self) -> &'static str {
        match self {
            Self::AuthnRequest(_) => "AuthnRequest",
            Self::Response(_) => "Response",
            Self::LogoutRequest(_) => "LogoutRequest",
            Self::LogoutResponse(_) => "LogoutResponse",
        }
    }

    /// Message ID.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::AuthnRequest(m) => &m.id,
            Self::Response(m) => &m.id,
            Self::LogoutRequest(m) => &m.id,
            Self::LogoutResponse(m) => &m.id,
        }
    }
}

impl From<AuthnRequest> for ProtocolMessage {
    fn from(m: AuthnRequest) -> Self {
        Self::AuthnRequest(m)
    }
}

impl From<Response> for ProtocolMessage {
    fn from(m: Response) -> Self {
        Self::Response(m)
    }
}

impl From<LogoutRequest> for ProtocolMessage {
    fn from(m: LogoutRequest) -> Self {
        Self::LogoutRequest(m)
    }
}

impl From<LogoutResponse> for ProtocolMessage {
    fn from(m: LogoutResponse) -> Self {
        Self::LogoutResponse(m)
    }
}
