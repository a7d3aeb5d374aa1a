//! Protocol status.

use super::status_codes;

/// Status of a Response or LogoutResponse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    /// Top-level status code.
    pub code: StatusCode,
    /// Optional human-readable message.
    pub message: Option<String>,
}

impl Status {
    /// Creates a success status.
    #[must_use]
    pub fn success() -> Self {
        Self {
            code: StatusCode::new(status_codes::SUCCESS),
            message: None,
        }
    }

    /// Creates a responder failure status.
    #[must_use]
    pub fn responder(message: impl Into<String>) -> Self {
        Self {
            code: StatusCode::new(status_codes::RESPONDER),
            message: Some(message.into()),
        }
    }

    /// Success when `success`, otherwise a responder failure.
    #[must_use]
    pub fn from_outcome(success: bool) -> Self {
        if success {
            Self::success()
        } else {
            Self::responder("Logout failed")
        }
    }

    /// Returns true if the top-level code is Success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.code.value == status_codes::SUCCESS
    }
}

/// A status code with an optional nested code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCode {
    /// Status code URI.
    pub value: String,
    /// Second-level code.
    pub sub_code: Option<Box<StatusCode>>,
}

impl StatusCode {
    /// Creates a status code without a nested code.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            sub_code: None,
        }
    }

    /// Returns `value` followed by the nested codes, `/`-separated.
    #[must_use]
    pub fn describe(&self) -> String {
        match &self.sub_code {
            Some(sub) => format!("{}/{}", self.value, sub.describe()),
            None => self.value.clone(),
        }
    }
}
