// ── Core error types ──
//
// User-facing errors from connexa-core. Consumers never match on reqwest
// or serde failures directly: the `From<connexa_api::Error>` impl folds
// transport-layer errors into the four operator-visible categories
// (auth, validation, request, network) plus a few local ones.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Authentication ───────────────────────────────────────────────
    /// Missing, rejected or expired credential. Recovered centrally by
    /// forcing the logged-out state.
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    /// The server wants a TOTP code before it issues a token.
    #[error("Two-factor authentication code required")]
    TwoFactorRequired,

    /// An operation that needs a session was attempted without one.
    #[error("Not logged in")]
    NotAuthenticated,

    // ── Input ────────────────────────────────────────────────────────
    /// Bad operator input, caught before any network call.
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    // ── Server / transport ───────────────────────────────────────────
    /// Non-2xx server response. `message` is the server's own wording
    /// when it supplied one.
    #[error("{message}")]
    Request { status: u16, message: String },

    /// No response received at all.
    #[error("Cannot reach the panel: {reason}")]
    Network { reason: String },

    // ── Local ────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn validation(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_owned(),
            reason: reason.into(),
        }
    }

    /// `true` for errors that mean the session is gone.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. } | Self::NotAuthenticated)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Request { status: 404, .. })
    }

    /// HTTP status of the failed response, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<connexa_api::Error> for CoreError {
    fn from(err: connexa_api::Error) -> Self {
        match err {
            connexa_api::Error::Authentication { message } => CoreError::Auth { message },
            connexa_api::Error::TwoFactorRequired => CoreError::TwoFactorRequired,
            connexa_api::Error::SessionExpired => CoreError::Auth {
                message: "Session expired -- please log in again".into(),
            },
            connexa_api::Error::StaleSession => CoreError::Auth {
                message: "Session changed while the request was in flight".into(),
            },
            connexa_api::Error::Request { status, message } => {
                CoreError::Request { status, message }
            }
            connexa_api::Error::Transport(ref e) => {
                // A status on a reqwest error means a response did arrive.
                if let Some(status) = e.status() {
                    CoreError::Request {
                        status: status.as_u16(),
                        message: e.to_string(),
                    }
                } else if e.is_timeout() {
                    CoreError::Network {
                        reason: "request timed out".into(),
                    }
                } else {
                    CoreError::Network {
                        reason: e.to_string(),
                    }
                }
            }
            connexa_api::Error::Tls(msg) => CoreError::Network {
                reason: format!("TLS error: {msg}"),
            },
            connexa_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            connexa_api::Error::Deserialization { message, .. } => {
                CoreError::Internal(format!("Unexpected response shape: {message}"))
            }
            connexa_api::Error::TokenStorage(msg) => CoreError::Config { message: msg },
        }
    }
}
