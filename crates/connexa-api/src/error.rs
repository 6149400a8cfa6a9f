use thiserror::Error;

/// Fallback message used when an error response carries no usable `detail`.
pub const GENERIC_FAILURE: &str = "Request failed";

/// Top-level error type for the `connexa-api` crate.
///
/// Covers every failure mode of the admin REST API: authentication,
/// transport, non-2xx responses, response decoding, and token persistence.
/// `connexa-core` maps these into its own error taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login rejected (wrong credentials, account locked, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// The server asked for a TOTP code before it will issue a token.
    #[error("Two-factor authentication token required")]
    TwoFactorRequired,

    /// Any 401 on an authenticated call. The session token has already
    /// been cleared by the time the caller sees this.
    #[error("Session expired -- re-authentication required")]
    SessionExpired,

    /// A 401 that answered a request sent under an earlier session. The
    /// current session was left untouched.
    #[error("Response belongs to a previous session")]
    StaleSession,

    // ── Server responses ────────────────────────────────────────────
    /// Non-2xx response. `message` is the payload's `detail` when present.
    #[error("{message} (HTTP {status})")]
    Request { status: u16, message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or client construction failed.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON did not match the expected shape, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    // ── Persistence ─────────────────────────────────────────────────
    /// Reading or writing the persisted session token failed.
    #[error("Token storage error: {0}")]
    TokenStorage(String),
}

impl Error {
    /// Returns `true` if re-authenticating might resolve this error.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }

    /// Returns `true` if no HTTP response was received at all.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Tls(_))
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Request { status: 404, .. })
    }

    /// HTTP status of the failed response, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request { status, .. } => Some(*status),
            Self::SessionExpired | Self::StaleSession => Some(401),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Error body shape used by the admin API: `{"detail": "..."}`.
#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

/// Extract the human-readable `detail` field from an error body.
///
/// Returns `None` for bodies that are not JSON or carry no detail. A
/// non-string detail (validation errors come back as arrays) is rendered
/// as compact JSON rather than dropped.
pub(crate) fn extract_detail(raw: &str) -> Option<String> {
    let parsed: ErrorResponse = serde_json::from_str(raw).ok()?;
    match parsed.detail? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s),
        serde_json::Value::String(_) | serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Build a [`Error::Request`] from a non-2xx status and its raw body.
pub(crate) fn request_error(status: u16, raw: &str) -> Error {
    Error::Request {
        status,
        message: extract_detail(raw).unwrap_or_else(|| GENERIC_FAILURE.to_owned()),
    }
}
