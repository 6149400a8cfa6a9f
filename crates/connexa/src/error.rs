//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and process exit codes.

use miette::Diagnostic;
use thiserror::Error;

use connexa_config::ConfigError;
use connexa_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Cannot reach the panel: {reason}")]
    #[diagnostic(
        code(connexa::connection_failed),
        help(
            "Check that the panel is running and reachable.\n\
             Verify the profile's base_url with: connexa config show"
        )
    )]
    ConnectionFailed { reason: String },

    #[error("TLS certificate verification failed: {reason}")]
    #[diagnostic(
        code(connexa::tls_error),
        help(
            "The panel is probably using a self-signed certificate.\n\
             Use --insecure (-k) to accept it, or configure ca_cert in your profile."
        )
    )]
    TlsError { reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(connexa::timeout),
        help("Increase the timeout with --timeout or check the panel's responsiveness.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(code(connexa::auth_failed), help("Run: connexa login"))]
    AuthFailed { message: String },

    #[error("Not logged in to profile '{profile}'")]
    #[diagnostic(code(connexa::not_logged_in), help("Run: connexa login --profile {profile}"))]
    NotLoggedIn { profile: String },

    #[error("Two-factor authentication code required")]
    #[diagnostic(
        code(connexa::totp_required),
        help("Pass the current code from your authenticator app with --totp.")
    )]
    TwoFactorRequired,

    #[error("No username configured for profile '{profile}'")]
    #[diagnostic(
        code(connexa::no_username),
        help(
            "Pass --username, set CONNEXA_USERNAME, or add username to the profile\n\
             with: connexa config init"
        )
    )]
    NoUsername { profile: String },

    #[error("A password change is required before the dashboard is available")]
    #[diagnostic(code(connexa::password_change_required), help("Run: connexa password"))]
    PasswordChangeRequired,

    // ── Resources ────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(connexa::not_found), help("Run: connexa {list_command}"))]
    NotFound {
        message: String,
        list_command: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(connexa::api_error))]
    Api { status: Option<u16>, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(connexa::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(connexa::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: connexa config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No panel URL configured")]
    #[diagnostic(
        code(connexa::no_config),
        help(
            "Create a profile with: connexa config init\n\
             Or pass --url. Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(connexa::config))]
    Config { message: String },

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(connexa::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::TlsError { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. }
            | Self::NotLoggedIn { .. }
            | Self::TwoFactorRequired
            | Self::NoUsername { .. }
            | Self::PasswordChangeRequired => exit_code::AUTH,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Auth { message } => CliError::AuthFailed { message },
            CoreError::TwoFactorRequired => CliError::TwoFactorRequired,
            CoreError::NotAuthenticated => CliError::NotLoggedIn {
                profile: "default".into(),
            },
            CoreError::Validation { field, reason } => CliError::Validation { field, reason },
            CoreError::Request {
                status: 404,
                message,
            } => CliError::NotFound {
                message,
                list_command: "nodes list".into(),
            },
            CoreError::Request { status, message } => CliError::Api {
                status: Some(status),
                message,
            },
            CoreError::Network { reason } => {
                if reason.contains("timed out") {
                    CliError::Timeout
                } else if reason.starts_with("TLS") || reason.contains("certificate") {
                    CliError::TlsError { reason }
                } else {
                    CliError::ConnectionFailed { reason }
                }
            }
            CoreError::Config { message } => CliError::Config { message },
            CoreError::Internal(message) => CliError::Api {
                status: None,
                message,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::UnknownProfile { name } => CliError::ProfileNotFound {
                name,
                available: String::new(),
            },
            ConfigError::NoUsername { profile } => CliError::NoUsername { profile },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}
