// ── Runtime connection configuration ──
//
// Describes *how* to reach the admin panel. Never touches disk: the CLI
// builds a `ControllerConfig` from its profile and hands it in together
// with a `SessionStore`.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Extra CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed panel on a private address).
    DangerAcceptInvalid,
}

/// Configuration for one panel.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Panel root URL (e.g. `https://10.0.0.5:8000`). `/api/v1` is appended.
    pub url: Url,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Node poll cadence while the nodes tab is active.
    pub poll_interval: Duration,
    /// How many audit entries the logs tab asks for.
    pub logs_limit: u32,
}

/// Poll cadence used when none is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Audit entries fetched per logs-tab load.
pub const DEFAULT_LOGS_LIMIT: u32 = 100;

impl ControllerConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            poll_interval: DEFAULT_POLL_INTERVAL,
            logs_limit: DEFAULT_LOGS_LIMIT,
        }
    }
}
