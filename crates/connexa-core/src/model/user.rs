// ── Current user ──

use secrecy::SecretString;
use serde::Serialize;

/// The logged-in operator. Discarded on logout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentUser {
    pub username: String,
    pub is_admin: bool,
    pub totp_enabled: bool,
    pub requires_password_change: bool,
}

/// A pending two-factor enrollment. `uri` embeds the secret, so both
/// stay wrapped until shown to the operator.
#[derive(Debug, Clone)]
pub struct TwoFactorEnrollment {
    pub secret: SecretString,
    pub uri: SecretString,
}
