// ── Export tokens ──

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::Serialize;

/// An issued export token as listed by the server. The raw secret is
/// never part of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportToken {
    pub id: i64,
    pub description: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub is_revoked: bool,
    pub use_count: u64,
}

impl ExportToken {
    /// Not revoked and not past its expiry at `now`.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_revoked && self.expires_at > now
    }

    pub fn is_active(&self) -> bool {
        self.is_active_at(Utc::now())
    }
}

/// A freshly created token. The secret is shown to the operator once.
#[derive(Debug, Clone)]
pub struct CreatedExportToken {
    pub token: SecretString,
    pub expires_at: DateTime<Utc>,
    pub description: Option<String>,
}
