// ── Audit log entries ──

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditEntry {
    pub event_type: String,
    pub severity: Option<String>,
    pub username: Option<String>,
    pub message: String,
    pub created_at: Option<DateTime<Utc>>,
}
