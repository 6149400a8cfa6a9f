// Wire types for the admin REST API (`/api/v1`).
//
// Field names mirror the server's JSON exactly. Every optional or
// server-variant field is defaulted so that a partial payload still
// decodes; domain conversion and validation happen in connexa-core.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ── Auth ─────────────────────────────────────────────────────────────

/// `POST /auth/login` body.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totp_token: Option<String>,
}

/// `POST /auth/login` response. A token-less response carrying a
/// `detail` is how the server asks for a second factor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub require_password_change: bool,
    #[serde(default)]
    pub detail: Option<String>,
}

/// `GET /auth/me` response.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UserResponse {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub totp_enabled: bool,
    #[serde(default)]
    pub require_password_change: bool,
}

/// `POST /auth/change-password` body.
#[derive(Debug, Clone, Serialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// `POST /auth/setup-2fa` response. `qr_code` is a PNG data URI
/// rendering of `uri`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TwoFactorSetupResponse {
    #[serde(default)]
    pub secret: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub qr_code: Option<String>,
}

// ── Nodes ────────────────────────────────────────────────────────────

/// One egress node as reported by `GET /nodes/`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct NodeResponse {
    pub node_id: String,
    #[serde(default)]
    pub socks_port: u16,
    #[serde(default)]
    pub control_port: u16,
    #[serde(default)]
    pub exit_ip: Option<String>,
    #[serde(default)]
    pub exit_country: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub latency_ms: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeListResponse {
    #[serde(default)]
    pub total: Option<u32>,
    #[serde(default)]
    pub nodes: Vec<NodeResponse>,
}

/// `GET /nodes/stats/summary` response.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StatsResponse {
    #[serde(default)]
    pub total_nodes: u32,
    #[serde(default)]
    pub healthy_nodes: u32,
    #[serde(default)]
    pub unhealthy_nodes: u32,
    #[serde(default)]
    pub health_percentage: f64,
    #[serde(default)]
    pub countries: BTreeMap<String, u32>,
}

/// `GET /metrics/` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsResponse {
    #[serde(default)]
    pub nodes: NodeMetrics,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeMetrics {
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub healthy: u32,
    #[serde(default)]
    pub unhealthy: u32,
    #[serde(default)]
    pub health_percentage: f64,
}

// ── Configuration ────────────────────────────────────────────────────

/// `GET /config/` response. Only the fields the panel shows are decoded.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConfigResponse {
    #[serde(default)]
    pub tor_pool_size: u32,
    #[serde(default)]
    pub tor_base_socks_port: u16,
    #[serde(default)]
    pub tor_countries: Option<Vec<String>>,
    #[serde(default)]
    pub auto_rotate_enabled: bool,
    #[serde(default)]
    pub firewall_backend: String,
    #[serde(default)]
    pub tls_enable: bool,
    #[serde(default)]
    pub domain: Option<String>,
}

/// `POST /config/tor/countries` body. Countries travel comma-joined.
#[derive(Debug, Clone, Serialize)]
pub struct CountriesRequest {
    pub countries: String,
    pub strict_nodes: bool,
}

/// `GET /config/whitelist` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WhitelistResponse {
    #[serde(default)]
    pub whitelist: Vec<String>,
}

/// `POST /config/whitelist` body.
#[derive(Debug, Clone, Serialize)]
pub struct WhitelistEntryRequest {
    pub ip: String,
}

// ── Export tokens ────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ExportTokenResponse {
    pub id: i64,
    #[serde(default)]
    pub description: Option<String>,
    pub expires_at: String,
    #[serde(default)]
    pub is_revoked: bool,
    #[serde(default)]
    pub use_count: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenListResponse {
    #[serde(default)]
    pub tokens: Vec<ExportTokenResponse>,
}

/// `POST /export/tokens` body.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateTokenRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// `POST /export/tokens` response. The raw token is only ever shown here.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedTokenResponse {
    pub token: String,
    pub expires_at: String,
    #[serde(default)]
    pub description: Option<String>,
}

// ── Audit log ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuditEntryResponse {
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogListResponse {
    #[serde(default)]
    pub logs: Vec<AuditEntryResponse>,
}

// ── Generic ──────────────────────────────────────────────────────────

/// `{"message": "..."}` acknowledgement returned by command endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}
