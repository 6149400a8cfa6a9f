// ── Wire -> domain conversion ──
//
// Bridges `connexa_api::types` into the canonical model. Free-text fields
// that are blank on the wire become `None`; unparsable IPs are treated as
// absent; naive server timestamps are read as UTC.

use std::net::IpAddr;

use chrono::{DateTime, NaiveDateTime, Utc};
use connexa_api::types::{
    AuditEntryResponse, ConfigResponse, CreatedTokenResponse, ExportTokenResponse,
    MetricsResponse, NodeResponse, StatsResponse, TwoFactorSetupResponse, UserResponse,
};
use secrecy::SecretString;

use crate::error::CoreError;
use crate::model::{
    AuditEntry, CreatedExportToken, CurrentUser, ExportToken, Node, PoolConfig, PoolMetrics,
    PoolStats, TwoFactorEnrollment,
};

// ── Helpers ──────────────────────────────────────────────────────────

fn non_blank(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
}

fn parse_ip(raw: Option<&str>) -> Option<IpAddr> {
    raw.and_then(|s| s.trim().parse().ok())
}

/// Parse a server timestamp. RFC 3339 first, then offset-less ISO forms,
/// which the backend emits for UTC values.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

// ── Conversions ──────────────────────────────────────────────────────

impl From<NodeResponse> for Node {
    fn from(n: NodeResponse) -> Self {
        Self {
            exit_ip: parse_ip(n.exit_ip.as_deref()),
            exit_country: non_blank(n.exit_country).map(|c| c.to_ascii_uppercase()),
            status: non_blank(n.status),
            node_id: n.node_id,
            socks_port: n.socks_port,
            control_port: n.control_port,
            latency_ms: n.latency_ms.filter(|ms| ms.is_finite() && *ms >= 0.0),
        }
    }
}

impl From<StatsResponse> for PoolStats {
    fn from(s: StatsResponse) -> Self {
        Self {
            total_nodes: s.total_nodes,
            healthy_nodes: s.healthy_nodes,
            unhealthy_nodes: s.unhealthy_nodes,
            health_percentage: s.health_percentage,
            countries: s.countries,
        }
    }
}

impl From<MetricsResponse> for PoolMetrics {
    fn from(m: MetricsResponse) -> Self {
        Self {
            total: m.nodes.total,
            healthy: m.nodes.healthy,
            unhealthy: m.nodes.unhealthy,
            health_percentage: m.nodes.health_percentage,
        }
    }
}

impl From<ConfigResponse> for PoolConfig {
    fn from(c: ConfigResponse) -> Self {
        Self {
            pool_size: c.tor_pool_size,
            base_socks_port: c.tor_base_socks_port,
            countries: c
                .tor_countries
                .unwrap_or_default()
                .into_iter()
                .filter_map(|code| non_blank(Some(code)))
                .map(|code| code.to_ascii_uppercase())
                .collect(),
            auto_rotate_enabled: c.auto_rotate_enabled,
            firewall_backend: c.firewall_backend,
            tls_enabled: c.tls_enable,
            domain: non_blank(c.domain),
        }
    }
}

impl TryFrom<ExportTokenResponse> for ExportToken {
    type Error = CoreError;

    fn try_from(t: ExportTokenResponse) -> Result<Self, Self::Error> {
        let expires_at = parse_timestamp(&t.expires_at).ok_or_else(|| {
            CoreError::Internal(format!(
                "export token {} has unreadable expiry {:?}",
                t.id, t.expires_at
            ))
        })?;
        Ok(Self {
            id: t.id,
            description: non_blank(t.description),
            expires_at,
            is_revoked: t.is_revoked,
            use_count: t.use_count,
        })
    }
}

impl TryFrom<CreatedTokenResponse> for CreatedExportToken {
    type Error = CoreError;

    fn try_from(t: CreatedTokenResponse) -> Result<Self, Self::Error> {
        let expires_at = parse_timestamp(&t.expires_at).ok_or_else(|| {
            CoreError::Internal(format!("created token has unreadable expiry {:?}", t.expires_at))
        })?;
        Ok(Self {
            token: SecretString::from(t.token),
            expires_at,
            description: non_blank(t.description),
        })
    }
}

impl From<UserResponse> for CurrentUser {
    fn from(u: UserResponse) -> Self {
        Self {
            username: u.username,
            is_admin: u.is_admin,
            totp_enabled: u.totp_enabled,
            requires_password_change: u.require_password_change,
        }
    }
}

impl TryFrom<TwoFactorSetupResponse> for TwoFactorEnrollment {
    type Error = CoreError;

    fn try_from(r: TwoFactorSetupResponse) -> Result<Self, Self::Error> {
        if r.secret.trim().is_empty() {
            return Err(CoreError::Internal("two-factor setup returned no secret".into()));
        }
        Ok(Self {
            secret: SecretString::from(r.secret),
            uri: SecretString::from(r.uri),
        })
    }
}

impl From<AuditEntryResponse> for AuditEntry {
    fn from(e: AuditEntryResponse) -> Self {
        Self {
            event_type: e.event_type,
            severity: non_blank(e.severity),
            username: non_blank(e.username),
            message: e.message,
            created_at: e.created_at.as_deref().and_then(parse_timestamp),
        }
    }
}
