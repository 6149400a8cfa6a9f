// ── Pool configuration and server-side statistics ──

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

/// Read-mostly mirror of the server's pool configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PoolConfig {
    pub pool_size: u32,
    pub base_socks_port: u16,
    /// Exit country codes, upper-cased.
    pub countries: BTreeSet<String>,
    pub auto_rotate_enabled: bool,
    pub firewall_backend: String,
    pub tls_enabled: bool,
    pub domain: Option<String>,
}

/// `/nodes/stats/summary` as reported by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PoolStats {
    pub total_nodes: u32,
    pub healthy_nodes: u32,
    pub unhealthy_nodes: u32,
    pub health_percentage: f64,
    /// Exit country code -> node count.
    pub countries: BTreeMap<String, u32>,
}

/// `/metrics/` node totals, counted live by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PoolMetrics {
    pub total: u32,
    pub healthy: u32,
    pub unhealthy: u32,
    pub health_percentage: f64,
}
