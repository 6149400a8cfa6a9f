// ── Node domain type ──

use std::net::IpAddr;

use serde::Serialize;

use super::health::{HealthState, classify};

/// One egress node. An immutable snapshot: every change happens
/// server-side and is observed by fetching again.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub node_id: String,
    pub socks_port: u16,
    pub control_port: u16,
    pub exit_ip: Option<IpAddr>,
    pub exit_country: Option<String>,
    pub status: Option<String>,
    pub latency_ms: Option<f64>,
}

impl Node {
    /// Health of this snapshot. Recomputed on every call.
    pub fn health(&self) -> HealthState {
        classify(self)
    }
}
