// ── Dashboard data store ──
//
// One reactive panel per dashboard resource. Panels are written only by
// the controller's loaders; front ends read snapshots or subscribe.

mod panel;
mod refresh;

use std::collections::BTreeSet;
use std::net::IpAddr;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

pub use panel::{Panel, PanelState};
pub use refresh::{LoadOutcome, RefreshReport};

use crate::model::{AuditEntry, ExportToken, Node, PoolConfig, PoolStats};

/// All dashboard panels.
#[derive(Debug)]
pub struct DashboardStore {
    pub stats: Panel<PoolStats>,
    pub nodes: Panel<Vec<Node>>,
    pub config: Panel<PoolConfig>,
    pub tokens: Panel<Vec<ExportToken>>,
    pub whitelist: Panel<BTreeSet<IpAddr>>,
    pub logs: Panel<Vec<AuditEntry>>,
    last_full_refresh: watch::Sender<Option<DateTime<Utc>>>,
}

impl Default for DashboardStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardStore {
    pub fn new() -> Self {
        let (last_full_refresh, _) = watch::channel(None);
        Self {
            stats: Panel::new(),
            nodes: Panel::new(),
            config: Panel::new(),
            tokens: Panel::new(),
            whitelist: Panel::new(),
            logs: Panel::new(),
            last_full_refresh,
        }
    }

    pub fn last_full_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_full_refresh.borrow()
    }

    /// How long ago the last full refresh settled.
    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.last_full_refresh().map(|t| Utc::now() - t)
    }

    pub(crate) fn mark_full_refresh(&self) {
        self.last_full_refresh.send_replace(Some(Utc::now()));
    }

    /// Drop every panel's data and error.
    pub(crate) fn clear(&self) {
        self.stats.clear();
        self.nodes.clear();
        self.config.clear();
        self.tokens.clear();
        self.whitelist.clear();
        self.logs.clear();
        self.last_full_refresh.send_replace(None);
    }
}
