// ── Node health classification ──
//
// A node's health is derived from its snapshot on every read and never
// stored. The precedence below is fixed; operators rely on it.

use serde::Serialize;
use strum::{Display, EnumIter, IntoStaticStr};

use super::node::Node;

/// Latency above this (strictly greater) marks an otherwise-up node as slow.
pub const SLOW_LATENCY_MS: f64 = 500.0;

const TRANSITION_KEYWORDS: [&str; 2] = ["rotating", "changing"];
const FAILURE_KEYWORDS: [&str; 2] = ["down", "error"];
const UP_KEYWORDS: [&str; 2] = ["up", "healthy"];

/// Mutually exclusive health states.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Display, EnumIter, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HealthState {
    Healthy,
    Unhealthy,
    Slow,
    Rotating,
    Paused,
}

impl HealthState {
    /// Short display label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Healthy => "Healthy",
            Self::Unhealthy => "Unhealthy",
            Self::Slow => "Slow",
            Self::Rotating => "Rotating",
            Self::Paused => "Paused",
        }
    }

    /// Single-glyph icon.
    pub fn icon(self) -> &'static str {
        match self {
            Self::Healthy => "●",
            Self::Unhealthy => "✖",
            Self::Slow => "◐",
            Self::Rotating => "↻",
            Self::Paused => "‖",
        }
    }

    /// Only `Healthy` counts toward the health percentage.
    pub fn is_healthy(self) -> bool {
        matches!(self, Self::Healthy)
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Map a node snapshot to its health state.
pub fn classify(node: &Node) -> HealthState {
    // 1. no status signal at all
    let Some(status) = node
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    else {
        return HealthState::Paused;
    };
    let status = status.to_ascii_lowercase();

    // 2. in-progress change
    if contains_any(&status, &TRANSITION_KEYWORDS) {
        return HealthState::Rotating;
    }

    // 3. no exit, or explicit failure
    if node.exit_ip.is_none() || contains_any(&status, &FAILURE_KEYWORDS) {
        return HealthState::Unhealthy;
    }

    // 4. too slow
    if node.latency_ms.is_some_and(|ms| ms > SLOW_LATENCY_MS) {
        return HealthState::Slow;
    }

    // 5. up, or reachable through an exit
    if contains_any(&status, &UP_KEYWORDS) || node.exit_ip.is_some() {
        return HealthState::Healthy;
    }

    // 6. anything else counts against the pool
    HealthState::Unhealthy
}

/// Per-state counts over one node snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HealthSummary {
    pub total: usize,
    pub healthy: usize,
    pub unhealthy: usize,
    pub slow: usize,
    pub rotating: usize,
    pub paused: usize,
}

impl HealthSummary {
    /// Share of `Healthy` nodes, 0.0 for an empty pool.
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    pub fn health_percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.healthy as f64 * 100.0 / self.total as f64
        }
    }

    pub fn count(&self, state: HealthState) -> usize {
        match state {
            HealthState::Healthy => self.healthy,
            HealthState::Unhealthy => self.unhealthy,
            HealthState::Slow => self.slow,
            HealthState::Rotating => self.rotating,
            HealthState::Paused => self.paused,
        }
    }
}

/// Classify every node and tally the results.
pub fn summarize(nodes: &[Node]) -> HealthSummary {
    nodes
        .iter()
        .map(classify)
        .fold(HealthSummary::default(), |mut acc, state| {
            acc.total += 1;
            match state {
                HealthState::Healthy => acc.healthy += 1,
                HealthState::Unhealthy => acc.unhealthy += 1,
                HealthState::Slow => acc.slow += 1,
                HealthState::Rotating => acc.rotating += 1,
                HealthState::Paused => acc.paused += 1,
            }
            acc
        })
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use strum::IntoEnumIterator;

    use super::*;

    const EXIT: IpAddr = IpAddr::V4(Ipv4Addr::new(185, 220, 101, 4));

    fn node(status: Option<&str>, exit_ip: Option<IpAddr>, latency_ms: Option<f64>) -> Node {
        Node {
            node_id: "tor-0".into(),
            socks_port: 9050,
            control_port: 9051,
            exit_ip,
            exit_country: Some("DE".into()),
            status: status.map(str::to_owned),
            latency_ms,
        }
    }

    #[test]
    fn missing_status_is_paused_whatever_else() {
        assert_eq!(classify(&node(None, None, None)), HealthState::Paused);
        assert_eq!(classify(&node(None, Some(EXIT), Some(10.0))), HealthState::Paused);
        assert_eq!(classify(&node(None, Some(EXIT), Some(9000.0))), HealthState::Paused);
        assert_eq!(classify(&node(Some("   "), Some(EXIT), None)), HealthState::Paused);
    }

    #[test]
    fn rotating_wins_over_exit_ip() {
        assert_eq!(
            classify(&node(Some("rotating"), Some(EXIT), Some(20.0))),
            HealthState::Rotating
        );
        assert_eq!(
            classify(&node(Some("Circuit CHANGING"), None, None)),
            HealthState::Rotating
        );
    }

    #[test]
    fn missing_exit_ip_is_unhealthy() {
        assert_eq!(classify(&node(Some("running"), None, None)), HealthState::Unhealthy);
        assert_eq!(classify(&node(Some("up"), None, Some(20.0))), HealthState::Unhealthy);
    }

    #[test]
    fn failure_keyword_is_unhealthy_even_with_exit() {
        assert_eq!(classify(&node(Some("down"), Some(EXIT), None)), HealthState::Unhealthy);
        assert_eq!(
            classify(&node(Some("bootstrap error"), Some(EXIT), Some(5.0))),
            HealthState::Unhealthy
        );
    }

    #[test]
    fn latency_threshold_is_strict() {
        assert_eq!(classify(&node(Some("up"), Some(EXIT), Some(600.0))), HealthState::Slow);
        assert_eq!(classify(&node(Some("up"), Some(EXIT), Some(500.0))), HealthState::Healthy);
        assert_eq!(classify(&node(Some("up"), Some(EXIT), Some(500.1))), HealthState::Slow);
    }

    #[test]
    fn exit_ip_alone_is_healthy() {
        assert_eq!(classify(&node(Some("running"), Some(EXIT), None)), HealthState::Healthy);
    }

    #[test]
    fn labels_and_icons_are_distinct() {
        let labels: std::collections::HashSet<_> = HealthState::iter().map(HealthState::label).collect();
        let icons: std::collections::HashSet<_> = HealthState::iter().map(HealthState::icon).collect();
        assert_eq!(labels.len(), 5);
        assert_eq!(icons.len(), 5);
        assert_eq!(HealthState::Slow.to_string(), "slow");
    }

    #[test]
    fn summary_counts_only_healthy_toward_percentage() {
        let nodes = vec![
            node(Some("up"), Some(EXIT), Some(20.0)),
            node(Some("up"), Some(EXIT), Some(900.0)),
            node(Some("rotating"), Some(EXIT), None),
            node(None, None, None),
        ];
        let summary = summarize(&nodes);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.healthy, 1);
        assert_eq!(summary.slow, 1);
        assert_eq!(summary.rotating, 1);
        assert_eq!(summary.paused, 1);
        assert!((summary.health_percentage() - 25.0).abs() < f64::EPSILON);
        assert!(summarize(&[]).health_percentage().abs() < f64::EPSILON);
    }
}
