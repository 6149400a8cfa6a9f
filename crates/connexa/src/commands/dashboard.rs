//! Dashboard overview and the live `watch` view.

use std::collections::BTreeMap;
use std::io::IsTerminal;
use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use connexa_core::{HealthState, HealthSummary, PoolConfig, PoolMetrics, PoolStats, summarize};
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::{Session, nodes};

/// Display order for the health breakdown line.
const BREAKDOWN_ORDER: [HealthState; 5] = [
    HealthState::Healthy,
    HealthState::Slow,
    HealthState::Rotating,
    HealthState::Paused,
    HealthState::Unhealthy,
];

#[derive(Serialize)]
struct Overview {
    stats: Option<Arc<PoolStats>>,
    health: HealthSummary,
    config: Option<Arc<PoolConfig>>,
    active_tokens: Option<usize>,
    refreshed_at: Option<DateTime<Utc>>,
    /// Panels whose last load failed, with the reason.
    errors: BTreeMap<&'static str, String>,
}

fn overview(session: &Session) -> Overview {
    let store = session.controller.store();
    let nodes = store.nodes.data();

    let mut errors = BTreeMap::new();
    for (name, error) in [
        ("stats", store.stats.error()),
        ("nodes", store.nodes.error()),
        ("config", store.config.error()),
        ("tokens", store.tokens.error()),
    ] {
        if let Some(error) = error {
            errors.insert(name, error);
        }
    }

    Overview {
        stats: store.stats.data(),
        health: nodes.as_deref().map(|n| summarize(n)).unwrap_or_default(),
        config: store.config.data(),
        active_tokens: store
            .tokens
            .data()
            .map(|tokens| tokens.iter().filter(|t| t.is_active()).count()),
        refreshed_at: store.last_full_refresh(),
        errors,
    }
}

fn overview_detail(o: &Overview, color: bool) -> String {
    let mut lines = Vec::new();

    if let Some(ref stats) = o.stats {
        lines.push(format!(
            "Nodes:      {} total, {} healthy, {} unhealthy ({:.0}%)",
            stats.total_nodes, stats.healthy_nodes, stats.unhealthy_nodes, stats.health_percentage
        ));
        if !stats.countries.is_empty() {
            let by_country: Vec<String> = stats
                .countries
                .iter()
                .map(|(code, n)| format!("{code} {n}"))
                .collect();
            lines.push(format!("Exits:      {}", by_country.join(", ")));
        }
    }

    if o.health.total > 0 {
        let breakdown: Vec<String> = BREAKDOWN_ORDER
            .into_iter()
            .filter(|s| o.health.count(*s) > 0)
            .map(|s| format!("{} {}", output::paint_health(s, color), o.health.count(s)))
            .collect();
        lines.push(format!("Health:     {}", breakdown.join("  ")));
    }

    if let Some(ref config) = o.config {
        let countries = if config.countries.is_empty() {
            "any".to_owned()
        } else {
            config.countries.iter().cloned().collect::<Vec<_>>().join(", ")
        };
        lines.push(format!(
            "Pool:       {} nodes from port {}, countries: {countries}",
            config.pool_size, config.base_socks_port
        ));
        lines.push(format!(
            "Rotation:   {}",
            if config.auto_rotate_enabled { "automatic" } else { "manual" }
        ));
    }

    if let Some(active) = o.active_tokens {
        lines.push(format!("Tokens:     {active} active"));
    }

    if let Some(at) = o.refreshed_at {
        lines.push(format!(
            "Refreshed:  {}",
            at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
        ));
    }

    for (panel, error) in &o.errors {
        lines.push(format!("! {panel}: {error}"));
    }

    lines.join("\n")
}

// ── Handlers ────────────────────────────────────────────────────────

pub fn show(session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let o = overview(session);
    let out = output::render_single(
        &global.output,
        &o,
        |o| overview_detail(o, color),
        |o| format!("{:.0}", o.health.health_percentage()),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

fn metrics_detail(m: &PoolMetrics) -> String {
    format!(
        "Nodes: {} total, {} healthy, {} unhealthy ({:.0}%)",
        m.total, m.healthy, m.unhealthy, m.health_percentage
    )
}

pub async fn metrics(session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    let metrics = session.controller.metrics().await?;
    let out = output::render_single(&global.output, &metrics, metrics_detail, |m| {
        format!("{:.0}", m.health_percentage)
    });
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Redraw the node table on every poll until Ctrl-C.
pub async fn watch(session: &mut Session, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let clear_screen =
        matches!(global.output, OutputFormat::Table) && std::io::stdout().is_terminal();
    let interval = session.controller.config().poll_interval;

    if !session.controller.is_polling() {
        output::print_status("Polling is disabled (interval 0); showing one snapshot", global.quiet);
    }

    let mut nodes_rx = session.controller.store().nodes.subscribe();
    nodes_rx.mark_changed();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = nodes_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = nodes_rx.borrow_and_update().clone();
                let Some(nodes) = snapshot.data else { continue };
                let summary = summarize(&nodes);

                if clear_screen {
                    print!("\x1b[2J\x1b[H");
                }
                let header = format!(
                    "{} nodes, {:.0}% healthy, {} slow, {} rotating -- every {} (Ctrl-C to stop)",
                    summary.total,
                    summary.health_percentage(),
                    summary.count(HealthState::Slow),
                    summary.count(HealthState::Rotating),
                    humantime::format_duration(interval),
                );
                output::print_output(&header, global.quiet);
                let out = nodes::render_nodes(&global.output, &nodes, color);
                output::print_output(&out, global.quiet);
            }
            notice = session.notices.recv() => match notice {
                Ok(notice) => eprintln!(
                    "{}",
                    output::paint_notice(notice.level, &notice.message, color)
                ),
                Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            },
        }

        if !session.controller.navigation().is_dashboard() {
            // Session expired under us.
            return Err(CliError::NotLoggedIn {
                profile: session.profile_name.clone(),
            });
        }
    }

    Ok(())
}
