//! Node command handlers.

use connexa_core::{AssumeYes, Command as CoreCommand, HealthState, Node, ScalePool};
use tabled::Tabled;

use crate::cli::{GlobalOpts, HealthFilter, NodesArgs, NodesCommand, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::{Session, util};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct NodeRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Health")]
    health: String,
    #[tabled(rename = "SOCKS")]
    socks_port: u16,
    #[tabled(rename = "Control")]
    control_port: u16,
    #[tabled(rename = "Exit IP")]
    exit_ip: String,
    #[tabled(rename = "Country")]
    country: String,
    #[tabled(rename = "Latency")]
    latency: String,
}

impl NodeRow {
    fn new(n: &Node, color: bool) -> Self {
        Self {
            id: n.node_id.clone(),
            health: output::paint_health(n.health(), color),
            socks_port: n.socks_port,
            control_port: n.control_port,
            exit_ip: n.exit_ip.map(|ip| ip.to_string()).unwrap_or_default(),
            country: n.exit_country.clone().unwrap_or_default(),
            latency: format_latency(n.latency_ms),
        }
    }
}

fn format_latency(ms: Option<f64>) -> String {
    ms.map(|ms| format!("{ms:.0} ms")).unwrap_or_else(|| "-".into())
}

fn detail(n: &Node, color: bool) -> String {
    let or_dash = |v: Option<String>| v.unwrap_or_else(|| "-".into());
    [
        format!("ID:           {}", n.node_id),
        format!("Health:       {}", output::paint_health(n.health(), color)),
        format!("Status:       {}", or_dash(n.status.clone())),
        format!("SOCKS port:   {}", n.socks_port),
        format!("Control port: {}", n.control_port),
        format!("Exit IP:      {}", or_dash(n.exit_ip.map(|ip| ip.to_string()))),
        format!("Country:      {}", or_dash(n.exit_country.clone())),
        format!("Latency:      {}", format_latency(n.latency_ms)),
    ]
    .join("\n")
}

impl From<HealthFilter> for HealthState {
    fn from(f: HealthFilter) -> Self {
        match f {
            HealthFilter::Healthy => Self::Healthy,
            HealthFilter::Unhealthy => Self::Unhealthy,
            HealthFilter::Slow => Self::Slow,
            HealthFilter::Rotating => Self::Rotating,
            HealthFilter::Paused => Self::Paused,
        }
    }
}

/// Node list in the requested format. Shared with `watch`.
pub fn render_nodes(format: &OutputFormat, nodes: &[Node], color: bool) -> String {
    output::render_list(format, nodes, |n| NodeRow::new(n, color), |n| n.node_id.clone())
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    session: &Session,
    args: NodesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let controller = &session.controller;
    let color = output::should_color(&global.color);

    match args.command {
        NodesCommand::List { health } => {
            let nodes = util::panel_data(&controller.store().nodes, "nodes")?;
            let wanted = health.map(HealthState::from);
            let shown: Vec<Node> = nodes
                .iter()
                .filter(|n| wanted.is_none_or(|w| n.health() == w))
                .cloned()
                .collect();
            let out = render_nodes(&global.output, &shown, color);
            output::print_output(&out, global.quiet);
            Ok(())
        }

        NodesCommand::Get { node } => {
            let node = controller.node(&node).await?;
            let out = output::render_single(
                &global.output,
                &node,
                |n| detail(n, color),
                |n| n.node_id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        NodesCommand::Rotate { node } => {
            let cmd = CoreCommand::RotateNode { node_id: node };
            controller.execute(cmd, &AssumeYes).await?;
            Ok(())
        }

        NodesCommand::RotateAll => {
            let fut = controller.execute(CoreCommand::RotateAll, &AssumeYes);
            util::with_spinner("Rotating all circuits...", global.quiet, fut).await?;
            Ok(())
        }

        NodesCommand::Scale { size } => {
            let request = ScalePool::parse(&size)?;
            let fut = controller.execute(CoreCommand::ScalePool(request), &AssumeYes);
            util::with_spinner(
                &format!("Scaling pool to {} nodes...", request.size()),
                global.quiet,
                fut,
            )
            .await?;
            Ok(())
        }
    }
}
