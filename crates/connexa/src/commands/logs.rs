//! Audit log handler.

use chrono::Local;
use connexa_core::{AuditEntry, NavEvent, Tab};
use tabled::Tabled;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::{Session, util};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct LogRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Event")]
    event: String,
    #[tabled(rename = "User")]
    user: String,
    #[tabled(rename = "Message")]
    message: String,
}

impl From<&AuditEntry> for LogRow {
    fn from(e: &AuditEntry) -> Self {
        Self {
            time: e
                .created_at
                .map(|at| at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default(),
            severity: e.severity.clone().unwrap_or_default(),
            event: e.event_type.clone(),
            user: e.username.clone().unwrap_or_default(),
            message: e.message.clone(),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

/// The limit was applied to the controller config when the session opened.
pub async fn handle(session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    let controller = &session.controller;
    controller.navigate(NavEvent::SelectTab(Tab::Logs)).await;

    let entries = util::panel_data(&controller.store().logs, "logs")?;
    let out = output::render_list(
        &global.output,
        entries.as_slice(),
        |e| LogRow::from(e),
        |e| e.message.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
