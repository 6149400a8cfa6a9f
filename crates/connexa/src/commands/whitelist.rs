//! Client IP whitelist handlers.

use std::net::IpAddr;

use connexa_core::{
    AddWhitelistEntry, AssumeYes, Command as CoreCommand, CommandResult, Modal, NavEvent,
};
use tabled::Tabled;

use crate::cli::{GlobalOpts, WhitelistArgs, WhitelistCommand};
use crate::error::CliError;
use crate::output;

use super::{Session, util};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct WhitelistRow {
    #[tabled(rename = "IP")]
    ip: String,
}

/// Removal accepts exactly what an add would.
fn parse_ip(raw: &str) -> Result<IpAddr, CliError> {
    Ok(AddWhitelistEntry::parse(raw)?.ip())
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    session: &Session,
    args: WhitelistArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let controller = &session.controller;

    match args.command {
        WhitelistCommand::List => {
            controller.navigate(NavEvent::OpenModal(Modal::Whitelist)).await;
            let entries = util::panel_data(&controller.store().whitelist, "whitelist")?;
            let ips: Vec<IpAddr> = entries.iter().copied().collect();
            let out = output::render_list(
                &global.output,
                &ips,
                |ip| WhitelistRow { ip: ip.to_string() },
                IpAddr::to_string,
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        WhitelistCommand::Add { ip } => {
            let request = AddWhitelistEntry::parse(&ip)?;
            controller
                .execute(CoreCommand::AddWhitelistEntry(request), &AssumeYes)
                .await?;
            Ok(())
        }

        WhitelistCommand::Remove { ip } => {
            let ip = parse_ip(&ip)?;
            let confirmer = util::confirmer(global, "whitelist remove")?;
            let result = controller
                .execute(CoreCommand::RemoveWhitelistEntry { ip }, &confirmer)
                .await?;
            if matches!(result, CommandResult::Cancelled) {
                output::print_status("Cancelled", global.quiet);
            }
            Ok(())
        }
    }
}
