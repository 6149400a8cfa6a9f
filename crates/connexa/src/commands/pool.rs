//! Pool configuration handlers: show, exit countries, firewall.

use connexa_core::{AssumeYes, Command as CoreCommand, PoolConfig, SetCountries};

use crate::cli::{GlobalOpts, PoolArgs, PoolCommand};
use crate::error::CliError;
use crate::output;

use super::{Session, util};

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

fn detail(c: &PoolConfig) -> String {
    let countries = if c.countries.is_empty() {
        "any".to_owned()
    } else {
        c.countries.iter().cloned().collect::<Vec<_>>().join(", ")
    };
    [
        format!("Pool size:        {}", c.pool_size),
        format!("Base SOCKS port:  {}", c.base_socks_port),
        format!("Exit countries:   {countries}"),
        format!("Auto-rotate:      {}", yes_no(c.auto_rotate_enabled)),
        format!("Firewall backend: {}", c.firewall_backend),
        format!("TLS:              {}", yes_no(c.tls_enabled)),
        format!("Domain:           {}", c.domain.as_deref().unwrap_or("-")),
    ]
    .join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    session: &Session,
    args: PoolArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let controller = &session.controller;

    match args.command {
        PoolCommand::Show => {
            let config = util::panel_data(&controller.store().config, "configuration")?;
            let out = output::render_single(&global.output, config.as_ref(), detail, |c| {
                c.pool_size.to_string()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        PoolCommand::Countries { codes, strict } => {
            let request = SetCountries::new(&codes, strict)?;
            controller
                .execute(CoreCommand::SetCountries(request), &AssumeYes)
                .await?;
            Ok(())
        }

        PoolCommand::ApplyFirewall => {
            let fut = controller.execute(CoreCommand::ApplyFirewall, &AssumeYes);
            util::with_spinner("Applying firewall rules...", global.quiet, fut).await?;
            Ok(())
        }
    }
}
