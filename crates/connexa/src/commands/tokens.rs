//! Export token handlers.

use std::collections::BTreeMap;

use chrono::{DateTime, Local, Utc};
use connexa_core::{
    AssumeYes, Command as CoreCommand, CommandResult, CoreError, CreateExportToken,
    CreatedExportToken, ExportFormat, ExportToken, NavEvent, Tab,
};
use secrecy::ExposeSecret;
use serde::Serialize;
use tabled::Tabled;

use crate::cli::{GlobalOpts, TokensArgs, TokensCommand};
use crate::error::CliError;
use crate::output;

use super::{Session, util};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct TokenRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Expires")]
    expires: String,
    #[tabled(rename = "Uses")]
    uses: u64,
    #[tabled(rename = "State")]
    state: &'static str,
}

impl From<&ExportToken> for TokenRow {
    fn from(t: &ExportToken) -> Self {
        Self {
            id: t.id,
            description: t.description.clone().unwrap_or_default(),
            expires: local_time(t.expires_at),
            uses: t.use_count,
            state: token_state(t, Utc::now()),
        }
    }
}

fn token_state(t: &ExportToken, now: DateTime<Utc>) -> &'static str {
    if t.is_revoked {
        "revoked"
    } else if t.expires_at <= now {
        "expired"
    } else {
        "active"
    }
}

fn local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

// ── Issued token ────────────────────────────────────────────────────

/// A new token with its download links. Printed once, never stored.
#[derive(Serialize)]
struct IssuedToken {
    token: String,
    description: Option<String>,
    expires_at: DateTime<Utc>,
    downloads: BTreeMap<&'static str, String>,
}

fn issued(session: &Session, created: &CreatedExportToken) -> Result<IssuedToken, CliError> {
    let secret = created.token.expose_secret();
    let mut downloads = BTreeMap::new();
    for format in ExportFormat::ALL {
        let url = session
            .controller
            .api()
            .export_download_url(format, secret)
            .map_err(CoreError::from)?;
        downloads.insert(format.as_str(), url.to_string());
    }
    Ok(IssuedToken {
        token: secret.to_owned(),
        description: created.description.clone(),
        expires_at: created.expires_at,
        downloads,
    })
}

fn issued_detail(t: &IssuedToken) -> String {
    let mut lines = vec![
        format!("Token:    {}", t.token),
        format!("Expires:  {}", local_time(t.expires_at)),
    ];
    if let Some(ref d) = t.description {
        lines.push(format!("Note:     {d}"));
    }
    lines.push(String::new());
    for (format, url) in &t.downloads {
        lines.push(format!("{format:<5} {url}"));
    }
    lines.push(String::new());
    lines.push("Save the token now: it cannot be shown again.".into());
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    session: &Session,
    args: TokensArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let controller = &session.controller;

    match args.command {
        TokensCommand::List { all } => {
            controller.navigate(NavEvent::SelectTab(Tab::Tokens)).await;
            let tokens = util::panel_data(&controller.store().tokens, "export tokens")?;
            let shown: Vec<ExportToken> = tokens
                .iter()
                .filter(|t| all || t.is_active())
                .cloned()
                .collect();
            let out = output::render_list(
                &global.output,
                &shown,
                |t| TokenRow::from(t),
                |t| t.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        TokensCommand::Create { description } => {
            let request = CreateExportToken::new(description.as_deref());
            let result = controller
                .execute(CoreCommand::CreateExportToken(request), &AssumeYes)
                .await?;
            let CommandResult::TokenCreated(created) = result else {
                return Err(CliError::Api {
                    status: None,
                    message: "the panel did not return a token".into(),
                });
            };
            let token = issued(session, &created)?;
            let out = output::render_single(&global.output, &token, issued_detail, |t| {
                t.token.clone()
            });
            // Not suppressed by --quiet: the secret is shown only once.
            output::print_output(&out, false);
            Ok(())
        }

        TokensCommand::Revoke { id } => {
            let confirmer = util::confirmer(global, "tokens revoke")?;
            let result = controller
                .execute(CoreCommand::RevokeExportToken { id }, &confirmer)
                .await?;
            if matches!(result, CommandResult::Cancelled) {
                output::print_status("Cancelled", global.quiet);
            }
            Ok(())
        }
    }
}
