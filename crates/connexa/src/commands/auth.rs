//! Session commands: login, logout, whoami, password.

use std::io::IsTerminal;

use connexa_core::{
    AssumeYes, ChangePassword, Command as CoreCommand, CoreError, CurrentUser, NavState,
};
use secrecy::ExposeSecret;

use crate::cli::{GlobalOpts, LoginArgs};
use crate::error::CliError;
use crate::output;

use super::{Session, util};

fn user_detail(user: &CurrentUser) -> String {
    [
        format!("Username:        {}", user.username),
        format!("Admin:           {}", if user.is_admin { "yes" } else { "no" }),
        format!(
            "Two-factor:      {}",
            if user.totp_enabled { "enabled" } else { "disabled" }
        ),
        format!(
            "Password change: {}",
            if user.requires_password_change {
                "required"
            } else {
                "not required"
            }
        ),
    ]
    .join("\n")
}

/// `--username`, then `CONNEXA_USERNAME` or the profile, then a prompt.
fn resolve_username(session: &Session, flag: Option<String>) -> Result<String, CliError> {
    if let Some(name) = flag.filter(|n| !n.trim().is_empty()) {
        return Ok(name);
    }
    match connexa_config::resolve_username(&session.profile, &session.profile_name) {
        Ok(name) => Ok(name),
        Err(_) if std::io::stdin().is_terminal() => dialoguer::Input::new()
            .with_prompt("Username")
            .interact_text()
            .map_err(util::prompt_err),
        Err(e) => Err(e.into()),
    }
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn login(
    session: &Session,
    args: LoginArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let username = resolve_username(session, args.username)?;
    let password = match connexa_config::password_from_env() {
        Some(pw) => pw,
        None => util::prompt_secret("Password: ")?,
    };

    let controller = &session.controller;
    let state = match controller
        .login(&username, &password, args.totp.as_deref())
        .await
    {
        Err(CoreError::TwoFactorRequired)
            if args.totp.is_none() && std::io::stdin().is_terminal() =>
        {
            let code: String = dialoguer::Input::new()
                .with_prompt("Two-factor code")
                .interact_text()
                .map_err(util::prompt_err)?;
            controller.login(&username, &password, Some(code.trim())).await?
        }
        other => other?,
    };

    let message = match state {
        NavState::PasswordChangeRequired => format!(
            "Logged in as {username}. A password change is required: run `connexa password`"
        ),
        _ => format!("Logged in as {username} (profile '{}')", session.profile_name),
    };
    output::print_status(&message, global.quiet);
    Ok(())
}

pub async fn logout(session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    session.controller.logout().await;
    output::print_status(
        &format!("Logged out of profile '{}'", session.profile_name),
        global.quiet,
    );
    Ok(())
}

pub async fn whoami(session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    let user = session.controller.whoami().await?;
    let out = output::render_single(&global.output, user.as_ref(), user_detail, |u| {
        u.username.clone()
    });
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn password(session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    let current = util::prompt_secret("Current password: ")?;
    let new = util::prompt_secret("New password: ")?;
    let repeat = util::prompt_secret("Repeat new password: ")?;
    if new.expose_secret() != repeat.expose_secret() {
        return Err(CliError::Validation {
            field: "new password".into(),
            reason: "the two entries do not match".into(),
        });
    }

    let request = ChangePassword::new(current, new)?;
    session
        .controller
        .execute(CoreCommand::ChangePassword(request), &AssumeYes)
        .await?;

    if session.controller.navigation().is_dashboard() {
        output::print_status("Password changed; dashboard unlocked", global.quiet);
    }
    Ok(())
}
