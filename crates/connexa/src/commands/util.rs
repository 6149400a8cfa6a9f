//! Shared helpers for command handlers.

use std::future::Future;
use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;

use connexa_core::{Confirmer, Panel};
use indicatif::{ProgressBar, ProgressStyle};
use secrecy::SecretString;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Confirmation ────────────────────────────────────────────────────

/// Asks on the terminal, or auto-approves under `--yes`.
pub struct PromptConfirmer {
    yes: bool,
}

impl Confirmer for PromptConfirmer {
    fn confirm(&self, prompt: &str) -> bool {
        if self.yes {
            return true;
        }
        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .unwrap_or(false)
    }
}

/// Confirmer for a destructive command. Refuses up front when there is
/// no terminal to ask on and `--yes` was not passed.
pub fn confirmer(global: &GlobalOpts, action: &str) -> Result<PromptConfirmer, CliError> {
    if !global.yes && !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    Ok(PromptConfirmer { yes: global.yes })
}

// ── Prompts ─────────────────────────────────────────────────────────

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Read a secret without echo.
pub fn prompt_secret(label: &str) -> Result<SecretString, CliError> {
    let value = rpassword::prompt_password(label).map_err(prompt_err)?;
    Ok(SecretString::from(value))
}

// ── Progress ────────────────────────────────────────────────────────

/// Run `fut` behind a spinner when stderr is a terminal.
pub async fn with_spinner<F: Future>(message: &str, quiet: bool, fut: F) -> F::Output {
    if quiet || !std::io::stderr().is_terminal() {
        return fut.await;
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_owned());
    spinner.enable_steady_tick(Duration::from_millis(80));

    let out = fut.await;
    spinner.finish_and_clear();
    out
}

// ── Panels ──────────────────────────────────────────────────────────

/// Data of a loaded panel, or the panel's failure as an error.
pub fn panel_data<T>(panel: &Panel<T>, what: &str) -> Result<Arc<T>, CliError> {
    let state = panel.snapshot();
    match (state.data, state.error) {
        (_, Some(message)) => Err(CliError::Api {
            status: None,
            message: format!("Failed to load {what}: {message}"),
        }),
        (Some(data), None) => Ok(data),
        (None, None) => Err(CliError::Api {
            status: None,
            message: format!("{what} not loaded"),
        }),
    }
}
