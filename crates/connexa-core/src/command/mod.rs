// ── Command API ──
//
// Every mutating operation is a `Command`. The controller validates it,
// asks for confirmation when it is destructive, performs the single API
// call and then requests the targeted refresh for what changed.

pub mod requests;

use std::net::IpAddr;

use crate::model::CreatedExportToken;
use crate::navigation::Resource;

pub use requests::{
    AddWhitelistEntry, ChangePassword, CreateExportToken, MAX_POOL_SIZE, MIN_POOL_SIZE,
    ScalePool, SetCountries, TOTP_DIGITS, TotpCode,
};

/// All write operations against the panel.
#[derive(Debug, Clone)]
pub enum Command {
    // ── Nodes ────────────────────────────────────────────────────────
    RotateAll,
    RotateNode { node_id: String },
    ScalePool(ScalePool),

    // ── Configuration ────────────────────────────────────────────────
    SetCountries(SetCountries),
    ApplyFirewall,

    // ── Whitelist ────────────────────────────────────────────────────
    AddWhitelistEntry(AddWhitelistEntry),
    RemoveWhitelistEntry { ip: IpAddr },

    // ── Export tokens ────────────────────────────────────────────────
    CreateExportToken(CreateExportToken),
    RevokeExportToken { id: i64 },

    // ── Account ──────────────────────────────────────────────────────
    ChangePassword(ChangePassword),
    /// Confirm a pending two-factor enrollment.
    EnableTwoFactor(TotpCode),
}

/// What to reload after a command succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshScope {
    None,
    All,
    Only(Resource),
}

impl Command {
    /// Prompt to show before a destructive command, `None` otherwise.
    pub fn confirmation_prompt(&self) -> Option<String> {
        match self {
            Self::RevokeExportToken { id } => Some(format!("Revoke export token {id}?")),
            Self::RemoveWhitelistEntry { ip } => {
                Some(format!("Remove {ip} from the whitelist?"))
            }
            _ => None,
        }
    }

    pub fn refresh_scope(&self) -> RefreshScope {
        match self {
            Self::RotateNode { .. } => RefreshScope::Only(Resource::Nodes),
            Self::RotateAll | Self::ScalePool(_) => RefreshScope::All,
            Self::SetCountries(_) => RefreshScope::Only(Resource::Config),
            Self::AddWhitelistEntry(_) | Self::RemoveWhitelistEntry { .. } => {
                RefreshScope::Only(Resource::Whitelist)
            }
            Self::CreateExportToken(_) | Self::RevokeExportToken { .. } => {
                RefreshScope::Only(Resource::Tokens)
            }
            Self::ApplyFirewall | Self::ChangePassword(_) | Self::EnableTwoFactor(_) => {
                RefreshScope::None
            }
        }
    }

    /// Operator-facing text for a successful run.
    pub(crate) fn success_message(&self) -> String {
        match self {
            Self::RotateAll => "All circuits rotated".into(),
            Self::RotateNode { node_id } => format!("Circuit rotated for {node_id}"),
            Self::ScalePool(req) => format!("Pool scaled to {} nodes", req.size()),
            Self::SetCountries(req) => format!(
                "Exit countries set to {}",
                req.countries().iter().cloned().collect::<Vec<_>>().join(", ")
            ),
            Self::ApplyFirewall => "Firewall rules applied".into(),
            Self::AddWhitelistEntry(req) => format!("{} added to the whitelist", req.ip()),
            Self::RemoveWhitelistEntry { ip } => format!("{ip} removed from the whitelist"),
            Self::CreateExportToken(_) => "Token created successfully".into(),
            Self::RevokeExportToken { .. } => "Token revoked".into(),
            Self::ChangePassword(_) => "Password changed successfully".into(),
            Self::EnableTwoFactor(_) => "Two-factor authentication enabled".into(),
        }
    }
}

/// Result of a command.
#[derive(Debug, Clone)]
pub enum CommandResult {
    /// Done. `message` is the server's acknowledgement when it sent one.
    Ok { message: Option<String> },
    /// A token was issued. Its secret is only available here.
    TokenCreated(CreatedExportToken),
    /// The operator declined the confirmation; nothing was sent.
    Cancelled,
}

// ── Confirmation ─────────────────────────────────────────────────────

/// Asks the operator to confirm a destructive command.
pub trait Confirmer: Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirmer for F
where
    F: Fn(&str) -> bool + Sync,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Confirms everything (`--yes`, tests).
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl Confirmer for AssumeYes {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}
