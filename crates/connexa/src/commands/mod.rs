//! Command dispatch: bridges CLI args -> controller -> output formatting.

pub mod auth;
pub mod config_cmd;
pub mod dashboard;
pub mod logs;
pub mod nodes;
pub mod pool;
pub mod tokens;
pub mod two_factor;
pub mod util;
pub mod whitelist;

use connexa_core::{Controller, ControllerConfig, Level, NavState, Notification};
use tokio::sync::broadcast;
use tracing::debug;

use crate::cli::{Command, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

// ── Session ─────────────────────────────────────────────────────────

/// A controller bound to the active profile, plus its notice feed.
pub struct Session {
    pub controller: Controller,
    pub profile_name: String,
    pub profile: config::Profile,
    notices: broadcast::Receiver<Notification>,
}

impl Session {
    /// Build the controller without touching the network.
    pub fn connect(
        global: &GlobalOpts,
        tweak: impl FnOnce(&mut ControllerConfig),
    ) -> Result<Self, CliError> {
        let mut resolved = config::resolve(global)?;
        tweak(&mut resolved.controller);

        let controller = Controller::new(resolved.controller, resolved.session)?;
        let notices = controller.notifications();
        Ok(Self {
            controller,
            profile_name: resolved.profile_name,
            profile: resolved.profile,
            notices,
        })
    }

    /// Build the controller and resume the stored session.
    pub async fn open(
        global: &GlobalOpts,
        tweak: impl FnOnce(&mut ControllerConfig),
    ) -> Result<Self, CliError> {
        let session = Self::connect(global, tweak)?;
        match session.controller.restore().await {
            Ok(NavState::LoggedOut) => Err(session.not_logged_in()),
            Ok(state) => {
                debug!(?state, "session restored");
                Ok(session)
            }
            Err(e) if e.is_auth() => Err(session.not_logged_in()),
            Err(e) => Err(e.into()),
        }
    }

    fn not_logged_in(&self) -> CliError {
        CliError::NotLoggedIn {
            profile: self.profile_name.clone(),
        }
    }

    /// Fail unless the dashboard is reachable (no pending password change).
    pub fn require_dashboard(&self) -> Result<(), CliError> {
        match self.controller.navigation() {
            NavState::Dashboard(_) => Ok(()),
            NavState::PasswordChangeRequired => Err(CliError::PasswordChangeRequired),
            NavState::LoggedOut => Err(self.not_logged_in()),
        }
    }

    /// Print queued notices to stderr.
    pub fn flush_notices(&mut self, global: &GlobalOpts) {
        let color = output::should_color(&global.color);
        while let Ok(notice) = self.notices.try_recv() {
            if global.quiet && notice.level != Level::Error {
                continue;
            }
            eprintln!("{}", output::paint_notice(notice.level, &notice.message, color));
        }
    }
}

// ── Dispatch ────────────────────────────────────────────────────────

/// Dispatch a panel-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    let mut session = match &cmd {
        Command::Login(_) | Command::Logout => Session::connect(global, |_| {})?,
        Command::Watch(args) => {
            let interval = args.interval;
            Session::open(global, |c| {
                if let Some(interval) = interval {
                    c.poll_interval = interval;
                }
            })
            .await?
        }
        Command::Logs(args) => {
            let limit = args.limit;
            Session::open(global, |c| c.logs_limit = limit).await?
        }
        _ => Session::open(global, |_| {}).await?,
    };

    if !matches!(
        cmd,
        Command::Login(_) | Command::Logout | Command::Whoami | Command::Password
    ) {
        session.require_dashboard()?;
    }

    let result = match cmd {
        Command::Login(args) => auth::login(&session, args, global).await,
        Command::Logout => auth::logout(&session, global).await,
        Command::Whoami => auth::whoami(&session, global).await,
        Command::Password => auth::password(&session, global).await,
        Command::TwoFactor(args) => two_factor::handle(&session, args, global).await,
        Command::Dashboard => dashboard::show(&session, global),
        Command::Watch(_) => dashboard::watch(&mut session, global).await,
        Command::Metrics => dashboard::metrics(&session, global).await,
        Command::Nodes(args) => nodes::handle(&session, args, global).await,
        Command::Pool(args) => pool::handle(&session, args, global).await,
        Command::Whitelist(args) => whitelist::handle(&session, args, global).await,
        Command::Tokens(args) => tokens::handle(&session, args, global).await,
        Command::Logs(_) => logs::handle(&session, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Ok(()),
    };

    session.controller.shutdown();
    if result.is_ok() {
        session.flush_notices(global);
    }
    result
}
