// ── Controller ──
//
// Session and dashboard orchestration for one admin panel. Owns the API
// client, the dashboard panels, the navigation machine and the poller.
// Front ends feed it navigation events and commands, and read panels,
// navigation state and notifications back out.

use std::collections::BTreeSet;
use std::net::IpAddr;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use arc_swap::ArcSwapOption;
use connexa_api::{ApiClient, SessionStore, TlsMode, TransportConfig};
use secrecy::SecretString;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use crate::command::{Command, CommandResult, Confirmer, RefreshScope};
use crate::config::{ControllerConfig, TlsVerification};
use crate::error::CoreError;
use crate::model::{
    AuditEntry, CreatedExportToken, CurrentUser, ExportToken, Node, PoolMetrics,
    TwoFactorEnrollment,
};
use crate::navigation::{Effect, NavEvent, NavState, Navigation, Resource};
use crate::notify::{Notification, Notifier};
use crate::poller::PollingScheduler;
use crate::store::{DashboardStore, LoadOutcome, Panel, RefreshReport};

/// The main entry point for front ends.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. Background activity is
/// limited to the node poller, which holds only a weak reference back.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: ControllerConfig,
    api: ApiClient,
    session: Arc<SessionStore>,
    store: DashboardStore,
    navigation: Mutex<Navigation>,
    nav_tx: watch::Sender<NavState>,
    current_user: ArcSwapOption<CurrentUser>,
    poller: PollingScheduler,
    notifier: Notifier,
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("url", &self.inner.config.url.as_str())
            .field("navigation", &self.navigation())
            .field("poller", &self.inner.poller)
            .finish_non_exhaustive()
    }
}

impl Controller {
    /// Build a controller. Does no I/O: call [`restore`](Self::restore)
    /// or [`login`](Self::login) to enter the dashboard.
    pub fn new(config: ControllerConfig, session: Arc<SessionStore>) -> Result<Self, CoreError> {
        let transport = build_transport(&config);
        let api = ApiClient::new(config.url.as_str(), Arc::clone(&session), &transport)?;
        Ok(Self::with_api(config, api))
    }

    /// Build around an existing client (shares its session store).
    pub fn with_api(config: ControllerConfig, api: ApiClient) -> Self {
        let session = Arc::clone(api.session());
        let (nav_tx, _) = watch::channel(NavState::LoggedOut);

        Self {
            inner: Arc::new(ControllerInner {
                config,
                api,
                session,
                store: DashboardStore::new(),
                navigation: Mutex::new(Navigation::new()),
                nav_tx,
                current_user: ArcSwapOption::empty(),
                poller: PollingScheduler::new(),
                notifier: Notifier::new(),
            }),
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.inner.session
    }

    pub fn store(&self) -> &DashboardStore {
        &self.inner.store
    }

    pub fn current_user(&self) -> Option<Arc<CurrentUser>> {
        self.inner.current_user.load_full()
    }

    pub fn navigation(&self) -> NavState {
        *self.inner.nav_tx.borrow()
    }

    pub fn subscribe_navigation(&self) -> watch::Receiver<NavState> {
        self.inner.nav_tx.subscribe()
    }

    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.inner.notifier.subscribe()
    }

    pub fn is_polling(&self) -> bool {
        self.inner.poller.is_armed()
    }

    // ── Session lifecycle ────────────────────────────────────────────

    /// Pick up a token persisted by an earlier run and enter the
    /// matching screen.
    ///
    /// Without a persisted token this is a no-op that stays logged out.
    /// If `/auth/me` rejects the token the session is dropped. A network
    /// failure keeps the token so a later attempt can succeed.
    pub async fn restore(&self) -> Result<NavState, CoreError> {
        if self.inner.session.restore().is_none() {
            debug!("no persisted session");
            return Ok(self.navigation());
        }

        match self.inner.api.me().await {
            Ok(user) => {
                let user = CurrentUser::from(user);
                let requires_password_change = user.requires_password_change;
                self.inner.current_user.store(Some(Arc::new(user)));
                self.navigate(NavEvent::Authenticated {
                    requires_password_change,
                })
                .await;
                Ok(self.navigation())
            }
            Err(e) => {
                let err = CoreError::from(e);
                if matches!(err, CoreError::Network { .. }) {
                    self.inner.notifier.error(err.to_string());
                    return Err(err);
                }
                warn!(error = %err, "persisted session rejected");
                self.teardown();
                self.inner
                    .notifier
                    .error("Session expired -- please log in again");
                Err(CoreError::Auth {
                    message: err.to_string(),
                })
            }
        }
    }

    /// Authenticate with credentials and enter the matching screen.
    ///
    /// [`CoreError::TwoFactorRequired`] means: ask for a TOTP code and
    /// call again with it.
    pub async fn login(
        &self,
        username: &str,
        password: &SecretString,
        totp: Option<&str>,
    ) -> Result<NavState, CoreError> {
        let outcome = match self.inner.api.login(username, password, totp).await {
            Ok(outcome) => outcome,
            Err(e) => {
                let err = CoreError::from(e);
                if !matches!(err, CoreError::TwoFactorRequired) {
                    self.inner.notifier.error(err.to_string());
                }
                return Err(err);
            }
        };
        info!(username, "logged in");

        let user = match self.track(self.inner.api.me().await) {
            Ok(user) => CurrentUser::from(user),
            Err(err) => {
                // The new token is never kept without a confirmed user.
                self.teardown();
                return self.report(Err(err));
            }
        };
        let requires_password_change =
            outcome.require_password_change || user.requires_password_change;
        self.inner.current_user.store(Some(Arc::new(user)));

        self.navigate(NavEvent::Authenticated {
            requires_password_change,
        })
        .await;
        Ok(self.navigation())
    }

    /// Explicit logout. Always leaves the controller logged out, even if
    /// navigation never reached an authenticated screen.
    pub async fn logout(&self) {
        self.navigate(NavEvent::Logout).await;
        self.teardown();
        info!("logged out");
    }

    /// Stop background work without touching the session (process exit).
    pub fn shutdown(&self) {
        self.inner.poller.stop();
    }

    // ── Navigation ───────────────────────────────────────────────────

    /// Feed one navigation event and run the effects it produces.
    pub async fn navigate(&self, event: NavEvent) {
        let effects = self.transition(event);
        for effect in effects {
            match effect {
                Effect::RefreshAll => {
                    self.refresh_all().await;
                }
                Effect::Load(resource) => {
                    self.load(resource).await;
                }
                sync_effect => self.run_sync_effect(sync_effect),
            }
        }
    }

    fn transition(&self, event: NavEvent) -> Vec<Effect> {
        let (effects, state) = {
            let mut nav = self
                .inner
                .navigation
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let effects = nav.apply(event);
            (effects, nav.state())
        };
        self.inner.nav_tx.send_if_modified(|current| {
            let changed = *current != state;
            *current = state;
            changed
        });
        effects
    }

    fn run_sync_effect(&self, effect: Effect) {
        match effect {
            Effect::ArmPoller => self.arm_poller(),
            Effect::DisarmPoller => self.inner.poller.stop(),
            Effect::ClearSession => self.teardown(),
            Effect::RefreshAll | Effect::Load(_) => {
                warn!(?effect, "async effect dropped on a synchronous path");
            }
        }
    }

    /// Drop the session and everything derived from it.
    fn teardown(&self) {
        self.inner.poller.stop();
        self.inner.session.clear();
        self.inner.current_user.store(None);
        self.inner.store.clear();
    }

    /// Central 401 recovery: force the logged-out screen once.
    fn expire(&self) {
        let effects = self.transition(NavEvent::SessionExpired);
        let transitioned = !effects.is_empty();
        for effect in effects {
            self.run_sync_effect(effect);
        }
        // Also covers a 401 before navigation left LoggedOut.
        self.teardown();
        if transitioned {
            warn!("session expired, returning to login");
            self.inner
                .notifier
                .error("Session expired -- please log in again");
        }
    }

    /// Route an API result through the 401 policy.
    fn track<T>(&self, result: Result<T, connexa_api::Error>) -> Result<T, CoreError> {
        result.map_err(|e| {
            if e.is_auth_expired() {
                self.expire();
            }
            CoreError::from(e)
        })
    }

    fn arm_poller(&self) {
        // The refresh that ran just before may already have expired the session.
        if !self.navigation().is_dashboard() || !self.inner.session.is_authenticated() {
            debug!("not arming poller outside an authenticated dashboard");
            return;
        }
        let eligible = Arc::downgrade(&self.inner);
        let target = Arc::downgrade(&self.inner);
        self.inner.poller.start(
            self.inner.config.poll_interval,
            move || {
                eligible.upgrade().is_some_and(|inner| {
                    inner.session.is_authenticated() && inner.nav_tx.borrow().is_nodes_view_active()
                })
            },
            move || poll_nodes(target.clone()),
        );
    }

    // ── Dashboard loads ──────────────────────────────────────────────

    /// Load stats, nodes, configuration and export tokens concurrently.
    ///
    /// Never fails: each load settles on its own panel and the report
    /// says which ones moved.
    pub async fn refresh_all(&self) -> RefreshReport {
        let (stats, nodes, config, tokens) = tokio::join!(
            self.load(Resource::Stats),
            self.load(Resource::Nodes),
            self.load(Resource::Config),
            self.load(Resource::Tokens),
        );

        let mut report = RefreshReport::default();
        report.push(Resource::Stats, stats);
        report.push(Resource::Nodes, nodes);
        report.push(Resource::Config, config);
        report.push(Resource::Tokens, tokens);

        if report.succeeded().next().is_some() {
            self.inner.store.mark_full_refresh();
        }
        debug!(
            updated = report.succeeded().count(),
            failed = report.failed().count(),
            "dashboard refresh settled"
        );
        report
    }

    /// Load one resource into its panel.
    pub async fn load(&self, resource: Resource) -> LoadOutcome {
        let api = &self.inner.api;
        let store = &self.inner.store;
        let generation = self.inner.session.generation();

        match resource {
            Resource::Stats => {
                let result = api.node_stats().await.map(Into::into);
                self.settle(resource, generation, &store.stats, result)
            }
            Resource::Nodes => {
                let result = api
                    .list_nodes()
                    .await
                    .map(|nodes| nodes.into_iter().map(Node::from).collect());
                self.settle(resource, generation, &store.nodes, result)
            }
            Resource::Config => {
                let result = api.get_config().await.map(Into::into);
                self.settle(resource, generation, &store.config, result)
            }
            Resource::Tokens => {
                let result = api.list_export_tokens().await.map(convert_tokens);
                self.settle(resource, generation, &store.tokens, result)
            }
            Resource::Whitelist => {
                let result = api.list_whitelist().await.map(convert_whitelist);
                self.settle(resource, generation, &store.whitelist, result)
            }
            Resource::Logs => {
                let result = api
                    .list_logs(self.inner.config.logs_limit)
                    .await
                    .map(|logs| logs.into_iter().map(AuditEntry::from).collect());
                self.settle(resource, generation, &store.logs, result)
            }
        }
    }

    /// Apply a finished load to its panel, unless the session moved on.
    fn settle<T>(
        &self,
        resource: Resource,
        generation: u64,
        panel: &Panel<T>,
        result: Result<T, connexa_api::Error>,
    ) -> LoadOutcome {
        match result {
            // The client only reports expiry for the session the request
            // was sent under; clearing it already bumped the generation.
            Err(e) if e.is_auth_expired() => {
                self.expire();
                LoadOutcome::Failed(CoreError::from(e).to_string())
            }
            _ if !self.inner.session.is_current(generation) => {
                debug!(%resource, "discarding load from a previous session");
                LoadOutcome::Discarded
            }
            Ok(data) => {
                panel.set(data);
                LoadOutcome::Updated
            }
            Err(e) => {
                let message = CoreError::from(e).to_string();
                warn!(%resource, error = %message, "load failed");
                self.inner
                    .notifier
                    .error(format!("Failed to load {resource}: {message}"));
                panel.fail(message.clone());
                LoadOutcome::Failed(message)
            }
        }
    }

    // ── Ad-hoc reads ─────────────────────────────────────────────────

    /// Fetch one node directly. Does not touch the nodes panel.
    pub async fn node(&self, node_id: &str) -> Result<Node, CoreError> {
        let node_id = node_id.trim();
        if node_id.is_empty() {
            return Err(CoreError::validation("node id", "must not be empty"));
        }
        let result = self.inner.api.get_node(node_id).await;
        let node = self.report(self.track(result))?;
        Ok(Node::from(node))
    }

    /// Refresh the current user record.
    ///
    /// Any non-2xx answer ends the session. A network failure keeps it.
    pub async fn whoami(&self) -> Result<Arc<CurrentUser>, CoreError> {
        let user = match self.track(self.inner.api.me().await) {
            Ok(user) => Arc::new(CurrentUser::from(user)),
            Err(err) => {
                if matches!(err, CoreError::Request { .. }) {
                    self.expire();
                }
                return self.report(Err(err));
            }
        };
        self.inner.current_user.store(Some(Arc::clone(&user)));
        Ok(user)
    }

    /// Live node totals from `/metrics/`. Does not touch any panel.
    pub async fn metrics(&self) -> Result<PoolMetrics, CoreError> {
        let result = self.inner.api.metrics().await;
        Ok(PoolMetrics::from(self.report(self.track(result))?))
    }

    /// Start a two-factor enrollment. Each call replaces the pending
    /// secret; login keeps working without a code until
    /// [`Command::EnableTwoFactor`] confirms it.
    pub async fn setup_two_factor(&self) -> Result<TwoFactorEnrollment, CoreError> {
        let result = self.inner.api.setup_two_factor().await;
        let setup = self.report(self.track(result))?;
        self.report(TwoFactorEnrollment::try_from(setup))
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Run a command: confirm if destructive, call the API once, then
    /// run the targeted refresh. Failures are published once to the
    /// notification channel and returned.
    pub async fn execute(
        &self,
        cmd: Command,
        confirmer: &dyn Confirmer,
    ) -> Result<CommandResult, CoreError> {
        if let Command::RotateNode { node_id } = &cmd {
            if node_id.trim().is_empty() {
                return Err(CoreError::validation("node id", "must not be empty"));
            }
        }

        if let Some(prompt) = cmd.confirmation_prompt() {
            if !confirmer.confirm(&prompt) {
                debug!(?prompt, "command cancelled by operator");
                return Ok(CommandResult::Cancelled);
            }
        }

        let result = self.report(self.route(&cmd).await)?;

        self.inner.notifier.success(cmd.success_message());
        match &cmd {
            Command::ChangePassword(_) => self.password_changed().await,
            Command::EnableTwoFactor(_) => self.update_user(|user| user.totp_enabled = true),
            _ => {}
        }
        match cmd.refresh_scope() {
            RefreshScope::None => {}
            RefreshScope::All => {
                self.refresh_all().await;
            }
            RefreshScope::Only(resource) => {
                self.load(resource).await;
            }
        }
        Ok(result)
    }

    async fn route(&self, cmd: &Command) -> Result<CommandResult, CoreError> {
        let api = &self.inner.api;
        let ack = match cmd {
            Command::RotateAll => api.rotate_all_nodes().await,
            Command::RotateNode { node_id } => api.rotate_node(node_id.trim()).await,
            Command::ScalePool(req) => api.scale_pool(req.size()).await,
            Command::SetCountries(req) => {
                let codes: Vec<&str> = req.countries().iter().map(String::as_str).collect();
                api.set_countries(&codes, req.strict_nodes()).await
            }
            Command::ApplyFirewall => api.apply_firewall().await,
            Command::AddWhitelistEntry(req) => api.add_whitelist_entry(req.ip()).await,
            Command::RemoveWhitelistEntry { ip } => api.remove_whitelist_entry(*ip).await,
            Command::RevokeExportToken { id } => api.revoke_export_token(*id).await,
            Command::ChangePassword(req) => {
                api.change_password(req.old_password(), req.new_password())
                    .await
            }
            Command::EnableTwoFactor(code) => api.verify_two_factor(code.as_str()).await,
            Command::CreateExportToken(req) => {
                let created = self.track(api.create_export_token(req.description()).await)?;
                return Ok(CommandResult::TokenCreated(CreatedExportToken::try_from(
                    created,
                )?));
            }
        };

        let ack = self.track(ack)?;
        Ok(CommandResult::Ok {
            message: ack.message,
        })
    }

    async fn password_changed(&self) {
        self.update_user(|user| user.requires_password_change = false);
        self.navigate(NavEvent::PasswordChanged).await;
    }

    fn update_user(&self, edit: impl FnOnce(&mut CurrentUser)) {
        let updated = self.current_user().map(|user| {
            let mut user = (*user).clone();
            edit(&mut user);
            Arc::new(user)
        });
        self.inner.current_user.store(updated);
    }

    /// Publish a non-auth failure once. Auth failures were already
    /// handled by [`expire`](Self::expire).
    fn report<T>(&self, result: Result<T, CoreError>) -> Result<T, CoreError> {
        if let Err(ref err) = result {
            if !err.is_auth() {
                self.inner.notifier.error(err.to_string());
            }
        }
        result
    }
}

// ── Background tasks ─────────────────────────────────────────────────

async fn poll_nodes(target: Weak<ControllerInner>) {
    if let Some(inner) = target.upgrade() {
        let controller = Controller { inner };
        controller.load(Resource::Nodes).await;
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

fn build_transport(config: &ControllerConfig) -> TransportConfig {
    TransportConfig {
        tls: match &config.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        },
        timeout: config.timeout,
    }
}

fn convert_tokens(raw: Vec<connexa_api::types::ExportTokenResponse>) -> Vec<ExportToken> {
    raw.into_iter()
        .filter_map(|t| match ExportToken::try_from(t) {
            Ok(token) => Some(token),
            Err(e) => {
                warn!(error = %e, "skipping export token");
                None
            }
        })
        .collect()
}

fn convert_whitelist(raw: Vec<String>) -> BTreeSet<IpAddr> {
    raw.into_iter()
        .filter_map(|entry| match entry.trim().parse() {
            Ok(ip) => Some(ip),
            Err(_) => {
                warn!(entry, "skipping unparsable whitelist entry");
                None
            }
        })
        .collect()
}
