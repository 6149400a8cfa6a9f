// ── Navigation state machine ──
//
// Tracks which screen, tab and modal are active and decides which loads
// fire on entry. `apply` is pure: it mutates only the navigation value
// and returns the side effects for the controller to run. Events that
// make no sense in the current state are ignored and yield no effects.

use serde::Serialize;
use strum::{Display, EnumIter, EnumString};
use tracing::trace;

/// Top-level dashboard section. The single-select group has one member
/// today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Section {
    #[default]
    Overview,
}

/// Dashboard tabs.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Display, EnumIter, EnumString,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Tab {
    #[default]
    Nodes,
    Tokens,
    Config,
    Logs,
}

/// Dashboard modals.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumIter, EnumString,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Modal {
    PasswordChange,
    Whitelist,
    Config,
    Export,
}

/// A single-resource load the controller can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Resource {
    Stats,
    Nodes,
    Config,
    Tokens,
    Whitelist,
    Logs,
}

/// What is on screen inside the authenticated dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardView {
    pub section: Section,
    pub tab: Tab,
    pub modal: Option<Modal>,
    pub options_menu_open: bool,
}

/// Navigation state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum NavState {
    #[default]
    LoggedOut,
    PasswordChangeRequired,
    Dashboard(DashboardView),
}

impl NavState {
    pub fn is_dashboard(&self) -> bool {
        matches!(self, Self::Dashboard(_))
    }

    /// Active tab, when the dashboard is showing.
    pub fn tab(&self) -> Option<Tab> {
        match self {
            Self::Dashboard(view) => Some(view.tab),
            _ => None,
        }
    }

    pub fn modal(&self) -> Option<Modal> {
        match self {
            Self::Dashboard(view) => view.modal,
            _ => None,
        }
    }

    /// `true` while the nodes tab is the visible view (no modal over it).
    pub fn is_nodes_view_active(&self) -> bool {
        matches!(
            self,
            Self::Dashboard(DashboardView {
                tab: Tab::Nodes,
                modal: None,
                ..
            })
        )
    }
}

/// Inputs to the machine. The triggering item is always explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavEvent {
    /// A session was established (login or restore) and the user fetched.
    Authenticated { requires_password_change: bool },
    /// The forced password change succeeded.
    PasswordChanged,
    /// Operator asked to log out.
    Logout,
    /// The server answered 401 somewhere.
    SessionExpired,
    SelectSection(Section),
    SelectTab(Tab),
    /// Open a modal. Also closes the options menu it may have come from.
    OpenModal(Modal),
    CloseModal,
    ToggleOptionsMenu,
    /// Any click or key outside the options menu.
    OutsideInteraction,
}

/// Side effects requested by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Effect {
    /// Fan out the four dashboard loads.
    RefreshAll,
    ArmPoller,
    DisarmPoller,
    /// Drop the session token, the current user and all panel data.
    ClearSession,
    Load(Resource),
}

/// The navigation machine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Navigation {
    state: NavState,
}

impl Navigation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    /// Apply one event and return the effects to run, in order.
    pub fn apply(&mut self, event: NavEvent) -> Vec<Effect> {
        let (next, effects) = transition(self.state, event);
        if next != self.state || !effects.is_empty() {
            trace!(?event, from = ?self.state, to = ?next, ?effects, "navigation");
        }
        self.state = next;
        effects
    }
}

fn enter_dashboard() -> (NavState, Vec<Effect>) {
    (
        NavState::Dashboard(DashboardView::default()),
        vec![Effect::RefreshAll, Effect::ArmPoller],
    )
}

fn logged_out() -> (NavState, Vec<Effect>) {
    (
        NavState::LoggedOut,
        vec![Effect::DisarmPoller, Effect::ClearSession],
    )
}

fn tab_load(tab: Tab) -> Resource {
    match tab {
        Tab::Nodes => Resource::Nodes,
        Tab::Tokens => Resource::Tokens,
        Tab::Config => Resource::Config,
        Tab::Logs => Resource::Logs,
    }
}

fn modal_load(modal: Modal) -> Option<Resource> {
    match modal {
        Modal::PasswordChange => None,
        Modal::Whitelist => Some(Resource::Whitelist),
        Modal::Config => Some(Resource::Config),
        Modal::Export => Some(Resource::Tokens),
    }
}

fn transition(state: NavState, event: NavEvent) -> (NavState, Vec<Effect>) {
    let ignored = (state, Vec::new());

    match (state, event) {
        // ── Authentication ───────────────────────────────────────────
        (
            NavState::LoggedOut,
            NavEvent::Authenticated {
                requires_password_change: true,
            },
        ) => (NavState::PasswordChangeRequired, Vec::new()),
        (
            NavState::LoggedOut,
            NavEvent::Authenticated {
                requires_password_change: false,
            },
        )
        | (NavState::PasswordChangeRequired, NavEvent::PasswordChanged) => enter_dashboard(),

        // Logout and expiry leave any authenticated state.
        (
            NavState::PasswordChangeRequired | NavState::Dashboard(_),
            NavEvent::Logout | NavEvent::SessionExpired,
        ) => logged_out(),

        // ── Inside the dashboard ─────────────────────────────────────
        (NavState::Dashboard(mut view), NavEvent::SelectSection(section)) => {
            view.section = section;
            view.options_menu_open = false;
            (NavState::Dashboard(view), Vec::new())
        }
        (NavState::Dashboard(mut view), NavEvent::SelectTab(tab)) => {
            view.tab = tab;
            view.options_menu_open = false;
            (NavState::Dashboard(view), vec![Effect::Load(tab_load(tab))])
        }
        (NavState::Dashboard(mut view), NavEvent::OpenModal(modal)) => {
            view.modal = Some(modal);
            view.options_menu_open = false;
            let effects = modal_load(modal).map(Effect::Load).into_iter().collect();
            (NavState::Dashboard(view), effects)
        }
        // A voluntary change from the dashboard only closes its modal.
        (NavState::Dashboard(mut view), NavEvent::PasswordChanged)
            if view.modal == Some(Modal::PasswordChange) =>
        {
            view.modal = None;
            (NavState::Dashboard(view), Vec::new())
        }
        (NavState::Dashboard(mut view), NavEvent::CloseModal) if view.modal.is_some() => {
            view.modal = None;
            (NavState::Dashboard(view), Vec::new())
        }
        (NavState::Dashboard(mut view), NavEvent::ToggleOptionsMenu) => {
            view.options_menu_open = !view.options_menu_open;
            (NavState::Dashboard(view), Vec::new())
        }
        (NavState::Dashboard(mut view), NavEvent::OutsideInteraction)
            if view.options_menu_open =>
        {
            view.options_menu_open = false;
            (NavState::Dashboard(view), Vec::new())
        }

        _ => ignored,
    }
}
