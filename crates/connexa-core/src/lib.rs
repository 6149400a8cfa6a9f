// connexa-core: Session and dashboard orchestration for the Connexa admin client
//
// Sits between `connexa-api` (raw HTTP) and front ends (CLI). Owns the
// session lifecycle, the navigation state machine, the dashboard panels,
// the node poller and the notification channel.

pub mod command;
pub mod config;
pub mod controller;
mod convert;
pub mod error;
pub mod model;
pub mod navigation;
pub mod notify;
pub mod poller;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{
    AddWhitelistEntry, AssumeYes, ChangePassword, Command, CommandResult, Confirmer,
    CreateExportToken, MAX_POOL_SIZE, MIN_POOL_SIZE, RefreshScope, ScalePool, SetCountries,
    TOTP_DIGITS, TotpCode,
};
pub use config::{ControllerConfig, DEFAULT_LOGS_LIMIT, DEFAULT_POLL_INTERVAL, TlsVerification};
pub use controller::Controller;
pub use error::CoreError;
pub use navigation::{
    DashboardView, Effect, Modal, NavEvent, NavState, Navigation, Resource, Section, Tab,
};
pub use notify::{Level, Notification, Notifier};
pub use poller::PollingScheduler;
pub use store::{DashboardStore, LoadOutcome, Panel, PanelState, RefreshReport};

// ── Model re-exports ────────────────────────────────────────────────
pub use model::{
    AuditEntry, CreatedExportToken, CurrentUser, ExportToken, HealthState, HealthSummary, Node,
    PoolConfig, PoolMetrics, PoolStats, SLOW_LATENCY_MS, TwoFactorEnrollment, classify,
    summarize,
};

// Front ends build sessions without depending on connexa-api directly.
pub use connexa_api::{ExportFormat, FileTokenStore, MemoryTokenStore, SessionStore, TokenPersistence};
