// ── Domain model ──
//
// Canonical types built from `connexa_api::types` by `crate::convert`.

pub mod audit;
pub mod health;
pub mod node;
pub mod pool;
pub mod token;
pub mod user;

pub use audit::AuditEntry;
pub use health::{HealthState, HealthSummary, SLOW_LATENCY_MS, classify, summarize};
pub use node::Node;
pub use pool::{PoolConfig, PoolMetrics, PoolStats};
pub use token::{CreatedExportToken, ExportToken};
pub use user::{CurrentUser, TwoFactorEnrollment};
