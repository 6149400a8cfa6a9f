// connexa-api: Async Rust client for the Connexa proxy pool admin API
//
// One `ApiClient` covers the whole `/api/v1` surface. The bearer token is
// owned by `SessionStore`; the client only reads it and clears it on 401.

pub mod auth;
pub mod client;
pub mod error;
pub mod export;
pub mod logs;
pub mod metrics;
pub mod nodes;
pub mod pool_config;
pub mod session;
pub mod transport;
pub mod types;

pub use auth::LoginOutcome;
pub use client::{API_PREFIX, ApiClient};
pub use error::Error;
pub use export::ExportFormat;
pub use session::{FileTokenStore, MemoryTokenStore, SessionStore, TokenPersistence};
pub use transport::{TlsMode, TransportConfig};
