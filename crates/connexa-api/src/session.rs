// Session credential ownership.
//
// The bearer token is the only client state that survives a restart.
// `SessionStore` owns it in memory and mirrors every change into a
// `TokenPersistence` backend. No expiry timer is kept here: expiry is
// discovered when the server answers 401 and `ApiClient` calls `clear()`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use crate::error::Error;

// ── Persistence backends ────────────────────────────────────────────

/// Durable storage for the single session token.
pub trait TokenPersistence: Send + Sync + fmt::Debug {
    /// Read the persisted token, `None` if nothing is stored.
    fn load(&self) -> Result<Option<SecretString>, Error>;

    /// Persist the token, replacing any previous value.
    fn store(&self, token: &SecretString) -> Result<(), Error>;

    /// Remove the persisted token. Removing a missing token is not an error.
    fn clear(&self) -> Result<(), Error>;
}

/// Process-local storage. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<SecretString>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed the store, as if a previous run had persisted `token`.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(SecretString::from(token.into()))),
        }
    }
}

impl TokenPersistence for MemoryTokenStore {
    fn load(&self) -> Result<Option<SecretString>, Error> {
        Ok(self
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn store(&self, token: &SecretString) -> Result<(), Error> {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), Error> {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Token kept in a single file. The file holds the raw token and nothing else.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenPersistence for FileTokenStore {
    fn load(&self) -> Result<Option<SecretString>, Error> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                if token.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(SecretString::from(token.to_owned())))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::TokenStorage(format!(
                "failed to read {}: {e}",
                self.path.display()
            ))),
        }
    }

    fn store(&self, token: &SecretString) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::TokenStorage(format!("failed to create {}: {e}", parent.display()))
            })?;
        }
        std::fs::write(&self.path, token.expose_secret()).map_err(|e| {
            Error::TokenStorage(format!("failed to write {}: {e}", self.path.display()))
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .map_err(|e| {
                    Error::TokenStorage(format!(
                        "failed to restrict {}: {e}",
                        self.path.display()
                    ))
                })?;
        }

        Ok(())
    }

    fn clear(&self) -> Result<(), Error> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::TokenStorage(format!(
                "failed to remove {}: {e}",
                self.path.display()
            ))),
        }
    }
}

// ── SessionStore ────────────────────────────────────────────────────

/// Sole owner of the bearer credential.
///
/// The in-memory value is authoritative for the running process;
/// persistence failures are logged and never block a transition.
/// Every `set_token` / `clear` bumps a generation counter so that a
/// response started under an older session can be recognised as stale.
pub struct SessionStore {
    token: RwLock<Option<SecretString>>,
    generation: AtomicU64,
    persistence: Arc<dyn TokenPersistence>,
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("authenticated", &self.is_authenticated())
            .field("generation", &self.generation())
            .field("persistence", &self.persistence)
            .finish()
    }
}

impl SessionStore {
    /// Create an empty store. Call [`restore`](Self::restore) to pick up
    /// a token left by a previous run.
    pub fn new(persistence: Arc<dyn TokenPersistence>) -> Self {
        Self {
            token: RwLock::new(None),
            generation: AtomicU64::new(0),
            persistence,
        }
    }

    /// Store backed by [`MemoryTokenStore`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryTokenStore::new()))
    }

    /// Load a previously persisted token into memory.
    ///
    /// Returns the restored token, or `None` when nothing was persisted
    /// (which means the process starts logged out).
    pub fn restore(&self) -> Option<SecretString> {
        let loaded = match self.persistence.load() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "could not read persisted session token");
                None
            }
        };

        if loaded.is_some() {
            debug!("restored persisted session token");
        }
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = loaded.clone();
        self.bump();
        loaded
    }

    /// Store a freshly issued token in memory and persistence.
    pub fn set_token(&self, token: SecretString) {
        if let Err(e) = self.persistence.store(&token) {
            warn!(error = %e, "could not persist session token");
        }
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
        self.bump();
        info!("session established");
    }

    /// Drop the token from memory and persistence.
    pub fn clear(&self) {
        let had_token = self
            .token
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some();
        if let Err(e) = self.persistence.clear() {
            warn!(error = %e, "could not remove persisted session token");
        }
        self.bump();
        if had_token {
            info!("session cleared");
        }
    }

    /// The current token, if any. Synchronous and side-effect free.
    pub fn current(&self) -> Option<SecretString> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Monotonic counter bumped on every session change.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// `true` if no session change happened since `generation` was read
    /// and a token is still present.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation() == generation && self.is_authenticated()
    }

    fn bump(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
    }
}
