//! Shared configuration for Connexa tools.
//!
//! TOML profiles, environment overrides, session-token storage backends,
//! and translation to `connexa_core::ControllerConfig`. The CLI layers its
//! `GlobalOpts` overrides on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use connexa_api::{FileTokenStore, MemoryTokenStore, SessionStore, TokenPersistence};
use connexa_core::{ControllerConfig, DEFAULT_LOGS_LIMIT, TlsVerification};
use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Keyring service name for stored session tokens.
pub const KEYRING_SERVICE: &str = "connexa";

/// Prefix for environment overrides (`CONNEXA_DEFAULTS__TIMEOUT=60`).
pub const ENV_PREFIX: &str = "CONNEXA_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("no username configured for profile '{profile}'")]
    NoUsername { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named panel profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_poll_interval() -> u64 {
    5
}

/// Where a profile keeps its session token between runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStorage {
    /// A 0600 file under the platform data directory.
    #[default]
    File,
    /// The OS keyring.
    Keyring,
    /// Nothing is persisted; every run logs in again.
    Memory,
}

/// A named panel profile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Panel root URL (e.g. "https://10.0.0.5:8000").
    pub base_url: String,

    /// Admin username. `CONNEXA_USERNAME` takes precedence.
    pub username: Option<String>,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override the default insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override the default request timeout, in seconds.
    pub timeout: Option<u64>,

    /// Override the node poll cadence, in seconds. Zero disables polling.
    pub poll_interval_secs: Option<u64>,

    #[serde(default)]
    pub token_storage: TokenStorage,
}

impl Profile {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            username: None,
            ca_cert: None,
            insecure: None,
            timeout: None,
            poll_interval_secs: None,
            token_storage: TokenStorage::default(),
        }
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("io", "connexa", "connexa")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// File holding a profile's session token when `token_storage = "file"`.
pub fn token_path(profile_name: &str) -> PathBuf {
    let dir = project_dirs().map_or_else(
        || dirs_fallback(".local/share"),
        |dirs| dirs.data_dir().to_path_buf(),
    );
    dir.join("sessions").join(format!("{profile_name}.token"))
}

fn dirs_fallback(sub: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(sub);
    p.push("connexa");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file. A missing file yields the defaults.
///
/// Environment keys nest with a double underscore, so
/// `CONNEXA_DEFAULT_PROFILE=lab` and `CONNEXA_DEFAULTS__TIMEOUT=60` both work.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(
            Env::prefixed(ENV_PREFIX)
                .ignore(&["USERNAME", "PASSWORD", "PROFILE", "URL"])
                .split("__"),
        );

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    debug!(path = %path.display(), "config saved");
    Ok(())
}

// ── Profile resolution ──────────────────────────────────────────────

impl Config {
    /// Name of the profile to use: explicit, then `default_profile`, then "default".
    pub fn profile_name<'a>(&'a self, requested: Option<&'a str>) -> &'a str {
        requested
            .or(self.default_profile.as_deref())
            .unwrap_or("default")
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

/// Username from `CONNEXA_USERNAME`, then the profile.
pub fn resolve_username(profile: &Profile, profile_name: &str) -> Result<String, ConfigError> {
    std::env::var("CONNEXA_USERNAME")
        .ok()
        .filter(|u| !u.trim().is_empty())
        .or_else(|| profile.username.clone())
        .ok_or_else(|| ConfigError::NoUsername {
            profile: profile_name.into(),
        })
}

/// Password from `CONNEXA_PASSWORD`, if set. Passwords are never stored.
pub fn password_from_env() -> Option<SecretString> {
    std::env::var("CONNEXA_PASSWORD").ok().map(SecretString::from)
}

/// Build a `ControllerConfig` from a profile and the global defaults.
pub fn profile_to_controller_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<ControllerConfig, ConfigError> {
    let url: url::Url = profile
        .base_url
        .parse()
        .map_err(|_| ConfigError::Validation {
            field: "base_url".into(),
            reason: format!("invalid URL: {}", profile.base_url),
        })?;

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    Ok(ControllerConfig {
        url,
        tls,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        poll_interval: Duration::from_secs(
            profile
                .poll_interval_secs
                .unwrap_or(defaults.poll_interval_secs),
        ),
        logs_limit: DEFAULT_LOGS_LIMIT,
    })
}

// ── Session token storage ───────────────────────────────────────────

/// Session token kept in the OS keyring under `connexa / <profile>/session-token`.
#[derive(Debug)]
pub struct KeyringTokenStore {
    entry: keyring::Entry,
}

impl KeyringTokenStore {
    pub fn new(profile_name: &str) -> Result<Self, connexa_api::Error> {
        let entry = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/session-token"))
            .map_err(|e| connexa_api::Error::TokenStorage(format!("keyring unavailable: {e}")))?;
        Ok(Self { entry })
    }
}

impl TokenPersistence for KeyringTokenStore {
    fn load(&self) -> Result<Option<SecretString>, connexa_api::Error> {
        match self.entry.get_password() {
            Ok(token) if token.trim().is_empty() => Ok(None),
            Ok(token) => Ok(Some(SecretString::from(token))),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(connexa_api::Error::TokenStorage(format!(
                "keyring read failed: {e}"
            ))),
        }
    }

    fn store(&self, token: &SecretString) -> Result<(), connexa_api::Error> {
        self.entry
            .set_password(token.expose_secret())
            .map_err(|e| connexa_api::Error::TokenStorage(format!("keyring write failed: {e}")))
    }

    fn clear(&self) -> Result<(), connexa_api::Error> {
        match self.entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(connexa_api::Error::TokenStorage(format!(
                "keyring delete failed: {e}"
            ))),
        }
    }
}

/// Persistence backend for a profile.
pub fn token_persistence(
    profile: &Profile,
    profile_name: &str,
) -> Result<Arc<dyn TokenPersistence>, ConfigError> {
    Ok(match profile.token_storage {
        TokenStorage::File => Arc::new(FileTokenStore::new(token_path(profile_name))),
        TokenStorage::Keyring => Arc::new(KeyringTokenStore::new(profile_name).map_err(|e| {
            ConfigError::Validation {
                field: "token_storage".into(),
                reason: e.to_string(),
            }
        })?),
        TokenStorage::Memory => Arc::new(MemoryTokenStore::new()),
    })
}

/// Session store for a profile. The persisted token is not read yet:
/// the controller's `restore` does that.
pub fn build_session_store(
    profile: &Profile,
    profile_name: &str,
) -> Result<Arc<SessionStore>, ConfigError> {
    Ok(Arc::new(SessionStore::new(token_persistence(
        profile,
        profile_name,
    )?)))
}
