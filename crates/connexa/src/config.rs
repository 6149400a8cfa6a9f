//! CLI configuration -- thin wrapper around `connexa_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--url, --insecure, --timeout).

use std::sync::Arc;
use std::time::Duration;

use connexa_core::{ControllerConfig, SessionStore, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use connexa_config::{
    Config, Profile, TokenStorage, build_session_store, config_path, load_config_or_default,
    save_config,
};

/// Everything a panel-bound command needs before it can talk to the panel.
pub struct Resolved {
    pub profile_name: String,
    pub profile: Profile,
    pub controller: ControllerConfig,
    pub session: Arc<SessionStore>,
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.profile_name(global.profile.as_deref()).to_owned()
}

/// Translate the active profile + global flags into a controller config
/// and session store.
///
/// Without a profile, `--url` alone is enough: the session then lives in
/// a file named after the requested profile.
pub fn resolve(global: &GlobalOpts) -> Result<Resolved, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let mut profile = match (cfg.profiles.get(&profile_name), global.url.as_deref()) {
        (Some(profile), _) => profile.clone(),
        (None, Some(url)) => Profile::new(url),
        (None, None) if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(&cfg),
            });
        }
        (None, None) => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    // Flag > env > profile
    if let Some(ref url) = global.url {
        profile.base_url.clone_from(url);
    }

    let mut controller = connexa_config::profile_to_controller_config(&profile, &cfg.defaults)?;
    if global.insecure {
        controller.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        controller.timeout = Duration::from_secs(secs);
    }

    let session = build_session_store(&profile, &profile_name)?;

    Ok(Resolved {
        profile_name,
        profile,
        controller,
        session,
    })
}

pub fn available_profiles(cfg: &Config) -> String {
    if cfg.profiles.is_empty() {
        "(none)".into()
    } else {
        cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}
