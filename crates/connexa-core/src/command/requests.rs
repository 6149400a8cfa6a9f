// ── Validated command payloads ──
//
// Each type can only be built through its validating constructor, so a
// value that reaches the controller is already known to be acceptable.
// Validation failures never touch the network.

use std::collections::BTreeSet;
use std::net::IpAddr;

use secrecy::{ExposeSecret, SecretString};

use crate::error::CoreError;

/// Bounds on the pool size, inclusive.
pub const MIN_POOL_SIZE: u32 = 1;
pub const MAX_POOL_SIZE: u32 = 100;

// ── Pool ─────────────────────────────────────────────────────────────

/// Target pool size, always in `[1, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalePool {
    size: u32,
}

impl ScalePool {
    pub fn new(size: i64) -> Result<Self, CoreError> {
        u32::try_from(size)
            .ok()
            .filter(|s| (MIN_POOL_SIZE..=MAX_POOL_SIZE).contains(s))
            .map(|size| Self { size })
            .ok_or_else(|| {
                CoreError::validation(
                    "pool size",
                    format!("must be between {MIN_POOL_SIZE} and {MAX_POOL_SIZE}, got {size}"),
                )
            })
    }

    /// Parse operator text. Only whole numbers are accepted.
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let trimmed = raw.trim();
        let size: i64 = trimmed.parse().map_err(|_| {
            CoreError::validation("pool size", format!("{trimmed:?} is not a whole number"))
        })?;
        Self::new(size)
    }

    pub fn size(self) -> u32 {
        self.size
    }
}

/// Exit-country selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCountries {
    countries: BTreeSet<String>,
    strict_nodes: bool,
}

impl SetCountries {
    /// Codes are trimmed and upper-cased; each must be two ASCII letters.
    pub fn new<I, S>(countries: I, strict_nodes: bool) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = BTreeSet::new();
        for raw in countries {
            let code = raw.as_ref().trim();
            if code.is_empty() {
                continue;
            }
            if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(CoreError::validation(
                    "country",
                    format!("{code:?} is not a two-letter country code"),
                ));
            }
            set.insert(code.to_ascii_uppercase());
        }

        if set.is_empty() {
            return Err(CoreError::validation(
                "countries",
                "select at least one country",
            ));
        }

        Ok(Self {
            countries: set,
            strict_nodes,
        })
    }

    pub fn countries(&self) -> &BTreeSet<String> {
        &self.countries
    }

    pub fn strict_nodes(&self) -> bool {
        self.strict_nodes
    }
}

// ── Whitelist ────────────────────────────────────────────────────────

/// A whitelist IP to add.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddWhitelistEntry {
    ip: IpAddr,
}

impl AddWhitelistEntry {
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CoreError::validation("ip", "must not be empty"));
        }
        let ip = trimmed.parse().map_err(|_| {
            CoreError::validation("ip", format!("{trimmed:?} is not an IP address"))
        })?;
        Ok(Self { ip })
    }

    pub fn ip(self) -> IpAddr {
        self.ip
    }
}

// ── Export tokens ────────────────────────────────────────────────────

/// New export token. The description is optional free text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateExportToken {
    description: Option<String>,
}

impl CreateExportToken {
    /// Blank descriptions are treated as absent.
    pub fn new(description: Option<&str>) -> Self {
        Self {
            description: description
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_owned),
        }
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

// ── Account ──────────────────────────────────────────────────────────

/// Password change. The server enforces its own strength policy.
#[derive(Debug, Clone)]
pub struct ChangePassword {
    old_password: SecretString,
    new_password: SecretString,
}

impl ChangePassword {
    pub fn new(old_password: SecretString, new_password: SecretString) -> Result<Self, CoreError> {
        if new_password.expose_secret().is_empty() {
            return Err(CoreError::validation("new password", "must not be empty"));
        }
        if new_password.expose_secret() == old_password.expose_secret() {
            return Err(CoreError::validation(
                "new password",
                "must differ from the current password",
            ));
        }
        Ok(Self {
            old_password,
            new_password,
        })
    }

    pub fn old_password(&self) -> &SecretString {
        &self.old_password
    }

    pub fn new_password(&self) -> &SecretString {
        &self.new_password
    }
}

/// Digits in an authenticator code.
pub const TOTP_DIGITS: usize = 6;

/// A code from the operator's authenticator app, used to confirm a
/// two-factor enrollment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotpCode {
    code: String,
}

impl TotpCode {
    /// Spaces are dropped ("123 456" is accepted).
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let code: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        if code.len() != TOTP_DIGITS || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(CoreError::validation(
                "code",
                format!("expected {TOTP_DIGITS} digits"),
            ));
        }
        Ok(Self { code })
    }

    pub fn as_str(&self) -> &str {
        &self.code
    }
}
