//! Clap derive structures for the `connexa` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// connexa -- admin client for a Connexa Tor proxy pool
#[derive(Debug, Parser)]
#[command(
    name = "connexa",
    version,
    about = "Administer a Connexa Tor proxy pool from the command line",
    long_about = "Log in to a Connexa admin panel, inspect node health, rotate circuits,\n\
        scale the pool, manage the client whitelist and export tokens.\n\n\
        The session token is kept between runs according to the profile's\n\
        token_storage setting.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Panel profile to use
    #[arg(long, short = 'p', env = "CONNEXA_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Panel URL (overrides profile)
    #[arg(long, short = 'u', env = "CONNEXA_URL", global = true)]
    pub url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "CONNEXA_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "CONNEXA_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "CONNEXA_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and keep the session token
    Login(LoginArgs),

    /// Drop the stored session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Change the admin password
    #[command(alias = "passwd")]
    Password,

    /// Two-factor authentication enrollment
    #[command(name = "2fa")]
    TwoFactor(TwoFactorArgs),

    /// One-shot overview: stats, health breakdown, configuration, tokens
    #[command(alias = "dash")]
    Dashboard,

    /// Live node table, refreshed by the poller until Ctrl-C
    Watch(WatchArgs),

    /// Node totals as counted live by the server
    Metrics,

    /// Inspect and rotate proxy nodes
    #[command(alias = "n")]
    Nodes(NodesArgs),

    /// Pool configuration: exit countries, firewall
    Pool(PoolArgs),

    /// Manage the client IP whitelist
    #[command(alias = "wl")]
    Whitelist(WhitelistArgs),

    /// Manage proxy-list export tokens
    Tokens(TokensArgs),

    /// Show the admin audit log
    Logs(LogsArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SESSION
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Admin username (overrides profile and CONNEXA_USERNAME)
    #[arg(long)]
    pub username: Option<String>,

    /// Six-digit TOTP code, when two-factor authentication is enabled
    #[arg(long, value_name = "CODE")]
    pub totp: Option<String>,
}

#[derive(Debug, Args)]
pub struct TwoFactorArgs {
    #[command(subcommand)]
    pub command: TwoFactorCommand,
}

#[derive(Debug, Subcommand)]
pub enum TwoFactorCommand {
    /// Issue a new TOTP secret for your authenticator app
    Setup,

    /// Confirm the secret with a current code and turn two-factor login on
    Verify {
        /// Six-digit code from the authenticator app
        code: String,
    },
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Poll interval (e.g. "5s", "1m"); overrides the profile
    #[arg(long, short = 'i', value_parser = humantime::parse_duration)]
    pub interval: Option<Duration>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  NODES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct NodesArgs {
    #[command(subcommand)]
    pub command: NodesCommand,
}

#[derive(Debug, Subcommand)]
pub enum NodesCommand {
    /// List nodes with their health
    #[command(alias = "ls")]
    List {
        /// Only show nodes in this health state
        #[arg(long, value_enum)]
        health: Option<HealthFilter>,
    },

    /// Get node details
    Get {
        /// Node ID (e.g. "tor-3")
        node: String,
    },

    /// Request a new circuit for one node
    Rotate {
        /// Node ID
        node: String,
    },

    /// Request new circuits for every node
    RotateAll,

    /// Resize the pool (1-100 nodes)
    Scale {
        /// Target number of nodes
        size: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum HealthFilter {
    Healthy,
    Unhealthy,
    Slow,
    Rotating,
    Paused,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  POOL
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct PoolArgs {
    #[command(subcommand)]
    pub command: PoolCommand,
}

#[derive(Debug, Subcommand)]
pub enum PoolCommand {
    /// Show the pool configuration
    Show,

    /// Restrict exit nodes to the given countries
    Countries {
        /// Two-letter country codes (e.g. US DE NL, or US,DE,NL)
        #[arg(required = true, value_delimiter = ',')]
        codes: Vec<String>,

        /// Only ever use these exits (StrictNodes)
        #[arg(long)]
        strict: bool,
    },

    /// Re-apply the firewall rules on the host
    ApplyFirewall,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  WHITELIST
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WhitelistArgs {
    #[command(subcommand)]
    pub command: WhitelistCommand,
}

#[derive(Debug, Subcommand)]
pub enum WhitelistCommand {
    /// List whitelisted client IPs
    #[command(alias = "ls")]
    List,

    /// Allow a client IP
    Add {
        /// IPv4 or IPv6 address
        ip: String,
    },

    /// Remove a client IP
    #[command(alias = "rm")]
    Remove {
        /// IPv4 or IPv6 address
        ip: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  TOKENS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct TokensArgs {
    #[command(subcommand)]
    pub command: TokensCommand,
}

#[derive(Debug, Subcommand)]
pub enum TokensCommand {
    /// List export tokens
    #[command(alias = "ls")]
    List {
        /// Include revoked and expired tokens
        #[arg(long, short = 'a')]
        all: bool,
    },

    /// Issue a new export token and print its download URLs
    Create {
        /// Free-text description
        #[arg(long, short = 'd')]
        description: Option<String>,
    },

    /// Revoke an export token
    Revoke {
        /// Token ID
        id: i64,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  LOGS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct LogsArgs {
    /// Number of entries to fetch
    #[arg(long, short = 'l', default_value = "100")]
    pub limit: u32,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create or update a profile with guided setup
    Init,

    /// Display the current configuration
    Show,

    /// Print the config file location
    Path,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
