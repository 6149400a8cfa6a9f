//! Config subcommand handlers. None of these touch the network.

use dialoguer::{Confirm, Input, Select};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config::{self, Config, Profile, TokenStorage};
use crate::error::CliError;
use crate::output;

use super::util::prompt_err;

const STORAGE_CHOICES: [(&str, TokenStorage); 3] = [
    ("File in the data directory (default)", TokenStorage::File),
    ("System keyring", TokenStorage::Keyring),
    ("Don't persist (log in every run)", TokenStorage::Memory),
];

fn toml_text(cfg: &Config) -> Result<String, CliError> {
    toml::to_string_pretty(cfg).map_err(|e| CliError::Config {
        message: format!("failed to serialize config: {e}"),
    })
}

fn set_default(cfg: &mut Config, name: String) -> Result<(), CliError> {
    if !cfg.profiles.contains_key(&name) {
        return Err(CliError::ProfileNotFound {
            name,
            available: config::available_profiles(cfg),
        });
    }
    cfg.default_profile = Some(name);
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let mut cfg = config::load_config_or_default();
            eprintln!("Connexa -- profile setup");
            eprintln!("   Config path: {}\n", config::config_path().display());

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default(config::active_profile_name(global, &cfg))
                .interact_text()
                .map_err(prompt_err)?;

            let base_url: String = Input::new()
                .with_prompt("Panel URL")
                .default("http://localhost:8000".into())
                .validate_with(|s: &String| {
                    url::Url::parse(s.trim())
                        .map(|_| ())
                        .map_err(|e| format!("not a URL: {e}"))
                })
                .interact_text()
                .map_err(prompt_err)?;

            let username: String = Input::new()
                .with_prompt("Admin username (blank to ask at login)")
                .allow_empty(true)
                .interact_text()
                .map_err(prompt_err)?;

            let insecure = Confirm::new()
                .with_prompt("Accept invalid TLS certificates?")
                .default(false)
                .interact()
                .map_err(prompt_err)?;

            let labels: Vec<&str> = STORAGE_CHOICES.iter().map(|(label, _)| *label).collect();
            let storage = Select::new()
                .with_prompt("Where should the session token live?")
                .items(&labels)
                .default(0)
                .interact()
                .map_err(prompt_err)?;

            let mut profile = Profile::new(base_url.trim());
            profile.username = Some(username.trim().to_owned()).filter(|u| !u.is_empty());
            profile.insecure = insecure.then_some(true);
            profile.token_storage = STORAGE_CHOICES[storage].1;

            cfg.profiles.insert(profile_name.clone(), profile);
            if cfg.default_profile.is_none() || cfg.profiles.len() == 1 {
                cfg.default_profile = Some(profile_name.clone());
            }

            let path = config::save_config(&cfg)?;
            eprintln!("\n✓ Configuration written to {}", path.display());
            eprintln!("  Profile: {profile_name}");
            eprintln!("\n  Next: connexa --profile {profile_name} login");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let out = match global.output {
                OutputFormat::Table | OutputFormat::Plain => toml_text(&cfg)?,
                _ => output::render_single(&global.output, &cfg, |_| String::new(), |_| {
                    String::new()
                }),
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let active = config::active_profile_name(global, &cfg);
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: connexa config init");
            } else {
                for (name, profile) in &cfg.profiles {
                    let marker = if *name == active { " *" } else { "" };
                    println!("{name}{marker}\t{}", profile.base_url);
                }
            }
            Ok(())
        }

        // ── Use <name> ──────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            set_default(&mut cfg, name.clone())?;
            config::save_config(&cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }
    }
}
