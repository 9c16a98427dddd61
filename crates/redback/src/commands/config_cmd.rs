//! Config subcommand handlers.

use std::fmt::Write as _;

use dialoguer::{Input, Password, Select};
use redback_core::{ApiScheme, REDACTED, SiteIndex};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking secrets.
fn format_config_redacted(cfg: &Config) -> String {
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);

    let mut names: Vec<_> = cfg.profiles.keys().collect();
    names.sort();
    for name in names {
        let Some(p) = cfg.profiles.get(name) else {
            continue;
        };
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "scheme = \"{}\"", p.scheme);
        let _ = writeln!(out, "auth_id = \"{}\"", p.auth_id);
        if p.auth_secret.is_some() {
            let _ = writeln!(out, "auth_secret = \"{REDACTED}\"");
        }
        if let Some(ref env) = p.auth_secret_env {
            let _ = writeln!(out, "auth_secret_env = \"{env}\"");
        }
        let _ = writeln!(out, "site_index = {}", p.site_index);
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
        if let Some(ref url) = p.private_base_url {
            let _ = writeln!(out, "private_base_url = \"{url}\"");
        }
        if let Some(ref url) = p.public_base_url {
            let _ = writeln!(out, "public_base_url = \"{url}\"");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
    }

    out
}

/// Offer to store the secret in the system keyring.
///
/// Returns `Some(secret)` if the user chose plaintext, `None` if stored in keyring.
fn prompt_secret_storage(profile_name: &str, secret: String) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt("Where to store the secret?")
        .items(choices)
        .default(0)
        .interact()?;

    if selection == 0 {
        redback_config::store_secret(profile_name, &secret)?;
        eprintln!("   ✓ secret stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(secret))
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(),

        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            output::print_output(format_config_redacted(&cfg).trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }
    }
}

/// Interactive wizard: one profile, written to the canonical path.
fn init() -> Result<(), CliError> {
    eprintln!("Redback CLI configuration wizard");
    eprintln!("   Config path: {}\n", config::config_path().display());

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()?;

    let schemes = &[
        "Public API (OAuth2 client ID + secret)",
        "Private portal (inverter serial + cookie)",
    ];
    let scheme = match Select::new()
        .with_prompt("API scheme")
        .items(schemes)
        .default(0)
        .interact()?
    {
        0 => ApiScheme::Public,
        _ => ApiScheme::Private,
    };

    let (id_prompt, secret_prompt) = match scheme {
        ApiScheme::Public => ("Client ID", "Client secret"),
        ApiScheme::Private => ("Inverter serial number", "Portal cookie"),
    };
    let auth_id: String = Input::new().with_prompt(id_prompt).interact_text()?;
    let secret = Password::new().with_prompt(secret_prompt).interact()?;
    if auth_id.trim().is_empty() || secret.is_empty() {
        return Err(CliError::Validation {
            field: "credentials".into(),
            reason: "auth ID and secret cannot be empty".into(),
        });
    }

    let mut profile = Profile::new(scheme, auth_id.trim());
    if scheme == ApiScheme::Public {
        let raw: String = Input::new()
            .with_prompt("Site (number or \"first\", \"second\", ...)")
            .default("1".into())
            .interact_text()?;
        profile.site_index = SiteIndex::parse_lenient(&raw);
    }
    profile.auth_secret = prompt_secret_storage(&profile_name, secret)?;

    let mut cfg = config::load_config_or_default();
    if cfg.profiles.is_empty() {
        cfg.default_profile = Some(profile_name.clone());
    }
    cfg.profiles.insert(profile_name.clone(), profile);
    let path = config::save_config(&cfg)?;

    eprintln!("\n   ✓ profile '{profile_name}' saved to {}", path.display());
    eprintln!("   Try: redback --profile {profile_name} test");
    Ok(())
}
