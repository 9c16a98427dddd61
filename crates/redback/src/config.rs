//! CLI configuration -- thin wrapper around `redback_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--scheme, --auth-id, etc.).

use secrecy::SecretString;

use redback_core::{ApiScheme, ClientConfig, SiteIndex};

use crate::cli::{GlobalOpts, SchemeArg};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use redback_config::{Config, Profile, config_path, load_config_or_default, save_config};

// ── CLI-specific helpers ────────────────────────────────────────────

impl From<SchemeArg> for ApiScheme {
    fn from(arg: SchemeArg) -> Self {
        match arg {
            SchemeArg::Public => Self::Public,
            SchemeArg::Private => Self::Private,
        }
    }
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .unwrap_or_else(|| config.default_profile_name().to_owned())
}

/// Translate a `Profile` + global flags into a `ClientConfig`.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    global: &GlobalOpts,
    default_timeout: u64,
) -> Result<ClientConfig, CliError> {
    let mut profile = profile.clone();
    if let Some(scheme) = global.scheme {
        profile.scheme = scheme.into();
    }
    if let Some(ref id) = global.auth_id {
        profile.auth_id.clone_from(id);
    }
    if let Some(ref raw) = global.site_index {
        profile.site_index = SiteIndex::parse_lenient(raw);
    }
    if global.timeout.is_some() {
        profile.timeout = global.timeout;
    }

    let secret = match global.auth_secret {
        Some(ref s) => SecretString::from(s.clone()),
        None => redback_config::resolve_secret(&profile, profile_name)?,
    };

    Ok(redback_config::build_client_config(
        &profile,
        secret,
        default_timeout,
    )?)
}

/// Build a `ClientConfig` from flags and environment alone.
pub fn from_flags(
    global: &GlobalOpts,
    profile_name: &str,
    default_timeout: u64,
) -> Result<ClientConfig, CliError> {
    let auth_id = global.auth_id.as_deref().ok_or_else(|| CliError::NoConfig {
        path: config_path().display().to_string(),
    })?;
    let secret = global
        .auth_secret
        .clone()
        .map(SecretString::from)
        .ok_or_else(|| CliError::NoCredentials {
            profile: profile_name.to_owned(),
        })?;

    let mut profile = Profile::new(
        global.scheme.map_or_else(ApiScheme::default, ApiScheme::from),
        auth_id,
    );
    if let Some(ref raw) = global.site_index {
        profile.site_index = SiteIndex::parse_lenient(raw);
    }
    profile.timeout = global.timeout;

    Ok(redback_config::build_client_config(
        &profile,
        secret,
        default_timeout,
    )?)
}
