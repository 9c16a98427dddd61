//! Shared configuration for Redback tools.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `redback_core::ClientConfig`. The CLI layers its
//! flag overrides on top of what this crate resolves.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use redback_core::{ApiScheme, ApiUrls, ClientConfig, SiteIndex, TlsMode};

/// Environment variable consulted for the secret when the profile names none.
pub const SECRET_ENV: &str = "REDBACK_AUTH_SECRET";
/// Service name of keyring entries.
pub const KEYRING_SERVICE: &str = "redback";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{profile}' not found")]
    UnknownProfile { profile: String },

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
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named account profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use when none is given.
    pub fn default_profile_name(&self) -> &str {
        self.default_profile.as_deref().unwrap_or("default")
    }

    /// Look up `name`, or the default profile when `None`.
    pub fn profile(&self, name: Option<&str>) -> Result<(&str, &Profile), ConfigError> {
        let name = name.unwrap_or_else(|| self.default_profile_name());
        self.profiles
            .get_key_value(name)
            .map(|(k, p)| (k.as_str(), p))
            .ok_or_else(|| ConfigError::UnknownProfile {
                profile: name.into(),
            })
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named account profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// "public" (OAuth2) or "private" (portal cookie).
    #[serde(default)]
    pub scheme: ApiScheme,

    /// OAuth2 client ID (public) or inverter serial number (private).
    pub auth_id: String,

    /// Client secret or cookie (plaintext -- prefer keyring or env var).
    pub auth_secret: Option<String>,

    /// Environment variable name containing the secret.
    pub auth_secret_env: Option<String>,

    /// 1-based site position, as a number or an ordinal word.
    #[serde(default)]
    pub site_index: SiteIndex,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,

    /// Override the portal base URL (private scheme).
    pub private_base_url: Option<String>,

    /// Override the public API base URL (public scheme, token endpoint included).
    pub public_base_url: Option<String>,

    /// Path to an extra CA certificate.
    pub ca_cert: Option<PathBuf>,
}

impl Profile {
    pub fn new(scheme: ApiScheme, auth_id: impl Into<String>) -> Self {
        Self {
            scheme,
            auth_id: auth_id.into(),
            auth_secret: None,
            auth_secret_env: None,
            site_index: SiteIndex::FIRST,
            timeout: None,
            private_base_url: None,
            public_base_url: None,
            ca_cert: None,
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "redback", "redback").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("redback");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the full Config from `path` + environment.
///
/// Environment keys use `__` as the nesting separator, e.g.
/// `REDBACK_PROFILES__HOME__SITE_INDEX=2`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("REDBACK_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
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

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

/// Store a secret in the system keyring for `profile_name`.
pub fn store_secret(profile_name: &str, secret: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name))
        .and_then(|entry| entry.set_password(secret))
        .map_err(|e| ConfigError::Validation {
            field: "keyring".into(),
            reason: e.to_string(),
        })
}

fn keyring_user(profile_name: &str) -> String {
    format!("{profile_name}/auth-secret")
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the profile's secret from the credential chain.
///
/// Order: the profile's `auth_secret_env` variable, `REDBACK_AUTH_SECRET`,
/// the system keyring, then the plaintext `auth_secret` field.
pub fn resolve_secret(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    resolve_secret_with(
        profile,
        profile_name,
        |name| std::env::var(name).ok(),
        |user| {
            keyring::Entry::new(KEYRING_SERVICE, user)
                .and_then(|entry| entry.get_password())
                .ok()
        },
    )
}

/// [`resolve_secret`] with the environment and keyring lookups supplied
/// by the caller.
pub fn resolve_secret_with(
    profile: &Profile,
    profile_name: &str,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    // 1. Profile's auth_secret_env → env var lookup
    if let Some(val) = profile.auth_secret_env.as_deref().and_then(&env) {
        return Ok(SecretString::from(val));
    }

    // 2. Shared env var
    if let Some(val) = env(SECRET_ENV) {
        return Ok(SecretString::from(val));
    }

    // 3. System keyring
    if let Some(val) = keyring(&keyring_user(profile_name)) {
        return Ok(SecretString::from(val));
    }

    // 4. Plaintext in config
    if let Some(ref val) = profile.auth_secret {
        return Ok(SecretString::from(val.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Build a `ClientConfig` from a profile and an already-resolved secret.
pub fn build_client_config(
    profile: &Profile,
    secret: SecretString,
    default_timeout: u64,
) -> Result<ClientConfig, ConfigError> {
    let mut urls = ApiUrls::default();
    if let Some(ref raw) = profile.private_base_url {
        urls = urls
            .with_private_base(raw)
            .map_err(|e| ConfigError::Validation {
                field: "private_base_url".into(),
                reason: e.to_string(),
            })?;
    }
    if let Some(ref raw) = profile.public_base_url {
        urls = urls
            .with_public_base(raw)
            .map_err(|e| ConfigError::Validation {
                field: "public_base_url".into(),
                reason: e.to_string(),
            })?;
    }

    if profile.auth_id.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "auth_id".into(),
            reason: "must not be empty".into(),
        });
    }

    let mut cfg = ClientConfig::new(profile.scheme, profile.auth_id.trim(), secret)
        .with_site_index(profile.site_index)
        .with_urls(urls)
        .with_timeout(Duration::from_secs(
            profile.timeout.unwrap_or(default_timeout),
        ));
    if let Some(ref ca) = profile.ca_cert {
        cfg.tls = TlsMode::CustomCa(ca.clone());
    }
    Ok(cfg)
}

/// Build a `ClientConfig` from a profile -- no CLI flag overrides.
pub fn profile_to_client_config(
    profile: &Profile,
    profile_name: &str,
) -> Result<ClientConfig, ConfigError> {
    let secret = resolve_secret(profile, profile_name)?;
    build_client_config(profile, secret, default_timeout())
}
