//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use redback_config::ConfigError;
use redback_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const SERVICE: i32 = 8;
    pub const DATA: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not reach Redback at {url} ({attempts} attempt(s))")]
    #[diagnostic(
        code(redback::connection_failed),
        help(
            "Check network access to the Redback cloud.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed {
        url: String,
        attempts: u32,
        reason: String,
    },

    #[error("Redback service error (HTTP {status})")]
    #[diagnostic(
        code(redback::service_unavailable),
        help("The Redback cloud is having trouble. Try again in a minute.\n{message}")
    )]
    ServiceUnavailable { status: u16, message: String },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Credentials rejected (HTTP {status})")]
    #[diagnostic(
        code(redback::rejected),
        help(
            "Verify the auth ID and secret for this profile.\n\
             Private scheme: refresh the portal cookie.\n\
             Public scheme: check the OAuth2 client ID and secret.\n\
             {message}"
        )
    )]
    Rejected { status: u16, message: String },

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(redback::auth_failed),
        help("Run: redback config init to re-enter credentials")
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(redback::no_credentials),
        help(
            "Configure credentials with: redback config init\n\
             Or set the REDBACK_AUTH_SECRET environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Data ─────────────────────────────────────────────────────────

    #[error("No site at position {index}")]
    #[diagnostic(
        code(redback::site_not_found),
        help("The account lists {available} site(s). Pick one with --site-index.")
    )]
    SiteNotFound { index: u32, available: usize },

    #[error("Unexpected response from Redback: {message}")]
    #[diagnostic(
        code(redback::malformed_response),
        help("Re-run with -vv to log the failing request.")
    )]
    MalformedResponse { message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(redback::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(redback::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: redback config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No Redback account configured")]
    #[diagnostic(
        code(redback::no_config),
        help(
            "Create a profile with: redback config init\n\
             Or pass --auth-id and --auth-secret (or --demo).\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(redback::config))]
    Config { message: String },

    #[error(transparent)]
    #[diagnostic(code(redback::config))]
    Figment(Box<figment::Error>),

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not serialize output: {0}")]
    #[diagnostic(code(redback::json))]
    Json(#[from] serde_json::Error),

    #[error("Could not serialize output: {0}")]
    #[diagnostic(code(redback::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("Prompt failed: {0}")]
    #[diagnostic(code(redback::prompt))]
    Prompt(#[from] dialoguer::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::ServiceUnavailable { .. } => exit_code::SERVICE,
            Self::Rejected { .. } | Self::AuthFailed { .. } | Self::NoCredentials { .. } => {
                exit_code::AUTH
            }
            Self::SiteNotFound { .. } => exit_code::NOT_FOUND,
            Self::MalformedResponse { .. } => exit_code::DATA,
            Self::Validation { .. } | Self::ProfileNotFound { .. } | Self::NoConfig { .. } => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed {
                url,
                attempts,
                reason,
            } => Self::ConnectionFailed {
                url,
                attempts,
                reason,
            },
            CoreError::ServiceUnavailable { status, message } => {
                Self::ServiceUnavailable { status, message }
            }
            CoreError::RequestRejected { status, message } => Self::Rejected { status, message },
            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },
            CoreError::MalformedResponse { message } => Self::MalformedResponse { message },
            CoreError::SiteNotFound { index, available } => Self::SiteNotFound { index, available },
            CoreError::Config { message } => Self::Config { message },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::UnknownProfile { profile } => Self::ProfileNotFound {
                name: profile,
                available: String::new(),
            },
            ConfigError::Figment(err) => Self::Figment(err),
            ConfigError::Io(err) => Self::Io(err),
            other @ ConfigError::Serialization(_) => Self::Config {
                message: other.to_string(),
            },
        }
    }
}
