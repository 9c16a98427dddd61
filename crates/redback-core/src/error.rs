// ── Core error types ──
//
// User-facing errors from redback-core. The `From<redback_api::Error>` impl
// keeps the transport taxonomy intact (connection / service / credential /
// authentication / data) so the host can choose between "wait for the next
// poll" and "ask for new credentials".

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to Redback at {url} after {attempts} attempt(s): {reason}")]
    ConnectionFailed {
        url: String,
        attempts: u32,
        reason: String,
    },

    #[error("Redback service error (HTTP {status}): {message}")]
    ServiceUnavailable { status: u16, message: String },

    // ── Credential errors ────────────────────────────────────────────
    #[error("Request rejected (HTTP {status}): {message}")]
    RequestRejected { status: u16, message: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    #[error("No site at position {index} (account lists {available} site(s))")]
    SiteNotFound { index: u32, available: usize },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Worth waiting for the next poll.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. } | Self::ServiceUnavailable { .. }
        )
    }

    /// New credentials (or config) are needed before this can succeed.
    pub fn is_credential_problem(&self) -> bool {
        matches!(
            self,
            Self::RequestRejected { .. } | Self::AuthenticationFailed { .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<redback_api::Error> for CoreError {
    fn from(err: redback_api::Error) -> Self {
        match err {
            redback_api::Error::Connection {
                url,
                attempts,
                source,
            } => CoreError::ConnectionFailed {
                url,
                attempts,
                reason: source.to_string(),
            },
            redback_api::Error::TransientService { status, message } => {
                CoreError::ServiceUnavailable { status, message }
            }
            redback_api::Error::CredentialOrRequest { status, message } => {
                CoreError::RequestRejected { status, message }
            }
            redback_api::Error::Authentication { message, .. } => {
                CoreError::AuthenticationFailed { message }
            }
            redback_api::Error::MalformedResponse {
                message,
                line,
                column,
                ..
            } => CoreError::MalformedResponse {
                message: if line > 0 {
                    format!("{message} at line {line} column {column}")
                } else {
                    message
                },
            },
            redback_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("invalid URL: {e}"),
            },
            redback_api::Error::InvalidHeader(name) => CoreError::Config {
                message: format!("credential cannot be sent as a {name} header"),
            },
            redback_api::Error::Tls(message) => CoreError::Config { message },
        }
    }
}
