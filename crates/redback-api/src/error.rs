use thiserror::Error;

/// Top-level error type for the `redback-api` crate.
///
/// The first five variants are the failure taxonomy every caller reasons
/// about; the remaining ones are construction-time problems (bad base URL,
/// unbuildable HTTP client) that never occur once a client exists.
/// `redback-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// The request never produced an HTTP response (DNS failure, connection
    /// refused, timeout). Connect-level failures are retried before this
    /// surfaces; `attempts` records how many were made.
    #[error("Cannot reach {url} after {attempts} attempt(s): {source}")]
    Connection {
        url: String,
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },

    // ── HTTP status ─────────────────────────────────────────────────
    /// HTTP 5xx. Upstream trouble; the next poll may well succeed.
    #[error("Redback service unavailable (HTTP {status}): {message}")]
    TransientService { status: u16, message: String },

    /// Any other non-2xx status. Treated as permanent until the credentials
    /// or configuration change.
    #[error("Request rejected (HTTP {status}): {message}")]
    CredentialOrRequest { status: u16, message: String },

    // ── Authentication ──────────────────────────────────────────────
    /// The OAuth2 token endpoint answered 2xx without an `access_token`.
    #[error("Authentication failed: {message}")]
    Authentication {
        message: String,
        /// Upstream `error` field, if present.
        error: Option<String>,
        /// Upstream `error_description` field, if present.
        description: Option<String>,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// A 2xx body that is not the JSON we expected.
    #[error("Malformed response: {message}")]
    MalformedResponse {
        message: String,
        /// 1-based line of the parse failure (0 when not a syntax error).
        line: usize,
        /// 1-based column of the parse failure (0 when not a syntax error).
        column: usize,
        body: String,
    },

    // ── Construction ────────────────────────────────────────────────
    /// URL parsing or joining failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A credential could not be encoded as an HTTP header value.
    #[error("Invalid header value for {0}")]
    InvalidHeader(&'static str),

    /// The HTTP client could not be built (TLS backend, CA certificate).
    #[error("TLS error: {0}")]
    Tls(String),
}

impl Error {
    /// Build a `MalformedResponse` from a serde failure, keeping the
    /// parser position and a bounded copy of the body.
    pub(crate) fn malformed(err: &serde_json::Error, body: &str) -> Self {
        let preview = preview(body);
        Self::MalformedResponse {
            message: format!("{err} (body preview: {preview:?})"),
            line: err.line(),
            column: err.column(),
            body: body.to_owned(),
        }
    }

    /// Returns `true` if waiting for the next poll might resolve this.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::TransientService { .. }
        )
    }

    /// Returns `true` if new credentials (or config) are required.
    pub fn is_credential_problem(&self) -> bool {
        matches!(
            self,
            Self::CredentialOrRequest { .. } | Self::Authentication { .. }
        )
    }

    /// The HTTP status behind this error, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::TransientService { status, .. } | Self::CredentialOrRequest { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

/// First 200 bytes of a body, cut on a char boundary.
pub(crate) fn preview(body: &str) -> &str {
    let mut end = body.len().min(200);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
