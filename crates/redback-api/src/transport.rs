// Shared HTTP transport.
//
// Builds the `reqwest::Client`, retries connect-level failures, and maps
// every received response onto the crate's error taxonomy. No state is
// kept between calls beyond the connection pool inside `reqwest`.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Method;
use reqwest::header::HeaderMap;
use serde_json::Value;
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::{Error, preview};

/// TLS verification mode.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the system certificate store.
    #[default]
    System,
    /// Trust an extra CA certificate from the given PEM file
    /// (intercepting proxies).
    CustomCa(PathBuf),
}

/// How connect-level failures are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Never less than one.
    pub max_attempts: u32,
    /// Pause between attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Run `op` until it succeeds, fails with a non-retryable error, or
    /// the attempt budget is spent. Returns the last error together with
    /// the number of attempts made.
    pub async fn run<T, E, F, Fut>(
        &self,
        is_retryable: impl Fn(&E) -> bool,
        mut op: F,
    ) -> Result<T, (E, u32)>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let max = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < max && is_retryable(&err) => {
                    trace!(attempt, backoff = ?self.backoff, "retrying after connect failure");
                    if !self.backoff.is_zero() {
                        tokio::time::sleep(self.backoff).await;
                    }
                    attempt += 1;
                }
                Err(err) => return Err((err, attempt)),
            }
        }
    }
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("redback-rs/", env!("CARGO_PKG_VERSION")));

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

/// A fully resolved request: what the endpoint mapper produces and the
/// transport consumes.
#[derive(Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    /// `application/x-www-form-urlencoded` body, if any.
    pub form: Option<Vec<(&'static str, String)>>,
}

impl std::fmt::Debug for ApiRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Header values are marked sensitive and form values may hold the
        // client secret, so only names are shown.
        f.debug_struct("ApiRequest")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field(
                "form",
                &self
                    .form
                    .as_ref()
                    .map(|f| f.iter().map(|(k, _)| *k).collect::<Vec<_>>()),
            )
            .finish()
    }
}

/// Issues [`ApiRequest`]s and returns parsed JSON.
#[derive(Debug, Clone)]
pub struct Transport {
    http: reqwest::Client,
    retry: RetryPolicy,
}

impl Transport {
    pub fn new(config: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: config.build_client()?,
            retry: config.retry,
        })
    }

    /// Wrap a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, retry: RetryPolicy) -> Self {
        Self { http, retry }
    }

    /// Send `req`, retrying connect-level failures, and parse the body.
    ///
    /// A received response is never retried, whatever its status.
    pub async fn request(&self, req: &ApiRequest) -> Result<Value, Error> {
        debug!("{} {}", req.method, req.url);

        let resp = self
            .retry
            .run(reqwest::Error::is_connect, |attempt| {
                if attempt > 1 {
                    warn!(attempt, url = %req.url, "connection failed, retrying");
                }
                self.build(req).send()
            })
            .await
            .map_err(|(source, attempts)| Error::Connection {
                url: req.url.to_string(),
                attempts,
                source,
            })?;

        Self::handle_response(&req.url, resp).await
    }

    fn build(&self, req: &ApiRequest) -> reqwest::RequestBuilder {
        let mut builder = self
            .http
            .request(req.method.clone(), req.url.clone())
            .headers(req.headers.clone());
        if let Some(ref form) = req.form {
            builder = builder.form(form);
        }
        builder
    }

    async fn handle_response(url: &Url, resp: reqwest::Response) -> Result<Value, Error> {
        let status = resp.status();
        let body = resp.text().await.map_err(|source| Error::Connection {
            url: url.to_string(),
            attempts: 1,
            source,
        })?;

        if status.is_server_error() {
            return Err(Error::TransientService {
                status: status.as_u16(),
                message: status_message(status, &body),
            });
        }

        if !status.is_success() {
            return Err(Error::CredentialOrRequest {
                status: status.as_u16(),
                message: status_message(status, &body),
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::malformed(&e, &body))
    }
}

fn status_message(status: reqwest::StatusCode, body: &str) -> String {
    let body = preview(body).trim();
    if body.is_empty() {
        status.to_string()
    } else {
        format!("{status}: {body}")
    }
}
