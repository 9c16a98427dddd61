// ── Runtime client configuration ──
//
// Describes *how* to reach one Redback account. Carries credential data
// and timing, but never touches disk: redback-config (or the host)
// builds a `ClientConfig` and hands it in.

use std::time::Duration;

use chrono::TimeDelta;
use secrecy::SecretString;

use redback_api::{ApiScheme, ApiUrls, Credentials, RetryPolicy, TlsMode, TransportConfig};

use crate::site::SiteIndex;

/// Static info changes rarely; re-read it every 15 minutes.
pub const DEFAULT_INFO_TTL: TimeDelta = TimeDelta::minutes(15);
/// The upstream device samples once a minute.
pub const DEFAULT_ENERGY_TTL: TimeDelta = TimeDelta::seconds(60);

/// Where readings come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceKind {
    /// The live cloud API selected by the credentials.
    #[default]
    Live,
    /// Canned private-scheme payloads, no network.
    Demo,
}

/// Configuration for one client instance.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Serial + cookie (private) or client ID + secret (public). The
    /// variant selects the scheme.
    pub credentials: Credentials,
    /// Which site to use when the account lists several (public only).
    pub site_index: SiteIndex,
    pub urls: ApiUrls,
    pub tls: TlsMode,
    pub timeout: Duration,
    pub retry: RetryPolicy,
    pub info_ttl: TimeDelta,
    pub energy_ttl: TimeDelta,
    pub source: SourceKind,
}

impl ClientConfig {
    /// Interpret a generic `(id, secret)` pair per `scheme`.
    pub fn new(scheme: ApiScheme, auth_id: impl Into<String>, auth_secret: SecretString) -> Self {
        Self::with_credentials(Credentials::from_parts(scheme, auth_id.into(), auth_secret))
    }

    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            credentials,
            site_index: SiteIndex::FIRST,
            urls: ApiUrls::default(),
            tls: TlsMode::default(),
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            info_ttl: DEFAULT_INFO_TTL,
            energy_ttl: DEFAULT_ENERGY_TTL,
            source: SourceKind::Live,
        }
    }

    /// A configuration for the offline demo source.
    pub fn demo() -> Self {
        Self {
            source: SourceKind::Demo,
            ..Self::new(
                ApiScheme::Private,
                crate::demo::DEMO_SERIAL,
                SecretString::from("demo".to_owned()),
            )
        }
    }

    pub fn scheme(&self) -> ApiScheme {
        self.credentials.scheme()
    }

    pub fn with_site_index(mut self, site_index: SiteIndex) -> Self {
        self.site_index = site_index;
        self
    }

    pub fn with_urls(mut self, urls: ApiUrls) -> Self {
        self.urls = urls;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            tls: self.tls.clone(),
            timeout: self.timeout,
            retry: self.retry,
        }
    }
}
