use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Which Redback API surface a client talks to.
///
/// Marker enum (no data) -- the actual secrets live in [`Credentials`].
/// Useful for branching on auth flow without carrying secret material.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum ApiScheme {
    /// Legacy per-device portal API: serial number + session cookie.
    Private,
    /// Multi-site API: OAuth2 client credentials, keyed by site ID.
    #[default]
    Public,
}

/// Credentials for one Redback account.
///
/// Immutable once built; the variant decides the scheme every later
/// request uses.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Portal session cookie, pre-obtained from a browser login
    /// (the `.AspNet.ApplicationCookie=...` header value).
    SerialCookie { serial: String, cookie: SecretString },

    /// OAuth2 client-credentials pair issued by Redback.
    OAuth2 {
        client_id: String,
        client_secret: SecretString,
    },
}

impl Credentials {
    /// Build credentials from the generic `(id, secret)` pair the host
    /// application collects, interpreting it per scheme.
    pub fn from_parts(scheme: ApiScheme, auth_id: String, auth_secret: SecretString) -> Self {
        match scheme {
            ApiScheme::Private => Self::SerialCookie {
                serial: auth_id,
                cookie: auth_secret,
            },
            ApiScheme::Public => Self::OAuth2 {
                client_id: auth_id,
                client_secret: auth_secret,
            },
        }
    }

    pub fn scheme(&self) -> ApiScheme {
        match self {
            Self::SerialCookie { .. } => ApiScheme::Private,
            Self::OAuth2 { .. } => ApiScheme::Public,
        }
    }
}
