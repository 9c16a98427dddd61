// OAuth2 client-credentials token cache (public scheme only).
//
// NoToken -> Valid(token, refresh_at) -> (refresh_at reached) -> Valid(new).
// The check-fetch-store sequence runs under one async mutex so concurrent
// callers never issue duplicate token requests.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::endpoint::{ApiUrls, Authorization, Endpoint};
use crate::error::Error;
use crate::models::TokenResponse;
use crate::transport::Transport;

/// Refresh this long before the server-declared expiry.
pub const TOKEN_SAFETY_OFFSET: TimeDelta = TimeDelta::seconds(300);

/// Lifetime assumed when the server omits `expires_in`.
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// A bearer token and the instant after which it must be replaced.
#[derive(Clone)]
pub struct BearerToken {
    header_value: SecretString,
    refresh_at: DateTime<Utc>,
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerToken")
            .field("refresh_at", &self.refresh_at)
            .finish_non_exhaustive()
    }
}

impl BearerToken {
    /// Interpret a token endpoint body received at `now`.
    ///
    /// `refresh_at = now + (expires_in - 300s)`. A lifetime under the
    /// safety offset yields a token that is already due for refresh.
    pub fn from_response(resp: TokenResponse, now: DateTime<Utc>) -> Result<Self, Error> {
        let Some(access_token) = resp.access_token.filter(|t| !t.is_empty()) else {
            let message = match (&resp.error, &resp.error_description) {
                (Some(e), Some(d)) => format!("{e}: {d}"),
                (Some(e), None) => e.clone(),
                (None, Some(d)) => d.clone(),
                (None, None) => "token response has no access_token".to_owned(),
            };
            return Err(Error::Authentication {
                message,
                error: resp.error,
                description: resp.error_description,
            });
        };

        let token_type = resp.token_type.unwrap_or_else(|| "Bearer".to_owned());
        let lifetime = TimeDelta::seconds(resp.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS));

        Ok(Self {
            header_value: SecretString::from(format!("{token_type} {access_token}")),
            refresh_at: now + (lifetime - TOKEN_SAFETY_OFFSET),
        })
    }

    /// The full `Authorization` header value.
    pub fn header_value(&self) -> &SecretString {
        &self.header_value
    }

    pub fn refresh_at(&self) -> DateTime<Utc> {
        self.refresh_at
    }

    /// True once `now` has reached the refresh instant.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        now >= self.refresh_at
    }
}

/// Obtains and caches the bearer token for one client-credentials pair.
pub struct TokenManager {
    client_id: String,
    client_secret: SecretString,
    clock: Arc<dyn Clock>,
    state: Mutex<Option<BearerToken>>,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    pub fn new(client_id: String, client_secret: SecretString, clock: Arc<dyn Clock>) -> Self {
        Self {
            client_id,
            client_secret,
            clock,
            state: Mutex::new(None),
        }
    }

    /// Return a valid `Authorization` header value, requesting a new token
    /// first if none is cached or the cached one is due for refresh.
    pub async fn bearer(&self, transport: &Transport, urls: &ApiUrls) -> Result<SecretString, Error> {
        let mut state = self.state.lock().await;

        if let Some(ref token) = *state {
            if !token.needs_refresh(self.clock.now()) {
                debug!("reusing cached bearer token");
                return Ok(token.header_value().clone());
            }
        }

        let req = Endpoint::Token.request(
            urls,
            Authorization::ClientCredentials {
                client_id: &self.client_id,
                client_secret: &self.client_secret,
            },
        )?;
        let body = transport.request(&req).await?;
        let resp: TokenResponse = serde_json::from_value(body.clone())
            .map_err(|e| Error::malformed(&e, &body.to_string()))?;

        let token = BearerToken::from_response(resp, self.clock.now())?;
        info!(refresh_at = %token.refresh_at(), "obtained bearer token");
        let value = token.header_value().clone();
        *state = Some(token);
        Ok(value)
    }

    /// Forget the cached token so the next call re-authenticates.
    pub async fn invalidate(&self) {
        *self.state.lock().await = None;
    }

    /// Whether a token is cached (valid or not).
    pub async fn has_token(&self) -> bool {
        self.state.lock().await.is_some()
    }
}
