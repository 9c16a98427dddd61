// Public (OAuth2) API client
//
// Client-credentials auth with a cached bearer token. The site list is
// reachable without a site ID; the per-site endpoints take one as an
// argument, which the caller resolves from the site list first.

use std::sync::Arc;

use secrecy::SecretString;
use serde_json::Value;
use tracing::debug;

use crate::clock::Clock;
use crate::endpoint::{ApiUrls, Authorization, Endpoint};
use crate::error::Error;
use crate::models::SiteList;
use crate::token::TokenManager;
use crate::transport::Transport;

/// Raw HTTP client for the Redback public API.
#[derive(Debug)]
pub struct PublicClient {
    transport: Transport,
    urls: ApiUrls,
    tokens: TokenManager,
}

impl PublicClient {
    pub fn new(
        transport: Transport,
        urls: ApiUrls,
        client_id: String,
        client_secret: SecretString,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            transport,
            urls,
            tokens: TokenManager::new(client_id, client_secret, clock),
        }
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    async fn get(&self, endpoint: Endpoint<'_>) -> Result<Value, Error> {
        let bearer = self.tokens.bearer(&self.transport, &self.urls).await?;
        debug!(endpoint = endpoint.name(), "public request");
        let req = endpoint.request(&self.urls, Authorization::Bearer(&bearer))?;
        let result = self.transport.request(&req).await;
        if matches!(result, Err(Error::CredentialOrRequest { status: 401, .. })) {
            // Revoked before its declared expiry; re-authenticate next poll.
            self.tokens.invalidate().await;
        }
        result
    }

    /// `GET EnergyData/With/Nodes` -- every site (and node) on the account.
    pub async fn list_sites(&self) -> Result<SiteList, Error> {
        let body = self.get(Endpoint::SiteList).await?;
        serde_json::from_value(body.clone()).map_err(|e| Error::malformed(&e, &body.to_string()))
    }

    /// `GET EnergyData/{site_id}/Static`
    pub async fn site_static(&self, site_id: &str) -> Result<Value, Error> {
        self.get(Endpoint::SiteStatic { site_id }).await
    }

    /// `GET EnergyData/{site_id}/Dynamic?metadata=true`
    pub async fn site_dynamic(&self, site_id: &str) -> Result<Value, Error> {
        self.get(Endpoint::SiteDynamic { site_id }).await
    }
}
