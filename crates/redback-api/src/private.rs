// Private (portal) API client
//
// Cookie-authenticated, keyed by inverter serial number. The cookie is a
// pre-obtained `.AspNet.ApplicationCookie`; there is no login flow here,
// so an expired cookie shows up as a 4xx `CredentialOrRequest` error.

use secrecy::SecretString;
use serde_json::Value;
use tracing::debug;

use crate::endpoint::{ApiUrls, Authorization, Endpoint};
use crate::error::Error;
use crate::transport::Transport;

/// Raw HTTP client for the Redback portal API.
///
/// Returns the response bodies untouched; shaping them is the
/// normalizer's job.
#[derive(Debug, Clone)]
pub struct PrivateClient {
    transport: Transport,
    urls: ApiUrls,
    serial: String,
    cookie: SecretString,
}

impl PrivateClient {
    pub fn new(transport: Transport, urls: ApiUrls, serial: String, cookie: SecretString) -> Self {
        Self {
            transport,
            urls,
            serial,
            cookie,
        }
    }

    /// The inverter serial number this client is bound to.
    pub fn serial(&self) -> &str {
        &self.serial
    }

    async fn get(&self, endpoint: Endpoint<'_>) -> Result<Value, Error> {
        debug!(endpoint = endpoint.name(), "private request");
        let req = endpoint.request(&self.urls, Authorization::Cookie(&self.cookie))?;
        self.transport.request(&req).await
    }

    /// `GET inverterinfo?SerialNumber={serial}`
    ///
    /// Model, firmware and inverter-type flags.
    pub async fn inverter_info(&self) -> Result<Value, Error> {
        self.get(Endpoint::InverterInfo {
            serial: &self.serial,
        })
        .await
    }

    /// `GET BannerInfo?SerialNumber={serial}`
    ///
    /// Display name plus installed PV and battery capacity.
    pub async fn banner_info(&self) -> Result<Value, Error> {
        self.get(Endpoint::BannerInfo {
            serial: &self.serial,
        })
        .await
    }

    /// `GET energyflowd2/{serial}`
    ///
    /// Instantaneous readings, nested under `Data.Input`.
    pub async fn energy_flow(&self) -> Result<Value, Error> {
        self.get(Endpoint::EnergyFlow {
            serial: &self.serial,
        })
        .await
    }
}
