// ── Energy sources ──
//
// One variant per way of reaching the inverter. Each answers the same four
// questions (can I connect, which site, static info, live readings); the
// facade holds one variant picked at construction and never branches on
// the scheme anywhere else.

use std::sync::Arc;

use tracing::info;

use redback_api::{ApiScheme, Clock, Credentials, PrivateClient, PublicClient, Transport};

use crate::config::{ClientConfig, SourceKind};
use crate::demo::DemoSource;
use crate::error::CoreError;
use crate::measurements::Measurements;
use crate::normalize::{private_energy, private_info, public_energy, public_info};
use crate::site::{SiteIndex, select_site};

/// Cookie + serial number access to the portal API.
#[derive(Debug, Clone)]
pub struct PrivateSource {
    client: PrivateClient,
}

/// OAuth2 access to the multi-site public API.
#[derive(Debug)]
pub struct PublicSource {
    client: PublicClient,
    site_index: SiteIndex,
}

#[derive(Debug)]
pub enum EnergySource {
    Private(PrivateSource),
    Public(PublicSource),
    Demo(DemoSource),
}

impl EnergySource {
    /// Build the source selected by `config`. No network traffic.
    pub fn from_config(config: &ClientConfig, clock: Arc<dyn Clock>) -> Result<Self, CoreError> {
        if config.source == SourceKind::Demo {
            return Ok(Self::Demo(DemoSource));
        }

        let transport = Transport::new(&config.transport_config())?;
        Ok(match &config.credentials {
            Credentials::SerialCookie { serial, cookie } => Self::Private(PrivateSource {
                client: PrivateClient::new(
                    transport,
                    config.urls.clone(),
                    serial.clone(),
                    cookie.clone(),
                ),
            }),
            Credentials::OAuth2 {
                client_id,
                client_secret,
            } => Self::Public(PublicSource {
                client: PublicClient::new(
                    transport,
                    config.urls.clone(),
                    client_id.clone(),
                    client_secret.clone(),
                    clock,
                ),
                site_index: config.site_index,
            }),
        })
    }

    /// Wire scheme of the payloads this source returns.
    pub fn scheme(&self) -> ApiScheme {
        match self {
            Self::Private(_) | Self::Demo(_) => ApiScheme::Private,
            Self::Public(_) => ApiScheme::Public,
        }
    }

    pub fn is_demo(&self) -> bool {
        matches!(self, Self::Demo(_))
    }


    /// The cheapest authenticated call: device info (private) or the site
    /// list (public).
    pub async fn test_connection(&self) -> Result<(), CoreError> {
        match self {
            Self::Private(s) => s.client.inverter_info().await.map(drop)?,
            Self::Public(s) => s.client.list_sites().await.map(drop)?,
            Self::Demo(_) => {}
        }
        Ok(())
    }

    /// Resolve the site identifier.
    ///
    /// The private scheme is keyed by serial number, so that is the answer
    /// without any request. The public scheme reads the site list and picks
    /// the configured ordinal.
    pub async fn resolve_site_id(&self) -> Result<String, CoreError> {
        match self {
            Self::Private(s) => Ok(s.client.serial().to_owned()),
            Self::Demo(d) => Ok(d.serial().to_owned()),
            Self::Public(s) => {
                let sites = s.client.list_sites().await?;
                let site = select_site(&sites, s.site_index).ok_or(CoreError::SiteNotFound {
                    index: s.site_index.get(),
                    available: 0,
                })?;
                info!(site_id = %site.id, index = %s.site_index, "resolved site");
                Ok(site.id.clone())
            }
        }
    }

    /// Fetch and normalize static info. `site_id` is only used by the
    /// public scheme. Info and banner are fetched one after the other.
    pub async fn fetch_info(&self, site_id: &str) -> Result<Measurements, CoreError> {
        Ok(match self {
            Self::Private(s) => {
                let info = s.client.inverter_info().await?;
                let banner = s.client.banner_info().await?;
                private_info(&info, &banner)?
            }
            Self::Public(s) => public_info(&s.client.site_static(site_id).await?)?,
            Self::Demo(d) => private_info(&d.inverter_info(), &d.banner_info())?,
        })
    }

    /// Fetch and normalize live readings.
    pub async fn fetch_energy(&self, site_id: &str) -> Result<Measurements, CoreError> {
        Ok(match self {
            Self::Private(s) => private_energy(&s.client.energy_flow().await?)?,
            Self::Public(s) => public_energy(&s.client.site_dynamic(site_id).await?)?,
            Self::Demo(d) => private_energy(&d.energy_flow())?,
        })
    }

    /// Whether a bearer token is currently cached (public scheme only).
    pub async fn has_token(&self) -> Option<bool> {
        match self {
            Self::Public(s) => Some(s.client.tokens().has_token().await),
            Self::Private(_) | Self::Demo(_) => None,
        }
    }
}
