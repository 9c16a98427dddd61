// ── Client facade ──
//
// The four operations downstream code calls. Every read goes through a
// TTL cache; the source behind it is chosen once at construction.

use std::sync::Arc;

use chrono::TimeDelta;
use tracing::debug;

use redback_api::{ApiScheme, Clock, SystemClock};

use crate::cache::{CacheStatus, Snapshot, Ttl, TtlCache};
use crate::config::ClientConfig;
use crate::diagnostics::{Diagnostics, REDACTED};
use crate::error::CoreError;
use crate::measurements::Measurements;
use crate::site::SiteIndex;
use crate::source::EnergySource;

/// Polling client for one Redback inverter or site.
///
/// Cheaply cloneable via `Arc<ClientInner>`; clones share caches and the
/// bearer token.
#[derive(Debug, Clone)]
pub struct RedbackClient {
    inner: Arc<ClientInner>,
}

#[derive(Debug)]
struct ClientInner {
    source: EnergySource,
    clock: Arc<dyn Clock>,
    site_index: SiteIndex,
    info_ttl: TimeDelta,
    energy_ttl: TimeDelta,
    site: TtlCache<String>,
    info: TtlCache<Measurements>,
    energy: TtlCache<Measurements>,
}

impl RedbackClient {
    /// Build a client on the system clock. Does not touch the network.
    pub fn new(config: ClientConfig) -> Result<Self, CoreError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Build a client whose caches and token expiry read `clock`.
    pub fn with_clock(config: ClientConfig, clock: Arc<dyn Clock>) -> Result<Self, CoreError> {
        let source = EnergySource::from_config(&config, Arc::clone(&clock))?;
        debug!(scheme = %source.scheme(), demo = source.is_demo(), "client created");
        Ok(Self {
            inner: Arc::new(ClientInner {
                site: TtlCache::new("site_id", Ttl::Forever, Arc::clone(&clock)),
                info: TtlCache::new("inverter_info", Ttl::After(config.info_ttl), Arc::clone(&clock)),
                energy: TtlCache::new("energy_data", Ttl::After(config.energy_ttl), Arc::clone(&clock)),
                source,
                clock,
                site_index: config.site_index,
                info_ttl: config.info_ttl,
                energy_ttl: config.energy_ttl,
            }),
        })
    }

    pub fn scheme(&self) -> ApiScheme {
        self.inner.source.scheme()
    }

    pub fn source(&self) -> &EnergySource {
        &self.inner.source
    }

    /// How long one energy reading stays current.
    pub fn energy_ttl(&self) -> TimeDelta {
        self.inner.energy_ttl
    }

    // ── Facade operations ────────────────────────────────────────

    /// Validate credentials with the cheapest authenticated call.
    /// Success or failure only; see [`check_connection`](Self::check_connection)
    /// for the reason.
    pub async fn test_connection(&self) -> bool {
        match self.check_connection().await {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, "connection test failed");
                false
            }
        }
    }

    /// Like [`test_connection`](Self::test_connection), keeping the error.
    pub async fn check_connection(&self) -> Result<(), CoreError> {
        self.inner.source.test_connection().await
    }

    /// The site identifier: resolved once, then kept for the life of the
    /// client.
    pub async fn get_site_id(&self) -> Result<String, CoreError> {
        let snapshot = self
            .inner
            .site
            .get_or_refresh(|| self.inner.source.resolve_site_id())
            .await?;
        Ok(snapshot.value.as_ref().clone())
    }

    /// Static inverter/site info, re-fetched at most once per info TTL.
    pub async fn get_inverter_info(&self) -> Result<Arc<Measurements>, CoreError> {
        let snapshot = self.inner.info.get_or_refresh(|| self.load_info()).await?;
        Ok(snapshot.value)
    }

    /// Live readings, re-fetched at most once per energy TTL.
    pub async fn get_energy_data(&self) -> Result<Arc<Measurements>, CoreError> {
        Ok(self.energy_snapshot().await?.value)
    }

    /// Live readings together with their fetch time.
    pub async fn energy_snapshot(&self) -> Result<Snapshot<Measurements>, CoreError> {
        self.inner
            .energy
            .get_or_refresh(|| self.load_energy())
            .await
    }

    /// One refresh cycle: info first, then energy, one after the other.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        self.get_inverter_info().await?;
        self.get_energy_data().await?;
        Ok(())
    }

    async fn load_info(&self) -> Result<Measurements, CoreError> {
        let site_id = self.get_site_id().await?;
        self.inner.source.fetch_info(&site_id).await
    }

    async fn load_energy(&self) -> Result<Measurements, CoreError> {
        let site_id = self.get_site_id().await?;
        self.inner.source.fetch_energy(&site_id).await
    }

    // ── Introspection ────────────────────────────────────────────

    /// Last successfully fetched static info, without fetching.
    pub async fn cached_inverter_info(&self) -> Option<Arc<Measurements>> {
        self.inner.info.peek().await.map(|s| s.value)
    }

    /// Last successfully fetched readings, without fetching.
    pub async fn cached_energy_data(&self) -> Option<Snapshot<Measurements>> {
        self.inner.energy.peek().await
    }

    pub async fn cache_status(&self) -> Vec<CacheStatus> {
        vec![
            self.inner.site.status().await,
            self.inner.info.status().await,
            self.inner.energy.status().await,
        ]
    }

    /// Drop every cached value; the next reads go to the network.
    pub async fn invalidate(&self) {
        self.inner.site.invalidate().await;
        self.inner.info.invalidate().await;
        self.inner.energy.invalidate().await;
    }

    /// Support snapshot with credentials redacted.
    pub async fn diagnostics(&self) -> Diagnostics {
        let caches = self.cache_status().await;
        let source = &self.inner.source;
        Diagnostics {
            generated_at: self.inner.clock.now(),
            scheme: source.scheme(),
            demo: source.is_demo(),
            auth_id: REDACTED,
            auth_secret: REDACTED,
            site_index: self.inner.site_index.get(),
            site_id: self.inner.site.peek().await.map(|s| s.value.as_ref().clone()),
            has_token: source.has_token().await,
            info_ttl_secs: self.inner.info_ttl.num_seconds(),
            energy_ttl_secs: self.inner.energy_ttl.num_seconds(),
            last_update_success: caches.iter().all(|c| c.last_error.is_none()),
            inverter_info: self
                .cached_inverter_info()
                .await
                .map(|m| m.as_ref().clone()),
            caches,
        }
    }
}
