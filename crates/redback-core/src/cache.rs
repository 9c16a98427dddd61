// ── TTL cache ──
//
// "Return cached value if fresh, else perform exactly one fetch and update
// both value and expiry." The mutex is held across the fetch, so concurrent
// readers of a stale entry queue behind one network round trip instead of
// each issuing their own. A failed fetch leaves the previous snapshot in
// place and records the error.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use redback_api::Clock;

use crate::error::CoreError;

/// An immutable cached value and the instant it was fetched.
#[derive(Debug)]
pub struct Snapshot<T> {
    pub value: Arc<T>,
    pub fetched_at: DateTime<Utc>,
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            fetched_at: self.fetched_at,
        }
    }
}

/// Freshness policy of one cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Re-fetch once this much time has passed since the last fetch.
    After(TimeDelta),
    /// Fetch once, keep for the lifetime of the cache.
    Forever,
}

/// Serializable view of a cache for diagnostics and status output.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatus {
    pub name: &'static str,
    pub fetched_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub fetch_count: u64,
    pub last_error: Option<String>,
    pub last_error_at: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct CacheState<T> {
    entry: Option<Snapshot<T>>,
    fetch_count: u64,
    last_error: Option<(String, DateTime<Utc>)>,
}

/// A single-value cache that refreshes on stale read.
///
/// An empty cache counts as stale, so the first read always fetches.
#[derive(Debug)]
pub struct TtlCache<T> {
    name: &'static str,
    ttl: Ttl,
    clock: Arc<dyn Clock>,
    state: Mutex<CacheState<T>>,
}

impl<T> TtlCache<T> {
    pub fn new(name: &'static str, ttl: Ttl, clock: Arc<dyn Clock>) -> Self {
        Self {
            name,
            ttl,
            clock,
            state: Mutex::new(CacheState {
                entry: None,
                fetch_count: 0,
                last_error: None,
            }),
        }
    }

    fn expires_at(&self, fetched_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self.ttl {
            Ttl::After(ttl) => Some(fetched_at + ttl),
            Ttl::Forever => None,
        }
    }

    fn is_fresh(&self, snapshot: &Snapshot<T>, now: DateTime<Utc>) -> bool {
        self.expires_at(snapshot.fetched_at)
            .is_none_or(|expires| now < expires)
    }

    /// Return the cached snapshot if fresh, otherwise run `fetch` once and
    /// store its result.
    ///
    /// On failure the error is returned and recorded; the previous
    /// snapshot (if any) is kept unchanged.
    pub async fn get_or_refresh<F, Fut>(&self, fetch: F) -> Result<Snapshot<T>, CoreError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let mut state = self.state.lock().await;
        let now = self.clock.now();

        if let Some(snapshot) = state.entry.as_ref().filter(|s| self.is_fresh(s, now)) {
            debug!(cache = self.name, "cache hit");
            return Ok(snapshot.clone());
        }

        debug!(cache = self.name, "cache stale, fetching");
        state.fetch_count += 1;
        match fetch().await {
            Ok(value) => {
                let snapshot = Snapshot {
                    value: Arc::new(value),
                    fetched_at: self.clock.now(),
                };
                state.entry = Some(snapshot.clone());
                state.last_error = None;
                Ok(snapshot)
            }
            Err(e) => {
                warn!(
                    cache = self.name,
                    error = %e,
                    kept_previous = state.entry.is_some(),
                    "refresh failed"
                );
                state.last_error = Some((e.to_string(), self.clock.now()));
                Err(e)
            }
        }
    }

    /// The current snapshot regardless of freshness, without fetching.
    pub async fn peek(&self) -> Option<Snapshot<T>> {
        self.state.lock().await.entry.clone()
    }

    /// Mark the cache stale so the next read fetches.
    pub async fn invalidate(&self) {
        self.state.lock().await.entry = None;
    }

    pub async fn status(&self) -> CacheStatus {
        let state = self.state.lock().await;
        let fetched_at = state.entry.as_ref().map(|s| s.fetched_at);
        CacheStatus {
            name: self.name,
            fetched_at,
            expires_at: fetched_at.and_then(|t| self.expires_at(t)),
            fetch_count: state.fetch_count,
            last_error: state.last_error.as_ref().map(|(e, _)| e.clone()),
            last_error_at: state.last_error.as_ref().map(|(_, at)| *at),
        }
    }
}
