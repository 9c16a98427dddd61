// Support snapshot of a client: configuration shape, cache state, last
// errors. Credentials are replaced with a fixed marker before anything is
// serialized.

use chrono::{DateTime, Utc};
use serde::Serialize;

use redback_api::ApiScheme;

use crate::cache::CacheStatus;
use crate::measurements::Measurements;

/// Placeholder written in place of every credential.
pub const REDACTED: &str = "***SECRET***";

#[derive(Debug, Clone, Serialize)]
pub struct Diagnostics {
    pub generated_at: DateTime<Utc>,
    pub scheme: ApiScheme,
    pub demo: bool,
    pub auth_id: &'static str,
    pub auth_secret: &'static str,
    pub site_index: u32,
    pub site_id: Option<String>,
    /// Public scheme only: whether a bearer token is cached.
    pub has_token: Option<bool>,
    pub info_ttl_secs: i64,
    pub energy_ttl_secs: i64,
    /// False when any cache's most recent refresh failed.
    pub last_update_success: bool,
    pub caches: Vec<CacheStatus>,
    pub inverter_info: Option<Measurements>,
}
