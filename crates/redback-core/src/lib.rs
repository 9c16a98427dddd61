// redback-core: Normalized, cached inverter data between redback-api and consumers (CLI, host apps).

pub mod cache;
pub mod client;
pub mod config;
pub mod demo;
pub mod derived;
pub mod diagnostics;
pub mod energy;
pub mod error;
pub mod measurements;
pub mod normalize;
pub mod site;
pub mod source;

// ── Primary re-exports ──────────────────────────────────────────────
pub use cache::{CacheStatus, Snapshot, Ttl, TtlCache};
pub use client::RedbackClient;
pub use config::{ClientConfig, DEFAULT_ENERGY_TTL, DEFAULT_INFO_TTL, SourceKind};
pub use derived::{DerivedMeasurement, derive_all};
pub use diagnostics::{Diagnostics, REDACTED};
pub use energy::{DEFAULT_SAMPLE_INTERVAL, EnergyAccumulator};
pub use error::CoreError;
pub use measurements::Measurements;
pub use normalize::NormalizeError;
pub use site::SiteIndex;
pub use source::EnergySource;

// Transport-level types consumers need to build a `ClientConfig`.
pub use redback_api::{
    ApiScheme, ApiUrls, Clock, Credentials, RetryPolicy, SystemClock, TlsMode,
};
