// redback-api: Async Rust client for the Redback Technologies cloud APIs (private + public)

pub mod auth;
pub mod clock;
pub mod endpoint;
pub mod error;
pub mod models;
pub mod private;
pub mod public;
pub mod token;
pub mod transport;

pub use auth::{ApiScheme, Credentials};
pub use clock::{Clock, SystemClock};
#[cfg(any(test, feature = "test-util"))]
pub use clock::ManualClock;
pub use endpoint::{ApiUrls, Authorization, Endpoint};
pub use error::Error;
pub use models::{SiteEntry, SiteList, TokenResponse};
pub use private::PrivateClient;
pub use public::PublicClient;
pub use token::{BearerToken, TOKEN_SAFETY_OFFSET, TokenManager};
pub use transport::{ApiRequest, RetryPolicy, TlsMode, Transport, TransportConfig};
