// Typed shapes for the few payloads the client must interpret itself.
//
// Static and dynamic data stay as `serde_json::Value`: their field sets
// vary by firmware and are flattened by the normalizer in `redback-core`.

use serde::{Deserialize, Serialize};

/// `POST Auth/token` response body.
///
/// Every field is optional so a 2xx error body (`{"error": ...}`) still
/// deserializes and can be reported as an authentication failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// `GET EnergyData/With/Nodes` response body.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SiteList {
    #[serde(default)]
    pub data: Vec<SiteEntry>,
}

/// One entry of the site list. Only entries typed `"Site"` count as sites.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SiteEntry {
    pub id: String,
    #[serde(rename = "Type")]
    pub kind: String,
}

impl SiteEntry {
    pub fn is_site(&self) -> bool {
        self.kind == "Site"
    }
}
