//! `diagnostics`: a support snapshot with credentials redacted.

use tabled::{Table, Tabled, settings::Style};
use tracing::debug;

use redback_core::{CacheStatus, Diagnostics, RedbackClient};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    key: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Tabled)]
struct CacheRow {
    #[tabled(rename = "Cache")]
    name: &'static str,
    #[tabled(rename = "Fetched")]
    fetched_at: String,
    #[tabled(rename = "Expires")]
    expires_at: String,
    #[tabled(rename = "Fetches")]
    fetch_count: u64,
    #[tabled(rename = "Last error")]
    last_error: String,
}

impl From<&CacheStatus> for CacheRow {
    fn from(c: &CacheStatus) -> Self {
        Self {
            name: c.name,
            fetched_at: c.fetched_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
            expires_at: c.expires_at.map_or_else(
                || if c.fetched_at.is_some() { "never".into() } else { String::new() },
                |t| t.to_rfc3339(),
            ),
            fetch_count: c.fetch_count,
            last_error: c.last_error.clone().unwrap_or_default(),
        }
    }
}

pub async fn handle(client: &RedbackClient, global: &GlobalOpts) -> Result<(), CliError> {
    // The failure lands in the snapshot's cache status
    if let Err(e) = client.refresh().await {
        debug!(error = %e, "refresh before diagnostics failed");
    }

    let diag = client.diagnostics().await;
    let out = output::render_single(&global.output, &diag, detail, plain)?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn summary_rows(d: &Diagnostics) -> Vec<(&'static str, String)> {
    vec![
        ("generated_at", d.generated_at.to_rfc3339()),
        ("scheme", d.scheme.to_string()),
        ("demo", d.demo.to_string()),
        ("auth_id", d.auth_id.to_owned()),
        ("auth_secret", d.auth_secret.to_owned()),
        ("site_index", d.site_index.to_string()),
        ("site_id", d.site_id.clone().unwrap_or_default()),
        (
            "has_token",
            d.has_token.map(|t| t.to_string()).unwrap_or_default(),
        ),
        ("info_ttl_secs", d.info_ttl_secs.to_string()),
        ("energy_ttl_secs", d.energy_ttl_secs.to_string()),
        ("last_update_success", d.last_update_success.to_string()),
    ]
}

fn detail(d: &Diagnostics) -> String {
    let summary = Table::new(
        summary_rows(d)
            .into_iter()
            .map(|(key, value)| FieldRow { key, value }),
    )
        .with(Style::rounded())
        .to_string();
    let caches = Table::new(d.caches.iter().map(CacheRow::from))
        .with(Style::rounded())
        .to_string();
    format!("{summary}\n{caches}")
}

fn plain(d: &Diagnostics) -> String {
    summary_rows(d)
        .into_iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("\n")
}
