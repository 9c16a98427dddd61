//! `test` and `site-id`: credential check and site resolution.

use serde::Serialize;

use redback_core::{ApiScheme, RedbackClient};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct ConnectionReport {
    scheme: ApiScheme,
    connected: bool,
}

#[derive(Serialize)]
struct SiteReport {
    site_id: String,
}

pub async fn test(client: &RedbackClient, global: &GlobalOpts) -> Result<(), CliError> {
    client.check_connection().await?;

    let report = ConnectionReport {
        scheme: client.scheme(),
        connected: true,
    };
    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &report,
        |r| {
            format!(
                "Connection {} ({} API)",
                output::status_word(r.connected, color),
                r.scheme
            )
        },
        |r| r.connected.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn site_id(client: &RedbackClient, global: &GlobalOpts) -> Result<(), CliError> {
    let report = SiteReport {
        site_id: client.get_site_id().await?,
    };
    let out = output::render_single(
        &global.output,
        &report,
        |r| r.site_id.clone(),
        |r| r.site_id.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
