//! `info`: static inverter and site information.

use redback_core::RedbackClient;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

pub async fn handle(client: &RedbackClient, global: &GlobalOpts) -> Result<(), CliError> {
    let info = client.get_inverter_info().await?;
    let out = output::render_measurements(
        &global.output,
        &info,
        output::should_color(&global.color),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
