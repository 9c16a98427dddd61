//! `energy`: the latest readings, optionally with derived values.

use redback_core::{Measurements, RedbackClient, derive_all};

use crate::cli::{EnergyArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

pub async fn handle(
    client: &RedbackClient,
    args: &EnergyArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let readings = client.get_energy_data().await?;
    let readings = if args.derived {
        with_derived(&readings)
    } else {
        readings.as_ref().clone()
    };

    let out = output::render_measurements(
        &global.output,
        &readings,
        output::should_color(&global.color),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Raw readings followed by every derived value that can be computed.
pub(crate) fn with_derived(readings: &Measurements) -> Measurements {
    let mut merged = readings.clone();
    for (key, value) in derive_all(readings) {
        merged.insert(key, value);
    }
    merged
}
