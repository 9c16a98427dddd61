//! `watch`: poll readings on an interval and total the energy.
//!
//! Transient failures (connection, 5xx) are logged and the next tick
//! tries again. Credential failures end the watch.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::{self, MissedTickBehavior};
use tracing::{info, warn};

use redback_core::{EnergyAccumulator, Measurements, RedbackClient, derive_all};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct Tick<'a> {
    fetched_at: DateTime<Utc>,
    fresh: bool,
    derived: &'a Measurements,
}

#[derive(Serialize)]
struct Summary<'a> {
    samples: u64,
    totals: &'a Measurements,
}

pub async fn handle(
    client: &RedbackClient,
    args: &WatchArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let mut ticker = time::interval(args.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // Polls inside the energy TTL reuse the cached reading, so a counted
    // sample never stands for less than one TTL.
    let nominal = client
        .energy_ttl()
        .to_std()
        .map_or(args.interval, |ttl| ttl.max(args.interval));
    let mut totals = EnergyAccumulator::new(nominal);
    let mut polls = 0u64;

    info!(interval = ?args.interval, count = ?args.count, "watching energy readings");

    loop {
        if args.count.is_some_and(|max| polls >= max) {
            break;
        }

        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        }
        polls += 1;

        let snapshot = match client.energy_snapshot().await {
            Ok(s) => s,
            Err(e) if e.is_transient() => {
                warn!(error = %e, "poll failed, retrying on next tick");
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let fresh = totals.record(&snapshot.value, snapshot.fetched_at);
        let derived = derive_all(&snapshot.value);
        let line = render_tick(
            &global.output,
            &Tick {
                fetched_at: snapshot.fetched_at,
                fresh,
                derived: &derived,
            },
        )?;
        output::print_output(&line, global.quiet);
    }

    let summary = Summary {
        samples: totals.samples(),
        totals: &totals.totals(),
    };
    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &summary,
        |s| {
            format!(
                "{} sample(s)\n{}",
                s.samples,
                output::measurement_table(s.totals, color)
            )
        },
        |s| output::plain_lines(s.totals),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// One line per poll; structured formats emit one compact JSON object.
fn render_tick(format: &OutputFormat, tick: &Tick<'_>) -> Result<String, CliError> {
    Ok(match format {
        OutputFormat::Json | OutputFormat::JsonCompact => serde_json::to_string(tick)?,
        OutputFormat::Yaml => format!("---\n{}", serde_yaml::to_string(tick)?),
        OutputFormat::Table | OutputFormat::Plain => {
            let fields = tick
                .derived
                .iter()
                .map(|(k, v)| format!("{k}={}", output::scalar_text(v)))
                .collect::<Vec<_>>()
                .join(" ");
            let marker = if tick.fresh { "" } else { " (cached)" };
            format!("{}{marker} {fields}", tick.fetched_at.to_rfc3339())
        }
    })
}
