mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use redback_core::{ClientConfig, RedbackClient};

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a client
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "redback", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let client_config = build_client_config(&cli.global)?;
            let client = RedbackClient::new(client_config)?;

            tracing::debug!(command = ?cmd, scheme = %client.scheme(), "dispatching command");
            commands::dispatch(cmd, &client, &cli.global).await
        }
    }
}

/// Build a `ClientConfig` from the config file, profile, and CLI overrides.
fn build_client_config(global: &cli::GlobalOpts) -> Result<ClientConfig, CliError> {
    if global.demo {
        return Ok(ClientConfig::demo());
    }

    let cfg = config::load_config_or_default();
    let profile_name = config::active_profile_name(global, &cfg);
    let default_timeout = cfg.defaults.timeout;

    if let Some(profile) = cfg.profiles.get(&profile_name) {
        return config::resolve_profile(profile, &profile_name, global, default_timeout);
    }

    // An explicitly requested profile must exist
    if global.profile.is_some() && global.auth_id.is_none() {
        let mut available: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
        available.sort_unstable();
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: available.join(", "),
        });
    }

    config::from_flags(global, &profile_name, default_timeout)
}
