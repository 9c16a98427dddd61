//! Command handlers, one module per subcommand group.

pub mod config_cmd;
pub mod connection;
pub mod diagnostics;
pub mod energy;
pub mod info;
pub mod watch;

use redback_core::RedbackClient;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Route a client-backed command to its handler.
pub async fn dispatch(
    cmd: Command,
    client: &RedbackClient,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Test => connection::test(client, global).await,
        Command::SiteId => connection::site_id(client, global).await,
        Command::Info => info::handle(client, global).await,
        Command::Energy(args) => energy::handle(client, &args, global).await,
        Command::Watch(args) => watch::handle(client, &args, global).await,
        Command::Diagnostics => diagnostics::handle(client, global).await,
        Command::Config(_) | Command::Completions(_) => unreachable!("handled before dispatch"),
    }
}
