//! Clap derive structures for the `redback` CLI.
//!
//! Defines the command tree, global flags, and shared value types. Kept
//! free of workspace crates so `build.rs` can include it for man pages.

use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// redback -- poll Redback inverters and sites from the command line
#[derive(Debug, Parser)]
#[command(
    name = "redback",
    version,
    about = "Read Redback inverter and site data from the command line",
    long_about = "Query the Redback Technologies cloud APIs.\n\n\
        Supports the public OAuth2 API (client ID + secret, multi-site)\n\
        and the private portal API (inverter serial + session cookie).",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Account profile to use
    #[arg(long, short = 'p', env = "REDBACK_PROFILE", global = true)]
    pub profile: Option<String>,

    /// API scheme (overrides profile)
    #[arg(long, env = "REDBACK_SCHEME", global = true)]
    pub scheme: Option<SchemeArg>,

    /// OAuth2 client ID (public) or inverter serial number (private)
    #[arg(long, env = "REDBACK_AUTH_ID", global = true)]
    pub auth_id: Option<String>,

    /// OAuth2 client secret (public) or portal cookie (private)
    #[arg(
        long,
        env = "REDBACK_AUTH_SECRET",
        global = true,
        hide_env_values = true
    )]
    pub auth_secret: Option<String>,

    /// Site position: a number or an ordinal word ("first", "second", ...)
    #[arg(long, env = "REDBACK_SITE_INDEX", global = true)]
    pub site_index: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "REDBACK_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "REDBACK_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Use built-in sample data instead of the network
    #[arg(long, env = "REDBACK_DEMO", global = true)]
    pub demo: bool,
}

// ── Value Enums ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SchemeArg {
    /// OAuth2 client credentials, multi-site API
    Public,
    /// Portal cookie + inverter serial number
    Private,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one key=value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check that the configured credentials are accepted
    Test,

    /// Print the resolved site ID (serial number for the private scheme)
    #[command(alias = "site")]
    SiteId,

    /// Show static inverter and site information
    Info,

    /// Show the latest energy readings
    #[command(alias = "e")]
    Energy(EnergyArgs),

    /// Poll energy readings on a fixed interval and total the energy
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Print a support snapshot with credentials redacted
    #[command(alias = "diag")]
    Diagnostics,

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct EnergyArgs {
    /// Append derived values (site load, grid import/export, ...) in kW
    #[arg(long, short = 'd')]
    pub derived: bool,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Time between polls (e.g. "60s", "5m")
    #[arg(long, short = 'i', default_value = "60s", value_parser = humantime::parse_duration)]
    pub interval: Duration,

    /// Stop after this many polls
    #[arg(long, short = 'n')]
    pub count: Option<u64>,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive setup wizard
    Init,
    /// Display the current configuration (secrets masked)
    Show,
    /// Print the configuration file path
    Path,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
