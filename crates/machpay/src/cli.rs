//! CLI argument parsing with clap

use clap::{Args, Parser, Subcommand, ValueEnum};

/// MachPay - run the payment gateway in front of your API
#[derive(Parser, Debug)]
#[command(name = "machpay")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the payment gateway (installs it on first use)
    Serve(ServeArgs),

    /// Stop the background gateway
    Stop(StopArgs),

    /// Restart the gateway in the background
    Restart(RestartArgs),

    /// Show gateway logs
    Logs(LogsArgs),

    /// Update the gateway or the CLI
    Update(UpdateArgs),

    /// Show account and gateway status
    Status(StatusArgs),

    /// Show version information
    Version(VersionArgs),
}

/// Options shared by every command that launches the gateway
#[derive(Args, Debug, Clone, Default)]
pub struct GatewayArgs {
    /// Port the gateway listens on [default: from config, else 8402]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Upstream API URL to proxy paid requests to
    #[arg(short, long)]
    pub upstream: Option<String>,

    /// Enable gateway debug logging
    #[arg(long)]
    pub debug: bool,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub gateway: GatewayArgs,

    /// Run in the background and write output to the log file
    #[arg(short, long)]
    pub detach: bool,
}

#[derive(Args, Debug)]
pub struct StopArgs {
    /// Kill immediately instead of stopping gracefully
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct RestartArgs {
    #[command(flatten)]
    pub gateway: GatewayArgs,
}

#[derive(Args, Debug)]
pub struct LogsArgs {
    /// Keep streaming new log lines until interrupted
    #[arg(short, long, conflicts_with = "clear")]
    pub follow: bool,

    /// Truncate the log file
    #[arg(long)]
    pub clear: bool,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Component to update
    #[arg(value_enum, default_value_t = UpdateTarget::All)]
    pub target: UpdateTarget,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateTarget {
    Gateway,
    Cli,
    All,
}

impl UpdateTarget {
    pub fn includes_gateway(self) -> bool {
        matches!(self, UpdateTarget::Gateway | UpdateTarget::All)
    }

    pub fn includes_cli(self) -> bool {
        matches!(self, UpdateTarget::Cli | UpdateTarget::All)
    }
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
