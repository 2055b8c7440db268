//! MachPay CLI - payment gateway lifecycle
//!
//! This is the main entry point for the machpay command-line interface.

mod cli;
mod commands;
mod context;
mod output;
mod version;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize rustls crypto provider (required for rustls 0.23+)
    // This must be done before any TLS operations
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Version(args) => commands::version::run(args),
        Commands::Serve(args) => commands::serve::run(args).await,
        Commands::Stop(args) => commands::stop::run(args).await,
        Commands::Restart(args) => commands::restart::run(args).await,
        Commands::Logs(args) => commands::logs::run(args).await,
        Commands::Update(args) => commands::update::run(args).await,
        Commands::Status(args) => commands::status::run(args).await,
    }
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(EnvFilter::new(filter_directive(verbose, quiet)))
        .init();
}

/// Terminal output carries the user-facing messages, so library logs stay at
/// `warn` unless asked for
fn filter_directive(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive() {
        assert_eq!(filter_directive(0, false), "warn");
        assert_eq!(filter_directive(1, false), "info");
        assert_eq!(filter_directive(2, false), "debug");
        assert_eq!(filter_directive(5, false), "trace");
        assert_eq!(filter_directive(3, true), "error");
    }
}
