//! Update command for the gateway binary and the CLI itself

use anyhow::{Context, Result};
use machpay_gateway::{GatewayError, StepProgress};
use std::io;
use tracing::debug;

use crate::cli::{UpdateArgs, UpdateTarget};
use crate::commands::install_release;
use crate::context::GatewayContext;
use crate::output;
use crate::version::VersionInfo;

pub async fn run(args: UpdateArgs) -> Result<()> {
    if args.target.includes_gateway() {
        let result = match GatewayContext::load() {
            Ok(ctx) => update_gateway(&ctx).await,
            Err(e) => Err(e),
        };
        settle_gateway(args.target, result)?;
    }

    if args.target.includes_cli() {
        update_cli();
    }

    Ok(())
}

async fn update_gateway(ctx: &GatewayContext) -> Result<()> {
    output::header("Gateway");

    let installer = ctx.installer()?;
    if !installer.is_installed() {
        output::kv("Installed", "no");
        output::muted("  Run 'machpay serve' to install it");
        return Ok(());
    }

    match installer.installed_version().await {
        Ok(version) => output::kv("Installed", &format!("v{}", version)),
        Err(e) => {
            debug!("Could not read installed version: {}", e);
            output::kv("Installed", "unknown");
        }
    }

    let spinner = output::spinner("Checking for updates...");
    let check = installer.needs_update().await;
    spinner.finish_and_clear();
    let check = check.context("Failed to check for gateway updates")?;

    let latest = match check.latest {
        Some(latest) if check.needs_update => latest,
        _ => {
            output::success("Gateway is up to date");
            return Ok(());
        }
    };
    output::kv("Latest", &format!("v{}", latest));

    let supervisor = ctx.supervisor(&installer.binary_path())?;
    let was_running = supervisor.is_running();

    let mut steps = StepProgress::new(io::stdout(), if was_running { 3 } else { 1 });
    if was_running {
        steps.step("Stopping gateway");
        match supervisor.stop().await {
            Ok(()) | Err(GatewayError::NotRunning) => {}
            Err(e) => return Err(e).context("Failed to stop gateway before updating"),
        }
    }

    steps.step(&format!("Installing v{}", latest));
    install_release(&installer, &latest).await?;

    if was_running {
        steps.step("Restarting gateway");
        match supervisor.start().await {
            Ok(pid) => output::success(&format!("Gateway restarted (PID {})", pid)),
            Err(e) => {
                output::warning(&format!("Failed to restart gateway: {}", e));
                output::muted("  Run 'machpay serve --detach' to start it");
                return Ok(());
            }
        }
    }

    steps.complete();
    Ok(())
}

/// A gateway failure only aborts `update gateway`; `update all` warns and
/// moves on to the CLI
fn settle_gateway(target: UpdateTarget, result: Result<()>) -> Result<()> {
    match (target, result) {
        (UpdateTarget::All, Err(e)) => {
            output::warning(&format!("Gateway update failed: {:#}", e));
            Ok(())
        }
        (_, result) => result,
    }
}

fn update_cli() {
    output::header("CLI");
    output::kv("Installed", &format!("v{}", VersionInfo::current().version));
    println!();
    for line in cli_update_instructions(std::env::consts::OS) {
        output::muted(line);
    }
}

/// Package-manager instructions for upgrading the CLI on `os`
fn cli_update_instructions(os: &str) -> &'static [&'static str] {
    match os {
        "macos" => &[
            "  To update the CLI, run:",
            "    brew upgrade machpay",
        ],
        "windows" => &[
            "  To update the CLI, run:",
            "    winget upgrade machpay",
            "  Or download from: https://github.com/machpay/machpay-cli/releases",
        ],
        _ => &[
            "  To update the CLI, run:",
            "    curl -fsSL https://machpay.xyz/install.sh | sh",
        ],
    }
}
