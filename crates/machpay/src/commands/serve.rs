//! Serve command: install the gateway if needed and run it

use anyhow::{anyhow, bail, Context, Result};
use machpay_core::{CredentialStore, ProfileStore, Role};
use machpay_gateway::{Installer, Spinner, Supervisor};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cli::ServeArgs;
use crate::commands::{cancel_on_shutdown, install_release};
use crate::context::GatewayContext;
use crate::output;

/// Upper bound on the pre-start update check so an unreachable registry
/// does not hold up `serve`
const UPDATE_CHECK_TIMEOUT: Duration = Duration::from_secs(3);

pub async fn run(args: ServeArgs) -> Result<()> {
    let ctx = GatewayContext::load()?;
    serve(&ctx, &args).await
}

pub(crate) async fn serve(ctx: &GatewayContext, args: &ServeArgs) -> Result<()> {
    let upstream = check_profile(ctx, args.gateway.upstream.as_deref())?;

    let installer = ctx.installer()?;
    ensure_installed(&installer).await?;

    let supervisor = ctx
        .supervisor_with(&installer.binary_path(), &args.gateway)?
        .with_upstream(upstream);

    if args.detach {
        run_detached(ctx, &supervisor).await
    } else {
        run_foreground(&supervisor).await
    }
}

/// Vendor login with an upstream is required before the gateway can serve
fn check_profile(ctx: &GatewayContext, flag_upstream: Option<&str>) -> Result<String> {
    if !ctx.user.is_authenticated() {
        output::error("Not logged in");
        output::muted("  Run 'machpay login' first");
        bail!("not logged in");
    }

    if ctx.user.role() != Some(Role::Vendor) {
        output::error("Gateway is only available for vendors");
        output::muted("  Run 'machpay setup' and choose vendor");
        bail!("not configured as a vendor");
    }

    resolve_upstream(flag_upstream, ctx.user.upstream_url()).ok_or_else(|| {
        output::error("No upstream URL configured");
        output::muted("  Use --upstream or run 'machpay setup'");
        anyhow!("no upstream URL configured")
    })
}

fn resolve_upstream(flag: Option<&str>, profile: Option<&str>) -> Option<String> {
    flag.filter(|u| !u.trim().is_empty())
        .or(profile)
        .map(String::from)
}

/// Install the latest release when missing; otherwise mention an available update
async fn ensure_installed(installer: &Installer) -> Result<()> {
    if !installer.is_installed() {
        output::info("Gateway not installed. Downloading...");
        let latest = installer
            .get_latest_release()
            .await
            .context("Failed to resolve the latest gateway release")?;
        install_release(installer, &latest.tag_name).await?;
        return Ok(());
    }

    match tokio::time::timeout(UPDATE_CHECK_TIMEOUT, installer.needs_update()).await {
        Ok(Ok(check)) if check.needs_update => {
            if let Some(latest) = check.latest {
                output::info(&format!(
                    "Gateway update available: v{} (run 'machpay update gateway')",
                    latest
                ));
            }
        }
        Ok(Ok(_)) => {}
        Ok(Err(e)) => debug!("Update check failed: {}", e),
        Err(_) => debug!("Update check timed out"),
    }
    Ok(())
}

async fn run_detached(ctx: &GatewayContext, supervisor: &Supervisor) -> Result<()> {
    if let Ok(pid) = supervisor.get_pid() {
        output::info(&format!("Gateway already running (PID {})", pid));
        output::muted("  Use 'machpay stop' to stop it");
        return Ok(());
    }

    let pid = supervisor.start().await.context("Failed to start gateway")?;

    let mut spinner = Spinner::stderr(format!("Starting gateway (PID {})", pid));
    spinner.start();
    match supervisor
        .wait_for_healthy(ctx.config.gateway.startup_timeout())
        .await
    {
        Ok(()) => {
            spinner.stop_with_message(true, &format!("Gateway running in background (PID {})", pid));
        }
        Err(e) => {
            spinner.stop_with_message(false, &format!("Gateway started (PID {}) but is not healthy yet", pid));
            debug!("Health wait failed: {}", e);
            output::muted("  Check logs with 'machpay logs'");
        }
    }

    output::kv("Port", &supervisor.port().to_string());
    output::kv("Upstream", supervisor.upstream().unwrap_or("-"));
    output::kv("Logs", &supervisor.log_file().display().to_string());
    println!();
    output::muted("  machpay logs -f   follow the log");
    output::muted("  machpay stop      stop the gateway");
    Ok(())
}

async fn run_foreground(supervisor: &Supervisor) -> Result<()> {
    if let Ok(pid) = supervisor.get_pid() {
        bail!(
            "gateway already running in the background (PID {}); stop it first with 'machpay stop'",
            pid
        );
    }

    output::header("MachPay Gateway");
    output::kv("Port", &supervisor.port().to_string());
    output::kv("Upstream", supervisor.upstream().unwrap_or("-"));
    output::muted("  Press Ctrl+C to stop");
    println!();

    let cancel = CancellationToken::new();
    let signals = tokio::spawn(cancel_on_shutdown(cancel.clone()));

    let mut stdout = tokio::io::stdout();
    let mut stderr = tokio::io::stderr();
    let result = supervisor
        .start_foreground(&cancel, &mut stdout, &mut stderr)
        .await;
    signals.abort();

    result.context("Gateway exited")?;
    if cancel.is_cancelled() {
        println!();
        output::success("Gateway stopped");
    }
    Ok(())
}
