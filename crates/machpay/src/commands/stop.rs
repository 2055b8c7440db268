//! Stop command

use anyhow::{Context, Result};
use machpay_gateway::{GatewayError, Supervisor};

use crate::cli::StopArgs;
use crate::context::GatewayContext;
use crate::output;

pub async fn run(args: StopArgs) -> Result<()> {
    let ctx = GatewayContext::load()?;
    let installer = ctx.installer()?;
    let supervisor = ctx.supervisor(&installer.binary_path())?;

    stop(&supervisor, args.force).await
}

/// Stop the recorded gateway; "not running" is reported, not returned
pub(crate) async fn stop(supervisor: &Supervisor, force: bool) -> Result<()> {
    let pid = match supervisor.get_pid() {
        Ok(pid) => pid,
        Err(GatewayError::NotRunning) => {
            output::muted("Gateway is not running");
            return Ok(());
        }
        Err(e) => return Err(e).context("Failed to read gateway state"),
    };

    println!("Stopping gateway (PID {})...", pid);
    let result = if force {
        supervisor.kill()
    } else {
        supervisor.stop().await
    };

    match result {
        Ok(()) => output::success("Gateway stopped"),
        Err(GatewayError::NotRunning) => output::muted("Gateway had already exited"),
        Err(e) => return Err(e).context("Failed to stop gateway"),
    }
    Ok(())
}
