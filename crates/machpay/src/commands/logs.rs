//! Logs command

use anyhow::{Context, Result};
use machpay_gateway::GatewayError;
use tokio_util::sync::CancellationToken;

use crate::cli::LogsArgs;
use crate::commands::cancel_on_shutdown;
use crate::context::GatewayContext;
use crate::output;

pub async fn run(args: LogsArgs) -> Result<()> {
    let ctx = GatewayContext::load()?;
    let installer = ctx.installer()?;
    let supervisor = ctx.supervisor(&installer.binary_path())?;

    if args.clear {
        match supervisor.clear_logs() {
            Ok(()) => output::success("Logs cleared"),
            Err(GatewayError::LogNotFound { .. }) => output::muted("No logs to clear"),
            Err(e) => return Err(e).context("Failed to clear logs"),
        }
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let signals = if args.follow {
        output::muted(&format!(
            "Following {} (Ctrl+C to stop)",
            supervisor.log_file().display()
        ));
        Some(tokio::spawn(cancel_on_shutdown(cancel.clone())))
    } else {
        None
    };

    let mut stdout = tokio::io::stdout();
    let result = supervisor
        .tail_logs(&cancel, args.follow, &mut stdout)
        .await;
    if let Some(signals) = signals {
        signals.abort();
    }

    match result {
        Ok(()) => Ok(()),
        Err(GatewayError::LogNotFound { .. }) => {
            output::muted("No logs found");
            output::muted("  Start the gateway with 'machpay serve --detach'");
            Ok(())
        }
        Err(e) => Err(e).context("Failed to read logs"),
    }
}
