//! Restart command: stop if running, then serve in the background

use anyhow::Result;

use crate::cli::{RestartArgs, ServeArgs};
use crate::commands::{serve, stop};
use crate::context::GatewayContext;

pub async fn run(args: RestartArgs) -> Result<()> {
    let ctx = GatewayContext::load()?;
    let installer = ctx.installer()?;
    let supervisor = ctx.supervisor(&installer.binary_path())?;

    if supervisor.is_running() {
        stop::stop(&supervisor, false).await?;
        println!();
    }

    let serve_args = ServeArgs {
        gateway: args.gateway,
        detach: true,
    };
    serve::serve(&ctx, &serve_args).await
}
