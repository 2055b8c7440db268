//! CLI command implementations

pub mod logs;
pub mod restart;
pub mod serve;
pub mod status;
pub mod stop;
pub mod update;
pub mod version;

use anyhow::{Context, Result};
use machpay_gateway::{InstallReport, Installer};
use tokio_util::sync::CancellationToken;

use crate::output;

/// Download, verify and install gateway release `tag`
pub(crate) async fn install_release(installer: &Installer, tag: &str) -> Result<InstallReport> {
    let result = if output::stderr_is_term() {
        let mut bar = output::download_bar();
        let result = installer.download(tag, &mut bar).await;
        bar.finish_and_clear();
        result
    } else {
        let mut bar = output::plain_download_bar();
        installer.download(tag, &mut bar).await
    };

    let report = result.with_context(|| format!("Failed to install gateway {}", tag))?;
    if !report.is_verified() {
        output::warning("Release has no checksums.txt; the download was not verified");
    }
    output::success(&format!(
        "Installed machpay-gateway {} to {}",
        report.tag,
        report.path.display()
    ));
    Ok(report)
}

/// Fire `cancel` on Ctrl+C (or SIGTERM on unix)
pub(crate) async fn cancel_on_shutdown(cancel: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                tracing::debug!("SIGTERM handler unavailable: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    cancel.cancel();
}
