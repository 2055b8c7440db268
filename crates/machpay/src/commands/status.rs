//! Status command: account, configuration and gateway state

use anyhow::Result;
use machpay_core::{CredentialStore, ProfileStore};
use serde::Serialize;
use tracing::debug;

use crate::cli::StatusArgs;
use crate::context::GatewayContext;
use crate::output;

#[derive(Debug, Serialize)]
struct StatusReport {
    logged_in: bool,
    email: Option<String>,
    role: Option<String>,
    network: String,
    config_path: String,
    gateway: GatewayStatus,
}

#[derive(Debug, Default, Serialize)]
struct GatewayStatus {
    installed: bool,
    version: Option<String>,
    path: String,
    port: u16,
    pid: Option<u32>,
    healthy: Option<bool>,
}

pub async fn run(args: StatusArgs) -> Result<()> {
    let ctx = GatewayContext::load()?;
    let report = collect(&ctx).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

async fn collect(ctx: &GatewayContext) -> Result<StatusReport> {
    let installer = ctx.installer()?;
    let supervisor = ctx.supervisor(&installer.binary_path())?;

    let mut gateway = GatewayStatus {
        installed: installer.is_installed(),
        path: installer.binary_path().display().to_string(),
        port: supervisor.port(),
        ..Default::default()
    };

    if gateway.installed {
        match installer.installed_version().await {
            Ok(version) => gateway.version = Some(version),
            Err(e) => debug!("Could not read installed version: {}", e),
        }
    }

    if let Ok(pid) = supervisor.get_pid() {
        gateway.pid = Some(pid);
        gateway.healthy = Some(supervisor.health_check().await.is_ok());
    }

    Ok(StatusReport {
        logged_in: ctx.user.is_authenticated(),
        email: ctx.user.auth.email.clone(),
        role: ctx.user.role().map(|r| r.to_string()),
        network: ctx.user.network().to_string(),
        config_path: ctx.paths.user_config_file().display().to_string(),
        gateway,
    })
}

fn print_report(report: &StatusReport) {
    output::header("MachPay Status");

    output::header("Authentication");
    if report.logged_in {
        output::kv("Status", "● Logged in");
        if let Some(email) = &report.email {
            output::kv("Account", email);
        }
    } else {
        output::kv("Status", "○ Not logged in");
        output::muted("  Run 'machpay login' to authenticate");
    }

    output::header("Configuration");
    output::kv("Role", report.role.as_deref().unwrap_or("Not configured"));
    output::kv("Network", &report.network);
    output::kv("Config", &report.config_path);

    output::header("Gateway");
    let gateway = &report.gateway;
    if !gateway.installed {
        output::kv("Status", "Not installed");
        output::muted("  Run 'machpay serve' to download and start");
        return;
    }

    output::kv(
        "Version",
        &gateway
            .version
            .as_deref()
            .map(|v| format!("v{}", v))
            .unwrap_or_else(|| "unknown".to_string()),
    );
    output::kv("Port", &gateway.port.to_string());
    output::kv("Status", &running_label(gateway.pid, gateway.healthy));
}

fn running_label(pid: Option<u32>, healthy: Option<bool>) -> String {
    match (pid, healthy) {
        (Some(pid), Some(true)) => format!("● Running (PID {}, healthy)", pid),
        (Some(pid), _) => format!("● Running (PID {}, not responding)", pid),
        (None, _) => "○ Not running".to_string(),
    }
}
