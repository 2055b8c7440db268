//! Per-invocation state shared by the gateway commands

use anyhow::{Context, Result};
use machpay_core::types::RuntimeConfig;
use machpay_core::{HierarchicalConfigLoader, MachpayPaths, ProfileStore, UserConfig};
use machpay_gateway::{Installer, Supervisor};
use std::path::Path;
use tracing::debug;

use crate::cli::GatewayArgs;

/// Resolved directories, runtime configuration and the user's profile
pub struct GatewayContext {
    pub paths: MachpayPaths,
    pub config: RuntimeConfig,
    pub user: UserConfig,
}

impl GatewayContext {
    pub fn load() -> Result<Self> {
        let paths = MachpayPaths::resolve().context("Failed to resolve the MachPay directory")?;
        let config = HierarchicalConfigLoader::new()?
            .load_runtime_config()
            .context("Failed to load runtime configuration")?;
        let user = UserConfig::load(&paths.user_config_file())
            .with_context(|| format!("Failed to read {}", paths.user_config_file().display()))?;

        debug!("Using MachPay directory {}", paths.root().display());
        Ok(Self {
            paths,
            config,
            user,
        })
    }

    pub fn installer(&self) -> Result<Installer> {
        Installer::new(self.paths.bin_dir(), &self.config)
            .context("Failed to initialize the gateway installer")
    }

    /// Supervisor for `binary` configured from the user's profile
    pub fn supervisor(&self, binary: &Path) -> Result<Supervisor> {
        let supervisor = Supervisor::new(binary, &self.paths, &self.config.gateway)
            .context("Failed to initialize the gateway supervisor")?
            .with_port(self.default_port());

        Ok(match self.user.upstream_url() {
            Some(upstream) => supervisor.with_upstream(upstream),
            None => supervisor,
        })
    }

    /// Supervisor with command-line overrides applied on top of the profile
    pub fn supervisor_with(&self, binary: &Path, args: &GatewayArgs) -> Result<Supervisor> {
        let mut supervisor = self.supervisor(binary)?.with_debug(args.debug);
        if let Some(port) = args.port {
            supervisor = supervisor.with_port(port);
        }
        if let Some(upstream) = &args.upstream {
            supervisor = supervisor.with_upstream(upstream.as_str());
        }
        Ok(supervisor)
    }

    /// Port from `config.yaml`, else the runtime configuration
    pub fn default_port(&self) -> u16 {
        resolve_port(None, self.user.gateway_port(), self.config.gateway.port)
    }
}

/// Flag beats the user's profile, which beats runtime configuration
pub fn resolve_port(flag: Option<u16>, profile: Option<u16>, runtime: u16) -> u16 {
    flag.or(profile).unwrap_or(runtime)
}
