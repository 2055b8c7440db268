//! Hierarchical configuration loader with precedence
//!
//! Loads configuration from multiple sources with the following precedence (low to high):
//! 1. Compiled-in defaults
//! 2. Runtime config (~/.machpay/runtime.yaml)
//! 3. Environment variables (MACHPAY_* prefix)
//! 4. CLI flags (handled by caller)

use crate::error::{Error, Result};
use crate::paths::MachpayPaths;
use crate::types::RuntimeConfig;
use camino::{Utf8Path, Utf8PathBuf};
use serde::de::DeserializeOwned;
use std::env;
use std::fs;
use std::str::FromStr;
use tracing::debug;

const RUNTIME_CONFIG_FILE: &str = "runtime.yaml";

/// Configuration hierarchy loader
pub struct HierarchicalConfigLoader {
    /// Base directory for configuration files
    config_dir: Utf8PathBuf,
}

impl HierarchicalConfigLoader {
    /// Create a loader rooted at the resolved private directory
    pub fn new() -> Result<Self> {
        let root = MachpayPaths::resolve()?.root().to_path_buf();
        let config_dir = Utf8PathBuf::from_path_buf(root).map_err(|p| {
            Error::invalid_config(format!("Config directory is not UTF-8: {}", p.display()))
        })?;
        Ok(Self { config_dir })
    }

    /// Create a loader with a custom config directory
    pub fn with_dir(config_dir: Utf8PathBuf) -> Self {
        Self { config_dir }
    }

    /// Load runtime configuration with hierarchical precedence
    pub fn load_runtime_config(&self) -> Result<RuntimeConfig> {
        let mut config = RuntimeConfig::default();

        let runtime_config_path = self.config_dir.join(RUNTIME_CONFIG_FILE);
        if runtime_config_path.exists() {
            debug!("Loading runtime config from {}", runtime_config_path);
            config = self.load_yaml_file::<RuntimeConfig>(&runtime_config_path)?;
        }

        self.apply_env_overrides(config)
    }

    /// Load a YAML file and parse it
    fn load_yaml_file<T: DeserializeOwned>(&self, path: &Utf8Path) -> Result<T> {
        let content = fs::read_to_string(path)?;
        let config: T = serde_yaml_ng::from_str(&content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse {}: {}", path, e)))?;
        Ok(config)
    }

    /// Apply environment variable overrides to runtime config
    fn apply_env_overrides(&self, mut config: RuntimeConfig) -> Result<RuntimeConfig> {
        if let Some(val) = parse_env("MACHPAY_HTTP_TIMEOUT_SECS")? {
            config.network.http_timeout_secs = val;
        }

        if let Some(val) = parse_env("MACHPAY_DOWNLOAD_TIMEOUT_SECS")? {
            config.network.download_timeout_secs = val;
        }

        if let Ok(val) = env::var("MACHPAY_REGISTRY_API_URL") {
            config.registry.api_url = val.trim_end_matches('/').to_string();
        }

        if let Ok(val) = env::var("MACHPAY_GATEWAY_REPO") {
            if !val.contains('/') {
                return Err(Error::invalid_config(
                    "MACHPAY_GATEWAY_REPO must be in owner/name form",
                ));
            }
            config.registry.repository = val;
        }

        if let Some(val) = parse_env("MACHPAY_GATEWAY_PORT")? {
            config.gateway.port = val;
        }

        Ok(config)
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }
}

fn parse_env<T: FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(val) => val
            .parse()
            .map(Some)
            .map_err(|_| Error::invalid_config(format!("{} must be a valid number", name))),
        Err(_) => Ok(None),
    }
}
