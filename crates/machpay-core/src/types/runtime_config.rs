//! Runtime configuration types for operational parameters
//!
//! These types define configuration that controls runtime behavior like
//! network timeouts, the release registry location and gateway supervision.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Complete runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RuntimeConfig {
    /// Network and HTTP configuration
    #[serde(default)]
    pub network: NetworkConfig,

    /// Release registry settings
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Gateway supervision settings
    #[serde(default)]
    pub gateway: GatewaySettings,
}

/// Network and HTTP configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkConfig {
    /// Timeout for registry API calls in seconds
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// Download timeout in seconds
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,

    /// User agent string for HTTP requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl NetworkConfig {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: default_http_timeout(),
            download_timeout_secs: default_download_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_http_timeout() -> u64 {
    30
}
fn default_download_timeout() -> u64 {
    600 // 10 minutes
}
fn default_user_agent() -> String {
    format!(
        "machpay-cli/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

/// Release registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RegistryConfig {
    /// Base URL for the registry API
    #[serde(default = "default_registry_api_url")]
    pub api_url: String,

    /// Repository hosting gateway releases, as `owner/name`
    #[serde(default = "default_repository")]
    pub repository: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            api_url: default_registry_api_url(),
            repository: default_repository(),
        }
    }
}

fn default_registry_api_url() -> String {
    "https://api.github.com".to_string()
}
fn default_repository() -> String {
    "machpay/machpay-gateway".to_string()
}

/// Gateway supervision settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GatewaySettings {
    /// Default listen port passed to the gateway
    #[serde(default = "default_port")]
    pub port: u16,

    /// Timeout of a single health probe in seconds
    #[serde(default = "default_health_timeout")]
    pub health_timeout_secs: u64,

    /// Interval between health probes while waiting for startup
    #[serde(default = "default_health_poll_interval")]
    pub health_poll_interval_ms: u64,

    /// Grace period between SIGTERM and SIGKILL on stop
    #[serde(default = "default_stop_grace")]
    pub stop_grace_secs: u64,

    /// How long a detached start waits for the gateway to become healthy
    #[serde(default = "default_startup_timeout")]
    pub startup_timeout_secs: u64,
}

impl GatewaySettings {
    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_secs)
    }

    pub fn health_poll_interval(&self) -> Duration {
        Duration::from_millis(self.health_poll_interval_ms)
    }

    pub fn stop_grace(&self) -> Duration {
        Duration::from_secs(self.stop_grace_secs)
    }

    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            port: default_port(),
            health_timeout_secs: default_health_timeout(),
            health_poll_interval_ms: default_health_poll_interval(),
            stop_grace_secs: default_stop_grace(),
            startup_timeout_secs: default_startup_timeout(),
        }
    }
}

fn default_port() -> u16 {
    8402
}
fn default_health_timeout() -> u64 {
    5
}
fn default_health_poll_interval() -> u64 {
    500
}
fn default_stop_grace() -> u64 {
    10
}
fn default_startup_timeout() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_config_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.network.http_timeout_secs, 30);
        assert_eq!(config.network.download_timeout_secs, 600);
        assert_eq!(config.registry.api_url, "https://api.github.com");
        assert_eq!(config.registry.repository, "machpay/machpay-gateway");
        assert_eq!(config.gateway.port, 8402);
        assert_eq!(config.gateway.stop_grace(), Duration::from_secs(10));
    }

    #[test]
    fn test_user_agent_identifies_cli() {
        let config = NetworkConfig::default();
        assert!(config.user_agent.starts_with("machpay-cli/"));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "gateway:\n  port: 9000\n";
        let config: RuntimeConfig = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(config.gateway.port, 9000);
        assert_eq!(config.gateway.health_poll_interval_ms, 500);
        assert_eq!(config.network.http_timeout_secs, 30);
    }
}
