//! Read-only view of the user profile file (`~/.machpay/config.yaml`)
//!
//! The file is written by the login and setup flows; this module only
//! reads the fields the gateway commands depend on.

use crate::error::{Error, Result};
use crate::profile::{CredentialStore, Network, ProfileStore, Role};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// User profile as persisted by the login/setup flows
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserConfig {
    #[serde(default)]
    pub role: Option<Role>,

    #[serde(default)]
    pub network: Network,

    #[serde(default)]
    pub auth: AuthSection,

    #[serde(default)]
    pub vendor: VendorSection,

    #[serde(default)]
    pub gateway: GatewaySection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthSection {
    #[serde(default)]
    pub access_token: Option<String>,

    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VendorSection {
    #[serde(default)]
    pub upstream_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewaySection {
    #[serde(default)]
    pub port: Option<u16>,
}

impl UserConfig {
    /// Load the profile; a missing file yields an empty (logged-out) profile
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    pub fn parse(content: &str) -> std::result::Result<Self, serde_yaml_ng::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml_ng::from_str(content)
    }
}

impl CredentialStore for UserConfig {
    fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }

    fn access_token(&self) -> Option<&str> {
        self.auth.access_token.as_deref().filter(|t| !t.is_empty())
    }
}

impl ProfileStore for UserConfig {
    fn role(&self) -> Option<Role> {
        self.role
    }

    fn network(&self) -> Network {
        self.network
    }

    fn upstream_url(&self) -> Option<&str> {
        self.vendor.upstream_url.as_deref().filter(|u| !u.is_empty())
    }

    fn gateway_port(&self) -> Option<u16> {
        self.gateway.port.filter(|p| *p > 0)
    }
}
