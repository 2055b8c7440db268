//! Release registry client

use chrono::{DateTime, Utc};
use machpay_core::types::{NetworkConfig, RegistryConfig};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::error::{GatewayError, Result};

/// Media type the registry expects for release metadata
pub const REGISTRY_ACCEPT: &str = "application/vnd.github.v3+json";

/// Release information
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    /// Release tag (e.g., "v1.2.0")
    pub tag_name: String,

    /// Display name
    #[serde(default)]
    pub name: Option<String>,

    /// Release notes
    #[serde(default)]
    pub body: Option<String>,

    #[serde(default)]
    pub prerelease: bool,

    #[serde(default)]
    pub draft: bool,

    /// Release assets
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,

    /// Published date
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

impl Release {
    /// Tag without the leading `v`
    pub fn version(&self) -> &str {
        self.tag_name.strip_prefix('v').unwrap_or(&self.tag_name)
    }

    /// Look up an asset by exact file name
    pub fn asset(&self, name: &str) -> Option<&ReleaseAsset> {
        self.assets.iter().find(|a| a.name == name)
    }
}

/// Release asset
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    /// Asset name
    pub name: String,

    /// Download URL
    pub browser_download_url: String,

    /// Asset size in bytes
    #[serde(default)]
    pub size: u64,
}

/// Client for the registry's release endpoints
#[derive(Debug, Clone)]
pub struct ReleaseManager {
    client: reqwest::Client,
    registry: RegistryConfig,
}

impl ReleaseManager {
    /// Create a release manager with its own HTTP client
    pub fn new(network: &NetworkConfig, registry: RegistryConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(REGISTRY_ACCEPT));

        let client = reqwest::Client::builder()
            .user_agent(&network.user_agent)
            .default_headers(headers)
            .timeout(network.http_timeout())
            .build()
            .map_err(|e| GatewayError::http("create HTTP client", e))?;

        Ok(Self::with_client(client, registry))
    }

    /// Create a release manager around an existing client
    pub fn with_client(client: reqwest::Client, registry: RegistryConfig) -> Self {
        Self { client, registry }
    }

    pub fn repository(&self) -> &str {
        &self.registry.repository
    }

    /// Get latest release
    pub async fn get_latest(&self) -> Result<Release> {
        let url = format!(
            "{}/repos/{}/releases/latest",
            self.registry.api_url, self.registry.repository
        );
        let what = format!("releases for {}", self.registry.repository);
        self.fetch(&url, what).await
    }

    /// Get release by tag
    pub async fn get_release(&self, tag: &str) -> Result<Release> {
        let url = format!(
            "{}/repos/{}/releases/tags/{}",
            self.registry.api_url, self.registry.repository, tag
        );
        self.fetch(&url, format!("release {}", tag)).await
    }

    async fn fetch(&self, url: &str, what: String) -> Result<Release> {
        debug!("Fetching release metadata from: {}", url);

        let response = self
            .client
            .get(url)
            .header(ACCEPT, REGISTRY_ACCEPT)
            .send()
            .await
            .map_err(|e| GatewayError::http("fetch release", e))?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => return Err(GatewayError::not_found(what)),
            status => return Err(GatewayError::Registry { status }),
        }

        let body = response
            .text()
            .await
            .map_err(|e| GatewayError::http("read release body", e))?;
        let release: Release = serde_json::from_str(&body)?;

        debug!(
            "Resolved release {} with {} assets",
            release.tag_name,
            release.assets.len()
        );
        Ok(release)
    }
}
