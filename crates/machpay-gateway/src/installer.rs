//! Release resolution and install pipeline
//!
//! The installed binary is the only record of what is installed: its
//! presence means "installed" and its `--version` output is the version.

use machpay_core::types::RuntimeConfig;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::archive;
use crate::checksum::{self, ChecksumManifest, CHECKSUM_MANIFEST};
use crate::download::Downloader;
use crate::error::{GatewayError, IoContext, Result};
use crate::platform::Platform;
use crate::progress::ProgressSink;
use crate::releases::{Release, ReleaseManager};
use crate::version;
use crate::BINARY_NAME;

/// How a downloaded artifact was checked before install
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// Digest matched the release's checksum manifest
    Verified { sha256: String },

    /// The release publishes no checksum manifest
    Unverified,
}

/// Outcome of a successful install
#[derive(Debug, Clone)]
pub struct InstallReport {
    /// Installed release tag (e.g., "v1.2.0")
    pub tag: String,

    /// Where the executable now lives
    pub path: PathBuf,

    /// Downloaded archive size in bytes
    pub archive_size: u64,

    pub verification: Verification,
}

impl InstallReport {
    pub fn is_verified(&self) -> bool {
        matches!(self.verification, Verification::Verified { .. })
    }
}

/// Result of comparing the installed binary against the latest release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCheck {
    pub needs_update: bool,

    /// Latest release version, absent when nothing is installed yet
    pub latest: Option<String>,
}

/// Resolves, verifies and installs gateway releases
#[derive(Debug, Clone)]
pub struct Installer {
    install_dir: PathBuf,
    platform: Platform,
    releases: ReleaseManager,
    downloader: Downloader,
}

impl Installer {
    /// Create an installer for `install_dir` from runtime configuration
    pub fn new(install_dir: impl Into<PathBuf>, config: &RuntimeConfig) -> Result<Self> {
        let releases = ReleaseManager::new(&config.network, config.registry.clone())?;
        let downloader = Downloader::new(&config.network)?;
        Ok(Self::from_parts(install_dir, releases, downloader))
    }

    /// Assemble an installer from pre-built clients
    pub fn from_parts(
        install_dir: impl Into<PathBuf>,
        releases: ReleaseManager,
        downloader: Downloader,
    ) -> Self {
        Self {
            install_dir: install_dir.into(),
            platform: Platform::current(),
            releases,
            downloader,
        }
    }

    /// Install for a platform other than the host
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// Fixed install path of the gateway executable
    pub fn binary_path(&self) -> PathBuf {
        self.install_dir.join(format!(
            "{}{}",
            BINARY_NAME,
            self.platform.executable_extension()
        ))
    }

    pub fn is_installed(&self) -> bool {
        self.binary_path().is_file()
    }

    /// Ask the installed binary for its version
    pub async fn installed_version(&self) -> Result<String> {
        if !self.is_installed() {
            return Err(GatewayError::NotInstalled);
        }

        let path = self.binary_path();
        let output = Command::new(&path)
            .arg("--version")
            .output()
            .await
            .io_context(|| format!("run {} --version", path.display()))?;
        if !output.status.success() {
            return Err(GatewayError::Exited {
                status: output.status,
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let text = if stdout.trim().is_empty() {
            String::from_utf8_lossy(&output.stderr)
        } else {
            stdout
        };

        version::parse_version_output(&text)
    }

    pub async fn get_latest_release(&self) -> Result<Release> {
        self.releases.get_latest().await
    }

    pub async fn get_release(&self, tag: &str) -> Result<Release> {
        self.releases.get_release(tag).await
    }

    /// Whether the latest release should be installed
    ///
    /// A missing binary always needs an update and never contacts the
    /// registry, so first installs and upgrades share one path. A binary
    /// that cannot report its version needs an update too; the latest
    /// release is still resolved so it can be reinstalled.
    pub async fn needs_update(&self) -> Result<UpdateCheck> {
        let installed = match self.installed_version().await {
            Ok(v) => Some(v),
            Err(GatewayError::NotInstalled) => {
                return Ok(UpdateCheck {
                    needs_update: true,
                    latest: None,
                })
            }
            Err(e) => {
                warn!("Installed gateway did not report a version: {}", e);
                None
            }
        };

        let latest = self.get_latest_release().await?;
        let latest_version = latest.version().to_string();
        let Some(installed) = installed else {
            return Ok(UpdateCheck {
                needs_update: true,
                latest: Some(latest_version),
            });
        };
        let needs_update = version::is_update_available(&installed, &latest_version);

        debug!(
            "Installed {} / latest {}: update needed = {}",
            installed, latest_version, needs_update
        );
        Ok(UpdateCheck {
            needs_update,
            latest: Some(latest_version),
        })
    }

    /// Download, verify and install release `version`
    ///
    /// 1. Resolve the release and the platform asset
    /// 2. Load the checksum manifest, if the release publishes one
    /// 3. Stream the asset to a temporary directory
    /// 4. Compare digests; any mismatch aborts before the install path is touched
    /// 5. Extract the executable and rename it into place
    pub async fn download(
        &self,
        version: &str,
        progress: &mut dyn ProgressSink,
    ) -> Result<InstallReport> {
        let tag = normalize_tag(version);
        let asset_name = self.platform.asset_name(BINARY_NAME);

        let release = self.get_release(&tag).await?;
        let asset = release
            .asset(&asset_name)
            .ok_or_else(|| GatewayError::AssetNotFound {
                os: self.platform.os().to_string(),
                arch: self.platform.arch().to_string(),
                expected: asset_name.clone(),
            })?;

        let expected = self.expected_checksum(&release, &asset_name).await?;

        let staging = TempDir::new().io_context(|| "create download directory".to_string())?;
        let downloaded = self
            .downloader
            .download_to(asset, staging.path(), progress)
            .await?;

        let verification = match expected {
            Some(expected) => {
                let actual = checksum::verify_checksum(&downloaded.path, &expected)?;
                info!("Checksum verified for {}", asset_name);
                Verification::Verified { sha256: actual }
            }
            None => {
                warn!(
                    "Release {} publishes no {}; installing {} unverified",
                    tag, CHECKSUM_MANIFEST, asset_name
                );
                Verification::Unverified
            }
        };

        let binary_path = self.binary_path();
        archive::extract_binary(&downloaded.path, BINARY_NAME, &binary_path)?;

        info!("Installed {} at {}", tag, binary_path.display());
        Ok(InstallReport {
            tag,
            path: binary_path,
            archive_size: downloaded.size,
            verification,
        })
    }

    /// Digest for `asset_name` from the release manifest
    ///
    /// `None` only when the release has no manifest asset. A manifest that is
    /// listed but cannot be fetched, or that omits the asset, is an error.
    async fn expected_checksum(
        &self,
        release: &Release,
        asset_name: &str,
    ) -> Result<Option<String>> {
        let Some(manifest_asset) = release.asset(CHECKSUM_MANIFEST) else {
            return Ok(None);
        };

        let text = self
            .downloader
            .fetch_text(&manifest_asset.browser_download_url)
            .await
            .map_err(|e| GatewayError::ChecksumManifest {
                reason: e.to_string(),
            })?;

        let manifest = ChecksumManifest::parse(&text);
        manifest
            .lookup(asset_name)
            .map(|digest| Some(digest.to_string()))
            .ok_or_else(|| GatewayError::ChecksumManifest {
                reason: format!("no entry for {}", asset_name),
            })
    }
}

/// Registry tags carry a leading `v`
fn normalize_tag(version: &str) -> String {
    let version = version.trim();
    if version.starts_with('v') {
        version.to_string()
    } else {
        format!("v{}", version)
    }
}
