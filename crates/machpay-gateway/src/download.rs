//! Streaming release asset download
//!
//! Assets are streamed straight to disk through a [`ProgressReader`], so
//! memory use stays flat regardless of archive size.

use futures_util::StreamExt;
use machpay_core::types::NetworkConfig;
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio_util::io::StreamReader;
use tracing::{debug, info};

use crate::error::{GatewayError, IoContext, Result};
use crate::progress::{ProgressReader, ProgressSink};
use crate::releases::ReleaseAsset;

/// A release asset written to local disk
#[derive(Debug, Clone)]
pub struct DownloadedAsset {
    /// Path to the downloaded file
    pub path: PathBuf,

    /// Size of the downloaded file in bytes
    pub size: u64,
}

/// HTTP client for release asset downloads
#[derive(Debug, Clone)]
pub struct Downloader {
    client: reqwest::Client,
}

impl Downloader {
    /// Create a downloader using the configured download timeout
    pub fn new(network: &NetworkConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&network.user_agent)
            .timeout(network.download_timeout())
            .build()
            .map_err(|e| GatewayError::http("create HTTP client", e))?;

        Ok(Self::with_client(client))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Stream `asset` into `dir/<asset name>`, reporting bytes to `progress`
    ///
    /// The expected length comes from `Content-Length`, falling back to the
    /// size the registry advertised. A short or long body is rejected when
    /// the registry advertised a non-zero size.
    pub async fn download_to(
        &self,
        asset: &ReleaseAsset,
        dir: &Path,
        progress: &mut dyn ProgressSink,
    ) -> Result<DownloadedAsset> {
        info!("Downloading {} ({})", asset.name, human_readable_size(asset.size));

        let response = self
            .client
            .get(&asset.browser_download_url)
            .send()
            .await
            .map_err(|e| GatewayError::http("download asset", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Registry { status });
        }

        let total = response
            .content_length()
            .filter(|len| *len > 0)
            .unwrap_or(asset.size);

        let path = dir.join(&asset.name);
        let mut file = tokio::fs::File::create(&path)
            .await
            .io_context(|| format!("create {}", path.display()))?;

        progress.start(total, &asset.name);

        let stream = Box::pin(response.bytes_stream().map(|chunk| chunk.map_err(io::Error::other)));
        let written = {
            let mut reader = ProgressReader::new(StreamReader::new(stream), &mut *progress);
            tokio::io::copy(&mut reader, &mut file)
                .await
                .io_context(|| format!("download {}", asset.name))?
        };
        file.flush()
            .await
            .io_context(|| format!("flush {}", path.display()))?;

        progress.finish();

        if asset.size > 0 && written != asset.size {
            return Err(GatewayError::SizeMismatch {
                asset: asset.name.clone(),
                expected: asset.size,
                actual: written,
            });
        }

        debug!("Downloaded {} bytes to {}", written, path.display());
        Ok(DownloadedAsset {
            path,
            size: written,
        })
    }

    /// Fetch a small text asset such as the checksum manifest
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| GatewayError::http("fetch text asset", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Registry { status });
        }

        response
            .text()
            .await
            .map_err(|e| GatewayError::http("read text asset", e))
    }
}

/// Convert bytes to human-readable size
pub fn human_readable_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}
