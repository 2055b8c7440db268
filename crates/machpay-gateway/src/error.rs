//! Error types for gateway install and supervision

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias using the gateway error type
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Errors surfaced by the installer and the process supervisor
#[derive(Error, Debug)]
pub enum GatewayError {
    /// No gateway binary at the install path
    #[error("gateway is not installed")]
    NotInstalled,

    /// A live gateway is already recorded in the PID file
    #[error("gateway is already running (PID {pid})")]
    AlreadyRunning { pid: u32 },

    /// No live gateway is recorded in the PID file
    #[error("gateway is not running")]
    NotRunning,

    /// The release has no asset for this platform
    #[error("no asset found for {os}/{arch} (looking for {expected})")]
    AssetNotFound {
        os: String,
        arch: String,
        expected: String,
    },

    /// Downloaded bytes do not match the checksum manifest
    #[error("checksum mismatch:\n  expected: {expected}\n  got:      {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    /// A checksum manifest was published but could not be used
    #[error("checksum manifest unusable: {reason}")]
    ChecksumManifest { reason: String },

    /// Downloaded size differs from the size the registry advertised
    #[error("size mismatch for {asset}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        asset: String,
        expected: u64,
        actual: u64,
    },

    /// The archive contained no entry named like the gateway binary
    #[error("binary not found in archive")]
    BinaryNotFoundInArchive,

    /// The asset uses an archive format this installer cannot unpack
    #[error("unsupported archive format: {name}")]
    UnsupportedArchive { name: String },

    /// Registry answered 404
    #[error("{what} not found")]
    NotFound { what: String },

    /// Registry answered with any other non-success status
    #[error("registry error: {status}")]
    Registry { status: reqwest::StatusCode },

    /// Registry body could not be decoded
    #[error("parse release: {0}")]
    Parse(#[from] serde_json::Error),

    /// The installed binary printed something that is not a version
    #[error("unable to parse version from: {output}")]
    VersionParse { output: String },

    /// Health endpoint answered with a non-200 status
    #[error("health check returned {status}")]
    Unhealthy { status: reqwest::StatusCode },

    /// Gateway did not become healthy in time
    #[error("gateway did not become healthy within {timeout:?}")]
    HealthCheckTimeout { timeout: Duration },

    /// Log file does not exist
    #[error("log file not found: {}", path.display())]
    LogNotFound { path: PathBuf },

    /// PID file exists but does not hold a process ID
    #[error("invalid PID file {}: {content:?}", path.display())]
    InvalidPidFile { path: PathBuf, content: String },

    /// Gateway process exited unsuccessfully, in the foreground or while
    /// reporting its version
    #[error("gateway exited with {status}")]
    Exited { status: std::process::ExitStatus },

    /// HTTP transport failure
    #[error("{context}: {source}")]
    Http {
        context: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Filesystem or process I/O failure
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl GatewayError {
    /// Wrap an I/O error with the operation that produced it
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Wrap an HTTP error with the operation that produced it
    pub fn http(context: &'static str, source: reqwest::Error) -> Self {
        Self::Http { context, source }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }
}

/// Attach an operation description to I/O results
pub(crate) trait IoContext<T> {
    fn io_context(self, context: impl FnOnce() -> String) -> Result<T>;
}

impl<T> IoContext<T> for std::io::Result<T> {
    fn io_context(self, context: impl FnOnce() -> String) -> Result<T> {
        self.map_err(|e| GatewayError::io(context(), e))
    }
}
