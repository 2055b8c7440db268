//! Gateway binary lifecycle for the MachPay CLI
//!
//! Provides:
//! - Release resolution against the registry for the host platform
//! - Streaming download with progress and SHA256 manifest verification
//! - Atomic extraction of the gateway executable into the install dir
//! - A PID-file based supervisor: detached and foreground start,
//!   graceful stop with kill escalation, health probes, log tailing
//! - Terminal progress indicators shared by the CLI

pub mod archive;
pub mod checksum;
pub mod download;
pub mod error;
pub mod installer;
pub mod pidfile;
pub mod platform;
pub mod process;
pub mod progress;
pub mod releases;
pub mod supervisor;
pub mod version;

pub use download::{DownloadedAsset, Downloader};
pub use error::{GatewayError, Result};
pub use installer::{InstallReport, Installer, UpdateCheck, Verification};
pub use platform::{ArchiveKind, Platform};
pub use process::ProcessControl;
pub use progress::{BarRenderer, NoProgress, ProgressReader, ProgressSink, Spinner, StepProgress};
pub use releases::{Release, ReleaseAsset, ReleaseManager};
pub use supervisor::Supervisor;

/// File name of the gateway executable (without platform suffix)
pub const BINARY_NAME: &str = "machpay-gateway";
