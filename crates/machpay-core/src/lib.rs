//! # machpay-core
//!
//! Core library for the MachPay CLI providing:
//! - Runtime configuration with file and environment overrides
//! - The private directory layout (binary, PID and log locations)
//! - Credential and profile store contracts consumed by gateway commands

pub mod config;
pub mod error;
pub mod paths;
pub mod profile;
pub mod types;
pub mod utils;

pub use config::{HierarchicalConfigLoader, UserConfig};
pub use error::{Error, Result};
pub use paths::MachpayPaths;
pub use profile::{CredentialStore, Network, ProfileStore, Role};
pub use utils::get_home_dir;
