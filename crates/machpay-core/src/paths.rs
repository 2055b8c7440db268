//! Well-known locations under the private per-user directory
//!
//! Layout (default root `~/.machpay`, relocatable with `MACHPAY_HOME`):
//!
//! ```text
//! ~/.machpay/
//!   bin/machpay-gateway    installed gateway binary
//!   gateway.pid            PID of the supervised gateway
//!   gateway.log            detached gateway output
//!   config.yaml            user profile (written by login/setup)
//!   runtime.yaml           optional runtime overrides
//! ```

use crate::error::Result;
use crate::utils::get_home_dir;
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable that relocates the whole private directory
pub const HOME_ENV: &str = "MACHPAY_HOME";

const DIR_NAME: &str = ".machpay";
const PID_FILE: &str = "gateway.pid";
const LOG_FILE: &str = "gateway.log";
const USER_CONFIG_FILE: &str = "config.yaml";
const RUNTIME_CONFIG_FILE: &str = "runtime.yaml";

/// Resolved private directories for one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachpayPaths {
    root: PathBuf,
}

impl MachpayPaths {
    /// Resolve from `MACHPAY_HOME`, falling back to `~/.machpay`
    pub fn resolve() -> Result<Self> {
        if let Ok(root) = env::var(HOME_ENV) {
            if !root.is_empty() {
                return Ok(Self::with_root(root));
            }
        }
        Ok(Self::with_root(get_home_dir()?.join(DIR_NAME)))
    }

    /// Use an explicit root directory
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding installed executables
    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    /// Directory holding runtime state (PID and log files)
    pub fn state_dir(&self) -> PathBuf {
        self.root.clone()
    }

    pub fn pid_file(&self) -> PathBuf {
        self.state_dir().join(PID_FILE)
    }

    pub fn log_file(&self) -> PathBuf {
        self.state_dir().join(LOG_FILE)
    }

    pub fn user_config_file(&self) -> PathBuf {
        self.root.join(USER_CONFIG_FILE)
    }

    pub fn runtime_config_file(&self) -> PathBuf {
        self.root.join(RUNTIME_CONFIG_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_layout_under_root() {
        let paths = MachpayPaths::with_root("/tmp/mp");
        assert_eq!(paths.bin_dir(), PathBuf::from("/tmp/mp/bin"));
        assert_eq!(paths.pid_file(), PathBuf::from("/tmp/mp/gateway.pid"));
        assert_eq!(paths.log_file(), PathBuf::from("/tmp/mp/gateway.log"));
        assert_eq!(
            paths.user_config_file(),
            PathBuf::from("/tmp/mp/config.yaml")
        );
    }

    #[test]
    #[serial]
    fn test_resolve_honours_machpay_home() {
        env::set_var(HOME_ENV, "/tmp/relocated");
        let paths = MachpayPaths::resolve().unwrap();
        env::remove_var(HOME_ENV);

        assert_eq!(paths.root(), Path::new("/tmp/relocated"));
    }

    #[test]
    #[serial]
    fn test_resolve_defaults_to_dot_machpay() {
        env::remove_var(HOME_ENV);
        if env::var("HOME").is_ok() {
            let paths = MachpayPaths::resolve().unwrap();
            assert!(paths.root().ends_with(".machpay"));
        }
    }
}
