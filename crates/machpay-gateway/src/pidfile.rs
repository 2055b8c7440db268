//! PID file: the single record of which gateway process is supervised
//!
//! Plain text, one decimal process ID. Writes go through a temporary file
//! in the same directory and a rename, so readers never see a partial ID.
//! There is no file lock: one supervisor per user at a time is assumed.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::error::{GatewayError, IoContext, Result};

#[derive(Debug, Clone)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Recorded PID, or `None` when no PID file exists
    pub fn read(&self) -> Result<Option<u32>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(GatewayError::io(
                    format!("read PID file {}", self.path.display()),
                    e,
                ))
            }
        };

        content
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|_| GatewayError::InvalidPidFile {
                path: self.path.clone(),
                content: content.trim().to_string(),
            })
    }

    pub fn write(&self, pid: u32) -> Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).io_context(|| format!("create {}", dir.display()))?;

        let mut staged = NamedTempFile::new_in(dir)
            .io_context(|| format!("create temp file in {}", dir.display()))?;
        write!(staged, "{}", pid).io_context(|| "write PID".to_string())?;
        staged
            .persist(&self.path)
            .map_err(|e| GatewayError::io(format!("write {}", self.path.display()), e.error))?;
        Ok(())
    }

    /// Delete the PID file; a missing file is not an error
    pub fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(GatewayError::io(
                format!("remove {}", self.path.display()),
                e,
            )),
        }
    }

    /// Delete the PID file only while it still records `pid`
    ///
    /// Returns whether the file was removed.
    pub fn remove_if(&self, pid: u32) -> Result<bool> {
        match self.read() {
            Ok(Some(recorded)) if recorded == pid => self.remove().map(|()| true),
            Ok(_) | Err(GatewayError::InvalidPidFile { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn pid_file(temp: &TempDir) -> PidFile {
        PidFile::new(temp.path().join("state").join("gateway.pid"))
    }

    #[test]
    fn test_write_then_read() {
        let temp = TempDir::new().unwrap();
        let pid_file = pid_file(&temp);

        assert_eq!(pid_file.read().unwrap(), None);
        pid_file.write(4242).unwrap();
        assert_eq!(pid_file.read().unwrap(), Some(4242));
        assert_eq!(fs::read_to_string(pid_file.path()).unwrap(), "4242");

        pid_file.write(17).unwrap();
        assert_eq!(pid_file.read().unwrap(), Some(17));
    }

    #[test]
    fn test_read_tolerates_whitespace() {
        let temp = TempDir::new().unwrap();
        let pid_file = PidFile::new(temp.path().join("gateway.pid"));
        fs::write(pid_file.path(), "  123\n").unwrap();
        assert_eq!(pid_file.read().unwrap(), Some(123));
    }

    #[test]
    fn test_read_rejects_garbage() {
        let temp = TempDir::new().unwrap();
        let pid_file = PidFile::new(temp.path().join("gateway.pid"));
        fs::write(pid_file.path(), "not-a-pid").unwrap();

        let err = pid_file.read().unwrap_err();
        assert!(matches!(err, GatewayError::InvalidPidFile { ref content, .. } if content == "not-a-pid"));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let pid_file = pid_file(&temp);
        pid_file.write(1).unwrap();

        pid_file.remove().unwrap();
        pid_file.remove().unwrap();
        assert!(!pid_file.path().exists());
    }

    #[test]
    fn test_remove_if_only_matching_pid() {
        let temp = TempDir::new().unwrap();
        let pid_file = pid_file(&temp);
        pid_file.write(200).unwrap();

        assert!(!pid_file.remove_if(100).unwrap());
        assert_eq!(pid_file.read().unwrap(), Some(200));

        assert!(pid_file.remove_if(200).unwrap());
        assert_eq!(pid_file.read().unwrap(), None);
        assert!(!pid_file.remove_if(200).unwrap());
    }
}
