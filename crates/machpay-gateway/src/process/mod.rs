//! Platform process control
//!
//! The supervisor only needs three capabilities from the OS: a liveness
//! probe that has no effect on the target, a graceful terminate and a
//! forced kill. One implementation per platform family is selected at
//! compile time.

use std::fmt;
use std::io;
use std::sync::Arc;
use tokio::process::Command;

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
pub use unix::UnixSignals as NativeControl;
#[cfg(windows)]
pub use windows::WindowsControl as NativeControl;

/// Signal-level control over an arbitrary process ID
pub trait ProcessControl: Send + Sync + fmt::Debug {
    /// Whether `pid` names a live process; never affects the process
    fn is_alive(&self, pid: u32) -> bool;

    /// Ask the process to shut down
    fn terminate(&self, pid: u32) -> io::Result<()>;

    /// Terminate the process immediately
    fn kill(&self, pid: u32) -> io::Result<()>;
}

/// Process control for the host platform
pub fn native() -> Arc<dyn ProcessControl> {
    Arc::new(NativeControl::default())
}

/// Configure `command` so the child outlives the launching process
pub(crate) fn detach(command: &mut Command) {
    #[cfg(unix)]
    {
        command.process_group(0);
    }

    #[cfg(windows)]
    {
        const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
        const DETACHED_PROCESS: u32 = 0x0000_0008;
        command.creation_flags(CREATE_NEW_PROCESS_GROUP | DETACHED_PROCESS);
    }
}
