use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::io;

use super::ProcessControl;

/// POSIX signals: signal 0 probe, SIGTERM, SIGKILL
#[derive(Debug, Default, Clone, Copy)]
pub struct UnixSignals;

impl UnixSignals {
    fn send(pid: u32, signal: Option<Signal>) -> io::Result<()> {
        // PIDs above i32::MAX cannot exist; 0 and negatives would address groups
        let raw = i32::try_from(pid)
            .ok()
            .filter(|raw| *raw > 0)
            .ok_or_else(|| io::Error::from(Errno::ESRCH))?;
        kill(Pid::from_raw(raw), signal).map_err(io::Error::from)
    }
}

impl ProcessControl for UnixSignals {
    fn is_alive(&self, pid: u32) -> bool {
        Self::send(pid, None).is_ok()
    }

    fn terminate(&self, pid: u32) -> io::Result<()> {
        Self::send(pid, Some(Signal::SIGTERM))
    }

    fn kill(&self, pid: u32) -> io::Result<()> {
        Self::send(pid, Some(Signal::SIGKILL))
    }
}
