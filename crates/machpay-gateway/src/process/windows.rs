use std::io;
use std::sync::Mutex;
use sysinfo::{Pid, ProcessesToUpdate, System};

use super::ProcessControl;

/// Process table lookups through `sysinfo`
///
/// Windows has no graceful console signal for detached processes, so
/// `terminate` is the same forced kill as `kill`.
#[derive(Debug, Default)]
pub struct WindowsControl {
    system: Mutex<System>,
}

impl WindowsControl {
    fn with_process<T>(&self, pid: u32, f: impl FnOnce(Option<&sysinfo::Process>) -> T) -> T {
        let pid = Pid::from_u32(pid);
        match self.system.lock() {
            Ok(mut system) => {
                system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
                f(system.process(pid))
            }
            Err(_) => f(None),
        }
    }
}

impl ProcessControl for WindowsControl {
    fn is_alive(&self, pid: u32) -> bool {
        self.with_process(pid, |process| process.is_some())
    }

    fn terminate(&self, pid: u32) -> io::Result<()> {
        self.kill(pid)
    }

    fn kill(&self, pid: u32) -> io::Result<()> {
        self.with_process(pid, |process| match process {
            Some(process) if process.kill() => Ok(()),
            Some(_) => Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("unable to terminate process {}", pid),
            )),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no process with PID {}", pid),
            )),
        })
    }
}
