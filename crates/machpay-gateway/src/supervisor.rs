//! Gateway process supervisor
//!
//! Owns the single gateway instance recorded in the PID file. Whether the
//! gateway is running is always derived from that file plus a liveness
//! probe, never from the file's existence alone, so a crashed gateway
//! reads as stopped.
//!
//! `start`, `stop` and `kill` are expected to be called serially; nothing
//! arbitrates concurrent callers across processes.

use machpay_core::types::GatewaySettings;
use machpay_core::MachpayPaths;
use reqwest::StatusCode;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::time::{sleep, timeout, timeout_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{GatewayError, IoContext, Result};
use crate::pidfile::PidFile;
use crate::process::{self, ProcessControl};

/// Interval between liveness probes while waiting for a graceful stop
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Interval between reads at end of file when following logs
const TAIL_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Supervises the installed gateway executable
#[derive(Debug, Clone)]
pub struct Supervisor {
    binary_path: PathBuf,
    state_dir: PathBuf,
    pid_file: PidFile,
    log_file: PathBuf,
    port: u16,
    upstream: Option<String>,
    debug: bool,
    settings: GatewaySettings,
    control: Arc<dyn ProcessControl>,
    client: reqwest::Client,
}

impl Supervisor {
    /// Create a supervisor for `binary_path` using the standard state files
    pub fn new(
        binary_path: impl Into<PathBuf>,
        paths: &MachpayPaths,
        settings: &GatewaySettings,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.health_timeout())
            .build()
            .map_err(|e| GatewayError::http("create HTTP client", e))?;

        Ok(Self {
            binary_path: binary_path.into(),
            state_dir: paths.state_dir(),
            pid_file: PidFile::new(paths.pid_file()),
            log_file: paths.log_file(),
            port: settings.port,
            upstream: None,
            debug: false,
            settings: settings.clone(),
            control: process::native(),
            client,
        })
    }

    /// Listen port passed as `--port`; 0 omits the flag
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Upstream passed as `--upstream`; empty omits the flag
    pub fn with_upstream(mut self, upstream: impl Into<String>) -> Self {
        let upstream = upstream.into();
        self.upstream = (!upstream.is_empty()).then_some(upstream);
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Replace the platform process control
    pub fn with_process_control(mut self, control: Arc<dyn ProcessControl>) -> Self {
        self.control = control;
        self
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    pub fn pid_file(&self) -> &Path {
        self.pid_file.path()
    }

    pub fn log_file(&self) -> &Path {
        &self.log_file
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn upstream(&self) -> Option<&str> {
        self.upstream.as_deref()
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Gateway command line; each flag only when set
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.port > 0 {
            args.push("--port".to_string());
            args.push(self.port.to_string());
        }

        if let Some(upstream) = &self.upstream {
            args.push("--upstream".to_string());
            args.push(upstream.clone());
        }

        if self.debug {
            args.push("--debug".to_string());
        }

        args
    }

    /// Start the gateway in the background, appending its output to the log
    ///
    /// The child runs in its own process group and outlives this process.
    /// While this process lives, a reaper task waits on the child and
    /// clears the PID file when it exits.
    pub async fn start(&self) -> Result<u32> {
        if let Some(pid) = self.live_pid() {
            return Err(GatewayError::AlreadyRunning { pid });
        }
        self.ensure_state_dir()?;

        let log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)
            .io_context(|| format!("open log file {}", self.log_file.display()))?;
        let log_err = log
            .try_clone()
            .io_context(|| "duplicate log handle".to_string())?;

        let mut command = Command::new(&self.binary_path);
        command
            .args(self.build_args())
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err))
            .kill_on_drop(false);
        process::detach(&mut command);

        let mut child = command
            .spawn()
            .io_context(|| format!("start {}", self.binary_path.display()))?;
        let pid = child_pid(&child)?;

        if let Err(e) = self.pid_file.write(pid) {
            let _ = child.start_kill();
            return Err(e);
        }

        let pid_file = self.pid_file.clone();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) => debug!(pid, %status, "Gateway exited"),
                Err(e) => warn!(pid, "Failed to wait for gateway: {}", e),
            }
            if let Err(e) = pid_file.remove_if(pid) {
                warn!(pid, "Failed to clear PID file: {}", e);
            }
        });

        info!(pid, "Gateway started in background");
        Ok(pid)
    }

    /// Run the gateway attached to the caller's output streams
    ///
    /// Blocks until the gateway exits or `cancel` fires. On cancellation the
    /// gateway is stopped (gracefully, then forcibly after the grace period)
    /// and `Ok(())` is returned. The PID file exists only for the duration
    /// of the call.
    pub async fn start_foreground<O, E>(
        &self,
        cancel: &CancellationToken,
        stdout: &mut O,
        stderr: &mut E,
    ) -> Result<()>
    where
        O: AsyncWrite + Unpin + ?Sized,
        E: AsyncWrite + Unpin + ?Sized,
    {
        if let Some(pid) = self.live_pid() {
            return Err(GatewayError::AlreadyRunning { pid });
        }
        self.ensure_state_dir()?;

        let mut child = Command::new(&self.binary_path)
            .args(self.build_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .io_context(|| format!("start {}", self.binary_path.display()))?;
        let pid = child_pid(&child)?;

        self.pid_file.write(pid)?;
        let _guard = PidFileGuard(&self.pid_file);
        info!(pid, "Gateway started in foreground");

        let child_out = child.stdout.take();
        let child_err = child.stderr.take();

        let outcome = tokio::select! {
            result = async {
                tokio::join!(
                    forward(child_out, stdout),
                    forward(child_err, stderr),
                    child.wait(),
                )
            } => Some(result),
            _ = cancel.cancelled() => None,
        };

        let Some((out, err, status)) = outcome else {
            info!(pid, "Cancellation requested, stopping gateway");
            let _ = self.control.terminate(pid);
            if timeout(self.settings.stop_grace(), child.wait()).await.is_err() {
                warn!(pid, "Gateway ignored terminate, killing");
                child
                    .kill()
                    .await
                    .io_context(|| format!("kill gateway {}", pid))?;
            }
            return Ok(());
        };

        out.io_context(|| "forward gateway stdout".to_string())?;
        err.io_context(|| "forward gateway stderr".to_string())?;
        let status = status.io_context(|| "wait for gateway".to_string())?;

        // A console interrupt reaches the child and the caller together
        if status.success() || cancel.is_cancelled() {
            Ok(())
        } else {
            Err(GatewayError::Exited { status })
        }
    }

    /// Stop the gateway gracefully, escalating to a kill after the grace period
    pub async fn stop(&self) -> Result<()> {
        let pid = self.claim_live_pid()?;
        info!(pid, "Stopping gateway");

        if let Err(e) = self.control.terminate(pid) {
            debug!(pid, "Terminate failed: {}", e);
            self.pid_file.remove()?;
            return Err(GatewayError::NotRunning);
        }

        let deadline = Instant::now() + self.settings.stop_grace();
        while Instant::now() < deadline {
            if !self.control.is_alive(pid) {
                self.pid_file.remove()?;
                info!(pid, "Gateway stopped");
                return Ok(());
            }
            sleep(STOP_POLL_INTERVAL).await;
        }

        warn!(
            pid,
            "Gateway did not exit within {:?}, killing",
            self.settings.stop_grace()
        );
        if let Err(e) = self.control.kill(pid) {
            debug!(pid, "Kill after grace period failed: {}", e);
        }
        self.pid_file.remove()?;
        Ok(())
    }

    /// Kill the gateway immediately
    pub fn kill(&self) -> Result<()> {
        let pid = self.claim_live_pid()?;
        info!(pid, "Killing gateway");

        let result = self.control.kill(pid);
        self.pid_file.remove()?;
        result.map_err(|e| {
            debug!(pid, "Kill failed: {}", e);
            GatewayError::NotRunning
        })
    }

    pub fn is_running(&self) -> bool {
        self.live_pid().is_some()
    }

    /// PID of the running gateway
    pub fn get_pid(&self) -> Result<u32> {
        self.live_pid().ok_or(GatewayError::NotRunning)
    }

    /// Health endpoint probed by [`Supervisor::health_check`]
    pub fn health_url(&self) -> String {
        format!("http://localhost:{}/healthz", self.port)
    }

    /// Probe the health endpoint once
    pub async fn health_check(&self) -> Result<()> {
        let response = self
            .client
            .get(self.health_url())
            .send()
            .await
            .map_err(|e| GatewayError::http("health check failed", e))?;

        match response.status() {
            StatusCode::OK => Ok(()),
            status => Err(GatewayError::Unhealthy { status }),
        }
    }

    /// Poll the health endpoint until it answers 200 or `within` elapses
    ///
    /// The deadline also bounds each in-flight check, so a slow response
    /// cannot push the call past `within`.
    pub async fn wait_for_healthy(&self, within: Duration) -> Result<()> {
        let deadline = Instant::now() + within;

        loop {
            match timeout_at(deadline, self.health_check()).await {
                Ok(Ok(())) => return Ok(()),
                Ok(Err(e)) => debug!("Gateway not healthy yet: {}", e),
                Err(_) => break,
            }

            let now = Instant::now();
            if now >= deadline {
                break;
            }
            sleep(self.settings.health_poll_interval().min(deadline - now)).await;
        }

        Err(GatewayError::HealthCheckTimeout { timeout: within })
    }

    /// Copy the log to `writer`; with `follow`, keep streaming new lines
    /// until `cancel` fires
    pub async fn tail_logs<W>(
        &self,
        cancel: &CancellationToken,
        follow: bool,
        writer: &mut W,
    ) -> Result<()>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let file = match File::open(&self.log_file).await {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(GatewayError::LogNotFound {
                    path: self.log_file.clone(),
                })
            }
            Err(e) => return Err(GatewayError::io("open log file", e)),
        };

        let mut reader = BufReader::new(file);
        tokio::io::copy_buf(&mut reader, writer)
            .await
            .io_context(|| "copy log file".to_string())?;
        writer
            .flush()
            .await
            .io_context(|| "flush log output".to_string())?;

        if !follow {
            return Ok(());
        }

        // Partial lines stay buffered until their newline arrives
        let mut line = Vec::new();
        loop {
            let read = tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                read = reader.read_until(b'\n', &mut line) => {
                    read.io_context(|| "read log file".to_string())?
                }
            };

            if line.ends_with(b"\n") {
                writer
                    .write_all(&line)
                    .await
                    .io_context(|| "write log output".to_string())?;
                writer
                    .flush()
                    .await
                    .io_context(|| "flush log output".to_string())?;
                line.clear();
                continue;
            }

            if read == 0 {
                tokio::select! {
                    _ = cancel.cancelled() => return Ok(()),
                    _ = sleep(TAIL_POLL_INTERVAL) => {}
                }
            }
        }
    }

    /// Truncate the log file to zero length
    pub fn clear_logs(&self) -> Result<()> {
        match OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&self.log_file)
        {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(GatewayError::LogNotFound {
                path: self.log_file.clone(),
            }),
            Err(e) => Err(GatewayError::io("clear log file", e)),
        }
    }

    fn ensure_state_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.state_dir)
            .io_context(|| format!("create state dir {}", self.state_dir.display()))
    }

    fn recorded_pid(&self) -> Option<u32> {
        match self.pid_file.read() {
            Ok(pid) => pid,
            Err(e) => {
                warn!("Ignoring unreadable PID file: {}", e);
                None
            }
        }
    }

    fn live_pid(&self) -> Option<u32> {
        self.recorded_pid()
            .filter(|pid| self.control.is_alive(*pid))
    }

    /// Live recorded PID; a stale or unreadable record is cleared
    fn claim_live_pid(&self) -> Result<u32> {
        match self.pid_file.read() {
            Ok(Some(pid)) if self.control.is_alive(pid) => Ok(pid),
            Ok(Some(pid)) => {
                info!(pid, "Removing stale PID file");
                self.pid_file.remove()?;
                Err(GatewayError::NotRunning)
            }
            Ok(None) => Err(GatewayError::NotRunning),
            Err(GatewayError::InvalidPidFile { .. }) => {
                self.pid_file.remove()?;
                Err(GatewayError::NotRunning)
            }
            Err(e) => Err(e),
        }
    }
}

fn child_pid(child: &tokio::process::Child) -> Result<u32> {
    child.id().ok_or_else(|| {
        GatewayError::io(
            "start gateway",
            io::Error::other("gateway exited before reporting a PID"),
        )
    })
}

async fn forward<R, W>(source: Option<R>, sink: &mut W) -> io::Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + ?Sized,
{
    let Some(mut source) = source else {
        return Ok(0);
    };
    let copied = tokio::io::copy(&mut source, sink).await?;
    sink.flush().await?;
    Ok(copied)
}

/// Removes the PID file when a foreground run ends, however it ends
struct PidFileGuard<'a>(&'a PidFile);

impl Drop for PidFileGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.0.remove() {
            warn!("Failed to remove PID file: {}", e);
        }
    }
}
