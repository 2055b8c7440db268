//! Terminal progress indicators
//!
//! Provides:
//! - [`ProgressSink`]: receiver for download byte counts
//! - [`BarRenderer`]: fixed-width text bar for non-TTY output, redrawn
//!   only when the whole percentage changes
//! - [`ProgressReader`]: byte-counting wrapper for sync and async readers
//! - [`Spinner`]: start/stop wrapper around an indicatif spinner
//! - [`StepProgress`]: `[n/total]` lines for multi-step operations

use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Read, Write};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, ReadBuf};

const BAR_WIDTH: u64 = 40;
const MIB: f64 = 1024.0 * 1024.0;

/// Receives progress for a byte stream of known (or unknown) length
pub trait ProgressSink: Send {
    /// A transfer of `total` bytes is starting (0 = unknown length)
    fn start(&mut self, total: u64, label: &str);

    /// `bytes` more bytes were transferred
    fn advance(&mut self, bytes: u64);

    /// The transfer completed
    fn finish(&mut self);
}

/// Sink that discards all progress
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn start(&mut self, _total: u64, _label: &str) {}
    fn advance(&mut self, _bytes: u64) {}
    fn finish(&mut self) {}
}

impl ProgressSink for ProgressBar {
    fn start(&mut self, total: u64, label: &str) {
        if total > 0 {
            self.set_length(total);
        }
        self.set_position(0);
        self.set_message(label.to_string());
    }

    fn advance(&mut self, bytes: u64) {
        self.inc(bytes);
    }

    fn finish(&mut self) {
        ProgressBar::finish(self);
    }
}

/// Text progress bar written to any [`Write`] sink
///
/// ```text
///   ████████████████████░░░░░░░░░░░░░░░░░░░░  50%  2.0/4.0 MB  (3.1 MB/s)
/// ```
pub struct BarRenderer<W: Write> {
    out: W,
    total: u64,
    current: u64,
    last_pct: u64,
    started: Instant,
}

impl<W: Write> BarRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            total: 0,
            current: 0,
            last_pct: 0,
            started: Instant::now(),
        }
    }

    pub fn current(&self) -> u64 {
        self.current
    }

    pub fn percentage(&self) -> u64 {
        self.last_pct
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn render(&mut self) {
        let filled = (BAR_WIDTH * self.current / self.total).min(BAR_WIDTH) as usize;
        let empty = BAR_WIDTH as usize - filled;
        let bar = format!("{}{}", "█".repeat(filled), "░".repeat(empty));

        let elapsed = self.started.elapsed().as_secs_f64();
        let speed = if elapsed > 0.0 {
            self.current as f64 / elapsed / MIB
        } else {
            0.0
        };

        // Progress output is best effort; a closed terminal must not fail a download
        let _ = write!(
            self.out,
            "\r  {} {:3}%  {:.1}/{:.1} MB  ({:.1} MB/s)",
            bar,
            self.last_pct,
            self.current as f64 / MIB,
            self.total as f64 / MIB,
            speed
        );
        if self.current >= self.total {
            let _ = writeln!(self.out);
        }
        let _ = self.out.flush();
    }
}

impl<W: Write + Send> ProgressSink for BarRenderer<W> {
    fn start(&mut self, total: u64, _label: &str) {
        self.total = total;
        self.current = 0;
        self.last_pct = 0;
        self.started = Instant::now();
    }

    fn advance(&mut self, bytes: u64) {
        self.current += bytes;
        if self.total == 0 {
            return;
        }

        let pct = (self.current.saturating_mul(100) / self.total).min(100);
        if pct != self.last_pct {
            self.last_pct = pct;
            self.render();
        }
    }

    fn finish(&mut self) {
        if self.total > 0 && self.last_pct < 100 {
            self.last_pct = 100;
            self.current = self.total;
            self.render();
        }
    }
}

/// Reader wrapper that reports every read to a [`ProgressSink`]
pub struct ProgressReader<'a, R> {
    inner: R,
    sink: &'a mut dyn ProgressSink,
}

impl<'a, R> ProgressReader<'a, R> {
    pub fn new(inner: R, sink: &'a mut dyn ProgressSink) -> Self {
        Self { inner, sink }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for ProgressReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.sink.advance(n as u64);
        }
        Ok(n)
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for ProgressReader<'_, R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        let before = buf.filled().len();
        let poll = Pin::new(&mut this.inner).poll_read(cx, buf);
        if let Poll::Ready(Ok(())) = &poll {
            let n = buf.filled().len() - before;
            if n > 0 {
                this.sink.advance(n as u64);
            }
        }
        poll
    }
}

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const SPINNER_TICK: Duration = Duration::from_millis(80);

/// Indeterminate progress indicator backed by an indicatif spinner
///
/// `start` on a running spinner and `stop` on a stopped one are no-ops.
pub struct Spinner {
    message: String,
    draw: bool,
    bar: Option<ProgressBar>,
}

impl Spinner {
    /// Spinner drawing to standard error
    pub fn stderr(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            draw: true,
            bar: None,
        }
    }

    /// Spinner that tracks state without drawing anything
    pub fn hidden(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            draw: false,
            bar: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.bar.is_some()
    }

    /// Message of the bar currently on screen, if any
    pub fn message(&self) -> Option<String> {
        self.bar.as_ref().map(|bar| bar.message())
    }

    pub fn start(&mut self) {
        if self.bar.is_some() {
            return;
        }

        let bar = if self.draw {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::default_spinner().template("  {spinner} {msg}") {
            bar.set_style(style.tick_strings(&SPINNER_FRAMES));
        }
        bar.set_message(self.message.clone());
        bar.enable_steady_tick(SPINNER_TICK);
        self.bar = Some(bar);
    }

    /// Stop and print the original message with a status glyph
    pub fn stop(&mut self, success: bool) {
        let message = self.message.clone();
        self.stop_with_message(success, &message);
    }

    /// Stop and print `message` with a status glyph
    pub fn stop_with_message(&mut self, success: bool, message: &str) {
        let Some(bar) = self.bar.take() else {
            return;
        };

        let glyph = if success { "✓" } else { "✗" };
        if let Ok(style) = ProgressStyle::default_spinner().template("  {msg}") {
            bar.set_style(style);
        }
        bar.finish_with_message(format!("{} {}", glyph, message));
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

/// Tracks progress through a fixed number of named steps
pub struct StepProgress<W: Write> {
    out: W,
    total: usize,
    current: usize,
}

impl<W: Write> StepProgress<W> {
    pub fn new(out: W, total: usize) -> Self {
        Self {
            out,
            total,
            current: 0,
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    /// Advance to the next step
    pub fn step(&mut self, name: &str) {
        self.current += 1;
        let _ = writeln!(self.out, "  [{}/{}] {}", self.current, self.total, name);
    }

    pub fn complete(&mut self) {
        let _ = writeln!(self.out, "  ✓ All {} steps complete", self.total);
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
