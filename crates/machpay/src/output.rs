//! Terminal output utilities

use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use machpay_gateway::BarRenderer;
use std::io;

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", style("✗").red().bold(), msg);
}

/// Print a warning message
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("⚠").yellow().bold(), msg);
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Print a dimmed hint
pub fn muted(msg: &str) {
    println!("{}", style(msg).dim());
}

/// Print a header
pub fn header(msg: &str) {
    println!("\n{}", style(msg).bold().underlined());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", style(key).dim(), value);
}

/// Create a spinner
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Create a byte-counting bar for gateway downloads
///
/// The installer sets the length and label once the asset size is known.
pub fn download_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::with_template(
        "  {msg}\n  [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
    ) {
        pb.set_style(style.progress_chars("█▓░"));
    }
    pb
}

/// Whether stderr is attached to a terminal that can redraw in place
pub fn stderr_is_term() -> bool {
    Term::stderr().is_term()
}

/// Plain-text download bar for redirected or non-TTY stderr
///
/// Only whole-percentage changes are written, which keeps captured logs short.
pub fn plain_download_bar() -> BarRenderer<io::Stderr> {
    BarRenderer::new(io::stderr())
}

#[cfg(test)]
mod tests {
    use super::*;
    use machpay_gateway::ProgressSink;

    #[test]
    fn test_plain_download_bar_tracks_bytes() {
        let mut bar = plain_download_bar();
        bar.start(2048, "machpay-gateway_linux_amd64.tar.gz");
        bar.advance(1024);
        assert_eq!(bar.percentage(), 50);

        bar.advance(1024);
        bar.finish();
        assert_eq!(bar.current(), 2048);
        assert_eq!(bar.percentage(), 100);
    }

    #[test]
    fn test_download_bar_starts_empty() {
        let bar = download_bar();
        assert_eq!(bar.position(), 0);
        assert_eq!(bar.length(), Some(0));
    }
}
