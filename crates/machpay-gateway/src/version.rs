//! Gateway version parsing and comparison

use semver::Version;

use crate::error::{GatewayError, Result};

/// Strip a single leading `v` from a version or tag
pub fn normalize(version: &str) -> &str {
    let version = version.trim();
    version.strip_prefix('v').unwrap_or(version)
}

/// Extract the version from a binary's `--version` output
///
/// Accepts `machpay-gateway v1.2.0`, `machpay-gateway version 1.2.0 (abc123)`
/// or a bare `1.2.0`. The first whitespace-separated token that looks like a
/// version wins; the leading `v` is dropped.
pub fn parse_version_output(output: &str) -> Result<String> {
    output
        .split_whitespace()
        .map(|token| normalize(token.trim_matches(|c: char| c == ',' || c == '(' || c == ')')))
        .find(|token| looks_like_version(token))
        .map(String::from)
        .ok_or_else(|| GatewayError::VersionParse {
            output: output.trim().to_string(),
        })
}

fn looks_like_version(token: &str) -> bool {
    if Version::parse(token).is_ok() {
        return true;
    }
    // Accept short forms like "1.2" that semver rejects
    token.starts_with(|c: char| c.is_ascii_digit()) && token.contains('.')
}

/// Whether `latest` should replace `installed`
///
/// Both sides are compared as semantic versions when they parse; otherwise
/// any difference counts as an update.
pub fn is_update_available(installed: &str, latest: &str) -> bool {
    let installed = normalize(installed);
    let latest = normalize(latest);

    match (Version::parse(installed), Version::parse(latest)) {
        (Ok(current), Ok(candidate)) => candidate > current,
        _ => installed != latest,
    }
}
