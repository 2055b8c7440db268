//! SHA256 digests and the release checksum manifest

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{GatewayError, IoContext, Result};

/// Name of the checksum manifest asset attached to each release
pub const CHECKSUM_MANIFEST: &str = "checksums.txt";

/// Chunk size for hashing (1MB)
const HASH_CHUNK_SIZE: usize = 1024 * 1024;

/// Calculate the SHA256 checksum of a file as lowercase hex
pub fn file_sha256(path: &Path) -> Result<String> {
    let mut file =
        File::open(path).io_context(|| format!("open {} for checksum", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; HASH_CHUNK_SIZE];

    loop {
        let bytes_read = file
            .read(&mut buffer)
            .io_context(|| format!("read {} for checksum", path.display()))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// SHA256 of an in-memory buffer as lowercase hex
pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Check a file against an expected hex digest (case-insensitive)
///
/// Returns the file's lowercase digest on a match.
pub fn verify_checksum(path: &Path, expected: &str) -> Result<String> {
    let actual = file_sha256(path)?;
    let expected = expected.trim();
    if actual.eq_ignore_ascii_case(expected) {
        Ok(actual)
    } else {
        Err(GatewayError::ChecksumMismatch {
            expected: expected.to_string(),
            actual,
        })
    }
}

/// Parsed `checksums.txt`: lines of `<hex-digest>  <filename>`
#[derive(Debug, Clone, Default)]
pub struct ChecksumManifest {
    entries: HashMap<String, String>,
}

impl ChecksumManifest {
    /// Parse manifest text; lines that are not `digest filename` are skipped
    pub fn parse(text: &str) -> Self {
        let entries = text
            .lines()
            .filter_map(|line| {
                let mut fields = line.split_whitespace();
                let digest = fields.next()?;
                // sha256sum marks binary mode with a leading '*'
                let name = fields.next()?.trim_start_matches('*');
                Some((name.to_string(), digest.to_ascii_lowercase()))
            })
            .collect();
        Self { entries }
    }

    /// Digest recorded for `file_name`, if any
    pub fn lookup(&self, file_name: &str) -> Option<&str> {
        self.entries.get(file_name).map(String::as_str)
    }
}
