//! Release archive extraction

use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io;
use std::path::Path;
use tar::{Archive, EntryType};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{GatewayError, IoContext, Result};
use crate::platform::ArchiveKind;

/// Extract the gateway executable from a downloaded release archive
///
/// Only regular-file entries are considered. The first one whose base name
/// starts with `binary_name` is written next to `destination` and renamed
/// into place, so a failed extraction never leaves a partial binary behind.
pub fn extract_binary(archive_path: &Path, binary_name: &str, destination: &Path) -> Result<()> {
    let file_name = archive_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    match ArchiveKind::from_file_name(file_name) {
        Some(ArchiveKind::TarGz) => extract_from_tarball(archive_path, binary_name, destination),
        _ => Err(GatewayError::UnsupportedArchive {
            name: file_name.to_string(),
        }),
    }
}

fn extract_from_tarball(archive_path: &Path, binary_name: &str, destination: &Path) -> Result<()> {
    debug!("Extracting tarball: {}", archive_path.display());

    let file = File::open(archive_path)
        .io_context(|| format!("open archive {}", archive_path.display()))?;
    let mut archive = Archive::new(GzDecoder::new(file));

    let entries = archive
        .entries()
        .io_context(|| "read archive entries".to_string())?;

    for entry in entries {
        let mut entry = entry.io_context(|| "read archive entry".to_string())?;
        if entry.header().entry_type() != EntryType::Regular {
            continue;
        }

        let path = entry
            .path()
            .io_context(|| "read archive entry path".to_string())?
            .into_owned();
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(binary_name));
        if !matches {
            continue;
        }

        info!("Found binary in archive: {}", path.display());
        return install_entry(&mut entry, destination);
    }

    Err(GatewayError::BinaryNotFoundInArchive)
}

fn install_entry(entry: &mut impl io::Read, destination: &Path) -> Result<()> {
    let install_dir = destination.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(install_dir)
        .io_context(|| format!("create install dir {}", install_dir.display()))?;

    let mut staged = NamedTempFile::new_in(install_dir)
        .io_context(|| format!("create temp file in {}", install_dir.display()))?;
    io::copy(entry, staged.as_file_mut()).io_context(|| "write binary".to_string())?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(staged.path(), fs::Permissions::from_mode(0o755))
            .io_context(|| "make binary executable".to_string())?;
    }

    staged
        .persist(destination)
        .map_err(|e| GatewayError::io(format!("install {}", destination.display()), e.error))?;

    debug!("Installed binary at {}", destination.display());
    Ok(())
}
