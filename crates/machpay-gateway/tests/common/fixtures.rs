//! Release tarballs and fake gateway executables

use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Build a gzip-compressed tarball in memory
pub fn tarball(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));

    for (name, data) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o755);
        header.set_cksum();
        builder.append_data(&mut header, name, *data).unwrap();
    }

    builder.into_inner().unwrap().finish().unwrap()
}

/// A release tarball holding a gateway that reports `version`, plus docs
pub fn gateway_tarball(version: &str) -> Vec<u8> {
    let script = version_script(version);
    tarball(&[
        ("LICENSE", b"MIT"),
        ("machpay-gateway", script.as_bytes()),
    ])
}

/// Shell script answering `--version` with `machpay-gateway v{version}`
pub fn version_script(version: &str) -> String {
    format!(
        "#!/bin/sh\nif [ \"$1\" = \"--version\" ]; then\n  echo \"machpay-gateway v{}\"\n  exit 0\nfi\nexit 1\n",
        version
    )
}

/// Write an executable script at `dir/name`
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    {
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file.sync_all().unwrap();
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    path
}

/// Gateway stand-in that logs its arguments then sleeps
pub const LONG_RUNNING_GATEWAY: &str = "#!/bin/sh\necho \"gateway starting $*\"\nexec sleep 30\n";

/// Gateway stand-in that writes to both streams and exits
pub const CHATTY_GATEWAY: &str =
    "#!/bin/sh\necho \"stdout line $*\"\necho \"stderr line\" >&2\nexit 0\n";

/// Gateway stand-in that fails immediately
pub const FAILING_GATEWAY: &str = "#!/bin/sh\necho \"fatal: bad config\" >&2\nexit 3\n";
