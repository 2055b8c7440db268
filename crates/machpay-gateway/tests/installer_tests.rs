//! Install pipeline tests against a wiremock registry
//!
//! Tests cover:
//! - Full download, verify and extract
//! - Checksum mismatch leaves the previous install untouched
//! - Missing manifest installs unverified; unusable manifest aborts
//! - Asset selection and size checks
//! - Update checks with a missing, current, stale or broken binary

mod common;

use common::*;
use machpay_gateway::checksum::sha256_hex;
use machpay_gateway::{BarRenderer, GatewayError, NoProgress, Verification};
use serial_test::serial;
use std::fs;
use tempfile::TempDir;
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mount release `tag` with the gateway tarball and, optionally, a manifest
async fn publish_release(server: &MockServer, tag: &str, tarball: &[u8], manifest: Option<&str>) {
    let mut release = ReleaseBuilder::new().tag(tag).asset(
        &server.uri(),
        LINUX_AMD64_ASSET,
        tarball.len() as u64,
    );
    if let Some(manifest) = manifest {
        release = release.asset(&server.uri(), CHECKSUMS_ASSET, manifest.len() as u64);
        mock_asset(server, CHECKSUMS_ASSET, manifest.as_bytes()).await;
    }

    mock_release_tag(server, tag, &release.build()).await;
    mock_asset(server, LINUX_AMD64_ASSET, tarball).await;
}

fn manifest_for(tarball: &[u8]) -> String {
    format!(
        "{}  machpay-gateway_darwin_arm64.tar.gz\n{}  {}\n",
        WRONG_CHECKSUM,
        sha256_hex(tarball),
        LINUX_AMD64_ASSET
    )
}

#[tokio::test]
#[serial]
async fn test_download_installs_verified_binary() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();
    let tarball = gateway_tarball(VERSION_1_2_0);
    publish_release(&server, TAG_V1_2_0, &tarball, Some(&manifest_for(&tarball))).await;

    let installer = installer(&server, &temp.path().join("bin"));
    let mut bar = BarRenderer::new(Vec::new());

    // Version without the leading `v` is normalized to the tag
    let report = installer.download(VERSION_1_2_0, &mut bar).await.unwrap();

    assert_eq!(report.tag, TAG_V1_2_0);
    assert_eq!(report.path, installer.binary_path());
    assert_eq!(report.archive_size, tarball.len() as u64);
    assert_eq!(
        report.verification,
        Verification::Verified {
            sha256: sha256_hex(&tarball)
        }
    );
    assert!(report.is_verified());
    assert!(installer.is_installed());
    assert_eq!(bar.current(), tarball.len() as u64);
    assert_eq!(bar.percentage(), 100);

    let installed = fs::read_to_string(installer.binary_path()).unwrap();
    assert_eq!(installed, version_script(VERSION_1_2_0));

    #[cfg(unix)]
    assert_eq!(installer.installed_version().await.unwrap(), VERSION_1_2_0);
}

#[tokio::test]
#[serial]
async fn test_corrupted_download_is_rejected() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();
    let tarball = gateway_tarball(VERSION_1_2_0);
    let manifest = manifest_for(&tarball);

    let mut corrupted = tarball.clone();
    let middle = corrupted.len() / 2;
    corrupted[middle] ^= 0xff;
    publish_release(&server, TAG_V1_2_0, &corrupted, Some(&manifest)).await;

    let installer = installer(&server, temp.path());
    fs::write(installer.binary_path(), OLD_BINARY_CONTENT).unwrap();

    let err = installer
        .download(TAG_V1_2_0, &mut NoProgress)
        .await
        .unwrap_err();

    match err {
        GatewayError::ChecksumMismatch { expected, actual } => {
            assert_eq!(expected, sha256_hex(&tarball));
            assert_eq!(actual, sha256_hex(&corrupted));
        }
        other => panic!("expected ChecksumMismatch, got {other:?}"),
    }
    assert_eq!(fs::read(installer.binary_path()).unwrap(), OLD_BINARY_CONTENT);
}

#[tokio::test]
#[serial]
async fn test_missing_manifest_installs_unverified() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();
    let tarball = gateway_tarball(VERSION_1_2_0);
    publish_release(&server, TAG_V1_2_0, &tarball, None).await;

    let installer = installer(&server, temp.path());
    let report = installer
        .download(TAG_V1_2_0, &mut NoProgress)
        .await
        .unwrap();

    assert_eq!(report.verification, Verification::Unverified);
    assert!(!report.is_verified());
    assert!(installer.is_installed());
}

#[tokio::test]
#[serial]
async fn test_manifest_without_entry_aborts() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();
    let tarball = gateway_tarball(VERSION_1_2_0);
    let manifest = format!("{}  machpay-gateway_windows_amd64.zip\n", WRONG_CHECKSUM);
    publish_release(&server, TAG_V1_2_0, &tarball, Some(&manifest)).await;

    let installer = installer(&server, temp.path());
    let err = installer
        .download(TAG_V1_2_0, &mut NoProgress)
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::ChecksumManifest { .. }));
    assert!(!installer.is_installed());
}

#[tokio::test]
#[serial]
async fn test_unreachable_manifest_aborts() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();
    let tarball = gateway_tarball(VERSION_1_2_0);

    // Manifest is listed but its download URL answers 404
    let release = ReleaseBuilder::new()
        .tag(TAG_V1_2_0)
        .asset(&server.uri(), LINUX_AMD64_ASSET, tarball.len() as u64)
        .asset(&server.uri(), CHECKSUMS_ASSET, 100)
        .build();
    mock_release_tag(&server, TAG_V1_2_0, &release).await;
    mock_asset(&server, LINUX_AMD64_ASSET, &tarball).await;
    mock_status(&server, "/download/checksums.txt", 404).await;

    let installer = installer(&server, temp.path());
    let err = installer
        .download(TAG_V1_2_0, &mut NoProgress)
        .await
        .unwrap_err();

    match err {
        GatewayError::ChecksumManifest { reason } => assert!(reason.contains("404")),
        other => panic!("expected ChecksumManifest, got {other:?}"),
    }
    assert!(!installer.is_installed());
}

#[tokio::test]
async fn test_missing_platform_asset() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();
    let release = ReleaseBuilder::new()
        .tag(TAG_V1_2_0)
        .asset(&server.uri(), "machpay-gateway_darwin_arm64.tar.gz", 10)
        .build();
    mock_release_tag(&server, TAG_V1_2_0, &release).await;

    let installer = installer(&server, temp.path());
    let err = installer
        .download(TAG_V1_2_0, &mut NoProgress)
        .await
        .unwrap_err();

    match err {
        GatewayError::AssetNotFound { os, arch, expected } => {
            assert_eq!(os, "linux");
            assert_eq!(arch, "amd64");
            assert_eq!(expected, LINUX_AMD64_ASSET);
        }
        other => panic!("expected AssetNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unknown_version_is_not_found() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();
    mock_status(&server, &tag_route("v0.0.1"), 404).await;

    let installer = installer(&server, temp.path());
    let err = installer
        .download("0.0.1", &mut NoProgress)
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::NotFound { .. }));
}

#[tokio::test]
#[serial]
async fn test_truncated_download_is_rejected() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();
    let tarball = gateway_tarball(VERSION_1_2_0);

    // Registry advertises more bytes than the asset endpoint delivers
    let release = ReleaseBuilder::new()
        .tag(TAG_V1_2_0)
        .asset(&server.uri(), LINUX_AMD64_ASSET, tarball.len() as u64 + 512)
        .build();
    mock_release_tag(&server, TAG_V1_2_0, &release).await;
    mock_asset(&server, LINUX_AMD64_ASSET, &tarball).await;

    let installer = installer(&server, temp.path());
    let err = installer
        .download(TAG_V1_2_0, &mut NoProgress)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        GatewayError::SizeMismatch { expected, actual, .. }
            if expected == tarball.len() as u64 + 512 && actual == tarball.len() as u64
    ));
    assert!(!installer.is_installed());
}

#[tokio::test]
#[serial]
async fn test_archive_without_gateway() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();
    let tarball = tarball(&[("README.md", b"docs"), ("LICENSE", b"MIT")]);
    publish_release(&server, TAG_V1_2_0, &tarball, None).await;

    let installer = installer(&server, temp.path());
    let err = installer
        .download(TAG_V1_2_0, &mut NoProgress)
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::BinaryNotFoundInArchive));
    assert!(!installer.is_installed());
}

#[tokio::test]
async fn test_needs_update_when_not_installed() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let check = installer(&server, temp.path()).needs_update().await.unwrap();

    assert!(check.needs_update);
    assert_eq!(check.latest, None);
}

#[cfg(unix)]
#[tokio::test]
#[serial]
async fn test_needs_update_compares_versions() {
    let server = MockServer::start().await;
    mock_latest_release(&server, &ReleaseBuilder::new().tag(TAG_V1_2_0).build()).await;

    let temp = TempDir::new().unwrap();
    let installer = installer(&server, temp.path());

    write_script(temp.path(), "machpay-gateway", &version_script("1.0.0"));
    let check = installer.needs_update().await.unwrap();
    assert!(check.needs_update);
    assert_eq!(check.latest.as_deref(), Some(VERSION_1_2_0));

    write_script(temp.path(), "machpay-gateway", &version_script("1.2.0"));
    let check = installer.needs_update().await.unwrap();
    assert!(!check.needs_update);

    // Semantic ordering: 1.10.0 is newer than 1.2.0
    write_script(temp.path(), "machpay-gateway", &version_script("1.10.0"));
    let check = installer.needs_update().await.unwrap();
    assert!(!check.needs_update);
}

#[cfg(unix)]
#[tokio::test]
#[serial]
async fn test_needs_update_surfaces_registry_errors() {
    let server = MockServer::start().await;
    mock_status(&server, &latest_route(), 502).await;

    let temp = TempDir::new().unwrap();
    write_script(temp.path(), "machpay-gateway", &version_script("1.0.0"));

    let err = installer(&server, temp.path())
        .needs_update()
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Registry { .. }));
}

#[cfg(unix)]
#[tokio::test]
#[serial]
async fn test_installed_version_unparseable() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();
    write_script(
        temp.path(),
        "machpay-gateway",
        "#!/bin/sh\necho \"usage: gateway [flags]\"\n",
    );

    let err = installer(&server, temp.path())
        .installed_version()
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::VersionParse { .. }));
}

#[cfg(unix)]
#[tokio::test]
#[serial]
async fn test_installed_version_failing_exit_status() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();
    write_script(
        temp.path(),
        "machpay-gateway",
        "#!/bin/sh\necho \"machpay-gateway v1.2.0\"\nexit 2\n",
    );

    let err = installer(&server, temp.path())
        .installed_version()
        .await
        .unwrap_err();
    match err {
        GatewayError::Exited { status } => assert_eq!(status.code(), Some(2)),
        other => panic!("expected Exited, got {other:?}"),
    }
}

#[cfg(unix)]
#[tokio::test]
#[serial]
async fn test_needs_update_for_broken_binary() {
    let server = MockServer::start().await;
    mock_latest_release(&server, &ReleaseBuilder::new().tag(TAG_V1_2_0).build()).await;

    let temp = TempDir::new().unwrap();
    let installer = installer(&server, temp.path());

    write_script(temp.path(), "machpay-gateway", "#!/bin/sh\necho garbage\n");
    let check = installer.needs_update().await.unwrap();
    assert!(check.needs_update);
    assert_eq!(check.latest.as_deref(), Some(VERSION_1_2_0));

    // A version-looking line from a failing binary is not trusted
    write_script(
        temp.path(),
        "machpay-gateway",
        "#!/bin/sh\necho \"machpay-gateway v1.2.0\"\nexit 1\n",
    );
    let check = installer.needs_update().await.unwrap();
    assert!(check.needs_update);
    assert_eq!(check.latest.as_deref(), Some(VERSION_1_2_0));
}
