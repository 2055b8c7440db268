//! Wiremock helpers for the release registry and asset downloads

use machpay_core::types::{NetworkConfig, RegistryConfig};
use machpay_gateway::{Downloader, Installer, ReleaseManager};
use serde_json::Value;
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::constants::*;

/// Registry configuration pointing at the mock server
pub fn registry_config(server: &MockServer) -> RegistryConfig {
    RegistryConfig {
        api_url: server.uri(),
        repository: TEST_REPO.to_string(),
    }
}

pub fn release_manager(server: &MockServer) -> ReleaseManager {
    ReleaseManager::new(&NetworkConfig::default(), registry_config(server)).unwrap()
}

/// Installer targeting `install_dir`, the mock registry and [`test_platform`]
pub fn installer(server: &MockServer, install_dir: &Path) -> Installer {
    let downloader = Downloader::new(&NetworkConfig::default()).unwrap();
    Installer::from_parts(install_dir, release_manager(server), downloader)
        .with_platform(test_platform())
}

/// Serve `release` from the "latest release" endpoint
pub async fn mock_latest_release(server: &MockServer, release: &Value) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/{}/releases/latest", TEST_REPO)))
        .respond_with(ResponseTemplate::new(200).set_body_json(release))
        .mount(server)
        .await;
}

/// Serve `release` from the tag endpoint for `tag`
pub async fn mock_release_tag(server: &MockServer, tag: &str, release: &Value) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/{}/releases/tags/{}", TEST_REPO, tag)))
        .respond_with(ResponseTemplate::new(200).set_body_json(release))
        .mount(server)
        .await;
}

/// Answer any request for `route` with a bare status
pub async fn mock_status(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route.to_string()))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Serve asset bytes at the URL [`super::builders::asset_url`] produces
pub async fn mock_asset(server: &MockServer, name: &str, content: &[u8]) {
    Mock::given(method("GET"))
        .and(path(format!("/download/{}", name)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
        .mount(server)
        .await;
}

/// Route of the latest-release endpoint
pub fn latest_route() -> String {
    format!("/repos/{}/releases/latest", TEST_REPO)
}

/// Route of the tag endpoint for `tag`
pub fn tag_route(tag: &str) -> String {
    format!("/repos/{}/releases/tags/{}", TEST_REPO, tag)
}
