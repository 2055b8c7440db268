//! Builder for registry release payloads
//!
//! The registry speaks JSON, so releases are built as `serde_json::Value`
//! and served by wiremock rather than constructed as structs.

use serde_json::{json, Value};

use super::constants::*;

#[derive(Debug, Clone)]
pub struct ReleaseBuilder {
    tag_name: String,
    name: Option<String>,
    published_at: Option<String>,
    assets: Vec<Value>,
}

impl ReleaseBuilder {
    pub fn new() -> Self {
        Self {
            tag_name: TAG_V1_2_0.to_string(),
            name: None,
            published_at: None,
            assets: Vec::new(),
        }
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.tag_name = tag.to_string();
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn published_at(mut self, date: &str) -> Self {
        self.published_at = Some(date.to_string());
        self
    }

    /// Add an asset served from `{base_url}/download/{name}`
    pub fn asset(mut self, base_url: &str, name: &str, size: u64) -> Self {
        self.assets.push(json!({
            "name": name,
            "size": size,
            "browser_download_url": asset_url(base_url, name),
        }));
        self
    }

    pub fn build(self) -> Value {
        json!({
            "tag_name": self.tag_name,
            "name": self.name,
            "published_at": self.published_at,
            "prerelease": false,
            "draft": false,
            "assets": self.assets,
        })
    }
}

impl Default for ReleaseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Download URL used for assets added through [`ReleaseBuilder::asset`]
pub fn asset_url(base_url: &str, name: &str) -> String {
    format!("{}/download/{}", base_url, name)
}
