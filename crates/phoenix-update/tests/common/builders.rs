//! Builder patterns for test data construction

use phoenix_update::registry::{RegistryAsset, RegistryRelease};

use super::constants::*;

/// Builder for registry releases with sensible test defaults
#[derive(Debug, Clone)]
pub struct ReleaseBuilder {
    release: RegistryRelease,
}

impl ReleaseBuilder {
    pub fn new() -> Self {
        Self {
            release: RegistryRelease {
                id: 1,
                tag_name: TAG_V1_3_0.to_string(),
                html_url: format!("https://github.com/{}/releases/tag/{}", SLUG, TAG_V1_3_0),
                ..Default::default()
            },
        }
    }

    /// Set the tag name (and the release page URL with it)
    pub fn tag(mut self, tag: &str) -> Self {
        self.release.tag_name = tag.to_string();
        self.release.html_url = format!("https://github.com/{}/releases/tag/{}", SLUG, tag);
        self
    }

    pub fn id(mut self, id: u64) -> Self {
        self.release.id = id;
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.release.name = Some(name.to_string());
        self
    }

    pub fn body(mut self, body: &str) -> Self {
        self.release.body = Some(body.to_string());
        self
    }

    pub fn draft(mut self) -> Self {
        self.release.draft = true;
        self
    }

    pub fn prerelease(mut self) -> Self {
        self.release.prerelease = true;
        self
    }

    pub fn asset(mut self, asset: RegistryAsset) -> Self {
        self.release.assets.push(asset);
        self
    }

    pub fn build(self) -> RegistryRelease {
        self.release
    }
}

impl Default for ReleaseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for registry assets
#[derive(Debug, Clone)]
pub struct AssetBuilder {
    asset: RegistryAsset,
}

impl AssetBuilder {
    pub fn new(id: u64, name: &str) -> Self {
        Self {
            asset: RegistryAsset {
                id,
                name: name.to_string(),
                size: 0,
                browser_download_url: format!("https://github.com/{}/releases/download/{}", SLUG, name),
            },
        }
    }

    pub fn size(mut self, size: u64) -> Self {
        self.asset.size = size;
        self
    }

    pub fn build(self) -> RegistryAsset {
        self.asset
    }
}
