//! In-memory release registry
//!
//! Serves a fixed set of releases and asset contents and counts the calls
//! made against it, so tests can assert which network operations happened.

use async_trait::async_trait;
use phoenix_update::registry::{
    Bytes, PageOptions, RegistryError, RegistryRelease, ReleasePage, ReleaseRegistry,
};
use phoenix_update::CancellationToken;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use super::builders::*;
use super::constants::*;
use super::fixtures::*;

#[derive(Default)]
pub struct FakeRegistry {
    /// Listing pages, served in order
    pages: Vec<Vec<RegistryRelease>>,

    /// Asset contents by identifier
    assets: HashMap<u64, Bytes>,

    /// Answer every listing with not-found
    missing_repository: bool,

    /// Assets whose download fails with HTTP 502
    failing_assets: Vec<u64>,

    /// Fired when the first download starts
    cancel_on_download: Option<CancellationToken>,

    next_id: AtomicU64,
    list_calls: AtomicUsize,
    download_calls: AtomicUsize,
}

/// Identifiers of a release published through [`FakeRegistry::publish`]
#[derive(Debug, Clone, Copy)]
pub struct PublishedIds {
    pub asset_id: u64,
    pub validation_id: u64,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self {
            pages: vec![Vec::new()],
            next_id: AtomicU64::new(100),
            ..Default::default()
        }
    }

    /// Add a release with a linux asset holding `binary` and a correct
    /// validation asset
    pub fn publish(self, tag: &str, binary: &[u8]) -> Self {
        let archive = release_archive(binary);
        let digest = digest_of(&archive);
        self.publish_archive(tag, LINUX_ASSET, archive, &digest).0
    }

    /// Like [`publish`](Self::publish) with a validation asset carrying
    /// `digest` instead of the correct one
    pub fn publish_with_digest(self, tag: &str, binary: &[u8], digest: &str) -> Self {
        self.publish_archive(tag, LINUX_ASSET, release_archive(binary), digest).0
    }

    /// Add a release carrying `archive` as `asset_name` and its validation
    /// asset with `digest`
    pub fn publish_archive(
        mut self,
        tag: &str,
        asset_name: &str,
        archive: Vec<u8>,
        digest: &str,
    ) -> (Self, PublishedIds) {
        let asset_id = self.next_id.fetch_add(2, Ordering::SeqCst);
        let validation_id = asset_id + 1;
        let validation_name = format!("{}{}", asset_name, VALIDATION_SUFFIX);

        let release = ReleaseBuilder::new()
            .tag(tag)
            .id(asset_id)
            .name(tag)
            .body("Bug fixes")
            .asset(AssetBuilder::new(asset_id, asset_name).size(archive.len() as u64).build())
            .asset(AssetBuilder::new(validation_id, &validation_name).size(64).build())
            .build();

        self.assets.insert(asset_id, Bytes::from(archive));
        self.assets
            .insert(validation_id, Bytes::from(validation_file(digest, asset_name)));
        self.push_release(release);

        (
            self,
            PublishedIds {
                asset_id,
                validation_id,
            },
        )
    }

    /// Add a raw registry release without contents
    pub fn with_release(mut self, release: RegistryRelease) -> Self {
        self.push_release(release);
        self
    }

    /// Start a new listing page; later releases land on it
    pub fn next_page(mut self) -> Self {
        self.pages.push(Vec::new());
        self
    }

    pub fn missing_repository(mut self) -> Self {
        self.missing_repository = true;
        self
    }

    pub fn failing_asset(mut self, asset_id: u64) -> Self {
        self.failing_assets.push(asset_id);
        self
    }

    pub fn cancel_on_download(mut self, token: CancellationToken) -> Self {
        self.cancel_on_download = Some(token);
        self
    }

    /// Replace the stored content of an asset
    pub fn with_asset_content(mut self, asset_id: u64, content: &[u8]) -> Self {
        self.assets.insert(asset_id, Bytes::copy_from_slice(content));
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn download_calls(&self) -> usize {
        self.download_calls.load(Ordering::SeqCst)
    }

    fn push_release(&mut self, release: RegistryRelease) {
        if let Some(page) = self.pages.last_mut() {
            page.push(release);
        }
    }
}

#[async_trait]
impl ReleaseRegistry for FakeRegistry {
    async fn list_releases(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repo: &str,
        page: PageOptions,
    ) -> Result<ReleasePage, RegistryError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if cancel.is_cancelled() {
            return Err(RegistryError::Cancelled);
        }
        if self.missing_repository || owner != OWNER || repo != REPO {
            return Err(RegistryError::NotFound {
                resource: format!("{}/{} releases", owner, repo),
            });
        }

        let index = page.page.saturating_sub(1) as usize;
        Ok(ReleasePage {
            releases: self.pages.get(index).cloned().unwrap_or_default(),
            has_next: index + 1 < self.pages.len(),
        })
    }

    async fn download_asset(
        &self,
        cancel: &CancellationToken,
        _owner: &str,
        _repo: &str,
        asset_id: u64,
    ) -> Result<Bytes, RegistryError> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(token) = &self.cancel_on_download {
            token.cancel();
        }
        if cancel.is_cancelled() {
            return Err(RegistryError::Cancelled);
        }
        if self.failing_assets.contains(&asset_id) {
            return Err(RegistryError::Status {
                status: 502,
                resource: format!("asset {}", asset_id),
            });
        }

        self.assets
            .get(&asset_id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound {
                resource: format!("asset {}", asset_id),
            })
    }
}
