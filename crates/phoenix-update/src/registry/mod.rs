//! Release registry client
//!
//! [`ReleaseRegistry`] is the seam between the update engine and the remote
//! service hosting releases. [`GithubRegistry`] talks to a GitHub-compatible
//! REST API; [`AnonymousFallback`] retries a call without credentials when
//! the configured token is rejected.

mod credentials;
mod fallback;
mod github;

pub use bytes::Bytes;
pub use credentials::{discover_token, token_from_gitconfig};
pub use fallback::AnonymousFallback;
pub use github::GithubRegistry;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use phoenix_core::types::RuntimeConfig;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Errors reported by a release registry
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Credentials were rejected
    #[error("registry rejected the credentials (HTTP {status})")]
    Unauthorized { status: u16 },

    /// Repository, release or asset does not exist
    #[error("not found: {resource}")]
    NotFound { resource: String },

    /// Rate limit exhausted
    #[error("registry rate limit exceeded while requesting {resource}")]
    RateLimited { resource: String },

    /// Any other non-success status
    #[error("registry returned HTTP {status} for {resource}")]
    Status { status: u16, resource: String },

    /// Transport failure
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Body could not be understood
    #[error("invalid registry response: {0}")]
    Decode(String),

    /// Body length differs from what the registry advertised
    #[error("expected {expected} bytes, received {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    /// The caller cancelled the operation
    #[error("operation cancelled")]
    Cancelled,
}

impl RegistryError {
    /// Whether retrying without credentials could help
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

/// A release as listed by the registry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryRelease {
    /// Registry identifier
    #[serde(default)]
    pub id: u64,

    /// Release tag (e.g., "v1.3.0")
    pub tag_name: String,

    /// Release name
    #[serde(default)]
    pub name: Option<String>,

    /// Release body (changelog)
    #[serde(default)]
    pub body: Option<String>,

    /// Whether this is a draft
    #[serde(default)]
    pub draft: bool,

    /// Whether this is a prerelease
    #[serde(default)]
    pub prerelease: bool,

    /// Published date
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,

    /// Release page for browsing
    #[serde(default)]
    pub html_url: String,

    /// Release assets
    #[serde(default)]
    pub assets: Vec<RegistryAsset>,
}

/// A downloadable file attached to a release
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryAsset {
    /// Asset identifier used for downloads
    pub id: u64,

    /// Asset name
    pub name: String,

    /// Asset size in bytes
    #[serde(default)]
    pub size: u64,

    /// Browser download URL
    #[serde(default)]
    pub browser_download_url: String,
}

/// Page selection for release listings (pages are 1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageOptions {
    pub page: u32,
    pub per_page: u32,
}

impl PageOptions {
    pub fn first(per_page: u32) -> Self {
        Self { page: 1, per_page }
    }

    pub fn next(self) -> Self {
        Self {
            page: self.page + 1,
            ..self
        }
    }
}

impl Default for PageOptions {
    fn default() -> Self {
        Self::first(30)
    }
}

/// One page of releases
#[derive(Debug, Clone, Default)]
pub struct ReleasePage {
    pub releases: Vec<RegistryRelease>,

    /// Whether the registry has another page after this one
    pub has_next: bool,
}

/// Remote registry holding a repository's releases
///
/// Every call races `cancel` and returns [`RegistryError::Cancelled`] as soon
/// as it fires.
#[async_trait]
pub trait ReleaseRegistry: Send + Sync {
    /// List one page of releases for `owner/repo`
    async fn list_releases(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repo: &str,
        page: PageOptions,
    ) -> Result<ReleasePage, RegistryError>;

    /// Download the content of a release asset
    async fn download_asset(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repo: &str,
        asset_id: u64,
    ) -> Result<Bytes, RegistryError>;
}

/// Run `fut` unless `cancel` fires first
pub(crate) async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T, RegistryError>
where
    F: Future<Output = Result<T, RegistryError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(RegistryError::Cancelled),
        result = fut => result,
    }
}

/// Build the registry described by `config`.
///
/// With a discoverable token the result is an authenticated client that
/// falls back to anonymous access when the token is rejected; without one it
/// is an anonymous client.
pub async fn registry_from_config(
    config: &RuntimeConfig,
) -> Result<Arc<dyn ReleaseRegistry>, RegistryError> {
    let anonymous = GithubRegistry::new(&config.network, &config.registry, None)?
        .with_progress(config.update.show_progress);

    match discover_token(&config.registry.token_env).await {
        Some(token) => {
            debug!("Using authenticated registry access");
            let authenticated =
                GithubRegistry::new(&config.network, &config.registry, Some(token))?
                    .with_progress(config.update.show_progress);
            Ok(Arc::new(AnonymousFallback::new(
                Arc::new(authenticated),
                Arc::new(anonymous),
            )))
        }
        None => {
            debug!("No registry token found, using anonymous access");
            Ok(Arc::new(anonymous))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_options() {
        let page = PageOptions::first(50);
        assert_eq!(page.page, 1);
        assert_eq!(page.next(), PageOptions { page: 2, per_page: 50 });
    }

    #[test]
    fn test_release_deserialization() {
        let json = r#"{
            "id": 7,
            "tag_name": "v1.3.0",
            "name": "1.3.0",
            "body": "notes",
            "draft": false,
            "prerelease": false,
            "published_at": "2024-05-01T12:00:00Z",
            "html_url": "https://github.com/o/r/releases/tag/v1.3.0",
            "assets": [
                {"id": 11, "name": "r_linux_amd64.tar.gz", "size": 42,
                 "browser_download_url": "https://example.com/a", "label": null}
            ]
        }"#;
        let release: RegistryRelease = serde_json::from_str(json).unwrap();
        assert_eq!(release.tag_name, "v1.3.0");
        assert!(release.published_at.is_some());
        assert_eq!(release.assets[0].id, 11);
        assert_eq!(release.assets[0].size, 42);
    }

    #[tokio::test]
    async fn test_cancellable_returns_cancelled() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result: Result<(), RegistryError> =
            cancellable(&cancel, std::future::pending()).await;
        assert!(matches!(result, Err(RegistryError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancellable_passes_result_through() {
        let cancel = CancellationToken::new();
        let result = cancellable(&cancel, async { Ok::<_, RegistryError>(5) }).await;
        assert_eq!(result.unwrap(), 5);
    }
}
