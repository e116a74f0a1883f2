//! Release discovery
//!
//! Turns a repository's registry listing into the single release applicable
//! to the running platform: the highest published version that carries both
//! a platform asset and its validation sibling.

use chrono::{DateTime, Utc};
use phoenix_core::types::{normalize_arch, normalize_os, PlatformMatrix, RuntimeConfig};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::UpdateError;
use crate::registry::{
    PageOptions, RegistryAsset, RegistryError, RegistryRelease, ReleaseRegistry,
};
use crate::version::Version;

/// Default suffix of the validation asset
pub const DEFAULT_VALIDATION_SUFFIX: &str = ".sha256";

/// `owner/name` repository identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slug {
    pub owner: String,
    pub name: String,
}

impl Slug {
    /// Parse `owner/name`; both segments must be non-empty
    pub fn parse(slug: &str) -> Result<Self, UpdateError> {
        let invalid = || UpdateError::InvalidSlug {
            slug: slug.to_string(),
        };

        let (owner, name) = slug.split_once('/').ok_or_else(invalid)?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(invalid());
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Operating system and CPU architecture releases are selected for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub os: String,
    pub arch: String,
}

impl Platform {
    pub fn new(os: &str, arch: &str) -> Self {
        Self {
            os: os.to_string(),
            arch: arch.to_string(),
        }
    }

    /// The platform this process runs on
    pub fn current() -> Self {
        Self::new(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Lower-cased tokens an asset name must contain to be built for this
    /// platform
    fn asset_tokens(&self, matrix: &PlatformMatrix) -> Vec<String> {
        if let Some(definition) = matrix.find_platform(&self.os, &self.arch) {
            return definition.asset_tokens();
        }

        debug!(
            "Platform {}-{} not in the platform matrix, using plain naming",
            self.os, self.arch
        );
        let os = normalize_os(&self.os);
        let arch = normalize_arch(&self.arch);
        vec![format!("{}-{}", os, arch), format!("{}_{}", os, arch)]
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}

/// A release applicable to this platform
#[derive(Debug, Clone, Serialize)]
pub struct Release {
    pub version: Version,
    pub name: String,
    pub release_notes: String,
    pub published_at: Option<DateTime<Utc>>,
    /// Release page for browsing
    pub url: String,
    pub repo_owner: String,
    pub repo_name: String,
    pub asset_name: String,
    pub asset_url: String,
    pub asset_byte_size: u64,
    pub asset_id: u64,
    pub validation_asset_id: u64,
    pub validation_asset_url: String,
}

/// Selects the applicable release from a registry listing
pub struct ReleaseResolver {
    registry: Arc<dyn ReleaseRegistry>,

    /// Platform naming tokens, lower-cased
    tokens: Vec<String>,

    validation_suffix: String,

    per_page: u32,

    /// Upper bound on listing requests per detection
    max_pages: u32,
}

impl ReleaseResolver {
    pub fn new(registry: Arc<dyn ReleaseRegistry>, matrix: &PlatformMatrix, platform: Platform) -> Self {
        let tokens = platform.asset_tokens(matrix);
        debug!("Asset tokens for {}: {:?}", platform, tokens);

        Self {
            registry,
            tokens,
            validation_suffix: DEFAULT_VALIDATION_SUFFIX.to_string(),
            per_page: 30,
            max_pages: 10,
        }
    }

    /// Resolver for the running platform configured from `config`
    pub fn from_config(
        registry: Arc<dyn ReleaseRegistry>,
        config: &RuntimeConfig,
        matrix: &PlatformMatrix,
    ) -> Self {
        Self::new(registry, matrix, Platform::current())
            .with_validation_suffix(&config.update.validation_suffix)
            .with_page_size(config.registry.per_page, config.registry.max_pages)
    }

    pub fn with_validation_suffix(mut self, suffix: &str) -> Self {
        self.validation_suffix = suffix.to_lowercase();
        self
    }

    pub fn with_page_size(mut self, per_page: u32, max_pages: u32) -> Self {
        self.per_page = per_page.max(1);
        self.max_pages = max_pages.max(1);
        self
    }

    pub fn registry(&self) -> &Arc<dyn ReleaseRegistry> {
        &self.registry
    }

    /// Find the latest release for `slug` with assets for this platform.
    ///
    /// `Ok(None)` means nothing applicable is published, which is not an
    /// error. An invalid slug fails before any registry call.
    pub async fn detect_latest(
        &self,
        cancel: &CancellationToken,
        slug: &str,
    ) -> Result<Option<Release>, UpdateError> {
        let slug = Slug::parse(slug)?;
        let mut latest: Option<Release> = None;
        let mut page = PageOptions::first(self.per_page);

        for _ in 0..self.max_pages {
            let listing = self
                .registry
                .list_releases(cancel, &slug.owner, &slug.name, page)
                .await
                .map_err(|e| match e {
                    RegistryError::NotFound { .. } => UpdateError::RepositoryNotFound {
                        slug: slug.to_string(),
                    },
                    other => other.into(),
                })?;
            debug!(
                "Page {} of {} lists {} releases",
                page.page,
                slug,
                listing.releases.len()
            );

            for candidate in listing.releases.iter().filter_map(|r| self.applicable(&slug, r)) {
                let newer = latest
                    .as_ref()
                    .map_or(true, |current| candidate.version.greater_than(&current.version));
                if newer {
                    latest = Some(candidate);
                }
            }

            if !listing.has_next {
                break;
            }
            page = page.next();
        }

        match &latest {
            Some(release) => info!("Latest release for {} is {}", slug, release.version),
            None => debug!("No applicable release found for {}", slug),
        }
        Ok(latest)
    }

    /// Map a listed release to a [`Release`] when it is published, tagged
    /// with a valid version and carries an asset pair for this platform
    fn applicable(&self, slug: &Slug, release: &RegistryRelease) -> Option<Release> {
        if release.draft || release.prerelease {
            debug!("Skipping draft or prerelease {}", release.tag_name);
            return None;
        }

        let Some(version) = Version::parse(&release.tag_name) else {
            debug!("Skipping release with unparsable tag {:?}", release.tag_name);
            return None;
        };

        let Some((asset, validation)) = self.asset_pair(&release.assets) else {
            debug!("Release {} has no asset pair for this platform", release.tag_name);
            return None;
        };

        Some(Release {
            version,
            name: release.name.clone().unwrap_or_default(),
            release_notes: release.body.clone().unwrap_or_default(),
            published_at: release.published_at,
            url: release.html_url.clone(),
            repo_owner: slug.owner.clone(),
            repo_name: slug.name.clone(),
            asset_name: asset.name.clone(),
            asset_url: asset.browser_download_url.clone(),
            asset_byte_size: asset.size,
            asset_id: asset.id,
            validation_asset_id: validation.id,
            validation_asset_url: validation.browser_download_url.clone(),
        })
    }

    /// First platform asset whose `<name><suffix>` sibling is also attached
    fn asset_pair<'a>(
        &self,
        assets: &'a [RegistryAsset],
    ) -> Option<(&'a RegistryAsset, &'a RegistryAsset)> {
        assets
            .iter()
            .filter(|a| self.is_platform_asset(&a.name))
            .find_map(|asset| {
                let expected = format!("{}{}", asset.name, self.validation_suffix).to_lowercase();
                assets
                    .iter()
                    .find(|v| v.name.to_lowercase() == expected)
                    .map(|validation| (asset, validation))
            })
    }

    fn is_platform_asset(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        !name.ends_with(&self.validation_suffix) && self.tokens.iter().any(|t| name.contains(t.as_str()))
    }
}
