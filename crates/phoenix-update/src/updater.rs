//! Update orchestration
//!
//! One attempt walks the stages below in order and stops at the first
//! failure:
//!
//! ```text
//! ResolvingExecutablePath -> DetectingRelease -> (UpToDate |
//!     Downloading -> Verifying -> Extracting -> Installing -> Updated)
//! ```
//!
//! Nothing is retried across stages, and nothing touches the installed
//! executable before `Installing`.

use phoenix_core::types::{PlatformMatrix, RuntimeConfig};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::archive;
use crate::checksum::{self, ChecksumError};
use crate::error::{UpdateError, UpdateFailure};
use crate::executable::{current_executable, resolve_target_path};
use crate::installer::{platform_installer, Installer};
use crate::registry::{Bytes, RegistryError, ReleaseRegistry};
use crate::releases::{Release, ReleaseResolver};
use crate::version::Version;

/// Stage of an update attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStage {
    ResolvingExecutablePath,
    DetectingRelease,
    Downloading,
    Verifying,
    Extracting,
    Installing,
}

impl fmt::Display for UpdateStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ResolvingExecutablePath => "resolving executable path",
            Self::DetectingRelease => "detecting release",
            Self::Downloading => "downloading",
            Self::Verifying => "verifying",
            Self::Extracting => "extracting",
            Self::Installing => "installing",
        };
        f.write_str(name)
    }
}

/// Successful end of an update attempt
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum UpdateOutcome {
    /// The latest release is the running version; nothing was downloaded
    UpToDate { current: Version, release: Release },

    /// The release was installed; the process should exit and be relaunched
    Updated { previous: Version, release: Release },
}

impl UpdateOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, Self::Updated { .. })
    }

    pub fn release(&self) -> &Release {
        match self {
            Self::UpToDate { release, .. } | Self::Updated { release, .. } => release,
        }
    }
}

/// Self-update orchestrator
pub struct Updater {
    resolver: ReleaseResolver,
    installer: Arc<dyn Installer>,

    /// Executable to replace; the running one when unset
    executable_path: Option<PathBuf>,
}

impl Updater {
    pub fn new(resolver: ReleaseResolver) -> Self {
        Self {
            resolver,
            installer: platform_installer(),
            executable_path: None,
        }
    }

    /// Updater for the running executable and platform
    pub fn from_config(
        registry: Arc<dyn ReleaseRegistry>,
        config: &RuntimeConfig,
        matrix: &PlatformMatrix,
    ) -> Self {
        Self::new(ReleaseResolver::from_config(registry, config, matrix))
    }

    pub fn with_installer(mut self, installer: Arc<dyn Installer>) -> Self {
        self.installer = installer;
        self
    }

    /// Replace `path` instead of the running executable
    pub fn with_executable_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable_path = Some(path.into());
        self
    }

    /// Latest release for `slug` when it is newer than `current`.
    ///
    /// `Ok(None)` means `current` is up to date. Nothing published for this
    /// platform is [`UpdateError::ReleaseNotDetected`].
    pub async fn check(
        &self,
        cancel: &CancellationToken,
        current: &Version,
        slug: &str,
    ) -> Result<Option<Release>, UpdateError> {
        let latest = self
            .resolver
            .detect_latest(cancel, slug)
            .await?
            .ok_or(UpdateError::ReleaseNotDetected)?;
        Ok(current.should_update(&latest.version).then_some(latest))
    }

    /// Bring the executable to the latest release of `slug`.
    ///
    /// Returns [`UpdateOutcome::UpToDate`] without downloading anything when
    /// the latest release is `current`. Every failure leaves the installed
    /// executable untouched.
    pub async fn update_from(
        &self,
        cancel: &CancellationToken,
        current: &Version,
        slug: &str,
    ) -> Result<UpdateOutcome, UpdateFailure> {
        debug!("Update stage: {}", UpdateStage::ResolvingExecutablePath);
        let target = match &self.executable_path {
            Some(path) => resolve_target_path(path),
            None => current_executable(),
        }
        .map_err(UpdateFailure::at(UpdateStage::ResolvingExecutablePath))?;
        debug!("Executable to replace: {:?}", target);

        debug!("Update stage: {}", UpdateStage::DetectingRelease);
        let release = self
            .resolver
            .detect_latest(cancel, slug)
            .await
            .and_then(|latest| latest.ok_or(UpdateError::ReleaseNotDetected))
            .map_err(UpdateFailure::at(UpdateStage::DetectingRelease))?;

        if release.version.equals(current) {
            info!("Already up to date ({})", current);
            return Ok(UpdateOutcome::UpToDate {
                current: current.clone(),
                release,
            });
        }
        if release.version.lower_than(current) {
            warn!(
                "Latest published release {} is older than the running {}, installing it anyway",
                release.version, current
            );
        } else {
            info!("Update available: {} -> {}", current, release.version);
        }

        match self.apply(cancel, &release, &target).await {
            Ok(()) => {
                info!("Updated {} -> {}", current, release.version);
                Ok(UpdateOutcome::Updated {
                    previous: current.clone(),
                    release,
                })
            }
            Err((stage, error)) => Err(UpdateFailure::new(stage, error).with_release(release)),
        }
    }

    /// Download, verify, extract and install `release` over `target`
    async fn apply(
        &self,
        cancel: &CancellationToken,
        release: &Release,
        target: &Path,
    ) -> Result<(), (UpdateStage, UpdateError)> {
        debug!("Update stage: {}", UpdateStage::Downloading);
        info!(
            "Downloading {} ({})",
            release.asset_name,
            human_readable_size(release.asset_byte_size)
        );
        let asset = self
            .download(cancel, release, release.asset_id, release.asset_byte_size)
            .await
            .map_err(|e| download_error(release, e))
            .map_err(at(UpdateStage::Downloading))?;

        debug!("Update stage: {}", UpdateStage::Verifying);
        let validation = self
            .download(cancel, release, release.validation_asset_id, 0)
            .await
            .map_err(|e| match e {
                RegistryError::Cancelled => UpdateError::Cancelled,
                source => ChecksumError::Download {
                    version: release.version.to_string(),
                    url: release.validation_asset_url.clone(),
                    source,
                }
                .into(),
            })
            .map_err(at(UpdateStage::Verifying))?;
        checksum::verify(&asset, &validation).map_err(at(UpdateStage::Verifying))?;
        debug!("Checksum verified for {}", release.asset_name);

        debug!("Update stage: {}", UpdateStage::Extracting);
        let executable = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let binary = archive::extract(&asset, &release.asset_name, &executable)
            .map_err(at(UpdateStage::Extracting))?;

        // Last point at which cancelling is honoured; installing runs to the end
        if cancel.is_cancelled() {
            return Err((UpdateStage::Installing, UpdateError::Cancelled));
        }

        debug!("Update stage: {}", UpdateStage::Installing);
        self.installer
            .apply(&binary, target)
            .map_err(at(UpdateStage::Installing))?;

        Ok(())
    }

    /// Fetch one asset of `release`; `expected_size` of 0 skips the size check
    async fn download(
        &self,
        cancel: &CancellationToken,
        release: &Release,
        asset_id: u64,
        expected_size: u64,
    ) -> Result<Bytes, RegistryError> {
        let data = self
            .resolver
            .registry()
            .download_asset(cancel, &release.repo_owner, &release.repo_name, asset_id)
            .await?;

        if expected_size > 0 && data.len() as u64 != expected_size {
            return Err(RegistryError::SizeMismatch {
                expected: expected_size,
                actual: data.len() as u64,
            });
        }

        Ok(data)
    }
}

fn at<E: Into<UpdateError>>(stage: UpdateStage) -> impl FnOnce(E) -> (UpdateStage, UpdateError) {
    move |error| (stage, error.into())
}

fn download_error(release: &Release, error: RegistryError) -> UpdateError {
    match error {
        RegistryError::Cancelled => UpdateError::Cancelled,
        source => UpdateError::Download {
            version: release.version.to_string(),
            url: release.asset_url.clone(),
            source,
        },
    }
}

/// Convert bytes to human-readable size
fn human_readable_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_index])
}
