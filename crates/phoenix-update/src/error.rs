//! Update error taxonomy

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::archive::ExtractError;
use crate::checksum::ChecksumError;
use crate::installer::InstallError;
use crate::registry::RegistryError;
use crate::releases::Release;
use crate::updater::UpdateStage;

/// Why an update attempt failed
///
/// Every variant raised after a release was resolved leaves the installed
/// executable untouched.
#[derive(Error, Debug)]
pub enum UpdateError {
    /// Slug is not `owner/name`
    #[error("invalid slug format, it must be owner/name: {slug:?}")]
    InvalidSlug { slug: String },

    /// Registry has no such repository
    #[error("repository or release not found: {slug}")]
    RepositoryNotFound { slug: String },

    /// No release carries an asset pair for this platform
    #[error("release not detected")]
    ReleaseNotDetected,

    /// Primary asset could not be fetched
    #[error("release could not be downloaded ({version}/{url}): {source}")]
    Download {
        version: String,
        url: String,
        #[source]
        source: RegistryError,
    },

    /// Validation asset missing, unreadable or not matching
    #[error(transparent)]
    Checksum(#[from] ChecksumError),

    /// Asset could not be unpacked, or lacked the executable
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// The new executable could not be put in place
    #[error(transparent)]
    Install(#[from] InstallError),

    /// Registry failure while detecting releases
    #[error("release registry request failed: {0}")]
    Registry(#[source] RegistryError),

    /// The running executable could not be located
    #[error("failed to resolve executable path {path:?}: {source}")]
    ExecutablePath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The caller cancelled the attempt; safe to retry later
    #[error("update cancelled")]
    Cancelled,
}

/// Flat classification of [`UpdateError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateErrorKind {
    InvalidSlug,
    RepositoryNotFound,
    ReleaseNotDetected,
    Download,
    ChecksumDownload,
    ChecksumValidation,
    Decompression,
    ReleaseBinaryMissing,
    Install,
    Registry,
    ExecutablePath,
    Cancelled,
}

impl UpdateError {
    /// The most specific kind of this error
    pub fn kind(&self) -> UpdateErrorKind {
        match self {
            Self::InvalidSlug { .. } => UpdateErrorKind::InvalidSlug,
            Self::RepositoryNotFound { .. } => UpdateErrorKind::RepositoryNotFound,
            Self::ReleaseNotDetected => UpdateErrorKind::ReleaseNotDetected,
            Self::Download { .. } => UpdateErrorKind::Download,
            Self::Checksum(ChecksumError::Download { .. }) => UpdateErrorKind::ChecksumDownload,
            Self::Checksum(_) => UpdateErrorKind::ChecksumValidation,
            Self::Extract(ExtractError::BinaryMissing { .. }) => {
                UpdateErrorKind::ReleaseBinaryMissing
            }
            Self::Extract(_) => UpdateErrorKind::Decompression,
            Self::Install(_) => UpdateErrorKind::Install,
            Self::Registry(_) => UpdateErrorKind::Registry,
            Self::ExecutablePath { .. } => UpdateErrorKind::ExecutablePath,
            Self::Cancelled => UpdateErrorKind::Cancelled,
        }
    }

    /// Whether this error belongs to `kind`, including broader categories:
    /// a checksum download failure is also a checksum validation failure.
    pub fn is(&self, kind: UpdateErrorKind) -> bool {
        let own = self.kind();
        own == kind
            || (own == UpdateErrorKind::ChecksumDownload
                && kind == UpdateErrorKind::ChecksumValidation)
    }

    /// Soft failure: nothing to install right now, try again later
    pub fn is_soft(&self) -> bool {
        matches!(self, Self::ReleaseNotDetected)
    }
}

impl From<RegistryError> for UpdateError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Cancelled => Self::Cancelled,
            other => Self::Registry(other),
        }
    }
}

/// A failed update attempt: the error, the stage it happened in, and the
/// release being applied when one had been resolved
#[derive(Debug)]
pub struct UpdateFailure {
    pub stage: UpdateStage,
    pub release: Option<Box<Release>>,
    pub error: UpdateError,
}

impl UpdateFailure {
    pub fn new(stage: UpdateStage, error: UpdateError) -> Self {
        Self {
            stage,
            release: None,
            error,
        }
    }

    /// Adapter for `map_err` tagging errors with the stage they came from
    pub fn at(stage: UpdateStage) -> impl FnOnce(UpdateError) -> Self {
        move |error| Self::new(stage, error)
    }

    pub fn with_release(mut self, release: Release) -> Self {
        self.release = Some(Box::new(release));
        self
    }

    pub fn kind(&self) -> UpdateErrorKind {
        self.error.kind()
    }

    pub fn is(&self, kind: UpdateErrorKind) -> bool {
        self.error.is(kind)
    }
}

impl fmt::Display for UpdateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.release {
            Some(release) => write!(
                f,
                "update to {} failed while {}",
                release.version, self.stage
            ),
            None => write!(f, "update failed while {}", self.stage),
        }
    }
}

impl std::error::Error for UpdateFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}
