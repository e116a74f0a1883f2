//! Self-update engine for Phoenix CLI
//!
//! Provides:
//! - Version parsing and comparison for release tags
//! - Release discovery against a GitHub-compatible registry, with a single
//!   anonymous retry when a configured token is rejected
//! - SHA256 verification against a sibling validation asset
//! - Extraction of the executable from tar.gz, gz and zip assets
//! - Atomic in-place replacement of the running executable
//!
//! The entry point is [`Updater::update_from`]. When it reports
//! [`UpdateOutcome::Updated`] the caller should exit so a supervisor (or the
//! user) relaunches the new binary.
//!
//! Updates are not coordinated across processes: run at most one updater
//! per installed binary at a time.

pub mod archive;
pub mod checksum;
pub mod error;
pub mod executable;
pub mod installer;
pub mod registry;
pub mod releases;
pub mod updater;
pub mod version;

pub use error::{UpdateError, UpdateErrorKind, UpdateFailure};
pub use installer::{platform_installer, Installer};
pub use registry::{registry_from_config, ReleaseRegistry};
pub use releases::{Platform, Release, ReleaseResolver, Slug};
pub use updater::{UpdateOutcome, UpdateStage, Updater};
pub use version::Version;

/// Re-exported so callers can build the cancellation signal every network
/// operation races against.
pub use tokio_util::sync::CancellationToken;
