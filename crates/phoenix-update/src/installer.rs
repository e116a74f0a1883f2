//! Atomic replacement of the installed executable
//!
//! New bytes are always staged in a temporary file next to the target, so
//! the final step is a same-filesystem rename. The target never holds a
//! truncated or partially written file.

use std::fs::{self, Permissions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Installation failures. The original executable is intact after each.
#[derive(Error, Debug)]
pub enum InstallError {
    #[error("cannot read the installed executable {path:?}: {source}")]
    TargetMissing {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot create a temporary file in {dir:?}: {source}")]
    TempFile {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write the new executable to {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to set permissions on {path:?}: {source}")]
    Permissions {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to rename {from:?} to {to:?}: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to move the running executable {path:?} aside to {aside:?}: {source}")]
    RenameAside {
        path: PathBuf,
        aside: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Puts new executable bytes in place of an existing file
pub trait Installer: Send + Sync {
    /// Replace `target` with `new_bytes`, keeping its permission bits.
    ///
    /// On error `target` is byte-identical to what it was before the call.
    fn apply(&self, new_bytes: &[u8], target: &Path) -> Result<(), InstallError>;
}

/// The installer suited to the running platform
pub fn platform_installer() -> Arc<dyn Installer> {
    if cfg!(windows) {
        Arc::new(RenameAsideInstaller::new())
    } else {
        Arc::new(RenameInstaller)
    }
}

/// Single rename over the target. Valid where a running executable's
/// directory entry may be replaced (Unix).
#[derive(Debug, Default, Clone, Copy)]
pub struct RenameInstaller;

impl Installer for RenameInstaller {
    fn apply(&self, new_bytes: &[u8], target: &Path) -> Result<(), InstallError> {
        let staged = stage(new_bytes, target)?;
        let staged_path = staged.path().to_path_buf();

        staged.persist(target).map_err(|e| InstallError::Rename {
            from: staged_path,
            to: target.to_path_buf(),
            source: e.error,
        })?;

        info!("Installed new executable at {:?}", target);
        Ok(())
    }
}

type RenameFn = dyn Fn(&Path, &Path) -> io::Result<()> + Send + Sync;

/// Moves the running executable aside before renaming the new one into
/// place. Needed where an executing file cannot be replaced (Windows).
pub struct RenameAsideInstaller {
    rename: Box<RenameFn>,
}

impl RenameAsideInstaller {
    pub fn new() -> Self {
        Self {
            rename: Box::new(|from, to| fs::rename(from, to)),
        }
    }

    #[cfg(test)]
    fn with_rename(rename: impl Fn(&Path, &Path) -> io::Result<()> + Send + Sync + 'static) -> Self {
        Self {
            rename: Box::new(rename),
        }
    }
}

impl Default for RenameAsideInstaller {
    fn default() -> Self {
        Self::new()
    }
}

impl Installer for RenameAsideInstaller {
    fn apply(&self, new_bytes: &[u8], target: &Path) -> Result<(), InstallError> {
        let staged = stage(new_bytes, target)?.into_temp_path();
        let staged_path: &Path = &staged;
        let aside = aside_path(target);

        (self.rename)(target, &aside).map_err(|source| InstallError::RenameAside {
            path: target.to_path_buf(),
            aside: aside.clone(),
            source,
        })?;
        debug!("Moved {:?} aside to {:?}", target, aside);

        if let Err(source) = (self.rename)(staged_path, target) {
            if let Err(e) = (self.rename)(&aside, target) {
                warn!("Failed to restore {:?} from {:?}: {}", target, aside, e);
            }
            return Err(InstallError::Rename {
                from: staged_path.to_path_buf(),
                to: target.to_path_buf(),
                source,
            });
        }
        // Renamed away; the temp path must not be cleaned up anymore
        let _ = staged.keep();

        // Still mapped by the running process on some platforms; left behind
        // when removal is refused
        if let Err(e) = fs::remove_file(&aside) {
            debug!("Leaving {:?} in place: {}", aside, e);
        }

        info!("Installed new executable at {:?}", target);
        Ok(())
    }
}

/// Write `new_bytes` to a temp file beside `target` carrying its permissions
fn stage(new_bytes: &[u8], target: &Path) -> Result<NamedTempFile, InstallError> {
    let permissions = target_permissions(target)?;
    let dir = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = file_name(target);

    let mut staged = tempfile::Builder::new()
        .prefix(&format!(".{}.", name))
        .suffix(".new")
        .tempfile_in(dir)
        .map_err(|source| InstallError::TempFile {
            dir: dir.to_path_buf(),
            source,
        })?;
    debug!("Staging {} bytes in {:?}", new_bytes.len(), staged.path());

    let write_error = |path: &Path| {
        let path = path.to_path_buf();
        move |source: io::Error| InstallError::Write { path, source }
    };
    staged
        .write_all(new_bytes)
        .map_err(write_error(staged.path()))?;
    staged
        .as_file()
        .sync_all()
        .map_err(write_error(staged.path()))?;

    staged
        .as_file()
        .set_permissions(permissions)
        .map_err(|source| InstallError::Permissions {
            path: staged.path().to_path_buf(),
            source,
        })?;

    Ok(staged)
}

fn target_permissions(target: &Path) -> Result<Permissions, InstallError> {
    fs::metadata(target)
        .map(|m| m.permissions())
        .map_err(|source| InstallError::TargetMissing {
            path: target.to_path_buf(),
            source,
        })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "executable".to_string())
}

/// Free path to move `target` aside to. A leftover `.name.old` from an
/// earlier update is removed first; while it stays locked a numbered
/// sibling is used instead.
fn aside_path(target: &Path) -> PathBuf {
    let aside = sibling(target, "old");
    if !aside.exists() {
        return aside;
    }
    match fs::remove_file(&aside) {
        Ok(()) => return aside,
        Err(e) => warn!("Cannot remove stale {:?}: {}", aside, e),
    }

    (1..)
        .map(|n| sibling(target, &format!("old.{}", n)))
        .find(|candidate| !candidate.exists())
        .unwrap_or(aside)
}

/// `dir/.name.<ext>` next to `target`
fn sibling(target: &Path, ext: &str) -> PathBuf {
    target.with_file_name(format!(".{}.{}", file_name(target), ext))
}
