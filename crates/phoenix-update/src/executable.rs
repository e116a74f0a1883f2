//! Locating the executable to replace

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::UpdateError;

/// Path of the running executable, resolved through symlinks
pub fn current_executable() -> Result<PathBuf, UpdateError> {
    let path = env::current_exe().map_err(|source| UpdateError::ExecutablePath {
        path: PathBuf::new(),
        source,
    })?;
    resolve_target_path(&with_exe_suffix(path))
}

/// Resolve `path` to the file that must be replaced.
///
/// A symlink is followed to its backing file, which is replaced while the
/// link itself stays untouched.
pub fn resolve_target_path(path: &Path) -> Result<PathBuf, UpdateError> {
    let path_error = |source| UpdateError::ExecutablePath {
        path: path.to_path_buf(),
        source,
    };

    let metadata = fs::symlink_metadata(path).map_err(path_error)?;
    if !metadata.file_type().is_symlink() {
        return Ok(path.to_path_buf());
    }

    let resolved = fs::canonicalize(path).map_err(path_error)?;
    debug!("Executable {:?} is a symlink to {:?}", path, resolved);
    Ok(resolved)
}

/// Windows reports the executable without `.exe` in some launch modes
fn with_exe_suffix(path: PathBuf) -> PathBuf {
    if !cfg!(windows) {
        return path;
    }

    let has_exe = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("exe"));
    if has_exe {
        path
    } else {
        let mut name = path.into_os_string();
        name.push(".exe");
        PathBuf::from(name)
    }
}
