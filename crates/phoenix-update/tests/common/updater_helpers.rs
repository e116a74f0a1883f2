//! Helpers for updater testing

use phoenix_core::types::PlatformMatrix;
use phoenix_update::installer::RenameInstaller;
use phoenix_update::{Platform, ReleaseResolver, Updater, Version};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use super::constants::*;
use super::fake_registry::FakeRegistry;

/// Create a fake installed executable with the given content
pub fn create_fake_binary(path: &Path, content: &[u8]) -> std::io::Result<()> {
    fs::write(path, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = fs::metadata(path)?.permissions();
        perms.set_mode(0o755);
        fs::set_permissions(path, perms)?;
    }

    Ok(())
}

/// Temp dir with `phoenix` holding [`OLD_BINARY`]
pub fn installed_executable() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(EXECUTABLE_NAME);
    create_fake_binary(&path, OLD_BINARY).unwrap();
    (dir, path)
}

/// Resolver for the fixed test platform
pub fn test_resolver(registry: Arc<FakeRegistry>) -> ReleaseResolver {
    ReleaseResolver::new(
        registry,
        &PlatformMatrix::default(),
        Platform::new(TEST_OS, TEST_ARCH),
    )
    .with_validation_suffix(VALIDATION_SUFFIX)
}

/// Updater replacing `target` on the fixed test platform
pub fn test_updater(registry: Arc<FakeRegistry>, target: &Path) -> Updater {
    Updater::new(test_resolver(registry))
        .with_installer(Arc::new(RenameInstaller))
        .with_executable_path(target)
}

pub fn current_version() -> Version {
    Version::must_parse(CURRENT_VERSION)
}

#[cfg(unix)]
pub fn mode(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path).unwrap().permissions().mode() & 0o777
}
