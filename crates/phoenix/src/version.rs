//! Version information for the phoenix CLI

use phoenix_update::Version;
use serde::Serialize;
use std::fmt;

/// Release tag of this build
pub const VERSION: &str = concat!("v", env!("CARGO_PKG_VERSION"));

/// The running version, as compared against release tags
pub fn current_version() -> Version {
    Version::must_parse(VERSION)
}

/// Version information
#[derive(Debug, Clone, Serialize)]
pub struct VersionInfo {
    /// Release tag (e.g. "v1.2.0")
    pub version: String,

    /// Operating system the binary was built for
    pub os: String,

    /// CPU architecture the binary was built for
    pub arch: String,
}

impl VersionInfo {
    /// Create version info for current build
    pub fn current() -> Self {
        Self {
            version: VERSION.to_string(),
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        }
    }

    /// Format as display string
    pub fn display(&self) -> String {
        format!("phoenix {} ({}-{})", self.version, self.os, self.arch)
    }
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_version_parses() {
        let version = current_version();
        assert_eq!(version.to_string(), VERSION);
        assert!(version.patch().is_some());
    }

    #[test]
    fn test_display() {
        let info = VersionInfo {
            version: "v1.2.3".to_string(),
            os: "linux".to_string(),
            arch: "x86_64".to_string(),
        };
        assert_eq!(info.display(), "phoenix v1.2.3 (linux-x86_64)");
        assert_eq!(format!("{}", info), info.display());
    }
}
