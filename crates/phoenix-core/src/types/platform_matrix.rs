//! Platform support matrix configuration types
//!
//! These types define platform detection and the naming tokens used to pick
//! the release asset built for the running operating system and CPU.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Complete platform support matrix
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PlatformMatrix {
    /// Platform definitions
    pub platforms: HashMap<String, PlatformDefinition>,
}

impl Default for PlatformMatrix {
    fn default() -> Self {
        let mut platforms = HashMap::new();

        platforms.insert(
            "linux-x86_64".to_string(),
            PlatformDefinition::new("linux", "x86_64", "x86_64-unknown-linux-musl")
                .with_aliases(&["linux-amd64", "linux_amd64", "linux_x86_64"]),
        );
        platforms.insert(
            "linux-aarch64".to_string(),
            PlatformDefinition::new("linux", "aarch64", "aarch64-unknown-linux-musl")
                .with_aliases(&["linux-arm64", "linux_arm64", "linux_aarch64"]),
        );
        platforms.insert(
            "macos-x86_64".to_string(),
            PlatformDefinition::new("macos", "x86_64", "x86_64-apple-darwin")
                .with_aliases(&["darwin-amd64", "darwin_amd64", "osx-x86_64"]),
        );
        platforms.insert(
            "macos-aarch64".to_string(),
            PlatformDefinition::new("macos", "aarch64", "aarch64-apple-darwin")
                .with_aliases(&["darwin-arm64", "darwin_arm64", "osx-arm64"]),
        );
        platforms.insert(
            "windows-x86_64".to_string(),
            PlatformDefinition::new("windows", "x86_64", "x86_64-pc-windows-msvc")
                .with_aliases(&["windows-amd64", "windows_amd64"]),
        );

        Self { platforms }
    }
}

/// Platform definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PlatformDefinition {
    /// Operating system (linux, macos, windows)
    pub os: String,

    /// CPU architecture (x86_64, aarch64)
    pub arch: String,

    /// Rust target triple
    pub target: String,

    /// Alternative names for this platform
    #[serde(default)]
    pub aliases: Vec<String>,

    /// Whether this platform is enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Normalize an OS name to the matrix vocabulary
pub fn normalize_os(os: &str) -> String {
    let os_lower = os.to_lowercase();
    match os_lower.as_str() {
        "darwin" | "osx" => "macos".to_string(),
        _ => os_lower,
    }
}

/// Normalize a CPU architecture to the matrix vocabulary
pub fn normalize_arch(arch: &str) -> String {
    let arch_lower = arch.to_lowercase();
    match arch_lower.as_str() {
        "amd64" | "x64" => "x86_64".to_string(),
        "arm64" => "aarch64".to_string(),
        _ => arch_lower,
    }
}

impl PlatformMatrix {
    /// Find platform definition by OS and architecture
    pub fn find_platform(&self, os: &str, arch: &str) -> Option<&PlatformDefinition> {
        let normalized_os = normalize_os(os);
        let normalized_arch = normalize_arch(arch);

        // Try direct lookup
        let key = format!("{}-{}", normalized_os, normalized_arch);
        if let Some(platform) = self.platforms.get(&key) {
            if platform.enabled {
                return Some(platform);
            }
        }

        self.platforms
            .values()
            .filter(|p| p.enabled)
            .find(|p| p.matches(&normalized_os, &normalized_arch))
    }
}

impl PlatformDefinition {
    /// Create an enabled platform definition without aliases
    pub fn new(os: &str, arch: &str, target: &str) -> Self {
        Self {
            os: os.to_string(),
            arch: arch.to_string(),
            target: target.to_string(),
            aliases: Vec::new(),
            enabled: true,
        }
    }

    /// Attach alternative names
    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| a.to_string()).collect();
        self
    }

    /// Check if this platform matches the given OS and architecture
    pub fn matches(&self, os: &str, arch: &str) -> bool {
        self.os.eq_ignore_ascii_case(os) && self.arch.eq_ignore_ascii_case(arch)
    }

    /// Lower-cased tokens an asset name may carry to be considered built for
    /// this platform
    pub fn asset_tokens(&self) -> Vec<String> {
        let mut tokens = vec![
            self.target.to_lowercase(),
            format!("{}-{}", self.os, self.arch).to_lowercase(),
            format!("{}_{}", self.os, self.arch).to_lowercase(),
        ];
        for alias in &self.aliases {
            let alias = alias.to_lowercase();
            if !tokens.contains(&alias) {
                tokens.push(alias);
            }
        }
        tokens
    }
}
