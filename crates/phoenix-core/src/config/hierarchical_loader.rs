//! Hierarchical configuration loader with precedence
//!
//! Loads configuration from multiple sources with the following precedence (low to high):
//! 1. Embedded defaults (built into binary)
//! 2. Runtime config (~/.phoenix/runtime.yaml)
//! 3. Environment variables (PHOENIX_* prefix)
//! 4. CLI flags (handled by caller)

use crate::error::{Error, Result};
use crate::types::{PlatformMatrix, RuntimeConfig};
use camino::{Utf8Path, Utf8PathBuf};
use rust_embed::RustEmbed;
use serde::de::DeserializeOwned;
use std::env;
use std::fs;
use tracing::debug;

/// Embedded configuration files
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/../../embedded/config/"]
#[prefix = ""]
struct EmbeddedConfigs;

/// Configuration hierarchy loader
pub struct HierarchicalConfigLoader {
    /// Base directory for configuration files
    config_dir: Utf8PathBuf,
}

impl HierarchicalConfigLoader {
    /// Create a new hierarchical config loader rooted at ~/.phoenix
    pub fn new() -> Result<Self> {
        let config_dir = Self::get_config_dir()?;
        Ok(Self { config_dir })
    }

    /// Create a loader with a custom config directory
    pub fn with_dir(config_dir: Utf8PathBuf) -> Self {
        Self { config_dir }
    }

    /// Get the standard config directory (~/.phoenix)
    ///
    /// The directory is not created; a missing directory simply means no
    /// file-level overrides.
    fn get_config_dir() -> Result<Utf8PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::invalid_config("Could not determine home directory"))?;
        let home = Utf8PathBuf::from_path_buf(home)
            .map_err(|p| Error::invalid_config(format!("Home directory is not UTF-8: {:?}", p)))?;

        Ok(home.join(".phoenix"))
    }

    /// Load runtime configuration with hierarchical precedence
    pub fn load_runtime_config(&self) -> Result<RuntimeConfig> {
        let mut config = Self::load_embedded_config::<RuntimeConfig>("runtime-defaults.yaml")?;

        let runtime_config_path = self.config_dir.join("runtime.yaml");
        if runtime_config_path.exists() {
            debug!("Loading runtime config from {}", runtime_config_path);
            config = self.load_yaml_file::<RuntimeConfig>(&runtime_config_path)?;
        }

        self.apply_env_overrides(config)
    }

    /// Load platform matrix configuration
    pub fn load_platform_matrix(&self) -> Result<PlatformMatrix> {
        let mut matrix = Self::load_embedded_config::<PlatformMatrix>("platform-rules.yaml")?;

        let platform_rules_path = self.config_dir.join("platform-rules.yaml");
        if platform_rules_path.exists() {
            debug!("Loading platform rules from {}", platform_rules_path);
            let file_matrix = self.load_yaml_file::<PlatformMatrix>(&platform_rules_path)?;
            matrix = Self::merge_platform_matrix(matrix, file_matrix);
        }

        Ok(matrix)
    }

    /// Load an embedded configuration file
    fn load_embedded_config<T: DeserializeOwned>(filename: &str) -> Result<T> {
        let embedded_file = EmbeddedConfigs::get(filename).ok_or_else(|| {
            Error::config_not_found(format!("Embedded config not found: {}", filename))
        })?;

        let content = std::str::from_utf8(&embedded_file.data).map_err(|_| {
            Error::invalid_config(format!("Invalid UTF-8 in embedded config: {}", filename))
        })?;

        serde_yaml_ng::from_str(content).map_err(|e| {
            Error::invalid_config(format!(
                "Failed to parse embedded config {}: {}",
                filename, e
            ))
        })
    }

    /// Load a YAML file and parse it
    fn load_yaml_file<T: DeserializeOwned>(&self, path: &Utf8Path) -> Result<T> {
        let content = fs::read_to_string(path)?;
        serde_yaml_ng::from_str(&content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse {}: {}", path, e)))
    }

    /// Merge platform matrices
    fn merge_platform_matrix(mut base: PlatformMatrix, overlay: PlatformMatrix) -> PlatformMatrix {
        // Overlay platforms take precedence
        for (key, platform) in overlay.platforms {
            base.platforms.insert(key, platform);
        }

        base
    }

    /// Apply environment variable overrides to runtime config
    fn apply_env_overrides(&self, mut config: RuntimeConfig) -> Result<RuntimeConfig> {
        // Network timeouts
        if let Ok(val) = env::var("PHOENIX_HTTP_TIMEOUT_SECS") {
            config.network.http_timeout_secs = val.parse().map_err(|_| {
                Error::invalid_config("PHOENIX_HTTP_TIMEOUT_SECS must be a valid number")
            })?;
        }

        if let Ok(val) = env::var("PHOENIX_DOWNLOAD_TIMEOUT_SECS") {
            config.network.download_timeout_secs = val.parse().map_err(|_| {
                Error::invalid_config("PHOENIX_DOWNLOAD_TIMEOUT_SECS must be a valid number")
            })?;
        }

        // Registry
        if let Ok(val) = env::var("PHOENIX_API_URL") {
            config.registry.api_url = val;
        }

        if let Ok(val) = env::var("PHOENIX_TOKEN_ENV") {
            config.registry.token_env = val;
        }

        if let Ok(val) = env::var("PHOENIX_PER_PAGE") {
            config.registry.per_page = val
                .parse()
                .map_err(|_| Error::invalid_config("PHOENIX_PER_PAGE must be a valid number"))?;
        }

        if let Ok(val) = env::var("PHOENIX_MAX_PAGES") {
            config.registry.max_pages = val
                .parse()
                .map_err(|_| Error::invalid_config("PHOENIX_MAX_PAGES must be a valid number"))?;
        }

        // Update behaviour
        if let Ok(val) = env::var("PHOENIX_VALIDATION_SUFFIX") {
            config.update.validation_suffix = val;
        }

        if let Ok(val) = env::var("PHOENIX_NO_PROGRESS") {
            config.update.show_progress = !val.parse().unwrap_or(false);
        }

        Ok(config)
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }
}
