//! Runtime configuration types for operational parameters
//!
//! These types define configuration that controls how the updater talks to
//! the release registry and how it installs what it downloads.

use serde::{Deserialize, Serialize};

/// Complete runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RuntimeConfig {
    /// Network and HTTP configuration
    #[serde(default)]
    pub network: NetworkConfig,

    /// Release registry settings
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Self-update behaviour
    #[serde(default)]
    pub update: UpdateConfig,

    /// Project the binary updates itself from
    #[serde(default)]
    pub project: ProjectConfig,
}

/// Network and HTTP configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkConfig {
    /// Connect and listing timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub http_timeout_secs: u64,

    /// Asset download timeout in seconds
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,

    /// User agent string for HTTP requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: default_http_timeout(),
            download_timeout_secs: default_download_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_http_timeout() -> u64 {
    30
}
fn default_download_timeout() -> u64 {
    300 // 5 minutes
}
fn default_user_agent() -> String {
    format!(
        "phoenix/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

/// Release registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RegistryConfig {
    /// Base URL for the GitHub-compatible REST API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Environment variable holding the bearer token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Releases requested per page
    #[serde(default = "default_per_page")]
    pub per_page: u32,

    /// Upper bound on pages fetched while resolving a release
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            token_env: default_token_env(),
            per_page: default_per_page(),
            max_pages: default_max_pages(),
        }
    }
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}
fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}
fn default_per_page() -> u32 {
    30
}
fn default_max_pages() -> u32 {
    10
}

/// Self-update configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UpdateConfig {
    /// Suffix naming the validation asset next to a release binary
    #[serde(default = "default_validation_suffix")]
    pub validation_suffix: String,

    /// Render download progress bars
    #[serde(default = "default_show_progress")]
    pub show_progress: bool,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            validation_suffix: default_validation_suffix(),
            show_progress: default_show_progress(),
        }
    }
}

fn default_validation_suffix() -> String {
    ".sha256".to_string()
}
fn default_show_progress() -> bool {
    true
}

/// Project the running binary belongs to
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProjectConfig {
    /// Repository slug in `owner/name` form
    #[serde(default = "default_slug")]
    pub slug: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            slug: default_slug(),
        }
    }
}

fn default_slug() -> String {
    "phoenix-cli/phoenix".to_string()
}
