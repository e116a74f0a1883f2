//! Registry token discovery
//!
//! The token comes from an environment variable, or failing that from the
//! `github.token` key of the user's global git configuration. Git itself is
//! asked first so includes and XDG locations are honoured; `~/.gitconfig` is
//! read directly when git is not installed. Nothing here is fatal: without a
//! token the registry is simply used anonymously.

use std::env;
use std::fs;
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

const TOKEN_KEY: &str = "github.token";

/// Find a registry token, checking `token_env` first and git config second
pub async fn discover_token(token_env: &str) -> Option<String> {
    if let Some(token) = token_from_env(token_env) {
        debug!("Registry token taken from ${}", token_env);
        return Some(token);
    }

    match token_from_git(None).await {
        Ok(token) => {
            if token.is_some() {
                debug!("Registry token taken from git config {}", TOKEN_KEY);
            }
            token
        }
        Err(e) => {
            debug!("git unavailable ({}), reading ~/.gitconfig directly", e);
            let gitconfig = dirs::home_dir()?.join(".gitconfig");
            let token = token_from_gitconfig(&gitconfig);
            if token.is_some() {
                debug!("Registry token taken from {}", gitconfig.display());
            }
            token
        }
    }
}

/// Ask git for the global `github.token`. `home` replaces the home
/// directory git resolves its global configuration against.
///
/// `Err` only when git could not be run; an unset key is `Ok(None)`.
async fn token_from_git(home: Option<&Path>) -> std::io::Result<Option<String>> {
    let mut cmd = Command::new("git");
    cmd.args(["config", "--global", "--get", TOKEN_KEY]);
    if let Some(home) = home {
        cmd.env("HOME", home)
            .env_remove("XDG_CONFIG_HOME")
            .env_remove("GIT_CONFIG_GLOBAL");
    }

    let output = cmd.output().await?;
    if !output.status.success() {
        // Key not set
        return Ok(None);
    }

    let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
    Ok(Some(value).filter(|v| !v.is_empty()))
}

fn token_from_env(token_env: &str) -> Option<String> {
    env::var(token_env)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read `github.token` from a git config file without running git.
/// Includes are not followed.
pub fn token_from_gitconfig(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(content) => parse_github_token(&content),
        Err(e) => {
            debug!("Could not read {}: {}", path.display(), e);
            None
        }
    }
}

/// Extract `token` from the `[github]` section; the last assignment wins, as
/// it does for git itself
fn parse_github_token(content: &str) -> Option<String> {
    let mut in_github = false;
    let mut token = None;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(header) = line.strip_prefix('[') {
            let section = header.split(']').next().unwrap_or("").trim();
            // `[github "subsection"]` is a different section
            in_github = section.eq_ignore_ascii_case("github");
            continue;
        }

        if !in_github {
            continue;
        }

        if let Some((key, value)) = line.split_once('=') {
            if key.trim().eq_ignore_ascii_case("token") {
                let value = strip_inline_comment(value.trim());
                let value = value.trim_matches('"').trim();
                if !value.is_empty() {
                    token = Some(value.to_string());
                }
            }
        }
    }

    token
}

fn strip_inline_comment(value: &str) -> &str {
    if value.starts_with('"') {
        return value;
    }
    match value.find([' ', '\t']) {
        Some(idx) if value[idx..].trim_start().starts_with(['#', ';']) => value[..idx].trim_end(),
        _ => value,
    }
}
