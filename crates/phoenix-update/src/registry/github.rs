//! GitHub REST API registry client

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use phoenix_core::types::{NetworkConfig, RegistryConfig};
use reqwest::header::{HeaderMap, ACCEPT, LINK};
use reqwest::{RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{cancellable, PageOptions, RegistryError, RegistryRelease, ReleasePage, ReleaseRegistry};

const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const OCTET_STREAM: &str = "application/octet-stream";

/// Registry client for a GitHub-compatible API
pub struct GithubRegistry {
    /// HTTP client
    client: reqwest::Client,

    /// API base URL without trailing slash
    api_url: String,

    /// Bearer token, `None` for anonymous access
    token: Option<String>,

    /// Timeout for listing requests
    http_timeout: Duration,

    /// Timeout for asset downloads
    download_timeout: Duration,

    /// Enable progress bars
    show_progress: bool,
}

impl GithubRegistry {
    /// Create a client; `token` selects authenticated mode
    pub fn new(
        network: &NetworkConfig,
        registry: &RegistryConfig,
        token: Option<String>,
    ) -> Result<Self, RegistryError> {
        let http_timeout = Duration::from_secs(network.http_timeout_secs);
        let client = reqwest::Client::builder()
            .user_agent(&network.user_agent)
            .connect_timeout(http_timeout)
            .build()?;

        Ok(Self {
            client,
            api_url: registry.api_url.trim_end_matches('/').to_string(),
            token,
            http_timeout,
            download_timeout: Duration::from_secs(network.download_timeout_secs),
            show_progress: false,
        })
    }

    /// Enable or disable progress bars
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    fn get(&self, url: &str) -> RequestBuilder {
        let request = self.client.get(url);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn fetch_page(
        &self,
        owner: &str,
        repo: &str,
        page: PageOptions,
    ) -> Result<ReleasePage, RegistryError> {
        let url = format!(
            "{}/repos/{}/{}/releases?per_page={}&page={}",
            self.api_url, owner, repo, page.per_page, page.page
        );
        debug!("Fetching releases from: {}", url);

        let response = self
            .get(&url)
            .header(ACCEPT, JSON_MEDIA_TYPE)
            .timeout(self.http_timeout)
            .send()
            .await?;
        let response = check_status(response, &format!("{}/{} releases", owner, repo))?;

        let link_says_next = next_link(response.headers());
        let body = response.bytes().await?;
        let releases: Vec<RegistryRelease> = serde_json::from_slice(&body)
            .map_err(|e| RegistryError::Decode(format!("release list: {}", e)))?;

        // Without a Link header a full page is the only hint that more exist
        let has_next = link_says_next
            .unwrap_or(page.per_page > 0 && releases.len() >= page.per_page as usize);

        Ok(ReleasePage { releases, has_next })
    }

    async fn fetch_asset(&self, owner: &str, repo: &str, asset_id: u64) -> Result<Bytes, RegistryError> {
        let url = format!(
            "{}/repos/{}/{}/releases/assets/{}",
            self.api_url, owner, repo, asset_id
        );
        debug!("Downloading asset from: {}", url);

        // Redirects to the storage host are followed; reqwest drops the
        // Authorization header when the redirect leaves the API host.
        let response = self
            .get(&url)
            .header(ACCEPT, OCTET_STREAM)
            .timeout(self.download_timeout)
            .send()
            .await?;
        let response = check_status(response, &format!("asset {}", asset_id))?;

        let total_size = response.content_length().unwrap_or(0);
        let progress = self.progress_bar(total_size, asset_id);

        let mut data = crate::archive::preallocated(total_size);
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            data.extend_from_slice(&chunk);
            if let Some(pb) = &progress {
                pb.set_position(data.len() as u64);
            }
        }

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        Ok(Bytes::from(data))
    }

    fn progress_bar(&self, total_size: u64, asset_id: u64) -> Option<ProgressBar> {
        if !self.show_progress || total_size == 0 {
            return None;
        }

        let pb = ProgressBar::new(total_size);
        let style = ProgressStyle::default_bar()
            .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        pb.set_style(style);
        pb.set_message(format!("Downloading asset {}", asset_id));
        Some(pb)
    }
}

#[async_trait]
impl ReleaseRegistry for GithubRegistry {
    async fn list_releases(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repo: &str,
        page: PageOptions,
    ) -> Result<ReleasePage, RegistryError> {
        cancellable(cancel, self.fetch_page(owner, repo, page)).await
    }

    async fn download_asset(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repo: &str,
        asset_id: u64,
    ) -> Result<Bytes, RegistryError> {
        cancellable(cancel, self.fetch_asset(owner, repo, asset_id)).await
    }
}

/// Map non-success statuses onto registry error classes
fn check_status(response: Response, resource: &str) -> Result<Response, RegistryError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    debug!("Registry answered {} for {}", status, resource);
    let rate_limit_exhausted = response
        .headers()
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim() == "0");

    Err(match status {
        StatusCode::UNAUTHORIZED => RegistryError::Unauthorized {
            status: status.as_u16(),
        },
        StatusCode::NOT_FOUND => RegistryError::NotFound {
            resource: resource.to_string(),
        },
        StatusCode::TOO_MANY_REQUESTS => RegistryError::RateLimited {
            resource: resource.to_string(),
        },
        StatusCode::FORBIDDEN if rate_limit_exhausted => RegistryError::RateLimited {
            resource: resource.to_string(),
        },
        _ => RegistryError::Status {
            status: status.as_u16(),
            resource: resource.to_string(),
        },
    })
}

/// `Some(true)` when a Link header advertises `rel="next"`, `None` without a
/// Link header
fn next_link(headers: &HeaderMap) -> Option<bool> {
    let link = headers.get(LINK)?.to_str().ok()?;
    Some(
        link.split(',')
            .any(|part| part.split(';').skip(1).any(|p| p.trim() == "rel=\"next\"")),
    )
}
