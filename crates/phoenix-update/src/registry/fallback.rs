//! Authenticated-then-anonymous registry decorator

use async_trait::async_trait;
use bytes::Bytes;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::{PageOptions, RegistryError, ReleasePage, ReleaseRegistry};

/// Calls the authenticated registry first and retries once anonymously when
/// it rejects the credentials.
///
/// A token may be expired or revoked while anonymous access still works (at
/// a lower rate limit). Every other error class is returned as-is.
pub struct AnonymousFallback {
    authenticated: Arc<dyn ReleaseRegistry>,
    anonymous: Arc<dyn ReleaseRegistry>,
}

impl AnonymousFallback {
    pub fn new(authenticated: Arc<dyn ReleaseRegistry>, anonymous: Arc<dyn ReleaseRegistry>) -> Self {
        Self {
            authenticated,
            anonymous,
        }
    }
}

/// Await `attempt`; on an authorization failure run `retry` exactly once
async fn retry_anonymously<T, Fut>(
    operation: &str,
    attempt: Fut,
    retry: impl FnOnce() -> Fut,
) -> Result<T, RegistryError>
where
    Fut: Future<Output = Result<T, RegistryError>>,
{
    match attempt.await {
        Err(err) if err.is_unauthorized() => {
            warn!("{} was denied with the configured token ({}), retrying anonymously", operation, err);
            retry().await
        }
        result => result,
    }
}

#[async_trait]
impl ReleaseRegistry for AnonymousFallback {
    async fn list_releases(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repo: &str,
        page: PageOptions,
    ) -> Result<ReleasePage, RegistryError> {
        retry_anonymously(
            "Listing releases",
            self.authenticated.list_releases(cancel, owner, repo, page),
            || self.anonymous.list_releases(cancel, owner, repo, page),
        )
        .await
    }

    async fn download_asset(
        &self,
        cancel: &CancellationToken,
        owner: &str,
        repo: &str,
        asset_id: u64,
    ) -> Result<Bytes, RegistryError> {
        retry_anonymously(
            "Asset download",
            self.authenticated.download_asset(cancel, owner, repo, asset_id),
            || self.anonymous.download_asset(cancel, owner, repo, asset_id),
        )
        .await
    }
}
