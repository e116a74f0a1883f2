//! Wiremock helpers for the HTTP registry client

use phoenix_core::types::{NetworkConfig, RegistryConfig};
use phoenix_update::registry::{GithubRegistry, RegistryRelease};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::constants::*;

pub fn releases_path() -> String {
    format!("/repos/{}/{}/releases", OWNER, REPO)
}

pub fn asset_path(asset_id: u64) -> String {
    format!("/repos/{}/{}/releases/assets/{}", OWNER, REPO, asset_id)
}

/// Registry client pointed at `server`
pub fn registry_for(server: &MockServer, token: Option<&str>) -> GithubRegistry {
    registry_at(&server.uri(), token)
}

/// Registry client pointed at `api_url`
pub fn registry_at(api_url: &str, token: Option<&str>) -> GithubRegistry {
    let registry = RegistryConfig {
        api_url: api_url.to_string(),
        ..Default::default()
    };
    GithubRegistry::new(&NetworkConfig::default(), &registry, token.map(str::to_string)).unwrap()
}

/// Release list JSON as the registry serves it
pub fn release_list_json(releases: &[RegistryRelease]) -> serde_json::Value {
    json!(releases)
}

/// Serve `releases` for the given page
pub async fn mock_release_page(
    server: &MockServer,
    page: u32,
    releases: &[RegistryRelease],
    link: Option<&str>,
) {
    let mut response = ResponseTemplate::new(200).set_body_json(release_list_json(releases));
    if let Some(link) = link {
        response = response.insert_header("link", link);
    }

    Mock::given(method("GET"))
        .and(path(releases_path()))
        .and(query_param("page", page.to_string()))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Serve asset content
pub async fn mock_asset(server: &MockServer, asset_id: u64, content: &[u8]) {
    Mock::given(method("GET"))
        .and(path(asset_path(asset_id)))
        .and(header("accept", "application/octet-stream"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
        .mount(server)
        .await;
}

/// Reject requests carrying `token` with 401
pub async fn mock_rejected_token(server: &MockServer, token: &str) {
    Mock::given(header("authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Bad credentials"})))
        .with_priority(1)
        .mount(server)
        .await;
}

/// Answer every request with `status`
pub async fn mock_status(server: &MockServer, status: u16) {
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}
