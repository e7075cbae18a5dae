use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::Client;

use crate::core::config::LauncherConfig;

const GITHUB_API_VERSION: &str = "2022-11-28";

/// Client for release-hosting API queries. Bounded by the request timeout.
pub fn build_api_client(config: &LauncherConfig) -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/vnd.github+json"),
    );
    default_headers.insert(
        HeaderName::from_static("x-github-api-version"),
        HeaderValue::from_static(GITHUB_API_VERSION),
    );

    Client::builder()
        .user_agent(config.user_agent.clone())
        .default_headers(default_headers)
        .timeout(config.request_timeout)
        .build()
}

/// Client for asset downloads. Connect and per-read stalls are bounded; the
/// whole transfer is not, so large archives on slow links still finish.
pub fn build_download_client(config: &LauncherConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .connect_timeout(config.download_timeout)
        .read_timeout(config.download_timeout)
        .pool_idle_timeout(Duration::from_secs(30))
        .build()
}
