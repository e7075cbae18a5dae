use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument, warn};

use super::model::{Channel, Release};
use crate::core::config::LauncherConfig;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::build_api_client;

/// Read-only queries against a release-hosting service.
/// `repo` is always `owner/name`.
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    /// The single release marked latest.
    async fn latest(&self, repo: &str) -> LauncherResult<Release>;

    /// The release published under `tag`.
    async fn by_tag(&self, repo: &str, tag: &str) -> LauncherResult<Release>;

    /// The most recent release of any kind, pre-releases included.
    async fn newest(&self, repo: &str) -> LauncherResult<Release>;
}

/// GitHub REST implementation of [`ReleaseSource`].
#[derive(Debug, Clone)]
pub struct GitHubReleases {
    client: Client,
    api_base: String,
}

impl GitHubReleases {
    pub fn new(config: &LauncherConfig) -> LauncherResult<Self> {
        Ok(Self {
            client: build_api_client(config)?,
            api_base: config.api_base.clone(),
        })
    }

    async fn get(&self, url: String, query: &[(&str, &str)]) -> LauncherResult<reqwest::Response> {
        debug!("GET {}", url);
        let response = self.client.get(&url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::HttpStatus {
                url,
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl ReleaseSource for GitHubReleases {
    async fn latest(&self, repo: &str) -> LauncherResult<Release> {
        let url = format!("{}/repos/{}/releases/latest", self.api_base, repo);
        Ok(self.get(url, &[]).await?.json().await?)
    }

    async fn by_tag(&self, repo: &str, tag: &str) -> LauncherResult<Release> {
        let url = format!("{}/repos/{}/releases/tags/{}", self.api_base, repo, tag);
        Ok(self.get(url, &[]).await?.json().await?)
    }

    async fn newest(&self, repo: &str) -> LauncherResult<Release> {
        let url = format!("{}/repos/{}/releases", self.api_base, repo);
        let releases: Vec<Release> = self.get(url, &[("per_page", "1")]).await?.json().await?;
        releases
            .into_iter()
            .next()
            .ok_or_else(|| LauncherError::NoRelease(repo.to_string()))
    }
}

/// Resolve the release `channel` points at.
///
/// A pinned tag that cannot be fetched falls back to latest instead of
/// failing the whole update. A release without a tag counts as not found.
#[instrument(skip(source))]
pub async fn resolve_release(
    source: &dyn ReleaseSource,
    repo: &str,
    channel: &Channel,
) -> LauncherResult<Release> {
    let release = match channel {
        Channel::Latest => source.latest(repo).await?,
        Channel::Prerelease => source.newest(repo).await?,
        Channel::Pinned(tag) => match source.by_tag(repo, tag).await {
            Ok(release) => release,
            Err(e) => {
                warn!(
                    "Failed to get release for branch {}, falling back to latest: {}",
                    tag, e
                );
                source.latest(repo).await?
            }
        },
    };

    if release.tag_name.trim().is_empty() {
        return Err(LauncherError::NoRelease(repo.to_string()));
    }
    debug!(
        "Resolved {} to {} (prerelease: {})",
        repo, release.tag_name, release.prerelease
    );
    Ok(release)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::FakeReleases;

    fn tagged(tag: &str) -> Release {
        Release {
            tag_name: tag.into(),
            ..Release::default()
        }
    }

    #[tokio::test]
    async fn latest_channel_queries_latest() {
        let source = FakeReleases::new().with_latest(tagged("v3"));
        let release = resolve_release(&source, "o/r", &Channel::Latest).await.unwrap();
        assert_eq!(release.tag_name, "v3");
    }

    #[tokio::test]
    async fn prerelease_channel_takes_newest_regardless_of_tag_shape() {
        let source = FakeReleases::new()
            .with_latest(tagged("v3"))
            .with_newest(tagged("nightly-42"));
        let release = resolve_release(&source, "o/r", &Channel::Prerelease)
            .await
            .unwrap();
        assert_eq!(release.tag_name, "nightly-42");
    }

    #[tokio::test]
    async fn pinned_tag_falls_back_to_latest_on_error() {
        let source = FakeReleases::new().with_latest(tagged("v3"));
        let release = resolve_release(&source, "o/r", &Channel::Pinned("1.0.0".into()))
            .await
            .unwrap();
        assert_eq!(release.tag_name, "v3");
    }

    #[tokio::test]
    async fn pinned_tag_is_fetched_when_present() {
        let source = FakeReleases::new()
            .with_latest(tagged("v3"))
            .with_tag(tagged("1.0.0"));
        let release = resolve_release(&source, "o/r", &Channel::Pinned("1.0.0".into()))
            .await
            .unwrap();
        assert_eq!(release.tag_name, "1.0.0");
    }

    #[tokio::test]
    async fn empty_tag_is_no_release() {
        let source = FakeReleases::new().with_latest(tagged(""));
        let err = resolve_release(&source, "o/r", &Channel::Latest)
            .await
            .unwrap_err();
        assert!(matches!(err, LauncherError::NoRelease(_)));
    }

    #[tokio::test]
    async fn unreachable_source_is_an_error() {
        let source = FakeReleases::new();
        assert!(resolve_release(&source, "o/r", &Channel::Latest).await.is_err());
    }
}
