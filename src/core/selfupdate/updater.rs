use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info, instrument};

use super::replace::{make_executable, REPLACE_FLAG};
use crate::core::config::LauncherConfig;
use crate::core::downloader::{download_verified, AssetFetcher, DigestPolicy};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::platform::{DetachedCommand, Platform};
use crate::core::release::{resolve_release, select_asset, Channel, ReleaseSource};

pub(super) const UPDATE_DIR_NAME: &str = "update";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelfUpdateOutcome {
    /// Developer build, or the check itself failed.
    Disabled,
    UpToDate,
    /// A newer binary was started in replace mode; this process must exit.
    Relaunched,
}

/// A newer launcher binary that has been downloaded and verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfUpdateRequest {
    pub tag: String,
    pub downloaded: PathBuf,
    pub original: PathBuf,
}

impl SelfUpdateRequest {
    /// `<downloaded> --replace <original> [args...]`, any stray
    /// `--replace` in `args` dropped.
    pub fn relaunch_command(&self, args: &[String]) -> DetachedCommand {
        let forwarded = args.iter().filter(|arg| *arg != REPLACE_FLAG).cloned();
        DetachedCommand::new(&self.downloaded)
            .args([REPLACE_FLAG.to_string(), self.original.to_string_lossy().into_owned()])
            .args(forwarded)
    }
}

pub struct SelfUpdater {
    config: LauncherConfig,
    data_dir: PathBuf,
    source: Arc<dyn ReleaseSource>,
    fetcher: Arc<dyn AssetFetcher>,
    platform: Arc<dyn Platform>,
}

impl SelfUpdater {
    pub fn new(
        config: LauncherConfig,
        data_dir: impl Into<PathBuf>,
        source: Arc<dyn ReleaseSource>,
        fetcher: Arc<dyn AssetFetcher>,
        platform: Arc<dyn Platform>,
    ) -> Self {
        Self {
            config,
            data_dir: data_dir.into(),
            source,
            fetcher,
            platform,
        }
    }

    /// Check for a newer launcher and hand over to it. `current_exe` is the
    /// running binary; `args` are its arguments without the program name.
    #[instrument(skip(self, args))]
    pub async fn run(&self, current_exe: &Path, args: &[String]) -> SelfUpdateOutcome {
        if self.config.dev_instance {
            info!("Developer build, self-update disabled");
            return SelfUpdateOutcome::Disabled;
        }

        let request = match self.prepare(current_exe).await {
            Ok(Some(request)) => request,
            Ok(None) => return SelfUpdateOutcome::UpToDate,
            Err(e) => {
                error!("Self-update failed: {}", e);
                return SelfUpdateOutcome::Disabled;
            }
        };

        info!("Launching self-update {}", request.tag);
        match self.platform.spawn_detached(&request.relaunch_command(args)) {
            Ok(_) => SelfUpdateOutcome::Relaunched,
            Err(e) => {
                error!("Failed to launch self-update: {}", e);
                SelfUpdateOutcome::Disabled
            }
        }
    }

    /// Resolve, download and verify a newer binary. `None` when the running
    /// version is current.
    async fn prepare(&self, current_exe: &Path) -> LauncherResult<Option<SelfUpdateRequest>> {
        let release =
            resolve_release(self.source.as_ref(), &self.config.launcher_repo, &Channel::Latest)
                .await?;
        let tag = release.version();
        if tag == self.config.version {
            return Ok(None);
        }

        info!("Self-update available: {} -> {}", self.config.version, tag);
        let asset = select_asset(&release, self.platform.launcher_asset_filter())?;

        let downloaded = self
            .data_dir
            .join(UPDATE_DIR_NAME)
            .join(single_component(tag)?)
            .join(single_component(&asset.name)?);
        download_verified(
            self.fetcher.as_ref(),
            asset,
            &downloaded,
            DigestPolicy::Required,
        )
        .await?;
        make_executable(&downloaded)?;
        info!("Self-update download complete");

        Ok(Some(SelfUpdateRequest {
            tag: tag.to_string(),
            downloaded,
            original: current_exe.to_path_buf(),
        }))
    }
}

/// `name` as one plain path component. Release tags and asset names come
/// from the network and must not climb out of the update directory.
fn single_component(name: &str) -> LauncherResult<&str> {
    let mut components = Path::new(name).components();
    let plain = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !plain || name.contains(['/', '\\']) {
        return Err(LauncherError::Other(format!(
            "Refusing unsafe release path component {name:?}"
        )));
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::downloader::digest::sha256_hex;
    use crate::core::platform::TargetOs;
    use crate::core::release::{Asset, Release};
    use crate::core::testing::{FakeFetcher, FakePlatform, FakeReleases};

    const BINARY: &[u8] = b"\x7fELF new launcher";

    fn launcher_release(tag: &str, digest: Option<String>) -> Release {
        Release {
            tag_name: tag.into(),
            prerelease: false,
            assets: vec![
                Asset {
                    name: "tc2-launcher.exe".into(),
                    browser_download_url: "https://example.invalid/tc2-launcher.exe".into(),
                    digest: None,
                },
                Asset {
                    name: "tc2-launcher-linux".into(),
                    browser_download_url: "https://example.invalid/tc2-launcher-linux".into(),
                    digest,
                },
            ],
        }
    }

    fn release_config() -> LauncherConfig {
        LauncherConfig {
            version: "0.1.0".into(),
            dev_instance: false,
            ..LauncherConfig::default()
        }
    }

    fn updater(
        config: LauncherConfig,
        data_dir: &Path,
        source: FakeReleases,
        fetcher: Arc<FakeFetcher>,
        platform: Arc<FakePlatform>,
    ) -> SelfUpdater {
        SelfUpdater::new(config, data_dir, Arc::new(source), fetcher, platform)
    }

    fn argv(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn same_version_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(FakeFetcher::serving(BINARY.to_vec()));
        let platform = Arc::new(FakePlatform::new(TargetOs::Linux));
        let source = FakeReleases::new().with_latest(launcher_release("v0.1.0", None));

        let outcome = updater(release_config(), dir.path(), source, fetcher.clone(), platform.clone())
            .run(Path::new("/opt/tc2-launcher"), &[])
            .await;

        assert_eq!(outcome, SelfUpdateOutcome::UpToDate);
        assert_eq!(fetcher.calls(), 0);
        assert!(platform.spawned().is_empty());
    }

    #[tokio::test]
    async fn dev_builds_never_check() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(FakeFetcher::serving(BINARY.to_vec()));
        let platform = Arc::new(FakePlatform::new(TargetOs::Linux));
        let config = LauncherConfig {
            dev_instance: true,
            ..release_config()
        };

        let outcome = updater(config, dir.path(), FakeReleases::new(), fetcher.clone(), platform)
            .run(Path::new("/opt/tc2-launcher"), &[])
            .await;

        assert_eq!(outcome, SelfUpdateOutcome::Disabled);
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test]
    async fn newer_release_relaunches_in_replace_mode() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(FakeFetcher::serving(BINARY.to_vec()));
        let platform = Arc::new(FakePlatform::new(TargetOs::Linux));
        let digest = Some(format!("sha256:{}", sha256_hex(BINARY)));
        let source = FakeReleases::new().with_latest(launcher_release("v0.2.0", digest));

        let outcome = updater(release_config(), dir.path(), source, fetcher, platform.clone())
            .run(
                Path::new("/opt/tc2-launcher"),
                &argv(&["--launch", "--replace", "--opts", "-novid"]),
            )
            .await;

        assert_eq!(outcome, SelfUpdateOutcome::Relaunched);
        let downloaded = dir.path().join("update/0.2.0/tc2-launcher-linux");
        assert_eq!(std::fs::read(&downloaded).unwrap(), BINARY);

        let spawned = platform.spawned();
        assert_eq!(spawned.len(), 1);
        assert_eq!(spawned[0].program, downloaded);
        assert_eq!(
            spawned[0].args,
            argv(&["--replace", "/opt/tc2-launcher", "--launch", "--opts", "-novid"])
        );
    }

    #[tokio::test]
    async fn unverifiable_binary_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(FakeFetcher::serving(BINARY.to_vec()));
        let platform = Arc::new(FakePlatform::new(TargetOs::Linux));
        let source = FakeReleases::new().with_latest(launcher_release("v0.2.0", None));

        let outcome = updater(release_config(), dir.path(), source, fetcher, platform.clone())
            .run(Path::new("/opt/tc2-launcher"), &[])
            .await;

        assert_eq!(outcome, SelfUpdateOutcome::Disabled);
        assert!(platform.spawned().is_empty());
        assert!(!dir.path().join("update/0.2.0/tc2-launcher-linux").exists());
    }

    #[tokio::test]
    async fn tampered_binary_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(FakeFetcher::serving(b"tampered".to_vec()));
        let platform = Arc::new(FakePlatform::new(TargetOs::Linux));
        let digest = Some(format!("sha256:{}", sha256_hex(BINARY)));
        let source = FakeReleases::new().with_latest(launcher_release("v0.2.0", digest));

        let outcome = updater(release_config(), dir.path(), source, fetcher, platform.clone())
            .run(Path::new("/opt/tc2-launcher"), &[])
            .await;

        assert_eq!(outcome, SelfUpdateOutcome::Disabled);
        assert!(platform.spawned().is_empty());
    }

    #[test]
    fn path_components_must_be_plain_names() {
        assert_eq!(single_component("0.2.0").unwrap(), "0.2.0");
        assert_eq!(single_component("tc2-launcher-linux").unwrap(), "tc2-launcher-linux");
        for bad in ["", ".", "..", "../../x", "a/b", "a\\b", "/abs"] {
            assert!(single_component(bad).is_err(), "{bad:?} accepted");
        }
    }

    #[tokio::test]
    async fn traversing_tag_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        let fetcher = Arc::new(FakeFetcher::serving(BINARY.to_vec()));
        let platform = Arc::new(FakePlatform::new(TargetOs::Linux));
        let digest = Some(format!("sha256:{}", sha256_hex(BINARY)));
        let source = FakeReleases::new().with_latest(launcher_release("../../x", digest));

        let outcome = updater(release_config(), &data_dir, source, fetcher.clone(), platform.clone())
            .run(Path::new("/opt/tc2-launcher"), &[])
            .await;

        assert_eq!(outcome, SelfUpdateOutcome::Disabled);
        assert_eq!(fetcher.calls(), 0);
        assert!(platform.spawned().is_empty());
        assert!(!dir.path().join("x").exists());
    }

    #[tokio::test]
    async fn unreachable_release_host_disables_self_update() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(FakeFetcher::failing());
        let platform = Arc::new(FakePlatform::new(TargetOs::Linux));

        let outcome = updater(release_config(), dir.path(), FakeReleases::new(), fetcher, platform)
            .run(Path::new("/opt/tc2-launcher"), &[])
            .await;

        assert_eq!(outcome, SelfUpdateOutcome::Disabled);
    }
}
