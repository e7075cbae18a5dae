// ─── Archive Installer ───
// Keeps the game directory in sync with the selected release:
//   Check → Resolve → Download → Verify → Extract → Confirm → Commit
// with an up-to-date short-circuit after resolution. Every failure maps to a
// status code; nothing escapes `update`.

pub mod extract;

pub use extract::extract_zip_file;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info, instrument};

use crate::core::downloader::{fetch_asset, verify_asset, AssetFetcher, DigestPolicy, ScratchDownload};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::events::{GameVersion, VersionEvents};
use crate::core::platform::Platform;
use crate::core::release::{resolve_release, select_asset, Channel, ReleaseSource};
use crate::core::store::{InstallState, Store};

/// Outcome of one update attempt, as reported to the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStatus {
    /// Installed release already matches the resolved one.
    UpToDate,
    /// A new release was installed and committed.
    Updated,
    /// The update failed; the previous install is still usable.
    FailedKeptInstall,
    /// The update failed and there is no usable install.
    FailedNoInstall,
    /// Extraction finished but produced no game executable.
    MissingExecutable,
}

impl UpdateStatus {
    pub fn code(self) -> i32 {
        match self {
            UpdateStatus::UpToDate | UpdateStatus::Updated => 0,
            UpdateStatus::FailedKeptInstall => 1,
            UpdateStatus::FailedNoInstall => 2,
            UpdateStatus::MissingExecutable => -2,
        }
    }

    pub fn is_success(self) -> bool {
        self.code() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InstallStep {
    Check,
    Resolve,
    Download,
    Verify,
    Extract,
    Confirm,
    Commit,
}

pub struct ArchiveInstaller {
    store: Store,
    source: Arc<dyn ReleaseSource>,
    fetcher: Arc<dyn AssetFetcher>,
    platform: Arc<dyn Platform>,
    events: Arc<VersionEvents>,
    repo: String,
    game_dir: PathBuf,
}

impl ArchiveInstaller {
    pub fn new(
        store: Store,
        source: Arc<dyn ReleaseSource>,
        fetcher: Arc<dyn AssetFetcher>,
        platform: Arc<dyn Platform>,
        events: Arc<VersionEvents>,
        repo: impl Into<String>,
        game_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            source,
            fetcher,
            platform,
            events,
            repo: repo.into(),
            game_dir: game_dir.into(),
        }
    }

    pub fn game_dir(&self) -> &Path {
        &self.game_dir
    }

    pub fn executable(&self) -> PathBuf {
        self.game_dir.join(self.platform.executable_file_name())
    }

    /// Bring the game install up to date. `force` reinstalls even when the
    /// committed tag and digest already match.
    #[instrument(skip(self), fields(repo = %self.repo))]
    pub async fn update(&self, force: bool) -> UpdateStatus {
        self.update_traced(force).await.0
    }

    /// `update`, also reporting the last step the state machine entered.
    async fn update_traced(&self, force: bool) -> (UpdateStatus, InstallStep) {
        let mut reached = InstallStep::Check;
        step(&mut reached, InstallStep::Check);
        let had_install = self.executable().is_file();
        let failed = if had_install {
            UpdateStatus::FailedKeptInstall
        } else {
            UpdateStatus::FailedNoInstall
        };

        let state = self.store.read_state();
        self.events.publish(GameVersion {
            tag: state.tag.clone(),
            digest: state.digest.clone(),
        });

        let status = match self.run(force, had_install, &state, &mut reached).await {
            Ok(status) => {
                info!("Game update finished: {:?}", status);
                status
            }
            Err(e) => {
                error!("Game update failed during {:?}: {}", reached, e);
                failed
            }
        };
        (status, reached)
    }

    async fn run(
        &self,
        force: bool,
        had_install: bool,
        state: &InstallState,
        reached: &mut InstallStep,
    ) -> LauncherResult<UpdateStatus> {
        step(reached, InstallStep::Resolve);
        let channel = Channel::from_selector(&self.store.channel_selector());
        let release = resolve_release(self.source.as_ref(), &self.repo, &channel).await?;
        let asset = select_asset(&release, self.platform.game_asset_filter())?;

        if !force
            && had_install
            && state.tag.as_deref() == Some(release.tag_name.as_str())
            && state.digest == asset.digest
        {
            debug!("Release {} already installed", release.tag_name);
            return Ok(UpdateStatus::UpToDate);
        }

        step(reached, InstallStep::Download);
        let scratch = ScratchDownload::new(&asset.name)?;
        fetch_asset(self.fetcher.as_ref(), asset, scratch.path()).await?;

        step(reached, InstallStep::Verify);
        verify_asset(asset, scratch.path(), DigestPolicy::IfPublished).await?;

        if asset.name.to_ascii_lowercase().ends_with(".zip") {
            step(reached, InstallStep::Extract);
            let archive = scratch.path().to_path_buf();
            let target = self.game_dir.clone();
            tokio::task::spawn_blocking(move || extract_zip_file(&archive, &target))
                .await
                .map_err(|e| LauncherError::Other(format!("Task join error: {e}")))??;
        }
        drop(scratch);

        step(reached, InstallStep::Confirm);
        if !self.game_dir.is_dir() {
            return Err(LauncherError::Other(format!(
                "Game directory missing after install: {}",
                self.game_dir.display()
            )));
        }
        if !self.executable().is_file() {
            error!("Game executable missing after extracting {}", asset.name);
            return Ok(UpdateStatus::MissingExecutable);
        }

        step(reached, InstallStep::Commit);
        let committed = InstallState {
            tag: Some(release.tag_name.clone()),
            digest: asset.digest.clone(),
        };
        self.store.write_state(&committed)?;
        self.events.publish(GameVersion {
            tag: committed.tag,
            digest: committed.digest,
        });

        info!("Installed game release {}", release.tag_name);
        Ok(UpdateStatus::Updated)
    }
}

fn step(reached: &mut InstallStep, next: InstallStep) {
    debug!("Update step: {:?}", next);
    *reached = next;
}
