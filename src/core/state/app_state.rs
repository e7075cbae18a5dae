use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::core::config::LauncherConfig;
use crate::core::downloader::{AssetFetcher, HttpFetcher};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::events::VersionEvents;
use crate::core::install::{ArchiveInstaller, UpdateStatus};
use crate::core::launch;
use crate::core::paths::{self, canonical_or_create_dir, default_data_dir, is_within};
use crate::core::platform::{HostPlatform, Platform};
use crate::core::process::{ProcessMonitor, RunningProbe, SysinfoProcessTable};
use crate::core::release::{GitHubReleases, ReleaseSource};
use crate::core::selfupdate::SelfUpdater;
use crate::core::store::Store;

/// Subdirectory used when the chosen install folder already has content.
const MOVED_GAME_DIR_NAME: &str = "tc2";

/// Whether the game is running, as reported to the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchState {
    Idle,
    Running(u32),
}

impl LaunchState {
    pub fn code(self) -> i32 {
        match self {
            LaunchState::Idle => 0,
            LaunchState::Running(_) => 2,
        }
    }
}

/// Everything the front-ends talk to, wired for one data directory.
pub struct AppState {
    pub config: LauncherConfig,
    pub data_dir: PathBuf,
    uses_default_data_dir: bool,
    pub store: Store,
    pub events: Arc<VersionEvents>,
    pub monitor: ProcessMonitor,
    platform: Arc<dyn Platform>,
    source: Arc<dyn ReleaseSource>,
    fetcher: Arc<dyn AssetFetcher>,
}

impl AppState {
    /// Production wiring. `dest` overrides the platform data directory.
    pub fn new(config: LauncherConfig, dest: Option<&Path>) -> LauncherResult<Self> {
        let default_dir = default_data_dir();
        let (data_dir, uses_default_data_dir) = match dest {
            Some(dest) => {
                if dest.exists() && !dest.is_dir() {
                    return Err(LauncherError::Other(format!(
                        "Destination '{}' exists and is not a directory",
                        dest.display()
                    )));
                }
                let dir = canonical_or_create_dir(dest)?;
                let is_default = std::fs::canonicalize(&default_dir)
                    .map(|default| default == dir)
                    .unwrap_or(false);
                (dir, is_default)
            }
            None => (canonical_or_create_dir(&default_dir)?, true),
        };

        let source = Arc::new(GitHubReleases::new(&config)?);
        let fetcher = Arc::new(HttpFetcher::new(&config)?);
        let monitor = ProcessMonitor::new(Arc::new(SysinfoProcessTable));

        Ok(Self::with_parts(
            config,
            data_dir,
            uses_default_data_dir,
            source,
            fetcher,
            Arc::new(HostPlatform),
            monitor,
        ))
    }

    pub fn with_parts(
        config: LauncherConfig,
        data_dir: PathBuf,
        uses_default_data_dir: bool,
        source: Arc<dyn ReleaseSource>,
        fetcher: Arc<dyn AssetFetcher>,
        platform: Arc<dyn Platform>,
        monitor: ProcessMonitor,
    ) -> Self {
        Self {
            config,
            store: Store::new(&data_dir),
            data_dir,
            uses_default_data_dir,
            events: Arc::new(VersionEvents::new()),
            monitor,
            platform,
            source,
            fetcher,
        }
    }

    pub fn platform(&self) -> &dyn Platform {
        self.platform.as_ref()
    }

    pub fn game_dir(&self) -> PathBuf {
        paths::resolve_game_dir(
            &self.data_dir,
            self.uses_default_data_dir,
            &self.store.read_settings(),
            self.platform.target(),
        )
    }

    /// Path of the game executable, if it is installed.
    pub fn game_executable(&self) -> Option<PathBuf> {
        let exe = self.game_dir().join(self.platform.executable_file_name());
        exe.is_file().then_some(exe)
    }

    // ── Updates ─────────────────────────────────────────

    pub fn installer(&self) -> ArchiveInstaller {
        ArchiveInstaller::new(
            self.store.clone(),
            Arc::clone(&self.source),
            Arc::clone(&self.fetcher),
            Arc::clone(&self.platform),
            Arc::clone(&self.events),
            self.config.game_repo.clone(),
            self.game_dir(),
        )
    }

    pub async fn update_archive(&self, force: bool) -> UpdateStatus {
        self.installer().update(force).await
    }

    pub fn self_updater(&self) -> SelfUpdater {
        SelfUpdater::new(
            self.config.clone(),
            &self.data_dir,
            Arc::clone(&self.source),
            Arc::clone(&self.fetcher),
            Arc::clone(&self.platform),
        )
    }

    // ── Game process ────────────────────────────────────

    /// Start the game. Non-empty `overrides` replace the persisted options
    /// for this launch only.
    pub fn launch_game(&self, overrides: &[String]) -> LauncherResult<u32> {
        let exe = self
            .game_executable()
            .ok_or_else(|| LauncherError::Other("Could not locate game executable".into()))?;

        let options = if overrides.is_empty() {
            self.store.launch_options()
        } else {
            overrides.to_vec()
        };
        launch::launch_game(self.platform.as_ref(), &exe, &options)
    }

    /// Look for the running game within `probe`'s budget. When found, arm
    /// the exit watcher so `on_exit` fires once the game closes; a watcher
    /// that is already armed is left alone.
    pub async fn check_launch_state<F>(&self, probe: RunningProbe, on_exit: F) -> LaunchState
    where
        F: FnOnce() + Send + 'static,
    {
        let game_dir = self.game_dir();
        let running = self
            .monitor
            .wait_game_running(self.platform.process_file_name(), &game_dir, probe)
            .await;

        match running {
            Some(game) => {
                self.monitor.wait_for_exit(game.pid, on_exit);
                LaunchState::Running(game.pid)
            }
            None => LaunchState::Idle,
        }
    }

    // ── Settings ────────────────────────────────────────

    pub fn launch_options(&self) -> Vec<String> {
        self.store.launch_options()
    }

    pub fn set_launch_options(&self, options: Vec<String>) -> LauncherResult<()> {
        self.store.set_launch_options(options)
    }

    /// Channel selector: empty (latest), `prerelease` or a pinned tag.
    pub fn channel(&self) -> String {
        self.store.channel_selector()
    }

    pub fn set_channel(&self, selector: &str) -> LauncherResult<()> {
        self.store.set_channel_selector(selector)
    }

    // ── Install folder ──────────────────────────────────

    pub fn open_install_folder(&self) -> LauncherResult<()> {
        let game_dir = self.game_dir();
        if !game_dir.is_dir() {
            warn!("Install folder {:?} does not exist yet", game_dir);
            return Ok(());
        }
        self.platform.open_path(&game_dir)
    }

    /// Move the game install to `new_dir` (or `new_dir/tc2` when `new_dir`
    /// already has content) and remember the new location.
    pub fn change_install_folder(&self, new_dir: &Path) -> LauncherResult<PathBuf> {
        let has_content = std::fs::read_dir(new_dir)
            .map(|mut entries| entries.next().is_some())
            .unwrap_or(false);
        let target = if has_content {
            new_dir.join(MOVED_GAME_DIR_NAME)
        } else {
            new_dir.to_path_buf()
        };
        let target = canonical_or_create_dir(&target)?;

        let old_game_dir = self.game_dir();
        if target == old_game_dir {
            return Ok(target);
        }
        if old_game_dir.is_dir() {
            if is_within(&target, &old_game_dir) {
                return Err(LauncherError::Other(format!(
                    "Cannot move the install into itself: {}",
                    target.display()
                )));
            }
            copy_dir_recursive(&old_game_dir, &target)?;
            std::fs::remove_dir_all(&old_game_dir).map_err(LauncherError::io(&old_game_dir))?;
        }

        self.store.set_game_dir(&target)?;
        info!("Moved game install from {:?} to {:?}", old_game_dir, target);
        Ok(target)
    }

    /// Delete the data directory. Only directories carrying our settings are
    /// removed. Returns whether anything was deleted.
    pub fn uninstall_launcher(&self) -> LauncherResult<bool> {
        if !self.data_dir.is_dir() {
            return Ok(false);
        }
        if self.store.read_settings().is_empty() {
            warn!(
                "{:?} has no launcher settings, refusing to delete it",
                self.data_dir
            );
            return Ok(false);
        }

        std::fs::remove_dir_all(&self.data_dir).map_err(|e| {
            error!("Failed to uninstall launcher: {}", e);
            LauncherError::Io {
                path: self.data_dir.clone(),
                source: e,
            }
        })?;
        info!("Removed launcher data {:?}", self.data_dir);
        Ok(true)
    }
}

/// Merge `source` into `destination`, overwriting files that exist in both.
fn copy_dir_recursive(source: &Path, destination: &Path) -> LauncherResult<()> {
    std::fs::create_dir_all(destination).map_err(LauncherError::io(destination))?;

    for entry in std::fs::read_dir(source).map_err(LauncherError::io(source))? {
        let entry = entry.map_err(LauncherError::io(source))?;
        let src_path = entry.path();
        let dst_path = destination.join(entry.file_name());
        let file_type = entry.file_type().map_err(LauncherError::io(&src_path))?;

        if file_type.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path).map_err(LauncherError::io(&dst_path))?;
        }
    }

    Ok(())
}
