// ─── Persistent Store ───
// Two small JSON documents in the data directory:
//   settings.json — user preferences (launch options, channel, game dir)
//   state.json    — last committed release tag + digest
// Whole-file overwrite, last writer wins.

mod model;

pub use model::{InstallState, Settings};

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::core::error::{LauncherError, LauncherResult};

const SETTINGS_FILE: &str = "settings.json";
const STATE_FILE: &str = "state.json";

/// Owner of the on-disk launcher documents. Cheap to clone; every read goes
/// to disk so callers always see the last committed value.
#[derive(Debug, Clone)]
pub struct Store {
    data_dir: PathBuf,
}

impl Store {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join(SETTINGS_FILE)
    }

    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join(STATE_FILE)
    }

    // ── settings.json ───────────────────────────────────

    pub fn read_settings(&self) -> Settings {
        read_document(&self.settings_path())
    }

    pub fn write_settings(&self, settings: &Settings) -> LauncherResult<()> {
        write_document(&self.settings_path(), settings)
    }

    /// Persisted launch options, empty when unset.
    pub fn launch_options(&self) -> Vec<String> {
        self.read_settings().opts.unwrap_or_default()
    }

    /// Persist `options`; an empty list removes the key.
    pub fn set_launch_options(&self, options: Vec<String>) -> LauncherResult<()> {
        let mut settings = self.read_settings();
        settings.set_opts((!options.is_empty()).then_some(options));
        self.write_settings(&settings)
    }

    /// Raw channel selector (`branch`), empty when following latest.
    pub fn channel_selector(&self) -> String {
        self.read_settings().branch.unwrap_or_default()
    }

    /// Persist the channel selector; an empty string removes the key.
    pub fn set_channel_selector(&self, selector: &str) -> LauncherResult<()> {
        let mut settings = self.read_settings();
        let selector = selector.trim();
        settings.set_branch((!selector.is_empty()).then(|| selector.to_string()));
        self.write_settings(&settings)
    }

    pub fn set_game_dir(&self, game_dir: &Path) -> LauncherResult<()> {
        let mut settings = self.read_settings();
        settings.set_game_dir(Some(game_dir.to_path_buf()));
        self.write_settings(&settings)
    }

    // ── state.json ──────────────────────────────────────

    pub fn read_state(&self) -> InstallState {
        read_document(&self.state_path())
    }

    pub fn write_state(&self, state: &InstallState) -> LauncherResult<()> {
        write_document(&self.state_path(), state)
    }
}

/// Missing file means defaults. An unreadable or corrupt file is logged and
/// also treated as defaults; it gets replaced on the next write.
fn read_document<T: DeserializeOwned + Default>(path: &Path) -> T {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return T::default(),
        Err(e) => {
            warn!("Cannot read {:?}: {}", path, e);
            return T::default();
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            warn!("Corrupt JSON at {:?}: {}", path, e);
            T::default()
        }
    }
}

/// Two-space indented JSON, written to a sibling temp file and renamed over
/// the target so readers never observe a half-written document.
fn write_document<T: Serialize>(path: &Path, value: &T) -> LauncherResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(LauncherError::io(parent))?;
    }

    let json = serde_json::to_string_pretty(value)?;
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, json).map_err(LauncherError::io(&tmp_path))?;
    std::fs::rename(&tmp_path, path).map_err(LauncherError::io(path))?;
    Ok(())
}
