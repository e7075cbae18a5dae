use std::path::{Component, Path, PathBuf};

use tracing::warn;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::platform::TargetOs;
use crate::core::store::Settings;

pub const APP_DIR_NAME: &str = "TC2Launcher";
const GAME_DIR_NAME: &str = "game";
const WINDOWS_GAME_DIR_NAME: &str = "tc2";

/// Platform data location + `TC2Launcher`: `$XDG_DATA_HOME` (or
/// `~/.local/share`), `~/Library/Application Support`, `%LOCALAPPDATA%`.
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .filter(|base| base.is_absolute())
        .or_else(|| dirs::home_dir().map(|home| home.join(".local").join("share")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

/// Create `path` if needed and return its canonical form.
pub fn canonical_or_create_dir(path: &Path) -> LauncherResult<PathBuf> {
    std::fs::create_dir_all(path).map_err(LauncherError::io(path))?;
    std::fs::canonicalize(path).map_err(LauncherError::io(path))
}

/// Where the game archive is unpacked.
///
/// A custom `game_dir` from settings wins when it can be created. Otherwise
/// the game lives in `<data>/game`, except on Windows with the default data
/// directory and no existing install, where it goes to `<home drive>\tc2`
/// to keep paths short.
pub fn resolve_game_dir(
    data_dir: &Path,
    uses_default_data_dir: bool,
    settings: &Settings,
    target: TargetOs,
) -> PathBuf {
    if let Some(custom) = settings
        .game_dir
        .as_deref()
        .filter(|p| !p.as_os_str().is_empty())
    {
        match canonical_or_create_dir(custom) {
            Ok(dir) if dir.is_dir() => return dir,
            Ok(dir) => warn!("Configured game directory {:?} is not a directory", dir),
            Err(e) => warn!("Failed to use configured game directory {:?}: {}", custom, e),
        }
    }

    let default_game_dir = data_dir.join(GAME_DIR_NAME);
    if uses_default_data_dir && target.is_windows() && !default_game_dir.exists() {
        return home_drive_root().join(WINDOWS_GAME_DIR_NAME);
    }

    default_game_dir
}

fn home_drive_root() -> PathBuf {
    dirs::home_dir()
        .and_then(|home| match home.components().next() {
            Some(Component::Prefix(prefix)) => Some(PathBuf::from(format!(
                "{}\\",
                prefix.as_os_str().to_string_lossy()
            ))),
            _ => None,
        })
        .unwrap_or_else(|| PathBuf::from("C:\\"))
}

/// `true` when `candidate` is `root` or lies beneath it. Compares both the
/// raw and the canonical forms so symlinked install paths still match.
pub fn is_within(candidate: &Path, root: &Path) -> bool {
    if candidate.starts_with(root) {
        return true;
    }
    match (std::fs::canonicalize(candidate), std::fs::canonicalize(root)) {
        (Ok(candidate), Ok(root)) => candidate.starts_with(root),
        (Err(_), Ok(root)) => candidate.starts_with(root),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_data_dir_ends_with_app_name() {
        assert!(default_data_dir().ends_with(APP_DIR_NAME));
    }

    #[test]
    fn custom_data_dir_uses_game_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        let game_dir = resolve_game_dir(dir.path(), false, &Settings::default(), TargetOs::Windows);
        assert_eq!(game_dir, dir.path().join("game"));
    }

    #[test]
    fn configured_game_dir_is_created_and_wins() {
        let dir = tempfile::tempdir().unwrap();
        let custom = dir.path().join("elsewhere").join("tc2");
        let settings = Settings {
            game_dir: Some(custom.clone()),
            ..Settings::default()
        };

        let game_dir = resolve_game_dir(dir.path(), true, &settings, TargetOs::Linux);

        assert!(custom.is_dir());
        assert_eq!(game_dir, std::fs::canonicalize(&custom).unwrap());
    }

    #[test]
    fn default_install_on_posix_stays_in_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let game_dir = resolve_game_dir(dir.path(), true, &Settings::default(), TargetOs::Linux);
        assert_eq!(game_dir, dir.path().join("game"));
    }

    #[test]
    fn containment_is_component_wise() {
        assert!(is_within(Path::new("/games/tc2/bin/tc2_linux64"), Path::new("/games/tc2")));
        assert!(!is_within(Path::new("/games/tc2-old/tc2_linux64"), Path::new("/games/tc2")));
    }
}
