// ─── Self-Update ───
// Two-phase protocol: the running launcher downloads its successor and starts
// it in replace mode, then exits; the successor overwrites the original
// binary once it is released.

pub mod replace;
pub mod updater;

pub use replace::{apply_replace, replace_original, AfterReplace, ReplaceBudget, ReplaceRequest};
pub use updater::{SelfUpdateOutcome, SelfUpdateRequest, SelfUpdater};

use std::path::Path;

use tracing::debug;

/// Remove leftovers of a finished self-update. Failures are ignored.
pub fn clean_self_update(data_dir: &Path) {
    let update_dir = data_dir.join(updater::UPDATE_DIR_NAME);
    if update_dir.is_dir() {
        match std::fs::remove_dir_all(&update_dir) {
            Ok(()) => debug!("Removed self-update directory {:?}", update_dir),
            Err(e) => debug!("Could not remove {:?}: {}", update_dir, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleanup_removes_update_tree_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("update/0.2.0")).unwrap();
        std::fs::write(dir.path().join("update/0.2.0/tc2-launcher-linux"), b"bin").unwrap();
        std::fs::write(dir.path().join("settings.json"), b"{}").unwrap();

        clean_self_update(dir.path());

        assert!(!dir.path().join("update").exists());
        assert!(dir.path().join("settings.json").exists());

        // Nothing to clean is fine too.
        clean_self_update(dir.path());
    }
}
