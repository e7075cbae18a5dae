use std::path::Path;

use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};

/// Unpack `zip_path` into `target`, overwriting existing files in place.
///
/// Unix permission bits stored in the archive's external attributes are
/// applied explicitly after each file is written; the game's launch script
/// is useless without its executable bit. Directory modes are applied last
/// so a read-only directory entry cannot block its own children. Files a
/// previous extraction left read-only are made writable before being
/// replaced. Entries that would land outside `target` are rejected.
pub fn extract_zip_file(zip_path: &Path, target: &Path) -> LauncherResult<usize> {
    let zip_file = std::fs::File::open(zip_path).map_err(LauncherError::io(zip_path))?;
    let mut archive = zip::ZipArchive::new(zip_file)?;

    std::fs::create_dir_all(target).map_err(LauncherError::io(target))?;

    let mut files = 0;
    let mut dir_modes = Vec::new();
    for index in 0..archive.len() {
        let mut zipped = archive.by_index(index)?;
        let rel_path = zipped
            .enclosed_name()
            .ok_or_else(|| LauncherError::Other(format!("Invalid zip entry path: {}", zipped.name())))?;

        if rel_path.as_os_str().is_empty() {
            continue;
        }

        let out_path = target.join(&rel_path);
        if zipped.is_dir() {
            std::fs::create_dir_all(&out_path).map_err(LauncherError::io(&out_path))?;
            ensure_writable(&out_path)?;
            dir_modes.push((out_path, zipped.unix_mode()));
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).map_err(LauncherError::io(parent))?;
            ensure_writable(parent)?;
        }
        if out_path.is_file() {
            ensure_writable(&out_path)?;
        }

        {
            let mut out = std::fs::File::create(&out_path).map_err(LauncherError::io(&out_path))?;
            std::io::copy(&mut zipped, &mut out).map_err(LauncherError::io(&out_path))?;
        }
        apply_unix_mode(&out_path, zipped.unix_mode())?;
        files += 1;
    }

    for (dir, mode) in dir_modes.iter().rev() {
        apply_unix_mode(dir, *mode)?;
    }

    debug!("Extracted {} files from {:?} into {:?}", files, zip_path, target);
    Ok(files)
}

#[cfg(unix)]
fn apply_unix_mode(path: &Path, mode: Option<u32>) -> LauncherResult<()> {
    use std::os::unix::fs::PermissionsExt;

    let Some(mode) = mode.map(|m| m & 0o7777).filter(|m| *m != 0) else {
        return Ok(());
    };
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .map_err(LauncherError::io(path))
}

#[cfg(not(unix))]
fn apply_unix_mode(_path: &Path, _mode: Option<u32>) -> LauncherResult<()> {
    Ok(())
}

/// Give the owner write access to an existing file or directory.
#[cfg(unix)]
fn ensure_writable(path: &Path) -> LauncherResult<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = std::fs::metadata(path)
        .map_err(LauncherError::io(path))?
        .permissions();
    let mode = perms.mode();
    if mode & 0o200 != 0 {
        return Ok(());
    }
    perms.set_mode(mode | 0o200);
    std::fs::set_permissions(path, perms).map_err(LauncherError::io(path))
}

#[cfg(not(unix))]
fn ensure_writable(path: &Path) -> LauncherResult<()> {
    let mut perms = std::fs::metadata(path)
        .map_err(LauncherError::io(path))?
        .permissions();
    if !perms.readonly() {
        return Ok(());
    }
    #[allow(clippy::permissions_set_readonly_false)]
    perms.set_readonly(false);
    std::fs::set_permissions(path, perms).map_err(LauncherError::io(path))
}
