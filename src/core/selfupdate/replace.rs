// ─── Replace Mode ───
// Second half of the self-update: the freshly downloaded binary, started as
//   <new-binary> --replace <original-path> [forwarded args...]
// waits for the old process to let go of its executable, then copies itself
// over it.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::platform::{DetachedCommand, Platform};

pub const REPLACE_FLAG: &str = "--replace";

/// Parsed replace-mode invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceRequest {
    /// Binary to overwrite.
    pub original: PathBuf,
    /// Arguments the original process was started with.
    pub forwarded: Vec<String>,
}

impl ReplaceRequest {
    /// Recognise `argv` (program name included) as a replace-mode call.
    pub fn from_args(argv: &[String]) -> Option<Self> {
        match argv {
            [_, flag, original, forwarded @ ..] if flag == REPLACE_FLAG && !original.is_empty() => {
                Some(Self {
                    original: PathBuf::from(original),
                    forwarded: forwarded.to_vec(),
                })
            }
            _ => None,
        }
    }

    /// Exactly `<bin> --replace <path>`: the original was the interactive
    /// front-end and gets started again afterwards.
    pub fn relaunch_front_end(&self) -> bool {
        self.forwarded.is_empty()
    }
}

/// How long to wait for the original executable to be released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaceBudget {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for ReplaceBudget {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            interval: Duration::from_millis(100),
        }
    }
}

/// What the replaced binary does next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AfterReplace {
    /// The original was restarted without arguments; exit now.
    RelaunchedFrontEnd,
    /// Run the normal command-line flow with these arguments, then exit.
    Continue(Vec<String>),
}

/// Remove `request.original` once its process has exited and copy
/// `self_path` into its place. Gives up with [`LauncherError::Timeout`]
/// when the file is still held after `budget.timeout`.
pub async fn replace_original(
    request: &ReplaceRequest,
    self_path: &Path,
    budget: ReplaceBudget,
) -> LauncherResult<()> {
    let original = &request.original;
    let deadline = Instant::now() + budget.timeout;
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        match tokio::fs::remove_file(original).await {
            Ok(()) => break,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => break,
            Err(e) => {
                if Instant::now() >= deadline {
                    warn!(
                        "Original binary {:?} still locked after {} attempts: {}",
                        original, attempts, e
                    );
                    return Err(LauncherError::Timeout {
                        what: format!("waiting for {} to be released", original.display()),
                        after: budget.timeout,
                    });
                }
                debug!("Original binary still in use ({}), retrying", e);
                tokio::time::sleep(budget.interval).await;
            }
        }
    }

    tokio::fs::copy(self_path, original)
        .await
        .map_err(LauncherError::io(original))?;
    make_executable(original)?;

    info!("Replaced {:?} with {:?}", original, self_path);
    Ok(())
}

/// Full replace-mode run: replace, then relaunch the front-end or hand the
/// forwarded arguments back to the caller.
pub async fn apply_replace(
    platform: &dyn Platform,
    request: &ReplaceRequest,
    self_path: &Path,
    budget: ReplaceBudget,
) -> LauncherResult<AfterReplace> {
    replace_original(request, self_path, budget).await?;

    if request.relaunch_front_end() {
        platform.spawn_detached(&DetachedCommand::new(&request.original))?;
        return Ok(AfterReplace::RelaunchedFrontEnd);
    }
    Ok(AfterReplace::Continue(request.forwarded.clone()))
}

#[cfg(unix)]
pub(crate) fn make_executable(path: &Path) -> LauncherResult<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .map_err(LauncherError::io(path))
}

#[cfg(not(unix))]
pub(crate) fn make_executable(_path: &Path) -> LauncherResult<()> {
    Ok(())
}
