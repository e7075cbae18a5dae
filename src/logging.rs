use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::core::error::{LauncherError, LauncherResult};

pub const LOG_FILE_NAME: &str = "tc2_launcher_log.txt";
const DEFAULT_FILTER: &str = "info,tc2_launcher_lib=debug";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber: stdout plus a single, non-rotating log
/// file in `data_dir`. Keep the returned guard alive until exit or buffered
/// lines are lost.
pub fn init(data_dir: &Path) -> LauncherResult<WorkerGuard> {
    std::fs::create_dir_all(data_dir).map_err(LauncherError::io(data_dir))?;

    let file_appender = rolling::never(data_dir, LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true);
    let console_layer = tracing_subscriber::fmt::layer().with_target(false);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| LauncherError::Other(format!("Logging already initialized: {e}")))?;

    tracing::info!(
        "Logging initialized: file={:?}",
        data_dir.join(LOG_FILE_NAME)
    );
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_writes_to_the_data_dir_once() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("TC2Launcher");

        let guard = init(&data_dir).unwrap();
        tracing::warn!("log line from test");
        drop(guard);

        assert!(data_dir.join(LOG_FILE_NAME).is_file());
        // A second global subscriber is refused, not panicked on.
        assert!(init(&data_dir).is_err());
    }
}
