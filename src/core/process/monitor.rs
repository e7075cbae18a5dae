// ─── Process Monitor ───
// Two independent primitives: detect-running (poll the process list for the
// game inside the configured directory) and wait-for-exit (one background
// watcher that fires a completion callback exactly once).

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::table::ProcessTable;
use crate::core::paths::is_within;

const POLL_INTERVAL: Duration = Duration::from_millis(200);
const EXIT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// A running game process found inside the game directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameProcess {
    pub pid: u32,
    pub exe: PathBuf,
}

/// How long detect-running may keep polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunningProbe {
    /// One check, no waiting.
    Immediate,
    /// Keep polling up to this long.
    Within(Duration),
}

impl RunningProbe {
    pub const DEFAULT_BUDGET: Duration = Duration::from_secs(5);

    /// Front-end budget in seconds: `0` means the default wait, a negative
    /// value means a single immediate check.
    pub fn from_secs(secs: f64) -> Self {
        if secs < 0.0 || secs.is_nan() {
            RunningProbe::Immediate
        } else if secs == 0.0 {
            RunningProbe::Within(Self::DEFAULT_BUDGET)
        } else {
            RunningProbe::Within(Duration::from_secs_f64(secs))
        }
    }
}

impl Default for RunningProbe {
    fn default() -> Self {
        RunningProbe::Within(Self::DEFAULT_BUDGET)
    }
}

pub struct ProcessMonitor {
    table: Arc<dyn ProcessTable>,
    /// Pid covered by the active exit watcher, if any.
    watcher: Arc<Mutex<Option<u32>>>,
    poll_interval: Duration,
    exit_poll_interval: Duration,
}

impl ProcessMonitor {
    pub fn new(table: Arc<dyn ProcessTable>) -> Self {
        Self {
            table,
            watcher: Arc::new(Mutex::new(None)),
            poll_interval: POLL_INTERVAL,
            exit_poll_interval: EXIT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_intervals(mut self, running: Duration, exit: Duration) -> Self {
        self.poll_interval = running;
        self.exit_poll_interval = exit;
        self
    }

    /// Single check: a process named exactly `process_name` whose executable
    /// lies under `game_dir`. Same-named processes elsewhere are ignored.
    pub fn find_game_process(&self, process_name: &str, game_dir: &Path) -> Option<GameProcess> {
        find_in(self.table.as_ref(), process_name, game_dir)
    }

    /// Poll for the game process every 200 ms within `probe`'s budget.
    pub async fn wait_game_running(
        &self,
        process_name: &str,
        game_dir: &Path,
        probe: RunningProbe,
    ) -> Option<GameProcess> {
        let budget = match probe {
            RunningProbe::Immediate => Duration::ZERO,
            RunningProbe::Within(budget) => budget,
        };
        let deadline = Instant::now() + budget;

        loop {
            let table = Arc::clone(&self.table);
            let name = process_name.to_string();
            let dir = game_dir.to_path_buf();
            let found = tokio::task::spawn_blocking(move || find_in(table.as_ref(), &name, &dir))
                .await
                .unwrap_or_else(|e| {
                    warn!("Process scan failed: {}", e);
                    None
                });
            if let Some(found) = found {
                debug!("Game process running: pid {} ({:?})", found.pid, found.exe);
                return Some(found);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }
            tokio::time::sleep(self.poll_interval.min(remaining)).await;
        }
    }

    /// Whether an exit watcher is currently active.
    pub fn is_watching(&self) -> bool {
        self.watcher
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Watch `pid` on a dedicated background thread and call `on_exit` once
    /// it terminates. Returns `false` without doing anything when a watcher
    /// is already active. A pid that is already gone fires immediately.
    pub fn wait_for_exit<F>(&self, pid: u32, on_exit: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        {
            let mut slot = self.watcher.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(active) = *slot {
                debug!("Exit watcher already active for pid {}", active);
                return false;
            }
            *slot = Some(pid);
        }

        let table = Arc::clone(&self.table);
        let slot = Arc::clone(&self.watcher);
        let interval = self.exit_poll_interval;

        let spawned = std::thread::Builder::new()
            .name("game-exit-watcher".into())
            .spawn(move || {
                while table.is_alive(pid) {
                    std::thread::sleep(interval);
                }
                slot.lock().unwrap_or_else(PoisonError::into_inner).take();
                info!("Game process {} exited", pid);
                on_exit();
            });

        if let Err(e) = spawned {
            warn!("Failed to start exit watcher for pid {}: {}", pid, e);
            self.watcher
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            return false;
        }
        true
    }
}

fn find_in(table: &dyn ProcessTable, process_name: &str, game_dir: &Path) -> Option<GameProcess> {
    table
        .snapshot()
        .into_iter()
        .filter(|entry| entry.name == process_name)
        .find_map(|entry| {
            let exe = entry.exe?;
            is_within(&exe, game_dir).then_some(GameProcess {
                pid: entry.pid,
                exe,
            })
        })
}
