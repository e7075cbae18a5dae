use std::path::{Path, PathBuf};

use sysinfo::{Pid, ProcessRefreshKind, ProcessStatus, RefreshKind, System};

/// One row of the OS process list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub pid: u32,
    pub name: String,
    /// Executable path as reported by the OS, when it can be read.
    pub exe: Option<PathBuf>,
}

/// Read access to the OS process list.
pub trait ProcessTable: Send + Sync {
    /// Every live process right now.
    fn snapshot(&self) -> Vec<ProcessEntry>;

    /// `false` once `pid` has exited (zombies count as exited).
    fn is_alive(&self, pid: u32) -> bool;
}

/// [`ProcessTable`] backed by `sysinfo`. Each call takes a fresh snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct SysinfoProcessTable;

impl SysinfoProcessTable {
    fn load() -> System {
        System::new_with_specifics(
            RefreshKind::new().with_processes(ProcessRefreshKind::everything()),
        )
    }
}

fn is_running(status: ProcessStatus) -> bool {
    !matches!(status, ProcessStatus::Zombie | ProcessStatus::Dead)
}

impl ProcessTable for SysinfoProcessTable {
    fn snapshot(&self) -> Vec<ProcessEntry> {
        let system = Self::load();
        let mut entries: Vec<ProcessEntry> = system
            .processes()
            .iter()
            .filter(|(_, process)| is_running(process.status()))
            .map(|(pid, process)| ProcessEntry {
                pid: pid.as_u32(),
                name: process.name().to_string_lossy().into_owned(),
                exe: process.exe().map(Path::to_path_buf),
            })
            .collect();
        // Lowest pid first: on Linux a process's threads are listed too and
        // always carry higher ids than the process itself.
        entries.sort_by_key(|entry| entry.pid);
        entries
    }

    fn is_alive(&self, pid: u32) -> bool {
        Self::load()
            .process(Pid::from_u32(pid))
            .is_some_and(|process| is_running(process.status()))
    }
}
