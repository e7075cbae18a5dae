//! Hand-written fakes for the trait seams of the core.

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::downloader::AssetFetcher;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::platform::{DetachedCommand, Platform, TargetOs};
use crate::core::process::{ProcessEntry, ProcessTable};
use crate::core::release::{Release, ReleaseSource};

// ── Releases ────────────────────────────────────────────

#[derive(Default)]
pub struct FakeReleases {
    latest: Option<Release>,
    newest: Option<Release>,
    tags: HashMap<String, Release>,
    queries: AtomicUsize,
}

impl FakeReleases {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latest(mut self, release: Release) -> Self {
        self.latest = Some(release);
        self
    }

    pub fn with_newest(mut self, release: Release) -> Self {
        self.newest = Some(release);
        self
    }

    pub fn with_tag(mut self, release: Release) -> Self {
        self.tags.insert(release.tag_name.clone(), release);
        self
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn answer(&self, repo: &str, release: Option<&Release>) -> LauncherResult<Release> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        release
            .cloned()
            .ok_or_else(|| LauncherError::HttpStatus {
                url: format!("fake://{repo}"),
                status: 404,
            })
    }
}

#[async_trait]
impl ReleaseSource for FakeReleases {
    async fn latest(&self, repo: &str) -> LauncherResult<Release> {
        self.answer(repo, self.latest.as_ref())
    }

    async fn by_tag(&self, repo: &str, tag: &str) -> LauncherResult<Release> {
        self.answer(repo, self.tags.get(tag))
    }

    async fn newest(&self, repo: &str) -> LauncherResult<Release> {
        self.answer(repo, self.newest.as_ref())
    }
}

// ── Downloads ───────────────────────────────────────────

pub struct FakeFetcher {
    body: Option<Vec<u8>>,
    calls: AtomicUsize,
}

impl FakeFetcher {
    pub fn serving(body: Vec<u8>) -> Self {
        Self {
            body: Some(body),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            body: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssetFetcher for FakeFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> LauncherResult<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let Some(body) = &self.body else {
            return Err(LauncherError::HttpStatus {
                url: url.to_string(),
                status: 503,
            });
        };
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(dest, body)?;
        Ok(body.len() as u64)
    }
}

// ── Platform ────────────────────────────────────────────

pub struct FakePlatform {
    target: TargetOs,
    spawned: Mutex<Vec<DetachedCommand>>,
    opened: Mutex<Vec<std::path::PathBuf>>,
}

impl FakePlatform {
    pub fn new(target: TargetOs) -> Self {
        Self {
            target,
            spawned: Mutex::new(Vec::new()),
            opened: Mutex::new(Vec::new()),
        }
    }

    pub fn spawned(&self) -> Vec<DetachedCommand> {
        self.spawned.lock().unwrap().clone()
    }

    pub fn opened(&self) -> Vec<std::path::PathBuf> {
        self.opened.lock().unwrap().clone()
    }
}

impl Platform for FakePlatform {
    fn target(&self) -> TargetOs {
        self.target
    }

    fn spawn_detached(&self, command: &DetachedCommand) -> LauncherResult<u32> {
        self.spawned.lock().unwrap().push(command.clone());
        Ok(4242)
    }

    fn open_path(&self, path: &Path) -> LauncherResult<()> {
        self.opened.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }
}

// ── Processes ───────────────────────────────────────────

pub struct FakeProcessTable {
    entries: Mutex<Vec<ProcessEntry>>,
    snapshots: AtomicUsize,
}

impl FakeProcessTable {
    pub fn new(entries: Vec<ProcessEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
            snapshots: AtomicUsize::new(0),
        }
    }

    pub fn set(&self, entries: Vec<ProcessEntry>) {
        *self.entries.lock().unwrap() = entries;
    }

    pub fn snapshots(&self) -> usize {
        self.snapshots.load(Ordering::SeqCst)
    }
}

impl ProcessTable for FakeProcessTable {
    fn snapshot(&self) -> Vec<ProcessEntry> {
        self.snapshots.fetch_add(1, Ordering::SeqCst);
        self.entries.lock().unwrap().clone()
    }

    fn is_alive(&self, pid: u32) -> bool {
        self.entries.lock().unwrap().iter().any(|e| e.pid == pid)
    }
}

// ── Archives ────────────────────────────────────────────

/// Build a zip in memory from `(name, contents, unix mode)` entries.
pub fn zip_bytes(entries: &[(&str, &[u8], u32)]) -> Vec<u8> {
    let mut cursor = std::io::Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut cursor);
        for (name, contents, mode) in entries {
            let options = zip::write::SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Stored)
                .unix_permissions(*mode);
            writer.start_file(*name, options).unwrap();
            writer.write_all(contents).unwrap();
        }
        writer.finish().unwrap();
    }
    cursor.into_inner()
}
