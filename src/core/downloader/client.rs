use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;

use crate::core::config::LauncherConfig;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::build_download_client;

/// Write buffer for streamed downloads.
const CHUNK_SIZE: usize = 1024 * 1024;

/// Something that can copy a remote asset to a local file.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Stream `url` into `dest`, creating parent directories. Returns the
    /// number of bytes written. A partially written file is never valid;
    /// callers gate acceptance on digest verification.
    async fn fetch(&self, url: &str, dest: &Path) -> LauncherResult<u64>;
}

/// Single-stream sequential HTTP downloader.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &LauncherConfig) -> LauncherResult<Self> {
        Ok(Self {
            client: build_download_client(config)?,
        })
    }
}

#[async_trait]
impl AssetFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> LauncherResult<u64> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(LauncherError::io(parent))?;
        }

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        // Scope the handle so it is closed before anyone reads the file back.
        let written = {
            let file = tokio::fs::File::create(dest)
                .await
                .map_err(LauncherError::io(dest))?;
            let mut writer = BufWriter::with_capacity(CHUNK_SIZE, file);
            let mut stream = response.bytes_stream();
            let mut written = 0_u64;
            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                writer
                    .write_all(&chunk)
                    .await
                    .map_err(LauncherError::io(dest))?;
                written = written.saturating_add(chunk.len() as u64);
            }
            writer.flush().await.map_err(LauncherError::io(dest))?;
            written
        };

        debug!("Downloaded {} bytes: {} -> {:?}", written, url, dest);
        Ok(written)
    }
}

/// A download target inside a fresh scratch directory. The directory and
/// anything left in it are removed on drop, so retries never see a previous
/// partial file.
#[derive(Debug)]
pub struct ScratchDownload {
    dir: tempfile::TempDir,
    path: PathBuf,
}

impl ScratchDownload {
    pub fn new(file_name: &str) -> LauncherResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix("TC2Launcher")
            .tempdir()
            .map_err(LauncherError::io(std::env::temp_dir()))?;
        // Asset names come from the network; never let one escape the dir.
        let name = Path::new(file_name)
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "download".into());
        let path = dir.path().join(name);
        Ok(Self { dir, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }
}
