pub mod client;
pub mod digest;

pub use client::{AssetFetcher, HttpFetcher, ScratchDownload};
pub use digest::{check_download, ContentDigest, DigestPolicy, Verification};

use std::path::Path;

use tracing::{error, info};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::release::Asset;

/// Fetch `asset` into `dest` and gate it on its published digest.
///
/// On any failure the file at `dest` is removed; a rejected download is
/// never left behind to be mistaken for a valid one.
pub async fn download_verified(
    fetcher: &dyn AssetFetcher,
    asset: &Asset,
    dest: &Path,
    policy: DigestPolicy,
) -> LauncherResult<()> {
    fetch_asset(fetcher, asset, dest).await?;
    verify_asset(asset, dest, policy).await
}

/// Download step alone. A partial file is removed on failure.
pub async fn fetch_asset(fetcher: &dyn AssetFetcher, asset: &Asset, dest: &Path) -> LauncherResult<()> {
    info!("Downloading {} to {:?}", asset.name, dest);
    if let Err(e) = fetcher.fetch(&asset.browser_download_url, dest).await {
        discard(dest).await;
        return Err(e);
    }
    Ok(())
}

/// Verification step alone: hash `dest` off the runtime and apply `policy`
/// to the digest published on `asset`. A rejected file is removed.
pub async fn verify_asset(asset: &Asset, dest: &Path, policy: DigestPolicy) -> LauncherResult<()> {
    let path = dest.to_path_buf();
    let published = asset.digest.clone();
    let verdict = tokio::task::spawn_blocking(move || {
        check_download(&path, published.as_deref(), policy)
    })
    .await
    .map_err(|e| LauncherError::Other(format!("Task join error: {e}")))?;

    if let Err(e) = verdict {
        error!("Verification of {} failed: {}", asset.name, e);
        discard(dest).await;
        return Err(e);
    }

    Ok(())
}

async fn discard(path: &Path) {
    let _ = tokio::fs::remove_file(path).await;
}
