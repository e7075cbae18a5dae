use super::model::{Asset, Release};
use crate::core::error::{LauncherError, LauncherResult};

/// First asset whose name contains `filter`, ignoring case.
pub fn select_asset<'a>(release: &'a Release, filter: &str) -> LauncherResult<&'a Asset> {
    let needle = filter.to_lowercase();
    release
        .assets
        .iter()
        .find(|asset| asset.name.to_lowercase().contains(&needle))
        .ok_or_else(|| LauncherError::AssetNotFound {
            filter: filter.to_string(),
            tag: release.tag_name.clone(),
        })
}
