pub mod model;
pub mod select;
pub mod source;

pub use model::{Asset, Channel, Release};
pub use select::select_asset;
pub use source::{resolve_release, GitHubReleases, ReleaseSource};
