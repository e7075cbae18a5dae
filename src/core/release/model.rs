use serde::Deserialize;

/// A tagged publication on the release-hosting service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Release {
    #[serde(default)]
    pub tag_name: String,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

/// One downloadable file attached to a [`Release`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Asset {
    pub name: String,
    pub browser_download_url: String,
    /// Published content digest in `algorithm:hex` form, when the host has one.
    #[serde(default)]
    pub digest: Option<String>,
}

impl Release {
    /// Tag with a leading `v` removed, for comparison with crate versions.
    pub fn version(&self) -> &str {
        self.tag_name.strip_prefix('v').unwrap_or(&self.tag_name)
    }
}

/// Update policy selector stored as `branch` in settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Channel {
    /// Latest stable release.
    Latest,
    /// Most recent release of any kind, pre-releases included.
    Prerelease,
    /// A specific release tag.
    Pinned(String),
}

pub const PRERELEASE_SELECTOR: &str = "prerelease";

impl Channel {
    /// Parse a persisted selector. Unknown names follow latest.
    pub fn from_selector(selector: &str) -> Self {
        let selector = selector.trim();
        if selector == PRERELEASE_SELECTOR {
            Channel::Prerelease
        } else if selector.starts_with(|c: char| c.is_ascii_digit()) {
            Channel::Pinned(selector.to_string())
        } else {
            Channel::Latest
        }
    }
}
