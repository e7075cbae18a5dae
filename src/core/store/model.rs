use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::warn;

const OPTS_KEY: &str = "opts";
const BRANCH_KEY: &str = "branch";
const GAME_DIR_KEY: &str = "game_dir";

/// `settings.json` — user preferences, mutated through explicit setters.
///
/// Each known key is read on its own: a value of the wrong type leaves that
/// field unset and stays in `extra`, so the rest of the document survives
/// and the next write puts the raw value back untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    /// Launch options passed verbatim to the game.
    pub opts: Option<Vec<String>>,
    /// Channel selector: empty/absent, `"prerelease"`, or a pinned tag.
    pub branch: Option<String>,
    /// Custom game installation directory.
    pub game_dir: Option<PathBuf>,
    /// Keys written by other tools (the front-end) are kept as-is.
    pub extra: Map<String, Value>,
}

impl<'de> Deserialize<'de> for Settings {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut extra = Map::deserialize(deserializer)?;
        Ok(Self {
            opts: take_field(&mut extra, OPTS_KEY),
            branch: take_field(&mut extra, BRANCH_KEY),
            game_dir: take_field(&mut extra, GAME_DIR_KEY),
            extra,
        })
    }
}

impl Serialize for Settings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut document = self.extra.clone();
        put_field(&mut document, OPTS_KEY, self.opts.as_ref())?;
        put_field(&mut document, BRANCH_KEY, self.branch.as_ref())?;
        put_field(&mut document, GAME_DIR_KEY, self.game_dir.as_ref())?;
        document.serialize(serializer)
    }
}

/// Move `key` out of `document` when it parses as `T`. `null` counts as
/// unset; anything else that does not parse is left where it is.
fn take_field<T: DeserializeOwned>(document: &mut Map<String, Value>, key: &str) -> Option<T> {
    let value = document.get(key)?;
    if value.is_null() {
        document.remove(key);
        return None;
    }
    match T::deserialize(value) {
        Ok(parsed) => {
            document.remove(key);
            Some(parsed)
        }
        Err(e) => {
            warn!("Ignoring settings key {:?}: {}", key, e);
            None
        }
    }
}

fn put_field<T: Serialize, E: serde::ser::Error>(
    document: &mut Map<String, Value>,
    key: &str,
    value: Option<&T>,
) -> Result<(), E> {
    if let Some(value) = value {
        let value = serde_json::to_value(value).map_err(E::custom)?;
        document.insert(key.to_string(), value);
    }
    Ok(())
}

impl Settings {
    pub fn is_empty(&self) -> bool {
        self.opts.is_none()
            && self.branch.is_none()
            && self.game_dir.is_none()
            && self.extra.is_empty()
    }

    /// Replace the launch options; `None` removes the key, including a
    /// malformed value kept from disk.
    pub fn set_opts(&mut self, opts: Option<Vec<String>>) {
        self.extra.remove(OPTS_KEY);
        self.opts = opts;
    }

    pub fn set_branch(&mut self, branch: Option<String>) {
        self.extra.remove(BRANCH_KEY);
        self.branch = branch;
    }

    pub fn set_game_dir(&mut self, game_dir: Option<PathBuf>) {
        self.extra.remove(GAME_DIR_KEY);
        self.game_dir = game_dir;
    }
}

/// `state.json` — what was last made runnable in the game directory.
///
/// Only written after extraction succeeded and the executable was found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}
