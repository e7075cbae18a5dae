use std::time::Duration;

/// Repository holding the game archive releases.
pub const GAME_REPO: &str = "mastercomfig/tc2";
/// Repository holding the launcher's own releases.
pub const LAUNCHER_REPO: &str = "mastercomfig/tc2-launcher";

const DEFAULT_API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = "TC2Launcher";

const API_BASE_ENV: &str = "TC2_LAUNCHER_API_BASE";
const DEV_ENV: &str = "TC2_LAUNCHER_DEV";

/// Static launcher configuration. User preferences live in `settings.json`
/// (see [`crate::core::store::Settings`]), not here.
#[derive(Debug, Clone)]
pub struct LauncherConfig {
    pub game_repo: String,
    pub launcher_repo: String,
    pub api_base: String,
    pub user_agent: String,
    pub request_timeout: Duration,
    pub download_timeout: Duration,
    /// Running version of this binary, compared against launcher releases.
    pub version: String,
    /// Developer / unpackaged build: self-update is never attempted.
    pub dev_instance: bool,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            game_repo: GAME_REPO.to_string(),
            launcher_repo: LAUNCHER_REPO.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            user_agent: USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(30),
            download_timeout: Duration::from_secs(60),
            version: env!("CARGO_PKG_VERSION").to_string(),
            dev_instance: cfg!(debug_assertions),
        }
    }
}

impl LauncherConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(base) = std::env::var(API_BASE_ENV) {
            let base = base.trim().trim_end_matches('/');
            if !base.is_empty() {
                config.api_base = base.to_string();
            }
        }

        if let Ok(flag) = std::env::var(DEV_ENV) {
            config.dev_instance = matches!(flag.trim(), "1" | "true" | "yes");
        }

        config
    }
}
