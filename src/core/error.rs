use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Central error type for the launcher core.
/// Every module returns `Result<T, LauncherError>`.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request to {url} failed: HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    // ── Releases ────────────────────────────────────────
    #[error("No release found for {0}")]
    NoRelease(String),

    #[error("No asset matching '{filter}' in release {tag}")]
    AssetNotFound { filter: String, tag: String },

    // ── Integrity ───────────────────────────────────────
    #[error("Digest mismatch for {path:?}: expected {expected}, got {actual}")]
    DigestMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("Unsupported digest algorithm: {0}")]
    UnsupportedDigest(String),

    #[error("No digest published for {0}")]
    MissingDigest(String),

    #[error("Malformed digest: {0}")]
    MalformedDigest(String),

    // ── Archive ─────────────────────────────────────────
    #[error("Zip extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Processes ───────────────────────────────────────
    #[error("Failed to spawn {program:?}: {source}")]
    Spawn {
        program: PathBuf,
        source: std::io::Error,
    },

    #[error("Timed out after {after:?} while {what}")]
    Timeout { what: String, after: Duration },

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

impl From<std::io::Error> for LauncherError {
    fn from(source: std::io::Error) -> Self {
        LauncherError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

impl LauncherError {
    /// Shorthand for the common `map_err` into [`LauncherError::Io`].
    pub fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> LauncherError {
        let path = path.into();
        move |source| LauncherError::Io { path, source }
    }
}
