// ─── Content Verification ───
// Published digests have the form `algorithm:hex`. Only sha256 is supported;
// anything else is "cannot verify" and the caller's policy decides.

use std::path::Path;

use sha2::{Digest, Sha256};

use crate::core::error::{LauncherError, LauncherResult};

pub const SHA256: &str = "sha256";

/// A parsed `algorithm:hex` digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDigest {
    pub algorithm: String,
    pub hex: String,
}

impl ContentDigest {
    pub fn parse(raw: &str) -> LauncherResult<Self> {
        let (algorithm, hex) = raw
            .trim()
            .split_once(':')
            .ok_or_else(|| LauncherError::MalformedDigest(raw.to_string()))?;
        if algorithm.is_empty() || hex.is_empty() {
            return Err(LauncherError::MalformedDigest(raw.to_string()));
        }
        Ok(Self {
            algorithm: algorithm.to_ascii_lowercase(),
            hex: hex.to_string(),
        })
    }

    pub fn sha256(hex: impl Into<String>) -> Self {
        Self {
            algorithm: SHA256.to_string(),
            hex: hex.into(),
        }
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.hex)
    }
}

/// Outcome of checking content against a digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Verified,
    Mismatch { actual: String },
    Unsupported(String),
}

/// How strictly a download is gated on its published digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestPolicy {
    /// A supported, matching digest must be published.
    Required,
    /// Verify when a digest is published; accept unverified only when none is.
    IfPublished,
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

pub fn verify_bytes(bytes: &[u8], digest: &ContentDigest) -> Verification {
    if digest.algorithm != SHA256 {
        return Verification::Unsupported(digest.algorithm.clone());
    }
    compare(sha256_hex(bytes), digest)
}

/// Hash the file at `path` in a streaming fashion and compare.
pub fn verify_file(path: &Path, digest: &ContentDigest) -> LauncherResult<Verification> {
    if digest.algorithm != SHA256 {
        return Ok(Verification::Unsupported(digest.algorithm.clone()));
    }

    let mut file = std::fs::File::open(path).map_err(LauncherError::io(path))?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher).map_err(LauncherError::io(path))?;
    Ok(compare(hex::encode(hasher.finalize()), digest))
}

fn compare(actual: String, digest: &ContentDigest) -> Verification {
    if actual.eq_ignore_ascii_case(&digest.hex) {
        Verification::Verified
    } else {
        Verification::Mismatch { actual }
    }
}

/// Apply `policy` to the file at `path` given the digest the host published.
pub fn check_download(
    path: &Path,
    published: Option<&str>,
    policy: DigestPolicy,
) -> LauncherResult<()> {
    let Some(raw) = published.filter(|raw| !raw.trim().is_empty()) else {
        return match policy {
            DigestPolicy::Required => Err(LauncherError::MissingDigest(path.display().to_string())),
            DigestPolicy::IfPublished => {
                tracing::warn!("No digest published for {:?}; skipping verification", path);
                Ok(())
            }
        };
    };

    let digest = ContentDigest::parse(raw)?;
    match verify_file(path, &digest)? {
        Verification::Verified => Ok(()),
        Verification::Mismatch { actual } => Err(LauncherError::DigestMismatch {
            path: path.to_path_buf(),
            expected: digest.hex,
            actual,
        }),
        Verification::Unsupported(algorithm) => Err(LauncherError::UnsupportedDigest(algorithm)),
    }
}
