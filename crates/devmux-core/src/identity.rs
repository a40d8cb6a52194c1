//! Session naming protocol.
//!
//! Every client that needs to find a project's tmux session (the CLI, the
//! window navigator, third-party scripts) must derive the same name from the
//! same path. The algorithm is therefore a versioned protocol pinned by the
//! shared fixture in `fixtures/session_names.json`:
//!
//! ```text
//! v2-hashed: sanitize(basename(path)) + "-" + hex6(sha256(utf8(absolute(path))))
//! v1-plain:  sanitize(basename(path))
//! ```
//!
//! The v2 suffix is 24 bits wide. Two distinct paths with the same basename
//! collide with probability 2^-24; across `n` such paths the birthday bound
//! gives `p ≈ 1 - exp(-n(n-1) / 2^25)`, roughly 0.03% at n = 100 and 50% near
//! n = 4,800. Collisions are rare, not impossible.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Naming protocol version. Pinned once per deployment via settings.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NamingScheme {
    /// Sanitized basename only. Distinct projects with equal basenames share a session.
    V1Plain,
    /// Sanitized basename plus a 6-hex-digit path digest.
    #[default]
    V2Hashed,
}

impl NamingScheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::V1Plain => "v1-plain",
            Self::V2Hashed => "v2-hashed",
        }
    }
}

impl fmt::Display for NamingScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NamingScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "v1" | "v1-plain" | "plain" => Ok(Self::V1Plain),
            "v2" | "v2-hashed" | "hashed" => Ok(Self::V2Hashed),
            other => Err(format!("unknown naming scheme: {other:?}")),
        }
    }
}

/// Derive the tmux session name for a project directory.
///
/// Relative paths are resolved against the current directory first, so
/// `session_name(".", ..)` names the project you are standing in.
pub fn session_name(path: &Path, scheme: NamingScheme) -> String {
    let abs = absolutize(path);
    let base = abs
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let base = sanitize(&base);
    match scheme {
        NamingScheme::V1Plain => base,
        NamingScheme::V2Hashed => format!("{base}-{}", path_hash(&abs)),
    }
}

/// Replace every character outside `[A-Za-z0-9_-]` with `-`.
pub fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Lowercase hex of the first 3 bytes of `sha256(path)`.
///
/// `path` must already be absolute and normalised; see [`absolutize`].
pub fn path_hash(path: &Path) -> String {
    let digest = Sha256::digest(path.to_string_lossy().as_bytes());
    digest[..3].iter().map(|b| format!("{b:02x}")).collect()
}

/// Resolve `path` to an absolute, lexically normalised path.
///
/// `.` segments are dropped, `..` pops a segment (never above the root) and
/// trailing separators vanish. Symlinks are not followed.
pub fn absolutize(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("/"))
            .join(path)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::Prefix(p) => out.push(p.as_os_str()),
            Component::RootDir => out.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(seg) => out.push(seg),
        }
    }
    if out.as_os_str().is_empty() {
        out.push("/");
    }
    out
}
