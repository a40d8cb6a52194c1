//! Dev-server command detection from `package.json` and lockfiles.

use std::fmt;
use std::path::Path;

use serde::Deserialize;

/// Script names tried in order when inferring the server pane command.
pub const DEV_SCRIPTS: &[&str] = &["dev", "start", "serve", "watch"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageManager {
    Pnpm,
    Bun,
    Yarn,
    Npm,
}

impl PackageManager {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pnpm => "pnpm",
            Self::Bun => "bun",
            Self::Yarn => "yarn",
            Self::Npm => "npm",
        }
    }

    /// Prefix used to run a package script.
    pub fn run_prefix(self) -> &'static str {
        match self {
            Self::Npm => "npm run",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick the package manager from the lockfiles present in `dir`.
///
/// Precedence: pnpm, then bun (either lockfile format), then yarn, else npm.
pub fn detect_package_manager(dir: &Path) -> PackageManager {
    let has = |name: &str| dir.join(name).exists();
    if has("pnpm-lock.yaml") {
        PackageManager::Pnpm
    } else if has("bun.lockb") || has("bun.lock") {
        PackageManager::Bun
    } else if has("yarn.lock") {
        PackageManager::Yarn
    } else {
        PackageManager::Npm
    }
}

#[derive(Debug, Default, Deserialize)]
struct Manifest {
    /// `"scripts": null` is treated as no scripts.
    #[serde(default)]
    scripts: Option<serde_json::Map<String, serde_json::Value>>,
}

impl Manifest {
    fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    fn has_script(&self, name: &str) -> bool {
        self.scripts.as_ref().is_some_and(|s| s.contains_key(name))
    }
}

/// Detected dev command plus the manager it was built with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevCommand {
    pub command: String,
    pub manager: PackageManager,
    pub script: &'static str,
}

/// Infer the dev-server command for `dir`.
///
/// Returns `None` when there is no manifest, it does not parse, or none of
/// [`DEV_SCRIPTS`] is defined.
pub fn detect_dev_command(dir: &Path) -> Option<DevCommand> {
    let manifest_path = dir.join("package.json");
    let raw = std::fs::read_to_string(&manifest_path).ok()?;
    let manifest = match Manifest::parse(&raw) {
        Ok(m) => m,
        Err(e) => {
            tracing::debug!("ignoring unparsable {}: {e}", manifest_path.display());
            return None;
        }
    };

    let script = DEV_SCRIPTS
        .iter()
        .copied()
        .find(|s| manifest.has_script(s))?;
    let manager = detect_package_manager(dir);
    Some(DevCommand {
        command: format!("{} {script}", manager.run_prefix()),
        manager,
        script,
    })
}
