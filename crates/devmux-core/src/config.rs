//! Per-project pane declaration (`.devmux.json`) and default inference.
//!
//! The declaration is read fresh on every call; nothing is cached between
//! orchestration runs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::detect::{DevCommand, detect_dev_command};
use crate::error::ConfigError;
use crate::identity::absolutize;

/// Declaration file name, looked up in the project root.
pub const DECLARATION_FILE: &str = ".devmux.json";

/// Main pane width when the first pane declares no size.
pub const DEFAULT_MAIN_SIZE: u8 = 60;

/// Server pane command written by `init` when nothing could be detected.
const INIT_PLACEHOLDER_CMD: &str = "echo 'no dev server detected'";

// ─── On-disk shape ───────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub ensure: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub prefill: bool,
    #[serde(default)]
    pub panes: Vec<DeclaredPane>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeclaredPane {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cmd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
}

// ─── Resolved model ──────────────────────────────────────────────

/// One pane of a project layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaneSpec {
    /// Label shown as the tmux pane title. May be empty.
    pub name: String,
    /// Shell command to submit. `None` leaves an idle shell.
    pub cmd: Option<String>,
    /// Main-region width percentage; only read from the first pane.
    pub size: Option<u8>,
}

impl PaneSpec {
    pub fn new(name: impl Into<String>, cmd: Option<String>) -> Self {
        Self {
            name: name.into(),
            cmd,
            size: None,
        }
    }

    #[must_use]
    pub fn with_size(mut self, size: u8) -> Self {
        self.size = Some(size);
        self
    }
}

impl From<DeclaredPane> for PaneSpec {
    fn from(p: DeclaredPane) -> Self {
        Self {
            name: p.name.unwrap_or_default(),
            cmd: p.cmd.filter(|c| !c.trim().is_empty()),
            size: p
                .size
                .filter(|s| s.is_finite() && *s > 0.0)
                .map(|s| s.round().clamp(1.0, 99.0) as u8),
        }
    }
}

/// Where a project's pane list came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// `.devmux.json` with a non-empty `panes` list.
    Declared,
    /// No usable declaration; the default two panes were inferred.
    Inferred { detected: Option<String> },
    /// The declaration was unreadable; inference was used instead.
    Fallback { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    /// Absolute project directory.
    pub path: PathBuf,
    pub panes: Vec<PaneSpec>,
    pub ensure: bool,
    pub prefill: bool,
    pub source: ConfigSource,
}

impl ProjectConfig {
    /// Width of the main (first) pane, falling back to [`DEFAULT_MAIN_SIZE`].
    pub fn main_size(&self) -> u8 {
        self.panes
            .first()
            .and_then(|p| p.size)
            .unwrap_or(DEFAULT_MAIN_SIZE)
    }

    /// Final path segment, used as the tmux window name.
    pub fn base_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

// ─── Loading ─────────────────────────────────────────────────────

/// Read `.devmux.json` from `dir`. `Ok(None)` when the file is absent.
pub fn read_declaration(dir: &Path) -> Result<Option<Declaration>, ConfigError> {
    let path = dir.join(DECLARATION_FILE);
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(ConfigError::Io { path, source }),
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| ConfigError::Json { path, source })
}

/// The default two-pane layout: an agent pane and a dev-server pane.
pub fn inferred_panes(dir: &Path) -> (Vec<PaneSpec>, Option<DevCommand>) {
    let detected = detect_dev_command(dir);
    let panes = vec![
        PaneSpec::new("claude", Some("claude".to_string())).with_size(DEFAULT_MAIN_SIZE),
        PaneSpec::new("server", detected.as_ref().map(|d| d.command.clone())),
    ];
    (panes, detected)
}

/// Resolve the project configuration for `dir`.
///
/// Never fails: a malformed declaration is logged and replaced by inference.
pub fn load_project(dir: &Path) -> ProjectConfig {
    let path = absolutize(dir);

    let (declaration, fallback_reason) = match read_declaration(&path) {
        Ok(decl) => (decl, None),
        Err(e) => {
            tracing::warn!("invalid {DECLARATION_FILE}, using defaults: {e}");
            (None, Some(e.to_string()))
        }
    };
    let ensure = declaration.as_ref().is_some_and(|d| d.ensure);
    let prefill = declaration.as_ref().is_some_and(|d| d.prefill);

    if let Some(decl) = declaration.filter(|d| !d.panes.is_empty()) {
        return ProjectConfig {
            path,
            panes: decl.panes.into_iter().map(PaneSpec::from).collect(),
            ensure,
            prefill,
            source: ConfigSource::Declared,
        };
    }

    let (panes, detected) = inferred_panes(&path);
    let source = match fallback_reason {
        Some(reason) => ConfigSource::Fallback { reason },
        None => ConfigSource::Inferred {
            detected: detected.map(|d| d.command),
        },
    };
    ProjectConfig {
        path,
        panes,
        ensure,
        prefill,
        source,
    }
}

/// Write a starter `.devmux.json` into `dir`. Refuses to overwrite.
pub fn init_declaration(dir: &Path) -> Result<(PathBuf, Declaration), ConfigError> {
    let path = absolutize(dir).join(DECLARATION_FILE);
    if path.exists() {
        return Err(ConfigError::AlreadyExists(path));
    }

    let server_cmd = detect_dev_command(dir)
        .map(|d| d.command)
        .unwrap_or_else(|| INIT_PLACEHOLDER_CMD.to_string());
    let declaration = Declaration {
        ensure: true,
        prefill: false,
        panes: vec![
            DeclaredPane {
                name: Some("claude".into()),
                cmd: Some("claude".into()),
                size: Some(f64::from(DEFAULT_MAIN_SIZE)),
            },
            DeclaredPane {
                name: Some("server".into()),
                cmd: Some(server_cmd),
                size: None,
            },
        ],
    };

    let body = serde_json::to_string_pretty(&declaration).map_err(|source| ConfigError::Json {
        path: path.clone(),
        source,
    })?;
    std::fs::write(&path, format!("{body}\n")).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    Ok((path, declaration))
}
