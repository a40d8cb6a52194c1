//! Project discovery under a scan root.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::{ConfigSource, load_project};
use crate::detect::detect_package_manager;
use crate::identity::{NamingScheme, session_name};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectSummary {
    pub name: String,
    pub path: PathBuf,
    pub session_name: String,
    pub dev_command: Option<String>,
    pub package_manager: Option<String>,
    pub has_declaration: bool,
    pub pane_names: Vec<String>,
    pub running: bool,
}

impl ProjectSummary {
    /// `claude + server` style one-liner of the pane names.
    pub fn pane_summary(&self) -> String {
        self.pane_names
            .iter()
            .map(|n| if n.is_empty() { "·" } else { n.as_str() })
            .collect::<Vec<_>>()
            .join(" + ")
    }
}

/// List the immediate, non-hidden subdirectories of `root`, sorted by name.
///
/// `is_running` is asked once per project with its session name. An
/// unreadable root yields an empty list.
pub fn scan_projects(
    root: &Path,
    scheme: NamingScheme,
    is_running: impl Fn(&str) -> bool,
) -> Vec<ProjectSummary> {
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!("cannot scan {}: {e}", root.display());
            return Vec::new();
        }
    };

    let mut dirs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_ok_and(|t| t.is_dir()))
        .filter(|e| !e.file_name().to_string_lossy().starts_with('.'))
        .map(|e| e.path())
        .collect();
    dirs.sort();

    dirs.into_iter()
        .map(|path| {
            let config = load_project(&path);
            let session = session_name(&config.path, scheme);
            let has_manifest = path.join("package.json").exists();
            let dev_command = config.panes.get(1).and_then(|p| match &config.source {
                ConfigSource::Declared => p.cmd.clone(),
                ConfigSource::Inferred { detected } => detected.clone(),
                ConfigSource::Fallback { .. } => p.cmd.clone(),
            });
            ProjectSummary {
                name: config.base_name(),
                running: is_running(&session),
                session_name: session,
                dev_command,
                package_manager: has_manifest
                    .then(|| detect_package_manager(&path).as_str().to_string()),
                has_declaration: config.source == ConfigSource::Declared,
                pane_names: config.panes.iter().map(|p| p.name.clone()).collect(),
                path: config.path,
            }
        })
        .collect()
}
