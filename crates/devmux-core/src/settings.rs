//! User-level settings (`~/.config/devmux/config.toml`).
//!
//! Every field is optional on disk; a missing file means defaults. A file
//! that does not parse is logged and ignored, never fatal.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::identity::NamingScheme;

/// Terminal emulators devmux knows how to drive.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerminalKind {
    #[default]
    Terminal,
    Iterm2,
    Warp,
    Ghostty,
    Kitty,
    Alacritty,
}

impl TerminalKind {
    pub const ALL: [Self; 6] = [
        Self::Terminal,
        Self::Iterm2,
        Self::Warp,
        Self::Ghostty,
        Self::Kitty,
        Self::Alacritty,
    ];

    /// Application name as the OS knows it.
    pub fn app_name(self) -> &'static str {
        match self {
            Self::Terminal => "Terminal",
            Self::Iterm2 => "iTerm2",
            Self::Warp => "Warp",
            Self::Ghostty => "Ghostty",
            Self::Kitty => "kitty",
            Self::Alacritty => "Alacritty",
        }
    }

    pub fn bundle_id(self) -> &'static str {
        match self {
            Self::Terminal => "com.apple.Terminal",
            Self::Iterm2 => "com.googlecode.iterm2",
            Self::Warp => "dev.warp.Warp-Stable",
            Self::Ghostty => "com.mitchellh.ghostty",
            Self::Kitty => "net.kovidgoyal.kitty",
            Self::Alacritty => "org.alacritty",
        }
    }
}

impl fmt::Display for TerminalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.app_name())
    }
}

impl FromStr for TerminalKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "terminal" | "terminal.app" | "apple" => Ok(Self::Terminal),
            "iterm" | "iterm2" => Ok(Self::Iterm2),
            "warp" => Ok(Self::Warp),
            "ghostty" => Ok(Self::Ghostty),
            "kitty" => Ok(Self::Kitty),
            "alacritty" => Ok(Self::Alacritty),
            other => Err(format!("unknown terminal: {other:?}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub terminal: TerminalKind,
    /// Directory scanned by `devmux projects`. Empty means `~/dev`.
    pub scan_root: Option<PathBuf>,
    pub naming_scheme: NamingScheme,
    pub tmux_bin: String,
    /// How long the highlight overlay holds before fading out.
    pub highlight_hold_ms: u64,
    /// Wait after a desktop switch before raising the window.
    pub space_settle_ms: u64,
    /// Upper bound on waiting for a pane to go idle after an interrupt.
    pub interrupt_timeout_ms: u64,
    /// Upper bound on waiting for a pane to go idle after a force kill.
    pub kill_timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            terminal: TerminalKind::default(),
            scan_root: None,
            naming_scheme: NamingScheme::default(),
            tmux_bin: "tmux".to_string(),
            highlight_hold_ms: 1_200,
            space_settle_ms: 200,
            interrupt_timeout_ms: 1_500,
            kill_timeout_ms: 1_000,
            poll_interval_ms: 100,
        }
    }
}

impl Settings {
    /// Parse settings from a TOML file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load settings from `explicit` or the default location, falling back
    /// to defaults on any problem.
    pub fn load_or_default(explicit: Option<&Path>) -> Self {
        let Some(path) = explicit.map(Path::to_path_buf).or_else(default_settings_path) else {
            return Self::default();
        };
        if explicit.is_none() && !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(settings) => {
                tracing::debug!("loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                tracing::warn!("ignoring settings: {e}");
                Self::default()
            }
        }
    }

    pub fn resolved_scan_root(&self) -> PathBuf {
        if let Some(root) = self.scan_root.as_ref().filter(|r| !r.as_os_str().is_empty()) {
            return expand_home(root);
        }
        home_dir().unwrap_or_else(|| PathBuf::from("/")).join("dev")
    }

    pub fn highlight_hold(&self) -> Duration {
        Duration::from_millis(self.highlight_hold_ms)
    }

    pub fn space_settle(&self) -> Duration {
        Duration::from_millis(self.space_settle_ms)
    }

    pub fn interrupt_timeout(&self) -> Duration {
        Duration::from_millis(self.interrupt_timeout_ms)
    }

    pub fn kill_timeout(&self) -> Duration {
        Duration::from_millis(self.kill_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

/// `$XDG_CONFIG_HOME/devmux/config.toml`, else `~/.config/devmux/config.toml`.
pub fn default_settings_path() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os("XDG_CONFIG_HOME").filter(|d| !d.is_empty()) {
        return Some(PathBuf::from(dir).join("devmux/config.toml"));
    }
    home_dir().map(|h| h.join(".config/devmux/config.toml"))
}
